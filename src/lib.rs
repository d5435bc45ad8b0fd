pub mod bot;
pub mod config;
pub mod context;
pub mod db;
pub mod deliver;
pub mod http_client;
pub mod http_server;
pub mod models;
pub mod schema;
pub mod sync;
