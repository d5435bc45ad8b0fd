pub mod commands;
pub mod handler;
pub mod telegram_client;
