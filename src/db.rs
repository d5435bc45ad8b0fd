use crate::config::Config;
use chrono::prelude::*;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use once_cell::sync::OnceCell;

pub mod subscriptions;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

static POOL: OnceCell<r2d2::Pool<r2d2::ConnectionManager<SqliteConnection>>> = OnceCell::new();

pub fn current_time() -> DateTime<Utc> {
    Utc::now().round_subsecs(0)
}

pub fn pool() -> &'static r2d2::Pool<r2d2::ConnectionManager<SqliteConnection>> {
    POOL.get_or_init(create_connection_pool)
}

pub fn create_connection_pool() -> r2d2::Pool<r2d2::ConnectionManager<SqliteConnection>> {
    let manager = r2d2::ConnectionManager::<SqliteConnection>::new(Config::database_url());

    r2d2::Pool::builder()
        .max_size(Config::commands_thread_number())
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .unwrap()
}

pub fn run_migrations(connection: &mut SqliteConnection) {
    connection
        .run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(Debug)]
struct ConnectionOptions;

impl r2d2::CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, connection: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        // SQLite serializes writers; wait instead of failing when the
        // scheduler and a command handler touch the database at once.
        diesel::sql_query("PRAGMA busy_timeout = 5000")
            .execute(connection)
            .map_err(r2d2::Error::QueryError)?;

        Ok(())
    }
}

#[cfg(test)]
pub fn establish_test_connection() -> SqliteConnection {
    let mut connection = SqliteConnection::establish(":memory:")
        .expect("Error connecting to the in-memory database");

    run_migrations(&mut connection);

    connection
}
