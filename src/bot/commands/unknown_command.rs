use super::Command;
use crate::bot::telegram_client::Api;
use diesel::r2d2::ConnectionManager;
use diesel::r2d2::Pool;
use diesel::sqlite::SqliteConnection;
use frankenstein::Message;

static USAGE: &str = "Unrecognized command. Available commands:\n\
/add <title> <url> - register a feed\n\
/remove <title> - delete a feed\n\
/list - show the registered feeds";

pub struct UnknownCommand {}

impl UnknownCommand {
    pub fn execute(
        db_pool: Pool<ConnectionManager<SqliteConnection>>,
        api: &Api,
        message: Message,
    ) {
        Self {}.execute(db_pool, api, message);
    }
}

impl Command for UnknownCommand {
    fn response(
        &self,
        _db_pool: Pool<ConnectionManager<SqliteConnection>>,
        _message: &Message,
    ) -> String {
        USAGE.to_string()
    }
}
