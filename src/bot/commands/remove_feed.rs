use super::Command;
use crate::bot::telegram_client::Api;
use crate::db::subscriptions;
use diesel::r2d2::ConnectionManager;
use diesel::r2d2::Pool;
use diesel::sqlite::SqliteConnection;
use frankenstein::Message;

pub struct RemoveFeed {
    title: String,
}

impl RemoveFeed {
    pub fn execute(
        db_pool: Pool<ConnectionManager<SqliteConnection>>,
        api: &Api,
        message: Message,
        title: String,
    ) {
        Self { title }.execute(db_pool, api, message);
    }

    fn remove_feed(&self, connection: &mut SqliteConnection, chat_id: i64) -> String {
        match subscriptions::remove(connection, chat_id, &self.title) {
            Ok(true) => format!("Removed the \"{}\" feed.", self.title),
            Ok(false) => format!("No feed named \"{}\" is registered.", self.title),
            Err(error) => {
                log::error!("Failed to remove \"{}\": {}", self.title, error);

                "Something went wrong with the bot's storage.".to_string()
            }
        }
    }
}

impl Command for RemoveFeed {
    fn response(
        &self,
        db_pool: Pool<ConnectionManager<SqliteConnection>>,
        message: &Message,
    ) -> String {
        match self.fetch_db_connection(db_pool) {
            Ok(mut connection) => self.remove_feed(&mut connection, message.chat.id),
            Err(error_message) => error_message,
        }
    }
}
