use super::Command;
use crate::bot::telegram_client::Api;
use crate::db;
use crate::db::subscriptions;
use crate::db::subscriptions::NewSubscription;
use crate::db::subscriptions::StoreError;
use crate::models::FeedSubscription;
use crate::sync::reader;
use diesel::r2d2::ConnectionManager;
use diesel::r2d2::Pool;
use diesel::sqlite::SqliteConnection;
use frankenstein::Message;
use url::Url;

pub struct AddFeed {
    title: String,
    url: String,
}

#[derive(Debug, PartialEq)]
enum AddFeedError {
    InvalidUrl,
    FeedUnreachable,
    Duplicate,
    Store,
}

impl From<StoreError> for AddFeedError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate => AddFeedError::Duplicate,
            StoreError::Db(_) => AddFeedError::Store,
        }
    }
}

impl AddFeed {
    pub fn execute(
        db_pool: Pool<ConnectionManager<SqliteConnection>>,
        api: &Api,
        message: Message,
        title: String,
        url: String,
    ) {
        Self { title, url }.execute(db_pool, api, message);
    }

    fn add_feed(&self, connection: &mut SqliteConnection, chat_id: i64) -> String {
        match self.create_subscription(connection, chat_id) {
            Ok(_subscription) => format!("Added the \"{}\" feed.", self.title),
            Err(AddFeedError::InvalidUrl) => "That doesn't look like a valid URL.".to_string(),
            Err(AddFeedError::FeedUnreachable) => format!(
                "Couldn't fetch a feed from {}. Check that the URL is correct.",
                self.url
            ),
            Err(AddFeedError::Duplicate) => {
                format!("A feed named \"{}\" is already registered.", self.title)
            }
            Err(AddFeedError::Store) => "Something went wrong with the bot's storage.".to_string(),
        }
    }

    /// Validates the URL by fetching the feed once, then stores the
    /// subscription seeded with the current newest item so nothing
    /// published before registration is ever announced.
    fn create_subscription(
        &self,
        connection: &mut SqliteConnection,
        chat_id: i64,
    ) -> Result<FeedSubscription, AddFeedError> {
        Url::parse(&self.url).map_err(|_| AddFeedError::InvalidUrl)?;

        let fetched_feed =
            reader::read_feed(&self.url).map_err(|_| AddFeedError::FeedUnreachable)?;

        log::info!(
            "Validated \"{}\" ({}) for chat {}",
            fetched_feed.title,
            self.url,
            chat_id
        );

        let last_item_id = fetched_feed
            .items
            .first()
            .map(|item| item.identifier())
            .filter(|identifier| !identifier.is_empty());

        let subscription = subscriptions::create(
            connection,
            NewSubscription {
                chat_id,
                title: &self.title,
                url: &self.url,
                last_checked_at: Some(db::current_time().naive_utc()),
                last_item_id: last_item_id.as_deref(),
            },
        )?;

        Ok(subscription)
    }
}

impl Command for AddFeed {
    fn response(
        &self,
        db_pool: Pool<ConnectionManager<SqliteConnection>>,
        message: &Message,
    ) -> String {
        match self.fetch_db_connection(db_pool) {
            Ok(mut connection) => self.add_feed(&mut connection, message.chat.id),
            Err(error_message) => error_message,
        }
    }
}
