use super::Command;
use crate::bot::telegram_client::Api;
use crate::db::subscriptions;
use diesel::r2d2::ConnectionManager;
use diesel::r2d2::Pool;
use diesel::sqlite::SqliteConnection;
use frankenstein::Message;

pub struct ListFeeds {}

impl ListFeeds {
    pub fn execute(
        db_pool: Pool<ConnectionManager<SqliteConnection>>,
        api: &Api,
        message: Message,
    ) {
        Self {}.execute(db_pool, api, message);
    }

    fn list_feeds(&self, connection: &mut SqliteConnection, chat_id: i64) -> String {
        match subscriptions::list_by_chat(connection, chat_id) {
            Err(error) => {
                log::error!("Failed to list feeds for chat {chat_id}: {error}");

                "Couldn't fetch the registered feeds.".to_string()
            }
            Ok(feeds) => {
                if feeds.is_empty() {
                    "This channel has no registered feeds.".to_string()
                } else {
                    let lines = feeds
                        .into_iter()
                        .map(|feed| format!("- {}: {}", feed.title, feed.url))
                        .collect::<Vec<String>>()
                        .join("\n");

                    format!("Registered feeds:\n{lines}")
                }
            }
        }
    }
}

impl Command for ListFeeds {
    fn response(
        &self,
        db_pool: Pool<ConnectionManager<SqliteConnection>>,
        message: &Message,
    ) -> String {
        match self.fetch_db_connection(db_pool) {
            Ok(mut connection) => self.list_feeds(&mut connection, message.chat.id),
            Err(error_message) => error_message,
        }
    }
}

#[cfg(test)]
mod list_feeds_tests {
    use super::ListFeeds;
    use crate::db;
    use crate::db::subscriptions;
    use crate::db::subscriptions::NewSubscription;

    #[test]
    fn it_lists_titles_and_urls_for_the_requesting_chat() {
        let mut connection = db::establish_test_connection();

        for (title, url) in [("News", "http://a/feed"), ("Blog", "http://b/feed")] {
            subscriptions::create(
                &mut connection,
                NewSubscription {
                    chat_id: 7,
                    title,
                    url,
                    last_checked_at: None,
                    last_item_id: None,
                },
            )
            .unwrap();
        }

        subscriptions::create(
            &mut connection,
            NewSubscription {
                chat_id: 8,
                title: "Elsewhere",
                url: "http://c/feed",
                last_checked_at: None,
                last_item_id: None,
            },
        )
        .unwrap();

        let result = ListFeeds {}.list_feeds(&mut connection, 7);

        assert_eq!(
            "Registered feeds:\n- News: http://a/feed\n- Blog: http://b/feed",
            result
        );
    }

    #[test]
    fn it_reports_when_nothing_is_registered() {
        let mut connection = db::establish_test_connection();

        let result = ListFeeds {}.list_feeds(&mut connection, 7);

        assert_eq!("This channel has no registered feeds.", result);
    }
}
