use crate::context;
use crate::db;
use crate::db::subscriptions;
use crate::db::subscriptions::StoreError;
use crate::deliver;
use crate::deliver::{DispatchError, Dispatcher};
use crate::models::FeedSubscription;
use crate::sync::detector;
use crate::sync::reader;
use crate::sync::reader::FeedReaderError;
use diesel::sqlite::SqliteConnection;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Delay between feeds within one sweep, to respect transport rate limits.
const PACING_DELAY: Duration = Duration::from_secs(1);

// Serializes check cycles: the scheduler, manual triggers, and push
// callbacks must never check the same subscription concurrently.
static CHECK_LOCK: Mutex<()> = Mutex::new(());

#[derive(Debug, Error)]
pub enum FeedCheckError {
    #[error("failed to fetch the feed: {msg}")]
    FeedUnreachable { msg: String },
    #[error(transparent)]
    TransportSendFailure(#[from] DispatchError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("connection pool failure: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

impl From<FeedReaderError> for FeedCheckError {
    fn from(error: FeedReaderError) -> Self {
        FeedCheckError::FeedUnreachable { msg: error.msg }
    }
}

/// Drives one pass over tracked feeds: fetch, detect, dispatch, persist.
///
/// State is persisted only after fetch and dispatch succeed, so a failed
/// cycle retries from the same stored state on the next tick. Delivery is
/// therefore at-least-once, never at-most-once.
pub struct FeedCheckJob<'a> {
    dispatcher: &'a dyn Dispatcher,
}

impl<'a> FeedCheckJob<'a> {
    pub fn new(dispatcher: &'a dyn Dispatcher) -> Self {
        FeedCheckJob { dispatcher }
    }

    /// Checks every subscription sequentially. Per-feed failures are logged
    /// and isolated; they never abort the sweep.
    pub fn run_all(&self, initial_check: bool) {
        // A panicked cycle must not wedge the scheduler for good.
        let _guard = CHECK_LOCK.lock().unwrap_or_else(|err| err.into_inner());

        let mut connection = match db::pool().get() {
            Ok(connection) => connection,
            Err(error) => {
                log::error!("Failed to fetch a connection from the pool: {error}");
                return;
            }
        };

        let subscriptions = match subscriptions::list_all(&mut connection) {
            Ok(subscriptions) => subscriptions,
            Err(error) => {
                log::error!("Failed to load subscriptions, aborting the sweep: {error}");
                return;
            }
        };

        log::info!("Checking {} feed subscriptions", subscriptions.len());

        for subscription in &subscriptions {
            if let Err(error) = self.check_subscription(&mut connection, subscription, initial_check)
            {
                log::error!(
                    "Failed to check \"{}\" ({}): {}",
                    subscription.title,
                    subscription.url,
                    error
                );
            }

            thread::sleep(PACING_DELAY);
        }
    }

    /// Targeted re-check of a single subscription, used by push callbacks.
    /// Returns true when any new item was dispatched.
    pub fn run_one(
        &self,
        subscription: &FeedSubscription,
        initial_check: bool,
    ) -> Result<bool, FeedCheckError> {
        let _guard = CHECK_LOCK.lock().unwrap_or_else(|err| err.into_inner());

        let mut connection = db::pool().get()?;

        self.check_subscription(&mut connection, subscription, initial_check)
    }

    fn check_subscription(
        &self,
        connection: &mut SqliteConnection,
        subscription: &FeedSubscription,
        initial_check: bool,
    ) -> Result<bool, FeedCheckError> {
        let fetched_feed = reader::read_feed(&subscription.url)?;

        let started_at = initial_check.then(|| context::get().started_at);
        let detection = detector::detect(
            &fetched_feed.items,
            subscription.last_item_id.as_deref(),
            subscription.last_checked_at.map(|time| time.and_utc()),
            started_at,
        );

        let delivered = !detection.new_items.is_empty();

        if delivered {
            let message =
                deliver::render_new_items_message(&subscription.title, &detection.new_items);

            self.dispatcher.send(subscription.chat_id, &message)?;
        }

        let updated = subscriptions::update_check_state(
            connection,
            subscription.id,
            db::current_time(),
            detection.last_item_id.as_deref(),
        )?;

        if !updated {
            log::warn!(
                "Subscription {} was removed while it was being checked",
                subscription.id
            );
        }

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::FeedCheckJob;
    use super::FeedCheckError;
    use crate::db;
    use crate::db::subscriptions;
    use crate::db::subscriptions::NewSubscription;
    use crate::deliver::{DispatchError, Dispatcher};
    use crate::models::FeedSubscription;
    use chrono::Duration;
    use diesel::sqlite::SqliteConnection;
    use mockito::mock;
    use std::cell::RefCell;

    struct RecordingDispatcher {
        sent: RefCell<Vec<(i64, String)>>,
    }

    impl RecordingDispatcher {
        fn new() -> Self {
            RecordingDispatcher {
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl Dispatcher for RecordingDispatcher {
        fn send(&self, chat_id: i64, text: &str) -> Result<(), DispatchError> {
            self.sent.borrow_mut().push((chat_id, text.to_string()));

            Ok(())
        }
    }

    struct FailingDispatcher;

    impl Dispatcher for FailingDispatcher {
        fn send(&self, chat_id: i64, _text: &str) -> Result<(), DispatchError> {
            Err(DispatchError {
                chat_id,
                msg: "rejected".to_string(),
            })
        }
    }

    fn feed_xml(guids: &[&str]) -> String {
        let items = guids
            .iter()
            .map(|guid| {
                format!(
                    "<item><title>Post {guid}</title>\
                     <link>http://news.example.com/{guid}</link>\
                     <guid>{guid}</guid>\
                     <pubDate>Wed, 06 Oct 2021 12:00:00 GMT</pubDate></item>"
                )
            })
            .collect::<String>();

        format!(
            "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel>\
             <title>News</title><link>http://news.example.com</link>\
             <description>news</description>{items}</channel></rss>"
        )
    }

    fn stored_subscription(
        connection: &mut SqliteConnection,
        url: &str,
        last_item_id: Option<&str>,
    ) -> FeedSubscription {
        subscriptions::create(
            connection,
            NewSubscription {
                chat_id: 99,
                title: "News",
                url,
                last_checked_at: Some((db::current_time() - Duration::hours(1)).naive_utc()),
                last_item_id,
            },
        )
        .unwrap()
    }

    #[test]
    fn it_dispatches_new_items_and_persists_the_new_state() {
        let mut connection = db::establish_test_connection();
        let path = "/check_job_new_items";
        let _m = mock("GET", path)
            .with_status(200)
            .with_body(feed_xml(&["g4", "g3", "g2"]))
            .create();
        let url = format!("{}{}", mockito::server_url(), path);

        let subscription = stored_subscription(&mut connection, &url, Some("g2"));
        let dispatcher = RecordingDispatcher::new();
        let job = FeedCheckJob::new(&dispatcher);

        let delivered = job
            .check_subscription(&mut connection, &subscription, false)
            .unwrap();

        assert!(delivered);

        let sent = dispatcher.sent.borrow();
        assert_eq!(1, sent.len());
        assert_eq!(99, sent[0].0);
        assert!(sent[0].1.contains("Post g4"));
        assert!(sent[0].1.contains("Post g3"));
        assert!(!sent[0].1.contains("Post g2"));

        let reloaded = subscriptions::find(&mut connection, subscription.id).unwrap();
        assert_eq!(Some("g4".to_string()), reloaded.last_item_id);
        assert!(reloaded.last_checked_at > subscription.last_checked_at);
    }

    #[test]
    fn it_advances_the_check_time_even_without_new_items() {
        let mut connection = db::establish_test_connection();
        let path = "/check_job_no_news";
        let _m = mock("GET", path)
            .with_status(200)
            .with_body(feed_xml(&["g2", "g1"]))
            .create();
        let url = format!("{}{}", mockito::server_url(), path);

        let subscription = stored_subscription(&mut connection, &url, Some("g2"));
        let dispatcher = RecordingDispatcher::new();
        let job = FeedCheckJob::new(&dispatcher);

        let delivered = job
            .check_subscription(&mut connection, &subscription, false)
            .unwrap();

        assert!(!delivered);
        assert!(dispatcher.sent.borrow().is_empty());

        let reloaded = subscriptions::find(&mut connection, subscription.id).unwrap();
        assert_eq!(Some("g2".to_string()), reloaded.last_item_id);
        assert!(reloaded.last_checked_at > subscription.last_checked_at);
    }

    #[test]
    fn a_fetch_failure_leaves_the_stored_state_untouched() {
        let mut connection = db::establish_test_connection();
        let path = "/check_job_fetch_failure";
        let _m = mock("GET", path).with_status(500).create();
        let url = format!("{}{}", mockito::server_url(), path);

        let subscription = stored_subscription(&mut connection, &url, Some("g2"));
        let dispatcher = RecordingDispatcher::new();
        let job = FeedCheckJob::new(&dispatcher);

        let result = job.check_subscription(&mut connection, &subscription, false);

        assert!(matches!(
            result,
            Err(FeedCheckError::FeedUnreachable { .. })
        ));

        let reloaded = subscriptions::find(&mut connection, subscription.id).unwrap();
        assert_eq!(subscription.last_checked_at, reloaded.last_checked_at);
        assert_eq!(subscription.last_item_id, reloaded.last_item_id);
    }

    #[test]
    fn a_dispatch_failure_skips_persistence_so_delivery_is_retried() {
        let mut connection = db::establish_test_connection();
        let path = "/check_job_dispatch_failure";
        let _m = mock("GET", path)
            .with_status(200)
            .with_body(feed_xml(&["g3", "g2"]))
            .create();
        let url = format!("{}{}", mockito::server_url(), path);

        let subscription = stored_subscription(&mut connection, &url, Some("g2"));
        let job = FeedCheckJob::new(&FailingDispatcher);

        let result = job.check_subscription(&mut connection, &subscription, false);

        assert!(matches!(
            result,
            Err(FeedCheckError::TransportSendFailure(_))
        ));

        let reloaded = subscriptions::find(&mut connection, subscription.id).unwrap();
        assert_eq!(Some("g2".to_string()), reloaded.last_item_id);
        assert_eq!(subscription.last_checked_at, reloaded.last_checked_at);
    }

    #[test]
    fn a_malformed_feed_body_counts_as_unreachable() {
        let mut connection = db::establish_test_connection();
        let path = "/check_job_malformed";
        let _m = mock("GET", path)
            .with_status(200)
            .with_body("<html>not a feed</html>")
            .create();
        let url = format!("{}{}", mockito::server_url(), path);

        let subscription = stored_subscription(&mut connection, &url, None);
        let dispatcher = RecordingDispatcher::new();
        let job = FeedCheckJob::new(&dispatcher);

        let result = job.check_subscription(&mut connection, &subscription, false);

        assert!(matches!(
            result,
            Err(FeedCheckError::FeedUnreachable { .. })
        ));
    }
}
