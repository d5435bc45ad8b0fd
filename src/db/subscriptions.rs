use crate::models::FeedSubscription;
use crate::schema::feed_subscriptions;
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("the subscription already exists")]
    Duplicate,
    #[error("storage failure: {0}")]
    Db(diesel::result::Error),
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                StoreError::Duplicate
            }
            other => StoreError::Db(other),
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = feed_subscriptions)]
pub struct NewSubscription<'a> {
    pub chat_id: i64,
    pub title: &'a str,
    pub url: &'a str,
    pub last_checked_at: Option<NaiveDateTime>,
    pub last_item_id: Option<&'a str>,
}

/// Insert-or-replace on `(chat_id, title)`: re-adding an existing title
/// resets its check state.
pub fn create(
    conn: &mut SqliteConnection,
    new_subscription: NewSubscription,
) -> Result<FeedSubscription, StoreError> {
    diesel::replace_into(feed_subscriptions::table)
        .values(&new_subscription)
        .execute(conn)?;

    let subscription = feed_subscriptions::table
        .filter(feed_subscriptions::chat_id.eq(new_subscription.chat_id))
        .filter(feed_subscriptions::title.eq(new_subscription.title))
        .first::<FeedSubscription>(conn)?;

    Ok(subscription)
}

pub fn remove(conn: &mut SqliteConnection, chat_id: i64, title: &str) -> Result<bool, StoreError> {
    let deleted = diesel::delete(
        feed_subscriptions::table
            .filter(feed_subscriptions::chat_id.eq(chat_id))
            .filter(feed_subscriptions::title.eq(title)),
    )
    .execute(conn)?;

    Ok(deleted > 0)
}

pub fn find(conn: &mut SqliteConnection, id: i32) -> Option<FeedSubscription> {
    feed_subscriptions::table
        .find(id)
        .first::<FeedSubscription>(conn)
        .ok()
}

pub fn find_by_url(
    conn: &mut SqliteConnection,
    url: &str,
) -> Result<Vec<FeedSubscription>, StoreError> {
    let subscriptions = feed_subscriptions::table
        .filter(feed_subscriptions::url.eq(url))
        .order(feed_subscriptions::id)
        .load::<FeedSubscription>(conn)?;

    Ok(subscriptions)
}

pub fn list_by_chat(
    conn: &mut SqliteConnection,
    chat_id: i64,
) -> Result<Vec<FeedSubscription>, StoreError> {
    let subscriptions = feed_subscriptions::table
        .filter(feed_subscriptions::chat_id.eq(chat_id))
        .order(feed_subscriptions::id)
        .load::<FeedSubscription>(conn)?;

    Ok(subscriptions)
}

pub fn list_all(conn: &mut SqliteConnection) -> Result<Vec<FeedSubscription>, StoreError> {
    let subscriptions = feed_subscriptions::table
        .order(feed_subscriptions::id)
        .load::<FeedSubscription>(conn)?;

    Ok(subscriptions)
}

/// Advances the check timestamp and the last seen item id in a single
/// write. Returns false when the row no longer exists.
pub fn update_check_state(
    conn: &mut SqliteConnection,
    id: i32,
    checked_at: DateTime<Utc>,
    item_id: Option<&str>,
) -> Result<bool, StoreError> {
    let updated = diesel::update(feed_subscriptions::table.find(id))
        .set((
            feed_subscriptions::last_checked_at.eq(Some(checked_at.naive_utc())),
            feed_subscriptions::last_item_id.eq(item_id),
        ))
        .execute(conn)?;

    Ok(updated > 0)
}
