use crate::schema::feed_subscriptions;
use chrono::NaiveDateTime;
use diesel::prelude::*;

/// One tracked feed for one chat. `(chat_id, title)` is the natural key.
///
/// `last_checked_at` and `last_item_id` are null until the first check and
/// are only ever updated together, by the check orchestrator or by the
/// add/remove commands.
#[derive(Queryable, Identifiable, Debug, Clone, Eq, PartialEq)]
#[diesel(table_name = feed_subscriptions)]
pub struct FeedSubscription {
    pub id: i32,
    pub chat_id: i64,
    pub title: String,
    pub url: String,
    pub last_checked_at: Option<NaiveDateTime>,
    pub last_item_id: Option<String>,
}
