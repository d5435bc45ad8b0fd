use crate::sync::reader::FetchedFeedItem;
use chrono::{DateTime, Utc};

/// Result of one novelty pass over a fetched feed.
#[derive(Debug, Eq, PartialEq)]
pub struct Detection {
    /// Genuinely new items, newest first, in fetch order.
    pub new_items: Vec<FetchedFeedItem>,
    /// Identifier to persist: the newest fetched item's identifier when the
    /// fetch is non-empty and that identifier is usable, otherwise whatever
    /// was stored before.
    pub last_item_id: Option<String>,
}

/// Decides which fetched items are new since the last check.
///
/// The stored identifier is authoritative when it is still present in the
/// fetch: everything strictly newer than its position is new, regardless of
/// clock skew. When the identifier is absent (feed rotated past it, or the
/// feed changed its id scheme) detection falls back to publication dates
/// strictly later than `last_checked_at`; items without a parseable date are
/// conservatively treated as old. In initial-check mode items at or before
/// `started_at` are additionally suppressed so a restart never replays
/// history.
pub fn detect(
    items: &[FetchedFeedItem],
    stored_item_id: Option<&str>,
    last_checked_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
) -> Detection {
    let mut new_items = match stored_item_id {
        Some(stored) if !stored.is_empty() => {
            match items.iter().position(|item| item.identifier() == stored) {
                Some(position) => items[..position].to_vec(),
                None => published_after(items, last_checked_at),
            }
        }
        _ => published_after(items, last_checked_at),
    };

    if let Some(boundary) = started_at {
        new_items.retain(|item| matches!(item.publication_date, Some(date) if date > boundary));
    }

    let last_item_id = items
        .first()
        .map(|item| item.identifier())
        .filter(|identifier| !identifier.is_empty())
        .or_else(|| stored_item_id.map(|id| id.to_string()));

    Detection {
        new_items,
        last_item_id,
    }
}

fn published_after(
    items: &[FetchedFeedItem],
    boundary: Option<DateTime<Utc>>,
) -> Vec<FetchedFeedItem> {
    let Some(boundary) = boundary else {
        // Nothing to compare against before the first successful check.
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| matches!(item.publication_date, Some(date) if date > boundary))
        .cloned()
        .collect()
}
