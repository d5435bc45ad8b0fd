pub mod atom;
pub mod rss;

use crate::http_client;
use chrono::{DateTime, Utc};
use isahc::prelude::*;

#[derive(Debug)]
pub struct FeedReaderError {
    pub msg: String,
}

/// One entry of a fetched feed. Lives only for the duration of a check
/// cycle; nothing here is persisted.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FetchedFeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub guid: Option<String>,
    pub id: Option<String>,
    pub publication_date: Option<DateTime<Utc>>,
}

impl FetchedFeedItem {
    /// Identifier used for novelty detection: guid, then id, then link.
    /// An item lacking all three resolves to an empty identifier, which
    /// never matches a stored one.
    pub fn identifier(&self) -> String {
        self.guid
            .as_ref()
            .or(self.id.as_ref())
            .or(self.link.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct FetchedFeed {
    pub title: String,
    pub items: Vec<FetchedFeedItem>,
}

/// Fetches a feed and parses it, trying RSS first and falling back to Atom.
/// Items come back in document order, which feeds conventionally keep
/// newest-first.
pub fn read_feed(url: &str) -> Result<FetchedFeed, FeedReaderError> {
    let body = read_url(url)?;

    match rss::parse(body.as_bytes()) {
        Ok(feed) => Ok(feed),
        Err(_) => atom::parse(body.as_bytes()),
    }
}

pub fn read_url(url: &str) -> Result<String, FeedReaderError> {
    let mut response = http_client::client().get(url).map_err(|error| {
        let msg = format!("{error:?}");

        FeedReaderError { msg }
    })?;

    if !response.status().is_success() {
        let msg = format!("unexpected status {}", response.status());

        return Err(FeedReaderError { msg });
    }

    response.text().map_err(|error| {
        let msg = format!("{error:?}");

        FeedReaderError { msg }
    })
}
