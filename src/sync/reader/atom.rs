use crate::sync::reader::{FeedReaderError, FetchedFeed, FetchedFeedItem};
use atom_syndication::Feed as AtomFeed;
use chrono::{DateTime, FixedOffset, Utc};
use std::str::FromStr;

pub fn parse(data: &[u8]) -> Result<FetchedFeed, FeedReaderError> {
    let body = std::str::from_utf8(data).map_err(|err| {
        let msg = format!("{err}");

        FeedReaderError { msg }
    })?;

    match AtomFeed::from_str(body) {
        Ok(atom_feed) => Ok(FetchedFeed::from(atom_feed)),
        Err(err) => {
            let msg = format!("{err}");

            Err(FeedReaderError { msg })
        }
    }
}

impl From<AtomFeed> for FetchedFeed {
    fn from(feed: AtomFeed) -> Self {
        let items = feed
            .entries()
            .iter()
            .map(|entry| {
                let base_date = match entry.published() {
                    None => Some(entry.updated()),
                    published => published,
                };

                FetchedFeedItem {
                    title: Some(entry.title().to_string()),
                    link: entry.links().first().map(|link| link.href().to_string()),
                    guid: None,
                    id: Some(entry.id().to_string()),
                    publication_date: parse_time(base_date),
                }
            })
            .collect::<Vec<FetchedFeedItem>>();

        FetchedFeed {
            title: feed.title().to_string(),
            items,
        }
    }
}

fn parse_time(date: Option<&DateTime<FixedOffset>>) -> Option<DateTime<Utc>> {
    date.map(|value| (*value).into())
}
