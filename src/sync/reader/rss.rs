use crate::sync::reader::{FeedReaderError, FetchedFeed, FetchedFeedItem};
use chrono::{DateTime, Utc};
use rss::Channel;

pub fn parse(data: &[u8]) -> Result<FetchedFeed, FeedReaderError> {
    match Channel::read_from(data) {
        Ok(channel) => Ok(FetchedFeed::from(channel)),
        Err(err) => {
            let msg = format!("{err}");

            Err(FeedReaderError { msg })
        }
    }
}

impl From<Channel> for FetchedFeed {
    fn from(channel: Channel) -> Self {
        let items = channel
            .items()
            .iter()
            .map(|item| FetchedFeedItem {
                title: item.title().map(|s| s.to_string()),
                link: item.link().map(|s| s.to_string()),
                guid: item.guid().map(|g| g.value().to_string()),
                id: None,
                publication_date: parse_time(item.pub_date()),
            })
            .collect::<Vec<FetchedFeedItem>>();

        FetchedFeed {
            title: channel.title().to_string(),
            items,
        }
    }
}

// Best effort: RSS mandates RFC 2822 dates but RFC 3339 appears in the
// wild. Anything else stays unparsed and is never treated as new.
fn parse_time(pub_date: Option<&str>) -> Option<DateTime<Utc>> {
    let string = pub_date?;

    DateTime::parse_from_rfc2822(string)
        .or_else(|_| DateTime::parse_from_rfc3339(string))
        .map(|date| date.into())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::parse;
    use chrono::DateTime;
    use std::fs;

    #[test]
    fn it_converts_an_rss_channel_to_a_fetched_feed() {
        let xml_feed = fs::read_to_string("./tests/support/rss_feed_example.xml").unwrap();

        let fetched_feed = parse(xml_feed.as_bytes()).unwrap();

        assert_eq!("Example News Feed", fetched_feed.title);
        assert_eq!(3, fetched_feed.items.len());

        let newest = &fetched_feed.items[0];
        assert_eq!(Some("Third post".to_string()), newest.title);
        assert_eq!(Some("http://news.example.com/3".to_string()), newest.link);
        assert_eq!(Some("guid-3".to_string()), newest.guid);
        assert_eq!(None, newest.id);
        assert_eq!(
            Some(
                DateTime::parse_from_rfc2822("Wed, 06 Oct 2021 12:00:00 GMT")
                    .unwrap()
                    .into()
            ),
            newest.publication_date
        );
    }

    #[test]
    fn it_keeps_items_without_guids_and_leaves_bad_dates_unparsed() {
        let xml_feed = r#"<?xml version="1.0"?>
            <rss version="2.0">
              <channel>
                <title>Sparse</title>
                <link>http://sparse.example.com</link>
                <description>sparse</description>
                <item>
                  <title>No guid</title>
                  <link>http://sparse.example.com/1</link>
                  <pubDate>not a date</pubDate>
                </item>
              </channel>
            </rss>"#;

        let fetched_feed = parse(xml_feed.as_bytes()).unwrap();

        assert_eq!(1, fetched_feed.items.len());
        assert_eq!(None, fetched_feed.items[0].guid);
        assert_eq!(None, fetched_feed.items[0].publication_date);
        assert_eq!("http://sparse.example.com/1", fetched_feed.items[0].identifier());
    }

    #[test]
    fn it_rejects_malformed_xml() {
        assert!(parse(b"<html>not a feed</html>").is_err());
    }
}
