use crate::bot::telegram_client;
use crate::sync::reader::FetchedFeedItem;
use thiserror::Error;

/// Telegram caps message length; enumerating a large backlog would blow
/// past it, so a single notification lists at most this many items.
const MAX_ITEMS_PER_MESSAGE: usize = 5;

#[derive(Debug, Error)]
#[error("failed to deliver a message to chat {chat_id}: {msg}")]
pub struct DispatchError {
    pub chat_id: i64,
    pub msg: String,
}

/// Seam between the check orchestrator and the chat transport.
pub trait Dispatcher {
    fn send(&self, chat_id: i64, text: &str) -> Result<(), DispatchError>;
}

pub struct TelegramDispatcher;

impl Dispatcher for TelegramDispatcher {
    fn send(&self, chat_id: i64, text: &str) -> Result<(), DispatchError> {
        telegram_client::api()
            .send_text(chat_id, text)
            .map_err(|error| DispatchError {
                chat_id,
                msg: format!("{error:?}"),
            })
    }
}

/// Renders one notification for a batch of new items, newest first: the
/// five newest get a title and link each, the rest collapse into a count.
pub fn render_new_items_message(feed_title: &str, items: &[FetchedFeedItem]) -> String {
    let mut message = format!("New items from \"{feed_title}\":\n\n");

    for item in items.iter().take(MAX_ITEMS_PER_MESSAGE) {
        match &item.title {
            Some(title) => message.push_str(title),
            None => message.push_str("(untitled)"),
        }
        message.push('\n');

        if let Some(link) = &item.link {
            message.push_str(link);
            message.push('\n');
        }

        message.push('\n');
    }

    if items.len() > MAX_ITEMS_PER_MESSAGE {
        message.push_str(&format!(
            "{} more new items not shown.",
            items.len() - MAX_ITEMS_PER_MESSAGE
        ));
    }

    message
}
