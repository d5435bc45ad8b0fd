use crate::bot::telegram_client::Api;
use diesel::r2d2::ConnectionManager;
use diesel::r2d2::Pool;
use diesel::r2d2::PooledConnection;
use diesel::sqlite::SqliteConnection;
use frankenstein::ChatMember;
use frankenstein::GetChatAdministratorsParams;
use frankenstein::Message;
use frankenstein::TelegramApi;

pub mod add_feed;
pub mod list_feeds;
pub mod remove_feed;
pub mod unknown_command;

pub static ACCESS_DENIED_MESSAGE: &str = "Only channel administrators can use this command.";

/// Command grammar. Two addressing forms feed the same variants: slash
/// commands ("/add title url", "/add@bot title url") and mention-prefixed
/// text ("@bot add title url"). Text not addressed to the bot parses to
/// nothing; addressed but unrecognized text parses to `Unknown`.
#[derive(Debug, Eq, PartialEq)]
pub enum BotCommand {
    Add { title: String, url: String },
    Remove { title: String },
    List,
    Unknown,
}

impl BotCommand {
    pub fn parse(text: &str, bot_username: &str) -> Option<BotCommand> {
        let text = text.trim();
        let mention = format!("@{bot_username}");

        let tokens: Vec<&str> = if let Some(stripped) = text.strip_prefix('/') {
            stripped.split_whitespace().collect()
        } else if text.split_whitespace().any(|token| token == mention) {
            text.split_whitespace()
                .filter(|token| *token != mention)
                .collect()
        } else {
            return None;
        };

        let Some((command, args)) = tokens.split_first() else {
            return Some(BotCommand::Unknown);
        };

        // "/add@botname" is Telegram's group addressing form.
        let command = command.split('@').next().unwrap_or(command);

        let command = match (command.to_lowercase().as_str(), args) {
            ("add", [title, url]) => BotCommand::Add {
                title: title.to_string(),
                url: url.to_string(),
            },
            ("remove", [title]) => BotCommand::Remove {
                title: title.to_string(),
            },
            ("list", []) => BotCommand::List,
            _ => BotCommand::Unknown,
        };

        Some(command)
    }
}

pub trait Command {
    fn response(
        &self,
        db_pool: Pool<ConnectionManager<SqliteConnection>>,
        message: &Message,
    ) -> String;

    fn execute(
        &self,
        db_pool: Pool<ConnectionManager<SqliteConnection>>,
        api: &Api,
        message: Message,
    ) {
        log::info!(
            "Chat {} wrote: {}",
            message.chat.id,
            message.text.as_deref().unwrap_or("")
        );

        let text = self.response(db_pool, &message);
        self.reply_to_message(api, &message, text);
    }

    fn reply_to_message(&self, api: &Api, message: &Message, text: String) {
        if let Err(error) = api.send_text(message.chat.id, &text) {
            log::error!("Failed to reply to chat {}: {:?}", message.chat.id, error);
        }
    }

    fn fetch_db_connection(
        &self,
        db_pool: Pool<ConnectionManager<SqliteConnection>>,
    ) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>, String> {
        match db_pool.get() {
            Ok(connection) => Ok(connection),
            Err(err) => {
                log::error!("Failed to fetch a connection from the pool: {err:?}");

                Err("Failed to process your command. Please try again later.".to_string())
            }
        }
    }
}

/// Checks whether the user administers the chat. A failed query counts as
/// not authorized.
pub fn is_chat_admin(api: &Api, chat_id: i64, user_id: u64) -> bool {
    let params = GetChatAdministratorsParams::builder()
        .chat_id(chat_id)
        .build();

    match api.get_chat_administrators(&params) {
        Ok(response) => response
            .result
            .iter()
            .any(|member| member_user_id(member) == Some(user_id)),
        Err(error) => {
            log::error!("Failed to verify admin status in chat {chat_id}: {error:?}");

            false
        }
    }
}

fn member_user_id(member: &ChatMember) -> Option<u64> {
    match member {
        ChatMember::Creator(owner) => Some(owner.user.id),
        ChatMember::Administrator(admin) => Some(admin.user.id),
        _ => None,
    }
}
