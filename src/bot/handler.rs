use super::commands;
use super::commands::add_feed::AddFeed;
use super::commands::list_feeds::ListFeeds;
use super::commands::remove_feed::RemoveFeed;
use super::commands::unknown_command::UnknownCommand;
use super::commands::BotCommand;
use super::commands::Command;
use crate::bot::telegram_client;
use crate::config::Config;
use crate::context;
use crate::db;
use frankenstein::Update;
use frankenstein::UpdateContent;
use std::thread;

pub struct UpdateHandler {}

impl UpdateHandler {
    /// Polls Telegram for updates and dispatches commands on a worker
    /// pool. Runs for the lifetime of the process.
    pub fn start() {
        let mut api = telegram_client::api().clone();
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(Config::commands_thread_number() as usize)
            .build()
            .unwrap();

        log::info!("Starting the feedrelay bot");

        let interval = std::time::Duration::from_secs(1);

        loop {
            while let Some(update) = api.next_update() {
                thread_pool.spawn(move || Self::process_update(update));
            }

            thread::sleep(interval);
        }
    }

    fn process_update(update: Update) {
        let message = match update.content {
            UpdateContent::Message(message) => message,
            UpdateContent::ChannelPost(channel_post) => channel_post,
            _ => return,
        };

        let Some(text) = message.text.clone() else {
            return;
        };

        let Some(command) = BotCommand::parse(&text, &context::get().bot_username) else {
            return;
        };

        let api = telegram_client::api();

        let Some(user) = message.from.as_deref() else {
            log::debug!("Ignoring a command without a sender in chat {}", message.chat.id);
            return;
        };

        if !commands::is_chat_admin(api, message.chat.id, user.id) {
            if let Err(error) =
                api.send_text(message.chat.id, commands::ACCESS_DENIED_MESSAGE)
            {
                log::error!("Failed to reply to chat {}: {:?}", message.chat.id, error);
            }
            return;
        }

        let db_pool = db::pool().clone();

        match command {
            BotCommand::Add { title, url } => AddFeed::execute(db_pool, api, message, title, url),
            BotCommand::Remove { title } => RemoveFeed::execute(db_pool, api, message, title),
            BotCommand::List => ListFeeds::execute(db_pool, api, message),
            BotCommand::Unknown => UnknownCommand::execute(db_pool, api, message),
        }
    }
}
