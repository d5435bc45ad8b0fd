use crate::db;
use chrono::{DateTime, Utc};
use std::sync::OnceLock;

/// Process-scoped facts resolved once at startup. The bot's identity is
/// required before any command handling begins, and the start time bounds
/// the initial feed check.
#[derive(Debug)]
pub struct ServiceContext {
    pub bot_username: String,
    pub started_at: DateTime<Utc>,
}

static CONTEXT: OnceLock<ServiceContext> = OnceLock::new();

pub fn init(bot_username: String) {
    let context = ServiceContext {
        bot_username,
        started_at: db::current_time(),
    };

    if CONTEXT.set(context).is_err() {
        panic!("the service context is already initialized");
    }
}

pub fn get() -> &'static ServiceContext {
    CONTEXT
        .get()
        .expect("the service context is not initialized")
}
