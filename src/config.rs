use std::env;

pub struct Config;

impl Config {
    pub fn telegram_bot_token() -> String {
        env::var("TELEGRAM_BOT_TOKEN").expect("TELEGRAM_BOT_TOKEN is not set")
    }

    pub fn telegram_base_url() -> String {
        env::var("TELEGRAM_BASE_URL")
            .unwrap_or_else(|_| "https://api.telegram.org/bot".to_string())
    }

    pub fn database_url() -> String {
        env::var("DATABASE_URL").unwrap_or_else(|_| "feedrelay.sqlite3".to_string())
    }

    pub fn port() -> u16 {
        env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .expect("PORT should parse to an integer")
    }

    pub fn host_domain() -> String {
        env::var("HOST_DOMAIN").unwrap_or_else(|_| "http://localhost".to_string())
    }

    pub fn external_port() -> u16 {
        match env::var("EXTERNAL_PORT") {
            Ok(value) => value.parse().expect("EXTERNAL_PORT should parse to an integer"),
            Err(_) => Self::port(),
        }
    }

    /// Public URL for the given path, as seen from outside the host.
    pub fn external_url(path: &str) -> String {
        build_external_url(&Self::host_domain(), Self::external_port(), path)
    }

    pub fn request_timeout_in_seconds() -> u64 {
        parse_var("REQUEST_TIMEOUT", 30)
    }

    pub fn commands_thread_number() -> u32 {
        parse_var("COMMANDS_THREAD_NUMBER", 4)
    }

    pub fn feed_check_interval_in_seconds() -> u64 {
        parse_var("FEED_CHECK_INTERVAL", 60)
    }

    pub fn initial_check_delay_in_seconds() -> u64 {
        parse_var("INITIAL_CHECK_DELAY", 5)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("{} should parse to an integer", name)),
        Err(_) => default,
    }
}

fn build_external_url(domain: &str, port: u16, path: &str) -> String {
    if port == 80 || port == 443 {
        format!("{domain}{path}")
    } else {
        format!("{domain}:{port}{path}")
    }
}
