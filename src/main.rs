use dotenv::dotenv;
use feedrelay::bot::handler::UpdateHandler;
use feedrelay::bot::telegram_client;
use feedrelay::context;
use feedrelay::db;
use feedrelay::http_server;
use feedrelay::sync::scheduler;
use frankenstein::TelegramApi;
use std::thread;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let mut connection = db::pool()
        .get()
        .expect("Failed to connect to the database");
    db::run_migrations(&mut connection);
    drop(connection);

    let me = match telegram_client::api().get_me() {
        Ok(response) => response.result,
        Err(error) => {
            log::error!("Failed to reach the Telegram API: {error:?}");

            std::process::exit(1);
        }
    };

    let bot_username = me.username.unwrap_or(me.first_name);
    log::info!("Authorized as @{bot_username}");

    context::init(bot_username);

    thread::spawn(UpdateHandler::start);
    thread::spawn(scheduler::start);

    http_server::start().await
}
