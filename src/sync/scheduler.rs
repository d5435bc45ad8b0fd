use crate::config::Config;
use crate::deliver::TelegramDispatcher;
use crate::sync::check_job::FeedCheckJob;
use std::thread;
use std::time::Duration;

/// Runs one delayed initial check, then sweeps all feeds on a fixed
/// cadence for the lifetime of the process. The short startup delay lets
/// the transport session settle before the first sweep.
pub fn start() {
    thread::sleep(Duration::from_secs(Config::initial_check_delay_in_seconds()));

    log::info!("Running the initial feed check");
    FeedCheckJob::new(&TelegramDispatcher).run_all(true);

    let interval = Duration::from_secs(Config::feed_check_interval_in_seconds());

    loop {
        thread::sleep(interval);

        FeedCheckJob::new(&TelegramDispatcher).run_all(false);
    }
}
