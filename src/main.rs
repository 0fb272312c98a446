// src/main.rs
use dotenv::dotenv;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

use signal_bot::config::BotConfig;
use signal_bot::scheduler::Scheduler;
use signal_bot::telegram_notifier::TelegramNotifier;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("signal_bot=debug,info"));

    info!("⏳ Initializing signal bot...");

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Invalid configuration: {}", e);
            return;
        }
    };
    config.log_current_settings();

    let notifier = Arc::new(TelegramNotifier::new());
    match notifier.send_test_message().await {
        Ok(()) => info!("✅ Telegram connection verified"),
        Err(e) => info!("📱 Telegram test skipped: {}", e),
    }

    // Advisory heartbeat: read-only, never touches scheduling state.
    let heartbeat_secs = config.heartbeat_secs;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(heartbeat_secs.max(1)));
        loop {
            ticker.tick().await;
            info!("🔄 Signal bot alive and scheduling normally...");
        }
    });

    info!("🚀 Starting precision scheduler...");

    // Crash-and-resume-from-zero: anything that escapes the loop body is
    // logged, we back off, and the scheduler restarts with fresh state.
    loop {
        let mut scheduler = Scheduler::new(config.clone(), Arc::clone(&notifier));
        if let Err(e) = scheduler.run().await {
            error!("❌ Scheduler loop failed: {}", e);
            info!(
                "🔄 Restarting scheduler in {}s (pending state discarded)...",
                config.restart_backoff_secs
            );
            tokio::time::sleep(Duration::from_secs(config.restart_backoff_secs)).await;
        }
    }
}
