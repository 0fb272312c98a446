// src/telegram_notifier.rs
use crate::stats::SessionStats;
use crate::types::{Candle, Decision, IndicatorSnapshot, TradeOutcome, TradeResult};
use chrono::{DateTime, FixedOffset};
use log::{error, info, warn};
use reqwest::Client;
use serde_json::json;
use std::env;

pub struct TelegramNotifier {
    client: Client,
    bot_token: Option<String>,
    chat_id: Option<String>,
    enabled: bool,
}

impl TelegramNotifier {
    pub fn new() -> Self {
        let bot_token = env::var("TELEGRAM_BOT_TOKEN").ok();
        let chat_id = env::var("TELEGRAM_CHAT_ID").ok();

        let enabled = bot_token.is_some() && chat_id.is_some();

        if enabled {
            info!("📱 Telegram notifier initialized");
        } else {
            warn!("📱 Telegram notifier disabled - missing TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID");
        }

        Self {
            client: Client::new(),
            bot_token,
            chat_id,
            enabled,
        }
    }

    /// Posts one message to the channel. Never propagates transport errors:
    /// a failed send is logged and the message dropped.
    pub async fn send_message(&self, message: &str) -> bool {
        if !self.enabled {
            return true;
        }

        let (bot_token, chat_id) = match (&self.bot_token, &self.chat_id) {
            (Some(token), Some(chat)) => (token, chat),
            _ => return true,
        };

        let url = format!("https://api.telegram.org/bot{}/sendMessage", bot_token);

        let payload = json!({
            "chat_id": chat_id,
            "text": message,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true
        });

        match self.client.post(&url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                error!("📱 Failed to send Telegram message: {}", error_text);
                false
            }
            Err(e) => {
                error!("📱 Telegram transport error: {}", e);
                false
            }
        }
    }

    pub async fn send_startup(&self, now: DateTime<FixedOffset>) -> bool {
        let message = format!(
            "🎯 *SIGNAL BOT ONLINE*\n\
            \n\
            ⏰ *Cycle timing:*\n\
            • :00 → signal published\n\
            • +1 min → trade entry\n\
            • +1:35 → result published\n\
            \n\
            🕒 *Current Time:* `{}`\n\
            \n\
            ⚡ *Preparing first signal...*",
            now.format("%H:%M:%S (UTC%:z)")
        );
        self.send_message(&message).await
    }

    pub async fn send_trade_signal(
        &self,
        decision: &Decision,
        snapshot: &IndicatorSnapshot,
        signal_time: DateTime<FixedOffset>,
        entry_time: DateTime<FixedOffset>,
        result_time: DateTime<FixedOffset>,
    ) -> bool {
        let emoji = if decision.direction == crate::types::Direction::Buy {
            "🟢"
        } else {
            "🔴"
        };

        let message = format!(
            "{} *TRADE SIGNAL* {}\n\
            \n\
            📊 *Pair:* `{}`\n\
            📈 *Direction:* `{}`\n\
            💪 *Confidence:* `{}%`\n\
            🧮 *Method:* `{}`\n\
            \n\
            📉 *Indicators:*\n\
            • RSI: `{:.2}` ({})\n\
            • MACD: `{}`\n\
            • Trend: `{}`\n\
            \n\
            🕒 *Timing:*\n\
            • Signal: `{}`\n\
            • Entry: `{}` 🎯\n\
            • Result: `{}`\n\
            \n\
            ⚡ *Preparing trade entry...*",
            emoji,
            emoji,
            decision.pair,
            decision.direction,
            decision.confidence,
            decision.rationale,
            snapshot.rsi,
            snapshot.rsi_label(),
            snapshot.macd_label(),
            snapshot.trend,
            signal_time.format("%H:%M:%S"),
            entry_time.format("%H:%M:%S"),
            result_time.format("%H:%M:%S"),
        );
        let sent = self.send_message(&message).await;
        if sent {
            info!(
                "📱 Signal notification sent for {} {} ({}%)",
                decision.direction, decision.pair, decision.confidence
            );
        }
        sent
    }

    pub async fn send_skip_notice(&self, decision: &Decision, now: DateTime<FixedOffset>) -> bool {
        let message = format!(
            "⏭️ *SIGNAL SKIPPED*\n\
            \n\
            📊 *Pair:* `{}`\n\
            📈 *Leaning:* `{}`\n\
            📉 *Confidence:* `{}%`\n\
            \n\
            ❌ *Reason:* confidence below the configured floor\n\
            🕒 *Time:* `{}`\n\
            \n\
            ⚡ *Looking for a better setup...*",
            decision.pair,
            decision.direction,
            decision.confidence,
            now.format("%H:%M:%S"),
        );
        self.send_message(&message).await
    }

    pub async fn send_trade_result(
        &self,
        decision: &Decision,
        outcome: &TradeOutcome,
        candle: &Candle,
        stats: &SessionStats,
        now: DateTime<FixedOffset>,
    ) -> bool {
        let result_emoji = if outcome.result == TradeResult::Win {
            "🎉"
        } else {
            "❌"
        };

        let message = format!(
            "🎯 *TRADE RESULT* {}\n\
            \n\
            📊 *Pair:* `{}`\n\
            📈 *Direction:* `{}`\n\
            🏁 *Result:* `{} {}`\n\
            \n\
            💹 *Price Move:*\n\
            • Entry: `{:.5}`\n\
            • Close: `{:.5}`\n\
            • Change: `{:+.3}%`\n\
            \n\
            📊 *Session Stats:*\n\
            • Trades: `{}`\n\
            • Wins: `{}`\n\
            • Losses: `{}`\n\
            • Skipped: `{}`\n\
            • Win Rate: `{:.1}%`\n\
            \n\
            🕒 *Time:* `{}`\n\
            \n\
            ⚡ *Preparing next signal...*",
            result_emoji,
            decision.pair,
            decision.direction,
            outcome.result,
            result_emoji,
            outcome.entry_price,
            candle.close,
            outcome.percent_move,
            stats.total_trades,
            stats.wins,
            stats.losses,
            stats.skipped,
            stats.win_rate(),
            now.format("%H:%M:%S"),
        );
        let sent = self.send_message(&message).await;
        if sent {
            info!(
                "📱 Result notification sent for {} ({})",
                decision.pair, outcome.result
            );
        }
        sent
    }

    pub async fn send_hourly_report(&self, stats: &SessionStats, now: DateTime<FixedOffset>) -> bool {
        let best = stats
            .best_pair()
            .map(|(pair, r)| format!("`{}` ({}W/{}L)", pair, r.wins, r.losses))
            .unwrap_or_else(|| "`-`".to_string());
        let worst = stats
            .worst_pair()
            .map(|(pair, r)| format!("`{}` ({}W/{}L)", pair, r.wins, r.losses))
            .unwrap_or_else(|| "`-`".to_string());

        let message = format!(
            "📊 *HOURLY REPORT*\n\
            \n\
            • Trades: `{}` (analyzed `{}`, skipped `{}`)\n\
            • Wins/Losses: `{}/{}`\n\
            • Win Rate: `{:.1}%`\n\
            • Streak: `{}` (best `{}`, worst `-{}`)\n\
            • Best Pair: {}\n\
            • Worst Pair: {}\n\
            • Uptime: `{}h {}m`\n\
            \n\
            🕒 `{}`",
            stats.total_trades,
            stats.analyzed,
            stats.skipped,
            stats.wins,
            stats.losses,
            stats.win_rate(),
            stats.current_streak,
            stats.max_win_streak,
            stats.max_loss_streak,
            best,
            worst,
            stats.uptime().num_hours(),
            stats.uptime().num_minutes() % 60,
            now.format("%H:%M:%S"),
        );
        self.send_message(&message).await
    }

    pub async fn send_session_change(&self, label: &str, now: DateTime<FixedOffset>) -> bool {
        let message = format!(
            "🕰️ *MARKET SESSION CHANGE*\n\
            \n\
            📍 *Now Trading:* `{}`\n\
            🕒 *Time:* `{}`\n\
            \n\
            ⚡ *Volatility profile updated*",
            label,
            now.format("%H:%M:%S"),
        );
        self.send_message(&message).await
    }

    pub async fn send_test_message(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !self.enabled {
            return Err("Telegram notifier not enabled".into());
        }

        let message = "🤖 *Signal Bot Test*\n\nTelegram notifications are working correctly!\n\n✅ Ready to publish signals.";

        if self.send_message(message).await {
            info!("📱 Telegram test message sent successfully");
            Ok(())
        } else {
            Err("Failed to send test message".into())
        }
    }
}

impl Default for TelegramNotifier {
    fn default() -> Self {
        Self::new()
    }
}
