// src/scheduler.rs - Signal -> entry -> result cadence on a polling tick
use crate::broker::BrokerSession;
use crate::config::BotConfig;
use crate::decision_engine::DecisionEngine;
use crate::errors::BotError;
use crate::indicators;
use crate::market_data::{session_label, SyntheticMarket};
use crate::stats::SessionStats;
use crate::telegram_notifier::TelegramNotifier;
use crate::trade_judge;
use crate::types::{Decision, IndicatorSnapshot};
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Timelike, Utc};
use log::{info, warn};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio::time::{interval, sleep, Duration};

/// Closes fed to the indicator engine each cycle.
const INDICATOR_WINDOW: usize = 30;

/// Single-slot holder for a signalled-but-not-yet-executed trade.
#[derive(Debug, Clone)]
pub struct PendingTrade {
    pub decision: Decision,
    pub snapshot: IndicatorSnapshot,
    pub signal_time: DateTime<FixedOffset>,
    pub entry_time: DateTime<FixedOffset>,
    pub result_time: DateTime<FixedOffset>,
}

/// Single-threaded cooperative polling loop. Re-checks the wall clock once
/// per tick and advances when a precomputed target instant has passed. At
/// most one trade is pending or in flight at any time.
pub struct Scheduler {
    config: BotConfig,
    offset: FixedOffset,
    notifier: Arc<TelegramNotifier>,
    market: SyntheticMarket,
    engine: DecisionEngine,
    broker: BrokerSession,
    pub stats: SessionStats,
    pending_trade: Option<PendingTrade>,
    trade_in_progress: bool,
    next_signal_time: Option<DateTime<FixedOffset>>,
    last_report_hour: Option<u32>,
    current_session: Option<&'static str>,
}

impl Scheduler {
    pub fn new(config: BotConfig, notifier: Arc<TelegramNotifier>) -> Self {
        let offset = FixedOffset::east_opt(config.utc_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
        let engine = DecisionEngine::new(
            config.tie_break,
            config.confidence_floor,
            config.max_direction_run,
        );
        Self {
            offset,
            engine,
            notifier,
            market: SyntheticMarket::new(),
            broker: BrokerSession::new(),
            stats: SessionStats::new(),
            pending_trade: None,
            trade_in_progress: false,
            next_signal_time: None,
            last_report_hour: None,
            current_session: None,
            config,
        }
    }

    fn now_local(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Next signal instant: the minute boundary plus the configured
    /// interval, so signals land on the :00 second.
    pub fn next_signal_after(
        now: DateTime<FixedOffset>,
        interval_secs: u64,
    ) -> DateTime<FixedOffset> {
        let floored = now
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        floored + ChronoDuration::seconds(interval_secs as i64)
    }

    /// Stages a pending trade. A no-op returning false while the slot is
    /// occupied or a trade is executing.
    pub fn try_stage(&mut self, pending: PendingTrade) -> bool {
        if self.pending_trade.is_some() || self.trade_in_progress {
            warn!(
                "⏸️ [SCHEDULER] Pending slot occupied, ignoring new {} signal",
                pending.decision.pair
            );
            return false;
        }
        self.pending_trade = Some(pending);
        true
    }

    pub fn has_pending(&self) -> bool {
        self.pending_trade.is_some()
    }

    /// Drives the cadence until an error escapes a cycle. The caller owns
    /// the restart-with-backoff policy.
    pub async fn run(&mut self) -> Result<(), BotError> {
        info!("🚀 [SCHEDULER] Precision scheduler starting...");
        let now = self.now_local();
        self.notifier.send_startup(now).await;
        self.current_session = Some(session_label(now.hour()));
        self.last_report_hour = Some(now.hour());
        self.next_signal_time = Some(Self::next_signal_after(now, self.config.signal_interval_secs));
        info!(
            "⏰ [SCHEDULER] First signal at {}",
            self.next_signal_time
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_default()
        );

        let mut ticker = interval(Duration::from_secs(self.config.tick_secs));
        loop {
            ticker.tick().await;
            let now = self.now_local();

            self.housekeeping(now).await;

            let signal_due = self
                .next_signal_time
                .map_or(false, |target| now >= target);
            if signal_due && !self.trade_in_progress && self.pending_trade.is_none() {
                info!("⏰ [SCHEDULER] Signal cycle at {}", now.format("%H:%M:%S"));
                self.signal_cycle(now).await?;
                self.next_signal_time =
                    Some(Self::next_signal_after(now, self.config.signal_interval_secs));
            }

            let entry_due = self
                .pending_trade
                .as_ref()
                .map_or(false, |pending| now >= pending.entry_time);
            if entry_due && !self.trade_in_progress {
                info!("🎯 [SCHEDULER] Trade cycle at {}", now.format("%H:%M:%S"));
                self.trade_cycle().await?;
            }
        }
    }

    /// One signal cycle: synthesize a window, score it, then either publish
    /// the signal and stage the trade, or publish a skip notice.
    async fn signal_cycle(&mut self, now: DateTime<FixedOffset>) -> Result<(), BotError> {
        let pair = self
            .config
            .pairs
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| BotError::Fatal("no tradable pairs configured".to_string()))?;

        let closes = self.market.recent_closes(&pair, INDICATOR_WINDOW);
        let snapshot = indicators::compute_snapshot(&closes);
        let decision = self.engine.score(&pair, &snapshot);
        self.stats.record_analyzed();

        if decision.confidence < self.config.min_confidence {
            info!(
                "⏭️ [SCHEDULER] Skipping {} - low confidence {}%",
                decision.pair, decision.confidence
            );
            self.notifier.send_skip_notice(&decision, now).await;
            self.stats.record_skip();
            return Ok(());
        }

        let entry_time = now + ChronoDuration::seconds(self.config.entry_delay_secs as i64);
        let result_time = entry_time + ChronoDuration::seconds(self.config.result_delay_secs as i64);

        self.notifier
            .send_trade_signal(&decision, &snapshot, now, entry_time, result_time)
            .await;

        self.try_stage(PendingTrade {
            decision,
            snapshot,
            signal_time: now,
            entry_time,
            result_time,
        });
        Ok(())
    }

    /// One execution cycle: simulated order, wait for the candle close,
    /// judge, update stats exactly once, publish the result. The pending
    /// slot and in-flight flag are cleared on every path.
    async fn trade_cycle(&mut self) -> Result<(), BotError> {
        let pending = match self.pending_trade.clone() {
            Some(pending) => pending,
            None => return Ok(()),
        };
        self.trade_in_progress = true;

        let outcome = async {
            let decision = &pending.decision;
            self.broker
                .execute_trade(&decision.pair, decision.direction, self.config.result_delay_secs)
                .await;

            let now = self.now_local();
            let wait_secs = (pending.result_time - now).num_seconds().max(0) as u64;
            if wait_secs > 0 {
                info!("⏳ [SCHEDULER] Waiting {}s for candle close...", wait_secs);
                sleep(Duration::from_secs(wait_secs)).await;
            }

            let candle = self.market.generate_candle(&decision.pair, Utc::now());
            let outcome = trade_judge::judge(&candle, decision.direction, Some(candle.open))?;

            let now = self.now_local();
            self.stats
                .record_outcome(&decision.pair, outcome.result, Utc::now());
            self.notifier
                .send_trade_result(decision, &outcome, &candle, &self.stats, now)
                .await;
            info!(
                "🎯 [SCHEDULER] Trade complete: {} {} -> {}",
                decision.pair, decision.direction, outcome.result
            );
            self.stats.log_summary();
            Ok(())
        }
        .await;

        self.trade_in_progress = false;
        self.pending_trade = None;
        outcome
    }

    /// Hourly report and trading-session label changes, interleaved on the
    /// same tick without their own task.
    async fn housekeeping(&mut self, now: DateTime<FixedOffset>) {
        let hour = now.hour();

        if self.last_report_hour != Some(hour) {
            self.last_report_hour = Some(hour);
            info!("🕐 [SCHEDULER] Hourly report for {:02}:00", hour);
            self.notifier.send_hourly_report(&self.stats, now).await;
        }

        let session = session_label(hour);
        if self.current_session != Some(session) {
            self.current_session = Some(session);
            info!("🕰️ [SCHEDULER] Session change -> {}", session);
            self.notifier.send_session_change(session, now).await;
        }

        self.broker.keep_alive();
    }
}
