// src/stats.rs - Process-lifetime session statistics
use crate::types::TradeResult;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PairRecord {
    pub wins: u32,
    pub losses: u32,
}

impl PairRecord {
    pub fn net(&self) -> i64 {
        self.wins as i64 - self.losses as i64
    }
}

/// Mutable aggregate owned by the scheduler. Updated exactly once per
/// completed cycle, reset on process restart, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub total_trades: u32,
    pub wins: u32,
    pub losses: u32,
    pub skipped: u32,
    pub analyzed: u32,
    /// Signed: positive = win streak, negative = loss streak.
    pub current_streak: i32,
    pub max_win_streak: u32,
    pub max_loss_streak: u32,
    pub per_pair: HashMap<String, PairRecord>,
    pub session_start: DateTime<Utc>,
    pub last_trade_time: Option<DateTime<Utc>>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            total_trades: 0,
            wins: 0,
            losses: 0,
            skipped: 0,
            analyzed: 0,
            current_streak: 0,
            max_win_streak: 0,
            max_loss_streak: 0,
            per_pair: HashMap::new(),
            session_start: Utc::now(),
            last_trade_time: None,
        }
    }

    pub fn record_analyzed(&mut self) {
        self.analyzed += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn record_outcome(&mut self, pair: &str, result: TradeResult, at: DateTime<Utc>) {
        self.total_trades += 1;
        self.last_trade_time = Some(at);
        let record = self.per_pair.entry(pair.to_string()).or_default();

        match result {
            TradeResult::Win => {
                self.wins += 1;
                record.wins += 1;
                self.current_streak = self.current_streak.max(0) + 1;
                self.max_win_streak = self.max_win_streak.max(self.current_streak as u32);
            }
            TradeResult::Loss => {
                self.losses += 1;
                record.losses += 1;
                self.current_streak = self.current_streak.min(0) - 1;
                self.max_loss_streak = self
                    .max_loss_streak
                    .max(self.current_streak.unsigned_abs());
            }
        }
    }

    /// Win percentage over completed trades; 0 before the first trade.
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.wins as f64 / self.total_trades as f64 * 100.0
    }

    pub fn net_score(&self) -> i64 {
        self.wins as i64 - self.losses as i64
    }

    pub fn best_pair(&self) -> Option<(&str, PairRecord)> {
        self.per_pair
            .iter()
            .max_by_key(|(_, r)| r.net())
            .map(|(pair, r)| (pair.as_str(), *r))
    }

    pub fn worst_pair(&self) -> Option<(&str, PairRecord)> {
        self.per_pair
            .iter()
            .min_by_key(|(_, r)| r.net())
            .map(|(pair, r)| (pair.as_str(), *r))
    }

    pub fn uptime(&self) -> Duration {
        Utc::now() - self.session_start
    }

    pub fn log_summary(&self) {
        info!(
            "📊 [STATS] trades={} wins={} losses={} skipped={} streak={} win_rate={:.1}%",
            self.total_trades,
            self.wins,
            self.losses,
            self.skipped,
            self.current_streak,
            self.win_rate()
        );
        match serde_json::to_string(self) {
            Ok(json) => debug!("📊 [STATS] snapshot: {}", json),
            Err(e) => debug!("📊 [STATS] snapshot serialization failed: {}", e),
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
