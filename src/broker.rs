// src/broker.rs - No-op broker session stub
use crate::types::Direction;
use chrono::Utc;
use log::info;
use std::time::Duration;

/// Stand-in for a real broker session. There is no venue behind this bot;
/// the stub keeps the scheduler's execute path shaped like a real one.
pub struct BrokerSession {
    last_activity: chrono::DateTime<Utc>,
}

impl BrokerSession {
    pub fn new() -> Self {
        info!("🎯 [BROKER] Candle-analysis mode, no live session required");
        Self {
            last_activity: Utc::now(),
        }
    }

    /// "Executes" a trade. Always succeeds after a token pause; the outcome
    /// is judged later from the synthetic candle.
    pub async fn execute_trade(&mut self, pair: &str, direction: Direction, duration_secs: u64) -> bool {
        info!(
            "📊 [BROKER] Simulated order: {} {} for {}s (no live execution)",
            pair, direction, duration_secs
        );
        tokio::time::sleep(Duration::from_millis(200)).await;
        self.last_activity = Utc::now();
        true
    }

    pub fn keep_alive(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn last_activity(&self) -> chrono::DateTime<Utc> {
        self.last_activity
    }
}

impl Default for BrokerSession {
    fn default() -> Self {
        Self::new()
    }
}
