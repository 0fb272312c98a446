// src/config.rs - Environment-sourced bot configuration
use crate::decision_engine::TieBreakPolicy;
use crate::errors::BotError;
use log::info;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct BotConfig {
    // Which synthetic markets are eligible
    pub pairs: Vec<String>,

    // Signal filtering
    pub min_confidence: u8,
    pub confidence_floor: u8,

    // Cadence (seconds)
    pub signal_interval_secs: u64,
    pub entry_delay_secs: u64,
    pub result_delay_secs: u64,
    pub tick_secs: u64,

    // Scorer behaviour
    pub tie_break: TieBreakPolicy,
    pub max_direction_run: u32,

    // Process behaviour
    pub restart_backoff_secs: u64,
    pub heartbeat_secs: u64,

    // Display offset for message timestamps (the channel runs on UTC+3)
    pub utc_offset_hours: i32,
}

const DEFAULT_PAIRS: &str = "USD/BRL,USD/TRY,USD/MXN,USD/EGP,USD/COP,USD/PKR,USD/PHP,USD/CAD";

/// Parses `key` from the environment. Absent vars fall back to `default`;
/// a var that is present but unparseable is a startup error, not a silent
/// default.
fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, BotError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| BotError::ConfigError {
            key: key.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

impl BotConfig {
    pub fn from_env() -> Result<Self, BotError> {
        let raw_pairs = env::var("SIGNAL_PAIRS").unwrap_or_else(|_| DEFAULT_PAIRS.to_string());
        let pairs: Vec<String> = raw_pairs
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if pairs.is_empty() {
            return Err(BotError::ConfigError {
                key: "SIGNAL_PAIRS".to_string(),
                value: raw_pairs,
            });
        }

        Ok(Self {
            pairs,
            min_confidence: env_or("MIN_CONFIDENCE", 65u8)?.min(100),
            confidence_floor: env_or("CONFIDENCE_FLOOR", 55u8)?.min(95),
            signal_interval_secs: env_or("SIGNAL_INTERVAL_SECS", 60u64)?.max(10),
            entry_delay_secs: env_or("ENTRY_DELAY_SECS", 60u64)?,
            result_delay_secs: env_or("RESULT_DELAY_SECS", 35u64)?,
            tick_secs: env_or("TICK_SECS", 1u64)?.max(1),
            tie_break: env_or("TIE_BREAK", TieBreakPolicy::Trend)?,
            max_direction_run: env_or("MAX_DIRECTION_RUN", 3u32)?,
            restart_backoff_secs: env_or("RESTART_BACKOFF_SECS", 15u64)?,
            heartbeat_secs: env_or("HEARTBEAT_SECS", 30u64)?,
            utc_offset_hours: env_or("UTC_OFFSET_HOURS", 3i32)?.clamp(-12, 14),
        })
    }

    pub fn log_current_settings(&self) {
        info!("🔧 [CONFIG] Current bot settings:");
        info!("🔧 [CONFIG]   Pairs: {:?}", self.pairs);
        info!("🔧 [CONFIG]   Min Confidence: {}%", self.min_confidence);
        info!("🔧 [CONFIG]   Confidence Floor: {}%", self.confidence_floor);
        info!(
            "🔧 [CONFIG]   Cadence: signal every {}s, entry +{}s, result +{}s, tick {}s",
            self.signal_interval_secs, self.entry_delay_secs, self.result_delay_secs, self.tick_secs
        );
        info!(
            "🔧 [CONFIG]   Tie Break: {:?}, Max Direction Run: {}",
            self.tie_break, self.max_direction_run
        );
        info!(
            "🔧 [CONFIG]   Restart Backoff: {}s, Heartbeat: {}s, Display Offset: UTC{:+}",
            self.restart_backoff_secs, self.heartbeat_secs, self.utc_offset_hours
        );
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            pairs: DEFAULT_PAIRS.split(',').map(|s| s.to_string()).collect(),
            min_confidence: 65,
            confidence_floor: 55,
            signal_interval_secs: 60,
            entry_delay_secs: 60,
            result_delay_secs: 35,
            tick_secs: 1,
            tie_break: TieBreakPolicy::Trend,
            max_direction_run: 3,
            restart_backoff_secs: 15,
            heartbeat_secs: 30,
            utc_offset_hours: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable names: the environment is
    // process-global and tests run in parallel.

    #[test]
    fn test_env_or_parses_present_values() {
        env::set_var("SIGNAL_BOT_TEST_INTERVAL", "90");
        assert_eq!(env_or("SIGNAL_BOT_TEST_INTERVAL", 60u64).unwrap(), 90);
        env::remove_var("SIGNAL_BOT_TEST_INTERVAL");
    }

    #[test]
    fn test_env_or_defaults_when_absent() {
        env::remove_var("SIGNAL_BOT_TEST_ABSENT");
        assert_eq!(env_or("SIGNAL_BOT_TEST_ABSENT", 65u8).unwrap(), 65);
    }

    #[test]
    fn test_env_or_rejects_malformed_values() {
        env::set_var("SIGNAL_BOT_TEST_BAD", "not-a-number");
        let result = env_or("SIGNAL_BOT_TEST_BAD", 65u8);
        match result {
            Err(BotError::ConfigError { key, value }) => {
                assert_eq!(key, "SIGNAL_BOT_TEST_BAD");
                assert_eq!(value, "not-a-number");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
        env::remove_var("SIGNAL_BOT_TEST_BAD");
    }

    #[test]
    fn test_env_or_parses_tie_break_policy() {
        env::set_var("SIGNAL_BOT_TEST_TIE", "balanced");
        assert_eq!(
            env_or("SIGNAL_BOT_TEST_TIE", TieBreakPolicy::Trend).unwrap(),
            TieBreakPolicy::Balanced
        );
        env::remove_var("SIGNAL_BOT_TEST_TIE");
    }

    #[test]
    fn test_defaults_are_complete() {
        let config = BotConfig::default();
        assert!(!config.pairs.is_empty());
        assert_eq!(config.min_confidence, 65);
        assert_eq!(config.confidence_floor, 55);
        assert_eq!(config.tie_break, TieBreakPolicy::Trend);
    }
}
