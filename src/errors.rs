// src/errors.rs
use thiserror::Error;

/// Error taxonomy for the signal loop.
///
/// `Degraded` marks a safe-default substitution (callers log it and carry on
/// with a fallback value), while `Judge` and `Fatal` abort the current cycle
/// and bounce the whole scheduler through its restart backoff. `ConfigError`
/// only occurs at startup, for values that are present but unparseable.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Invalid configuration value for {key}: {value}")]
    ConfigError { key: String, value: String },

    #[error("Data generation degraded: {0}")]
    Degraded(String),

    #[error("Trade judge precondition violated: {0}")]
    Judge(String),

    #[error("Scheduler fatal error: {0}")]
    Fatal(String),
}

impl BotError {
    /// True when the loop may substitute a fallback value and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BotError::Degraded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_degraded_is_recoverable() {
        assert!(BotError::Degraded("short window".to_string()).is_recoverable());
        assert!(!BotError::Judge("nan close".to_string()).is_recoverable());
        assert!(!BotError::Fatal("no pairs".to_string()).is_recoverable());
        assert!(!BotError::ConfigError {
            key: "MIN_CONFIDENCE".to_string(),
            value: "lots".to_string(),
        }
        .is_recoverable());
    }
}
