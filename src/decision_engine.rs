// src/decision_engine.rs - Weighted point tally over indicator readings
use crate::types::{Decision, Direction, IndicatorSnapshot};
use log::{debug, info};
use rand::Rng;
use std::collections::VecDeque;
use std::str::FromStr;

/// MACD histogram deadband; readings inside it score for neither side.
const MACD_DEADBAND: f64 = 0.0005;

/// Decisive buy/sell ratio. Past it the winning side names the direction.
const DECISIVE_RATIO: f64 = 0.6;

const MAX_CONFIDENCE: u8 = 95;

/// Confidence attached to a tie-break decision.
const TIE_BREAK_CONFIDENCE: u8 = 60;

/// How many past decisions the engine remembers for run balancing and the
/// balanced tie-break.
const RECENT_WINDOW: usize = 10;

/// What happens when neither side reaches the decisive ratio. One policy,
/// chosen by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreakPolicy {
    /// Follow the trend classification (default).
    Trend,
    /// Uniform coin flip.
    Random,
    /// Pick the direction least represented in recent decisions.
    Balanced,
}

impl FromStr for TieBreakPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trend" => Ok(TieBreakPolicy::Trend),
            "random" => Ok(TieBreakPolicy::Random),
            "balanced" => Ok(TieBreakPolicy::Balanced),
            other => Err(format!("unknown tie-break policy: {}", other)),
        }
    }
}

/// Converts indicator snapshots into BUY/SELL decisions with a confidence
/// percentage. Owns the short decision memory used for run balancing; the
/// scoring itself is a fixed-weight rubric.
pub struct DecisionEngine {
    tie_break: TieBreakPolicy,
    confidence_floor: u8,
    max_direction_run: u32,
    recent: VecDeque<Direction>,
}

impl DecisionEngine {
    pub fn new(tie_break: TieBreakPolicy, confidence_floor: u8, max_direction_run: u32) -> Self {
        Self {
            tie_break,
            confidence_floor,
            max_direction_run,
            recent: VecDeque::with_capacity(RECENT_WINDOW),
        }
    }

    /// Scores one snapshot. Point weights: RSI 3, MACD 2, Bollinger 2,
    /// trend 3, matching the heuristic this bot has always shipped with.
    pub fn score(&mut self, pair: &str, snapshot: &IndicatorSnapshot) -> Decision {
        let mut buy_points: u32 = 0;
        let mut sell_points: u32 = 0;

        // RSI (3 points)
        if snapshot.rsi < 35.0 {
            buy_points += 3;
        } else if snapshot.rsi > 65.0 {
            sell_points += 3;
        } else if (40.0..=60.0).contains(&snapshot.rsi) {
            buy_points += 1;
            sell_points += 1;
        }

        // MACD histogram (2 points)
        if snapshot.macd_histogram > MACD_DEADBAND {
            buy_points += 2;
        } else if snapshot.macd_histogram < -MACD_DEADBAND {
            sell_points += 2;
        }

        // Bollinger position (2 points)
        if snapshot.bollinger_position < 0.2 {
            buy_points += 2;
        } else if snapshot.bollinger_position > 0.8 {
            sell_points += 2;
        }

        // Trend (3 points)
        if snapshot.trend.is_up() {
            buy_points += 3;
        } else if snapshot.trend.is_down() {
            sell_points += 3;
        }

        let total = buy_points + sell_points;
        let (mut direction, mut confidence, mut rationale) = if total == 0 {
            let direction = random_direction();
            (direction, 50, "MARKET_NEUTRAL".to_string())
        } else {
            let buy_ratio = buy_points as f64 / total as f64;
            let sell_ratio = sell_points as f64 / total as f64;
            if buy_ratio > DECISIVE_RATIO {
                (
                    Direction::Buy,
                    ratio_confidence(buy_ratio),
                    "STRONG_BULLISH_SIGNALS".to_string(),
                )
            } else if sell_ratio > DECISIVE_RATIO {
                (
                    Direction::Sell,
                    ratio_confidence(sell_ratio),
                    "STRONG_BEARISH_SIGNALS".to_string(),
                )
            } else {
                self.break_tie(snapshot)
            }
        };

        // Run balancing: after N identical directions in a row the next
        // decision is forced the other way at floor confidence.
        if self.direction_run_exhausted(direction) {
            info!(
                "⚖️ [SCORER] {} direction run hit {} for {}, forcing {}",
                direction,
                self.max_direction_run,
                pair,
                direction.opposite()
            );
            direction = direction.opposite();
            confidence = self.confidence_floor;
            rationale = "RUN_BALANCED".to_string();
        }

        confidence = confidence.clamp(self.confidence_floor, MAX_CONFIDENCE);
        self.remember(direction);

        debug!(
            "🧮 [SCORER] {} points buy={} sell={} -> {} {}% ({})",
            pair, buy_points, sell_points, direction, confidence, rationale
        );

        Decision {
            pair: pair.to_string(),
            direction,
            confidence,
            rationale,
            buy_points,
            sell_points,
        }
    }

    fn break_tie(&self, snapshot: &IndicatorSnapshot) -> (Direction, u8, String) {
        match self.tie_break {
            TieBreakPolicy::Trend => {
                let direction = if snapshot.trend.is_up() {
                    Direction::Buy
                } else {
                    Direction::Sell
                };
                (direction, TIE_BREAK_CONFIDENCE, "TREND_FOLLOWING".to_string())
            }
            TieBreakPolicy::Random => (
                random_direction(),
                TIE_BREAK_CONFIDENCE,
                "MARKET_NEUTRAL".to_string(),
            ),
            TieBreakPolicy::Balanced => {
                let buys = self.recent.iter().filter(|d| **d == Direction::Buy).count();
                let sells = self.recent.len() - buys;
                let direction = if buys < sells {
                    Direction::Buy
                } else if sells < buys {
                    Direction::Sell
                } else {
                    random_direction()
                };
                (direction, TIE_BREAK_CONFIDENCE, "BALANCED".to_string())
            }
        }
    }

    fn direction_run_exhausted(&self, direction: Direction) -> bool {
        let run = self.max_direction_run as usize;
        if run == 0 || self.recent.len() < run {
            return false;
        }
        self.recent.iter().rev().take(run).all(|d| *d == direction)
    }

    fn remember(&mut self, direction: Direction) {
        self.recent.push_back(direction);
        while self.recent.len() > RECENT_WINDOW {
            self.recent.pop_front();
        }
    }
}

/// Confidence for a decisive ratio r: 60 + (r - 0.6) * 100, capped at 95.
fn ratio_confidence(ratio: f64) -> u8 {
    let raw = 60.0 + (ratio - DECISIVE_RATIO) * 100.0;
    (raw.round() as u8).min(MAX_CONFIDENCE)
}

fn random_direction() -> Direction {
    if rand::thread_rng().gen_bool(0.5) {
        Direction::Buy
    } else {
        Direction::Sell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrendClass;

    fn bullish_snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: 28.0,
            macd_histogram: 0.002,
            bollinger_position: 0.1,
            trend: TrendClass::StrongUp,
            degraded: false,
        }
    }

    fn bearish_snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: 72.0,
            macd_histogram: -0.002,
            bollinger_position: 0.9,
            trend: TrendClass::StrongDown,
            degraded: false,
        }
    }

    fn neutral_snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: 50.0,
            macd_histogram: 0.0,
            bollinger_position: 0.5,
            trend: TrendClass::Sideways,
            degraded: false,
        }
    }

    fn engine() -> DecisionEngine {
        DecisionEngine::new(TieBreakPolicy::Trend, 55, 0)
    }

    #[test]
    fn test_unanimous_bullish_signals() {
        let decision = engine().score("USD/BRL", &bullish_snapshot());
        assert_eq!(decision.direction, Direction::Buy);
        assert_eq!(decision.buy_points, 10);
        assert_eq!(decision.sell_points, 0);
        assert_eq!(decision.confidence, 95);
        assert_eq!(decision.rationale, "STRONG_BULLISH_SIGNALS");
    }

    #[test]
    fn test_unanimous_bearish_signals() {
        let decision = engine().score("USD/TRY", &bearish_snapshot());
        assert_eq!(decision.direction, Direction::Sell);
        assert_eq!(decision.sell_points, 10);
        assert_eq!(decision.rationale, "STRONG_BEARISH_SIGNALS");
    }

    #[test]
    fn test_confidence_stays_in_bounds() {
        let mut engine = DecisionEngine::new(TieBreakPolicy::Random, 55, 0);
        for snapshot in [bullish_snapshot(), bearish_snapshot(), neutral_snapshot()] {
            let decision = engine.score("USD/MXN", &snapshot);
            assert!(decision.confidence >= 55);
            assert!(decision.confidence <= 95);
        }
    }

    #[test]
    fn test_tie_break_confidence_is_sixty() {
        let mut engine = DecisionEngine::new(TieBreakPolicy::Trend, 55, 0);
        let decision = engine.score("USD/BRL", &neutral_snapshot());
        assert_eq!(decision.rationale, "TREND_FOLLOWING");
        assert_eq!(decision.confidence, 60);
    }

    #[test]
    fn test_neutral_snapshot_falls_to_tie_break() {
        // rsi 50 scores 1/1, nothing else fires: ratio 0.5 on both sides.
        let decision = engine().score("USD/PHP", &neutral_snapshot());
        assert_eq!(decision.buy_points, 1);
        assert_eq!(decision.sell_points, 1);
        assert_eq!(decision.rationale, "TREND_FOLLOWING");
        // Sideways trend resolves to SELL under trend following.
        assert_eq!(decision.direction, Direction::Sell);
    }

    #[test]
    fn test_mixed_signals_follow_trend() {
        // Overbought RSI and stretched band vs bullish MACD and trend:
        // 5 points each way, trend tie-break picks BUY at 60%.
        let snapshot = IndicatorSnapshot {
            rsi: 80.0,
            macd_histogram: 0.002,
            bollinger_position: 0.9,
            trend: TrendClass::StrongUp,
            degraded: false,
        };
        let decision = engine().score("USD/CAD", &snapshot);
        assert_eq!(decision.buy_points, 5);
        assert_eq!(decision.sell_points, 5);
        assert_eq!(decision.direction, Direction::Buy);
        assert!(decision.confidence >= 60);
    }

    #[test]
    fn test_run_balancing_forces_fourth_flip() {
        let mut engine = DecisionEngine::new(TieBreakPolicy::Trend, 55, 3);
        for _ in 0..3 {
            let decision = engine.score("USD/BRL", &bullish_snapshot());
            assert_eq!(decision.direction, Direction::Buy);
        }
        let fourth = engine.score("USD/BRL", &bullish_snapshot());
        assert_eq!(fourth.direction, Direction::Sell);
        assert_eq!(fourth.confidence, 55);
        assert_eq!(fourth.rationale, "RUN_BALANCED");
    }

    #[test]
    fn test_run_balancing_disabled() {
        let mut engine = DecisionEngine::new(TieBreakPolicy::Trend, 55, 0);
        for _ in 0..6 {
            let decision = engine.score("USD/BRL", &bullish_snapshot());
            assert_eq!(decision.direction, Direction::Buy);
        }
    }

    #[test]
    fn test_balanced_tie_break_prefers_minority() {
        let mut engine = DecisionEngine::new(TieBreakPolicy::Balanced, 55, 0);
        // Seed decision memory with two buys.
        engine.score("USD/BRL", &bullish_snapshot());
        engine.score("USD/BRL", &bullish_snapshot());
        let decision = engine.score("USD/BRL", &neutral_snapshot());
        assert_eq!(decision.direction, Direction::Sell);
        assert_eq!(decision.rationale, "BALANCED");
    }

    #[test]
    fn test_tie_break_policy_parsing() {
        assert_eq!("trend".parse::<TieBreakPolicy>(), Ok(TieBreakPolicy::Trend));
        assert_eq!(
            "Balanced".parse::<TieBreakPolicy>(),
            Ok(TieBreakPolicy::Balanced)
        );
        assert!("coinflip".parse::<TieBreakPolicy>().is_err());
    }
}
