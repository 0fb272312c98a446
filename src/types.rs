// src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One synthetic OHLC sample for a single decision cycle.
///
/// Invariant: `low <= min(open, close)` and `max(open, close) <= high`.
/// `synthetic` is false only for the simplified fallback candle emitted when
/// data generation degrades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub pair: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub timestamp: DateTime<Utc>,
    pub synthetic: bool,
}

impl Candle {
    pub fn is_well_formed(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite() && *p > 0.0)
            && self.low <= self.open.min(self.close)
            && self.open.max(self.close) <= self.high
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendClass {
    StrongUp,
    Up,
    Sideways,
    Down,
    StrongDown,
}

impl TrendClass {
    pub fn is_up(&self) -> bool {
        matches!(self, TrendClass::StrongUp | TrendClass::Up)
    }

    pub fn is_down(&self) -> bool {
        matches!(self, TrendClass::StrongDown | TrendClass::Down)
    }
}

impl fmt::Display for TrendClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendClass::StrongUp => "STRONG_UPTREND",
            TrendClass::Up => "UPTREND",
            TrendClass::Sideways => "SIDEWAYS",
            TrendClass::Down => "DOWNTREND",
            TrendClass::StrongDown => "STRONG_DOWNTREND",
        };
        write!(f, "{}", label)
    }
}

/// Indicator readings over one rolling window of closes. Recomputed each
/// cycle, no lifecycle of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// 0-100
    pub rsi: f64,
    pub macd_histogram: f64,
    /// 0-1, position of the last close inside the Bollinger band
    pub bollinger_position: f64,
    pub trend: TrendClass,
    /// True when the window was too short and the snapshot was synthesized.
    pub degraded: bool,
}

impl IndicatorSnapshot {
    pub fn rsi_label(&self) -> &'static str {
        if self.rsi < 30.0 {
            "OVERSOLD"
        } else if self.rsi > 70.0 {
            "OVERBOUGHT"
        } else {
            "NEUTRAL"
        }
    }

    pub fn macd_label(&self) -> &'static str {
        if self.macd_histogram > 0.0 {
            "BULLISH"
        } else {
            "BEARISH"
        }
    }
}

/// Output of the decision scorer, consumed by the notifier and the judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub pair: String,
    pub direction: Direction,
    /// 0-100, heuristic score, not a calibrated probability
    pub confidence: u8,
    /// Which heuristic path fired, e.g. STRONG_BULLISH_SIGNALS
    pub rationale: String,
    pub buy_points: u32,
    pub sell_points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeResult {
    Win,
    Loss,
}

impl fmt::Display for TradeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeResult::Win => write!(f, "WIN"),
            TradeResult::Loss => write!(f, "LOSS"),
        }
    }
}

/// Pure function output of the trade judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub result: TradeResult,
    pub entry_price: f64,
    pub close_price: f64,
    pub percent_move: f64,
}
