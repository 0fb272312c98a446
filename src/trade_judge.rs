// src/trade_judge.rs - Pure WIN/LOSS determination from a closed candle
use crate::errors::BotError;
use crate::types::{Candle, Direction, TradeOutcome, TradeResult};

/// Judges a claimed direction against the candle's close.
///
/// BUY wins iff `close > entry`; SELL wins iff `close < entry`; an unmoved
/// price is a LOSS for both directions (strict inequality only). The inputs
/// are always synthetically well-formed in a correct system, so a malformed
/// candle here is a loud error, never a guess.
pub fn judge(
    candle: &Candle,
    direction: Direction,
    entry_price: Option<f64>,
) -> Result<TradeOutcome, BotError> {
    if !candle.is_well_formed() {
        return Err(BotError::Judge(format!(
            "malformed candle for {}: o={} h={} l={} c={}",
            candle.pair, candle.open, candle.high, candle.low, candle.close
        )));
    }

    let entry = entry_price.unwrap_or(candle.open);
    if !entry.is_finite() || entry <= 0.0 {
        return Err(BotError::Judge(format!(
            "invalid entry price {} for {}",
            entry, candle.pair
        )));
    }

    let result = match direction {
        Direction::Buy if candle.close > entry => TradeResult::Win,
        Direction::Sell if candle.close < entry => TradeResult::Win,
        _ => TradeResult::Loss,
    };

    Ok(TradeOutcome {
        result,
        entry_price: entry,
        close_price: candle.close,
        percent_move: (candle.close - entry) / entry * 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candle(open: f64, close: f64) -> Candle {
        Candle {
            pair: "USD/BRL".to_string(),
            open,
            high: open.max(close) + 0.01,
            low: open.min(close) - 0.01,
            close,
            timestamp: Utc::now(),
            synthetic: true,
        }
    }

    #[test]
    fn test_buy_wins_only_above_entry() {
        let up = candle(5.20, 5.21);
        let outcome = judge(&up, Direction::Buy, None).unwrap();
        assert_eq!(outcome.result, TradeResult::Win);
        assert!(outcome.percent_move > 0.0);

        let down = candle(5.20, 5.19);
        let outcome = judge(&down, Direction::Buy, None).unwrap();
        assert_eq!(outcome.result, TradeResult::Loss);
    }

    #[test]
    fn test_sell_wins_only_below_entry() {
        let down = candle(5.20, 5.19);
        let outcome = judge(&down, Direction::Sell, None).unwrap();
        assert_eq!(outcome.result, TradeResult::Win);

        let up = candle(5.20, 5.21);
        let outcome = judge(&up, Direction::Sell, None).unwrap();
        assert_eq!(outcome.result, TradeResult::Loss);
    }

    #[test]
    fn test_unmoved_close_loses_both_ways() {
        let flat = candle(5.20, 5.20);
        assert_eq!(
            judge(&flat, Direction::Buy, None).unwrap().result,
            TradeResult::Loss
        );
        assert_eq!(
            judge(&flat, Direction::Sell, None).unwrap().result,
            TradeResult::Loss
        );
    }

    #[test]
    fn test_explicit_entry_price_overrides_open() {
        let c = candle(5.20, 5.25);
        let outcome = judge(&c, Direction::Sell, Some(5.30)).unwrap();
        assert_eq!(outcome.result, TradeResult::Win);
        assert_eq!(outcome.entry_price, 5.30);
    }

    #[test]
    fn test_malformed_candle_is_rejected() {
        let mut bad = candle(5.20, 5.21);
        bad.high = bad.low - 1.0;
        assert!(judge(&bad, Direction::Buy, None).is_err());

        let mut nan = candle(5.20, 5.21);
        nan.close = f64::NAN;
        assert!(judge(&nan, Direction::Buy, None).is_err());

        let ok = candle(5.20, 5.21);
        assert!(judge(&ok, Direction::Buy, Some(f64::INFINITY)).is_err());
    }
}
