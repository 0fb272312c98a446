// tests/signal_pipeline_tests.rs - End-to-end pipeline checks over the
// synthetic generator, indicator engine, scorer and judge.
use chrono::Utc;
use signal_bot::decision_engine::{DecisionEngine, TieBreakPolicy};
use signal_bot::indicators;
use signal_bot::market_data::{price_band, SyntheticMarket};
use signal_bot::trade_judge::judge;
use signal_bot::types::{Direction, TradeResult};

const PAIRS: [&str; 4] = ["USD/BRL", "USD/TRY", "USD/MXN", "USD/PHP"];

#[test]
fn generated_candles_always_satisfy_judge_laws() {
    let mut market = SyntheticMarket::new();
    for _ in 0..100 {
        for pair in PAIRS {
            let candle = market.generate_candle(pair, Utc::now());

            let buy = judge(&candle, Direction::Buy, None).expect("well-formed candle");
            let sell = judge(&candle, Direction::Sell, None).expect("well-formed candle");

            assert_eq!(buy.result == TradeResult::Win, candle.close > candle.open);
            assert_eq!(sell.result == TradeResult::Win, candle.close < candle.open);
            if candle.close == candle.open {
                assert_eq!(buy.result, TradeResult::Loss);
                assert_eq!(sell.result, TradeResult::Loss);
            }
        }
    }
}

#[test]
fn full_cycle_produces_bounded_decisions() {
    let mut market = SyntheticMarket::new();
    let mut engine = DecisionEngine::new(TieBreakPolicy::Trend, 55, 3);

    for i in 0..50 {
        let pair = PAIRS[i % PAIRS.len()];
        let closes = market.recent_closes(pair, 30);
        assert_eq!(closes.len(), 30);

        let band = price_band(pair);
        assert!(closes.iter().all(|c| band.contains(*c)));

        let snapshot = indicators::compute_snapshot(&closes);
        assert!((0.0..=100.0).contains(&snapshot.rsi));
        assert!((0.0..=1.0).contains(&snapshot.bollinger_position));
        assert!(!snapshot.degraded);

        let decision = engine.score(pair, &snapshot);
        assert!((55..=95).contains(&decision.confidence));
        assert!(!decision.rationale.is_empty());
    }
}

#[test]
fn outcome_percent_move_matches_prices() {
    let mut market = SyntheticMarket::new();
    for _ in 0..50 {
        let candle = market.generate_candle("USD/CAD", Utc::now());
        let outcome = judge(&candle, Direction::Buy, None).expect("well-formed candle");
        let expected = (candle.close - candle.open) / candle.open * 100.0;
        assert!((outcome.percent_move - expected).abs() < 1e-9);
        assert_eq!(outcome.entry_price, candle.open);
        assert_eq!(outcome.close_price, candle.close);
    }
}
