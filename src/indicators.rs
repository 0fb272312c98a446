// src/indicators.rs - RSI / MACD / Bollinger / trend over a close window
use crate::types::{IndicatorSnapshot, TrendClass};
use log::debug;
use rand::Rng;

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD_DEV: f64 = 2.0;

/// Minimum closes for a real snapshot; below this the engine degrades to a
/// randomized neutral snapshot instead of erroring.
pub const MIN_WINDOW: usize = 15;

#[derive(Debug, Clone, Copy, Default)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Classic 14-period RSI over simple rolling means of gains and losses.
/// Returns 50 when undefined, 100 when there are gains but no losses.
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period + 1 {
        return 50.0;
    }

    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let recent = &deltas[deltas.len() - period..];
    let avg_gain: f64 = recent.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
    let avg_loss: f64 = recent.iter().filter(|d| **d < 0.0).map(|d| -d).sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        if avg_gain > 0.0 {
            return 100.0;
        }
        return 50.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Exponential moving average series with alpha = 2 / (span + 1), seeded
/// from the first value.
fn ema_series(prices: &[f64], span: usize) -> Vec<f64> {
    if prices.is_empty() {
        return Vec::new();
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(prices.len());
    let mut ema = prices[0];
    out.push(ema);
    for price in &prices[1..] {
        ema = alpha * price + (1.0 - alpha) * ema;
        out.push(ema);
    }
    out
}

/// 12/26 EMA difference with a 9-period signal line. Zeroed when the window
/// is shorter than the slow span.
pub fn macd(prices: &[f64]) -> Macd {
    if prices.len() < MACD_SLOW {
        return Macd::default();
    }
    let fast = ema_series(prices, MACD_FAST);
    let slow = ema_series(prices, MACD_SLOW);
    let macd_line: Vec<f64> = fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect();
    let signal_line = ema_series(&macd_line, MACD_SIGNAL);

    let macd = *macd_line.last().unwrap_or(&0.0);
    let signal = *signal_line.last().unwrap_or(&0.0);
    Macd {
        macd,
        signal,
        histogram: macd - signal,
    }
}

/// 20-period SMA band at +/- 2 sample standard deviations.
pub fn bollinger_bands(prices: &[f64], period: usize, std_dev: f64) -> Option<BollingerBands> {
    if period < 2 || prices.len() < period {
        return None;
    }
    let window = &prices[prices.len() - period..];
    let sma = window.iter().sum::<f64>() / period as f64;
    let variance =
        window.iter().map(|p| (p - sma).powi(2)).sum::<f64>() / (period as f64 - 1.0);
    let sd = variance.sqrt();
    Some(BollingerBands {
        upper: sma + std_dev * sd,
        middle: sma,
        lower: sma - std_dev * sd,
    })
}

/// Position of `price` inside the band, clamped to [0, 1]. 0.5 when the band
/// has zero width or is unavailable.
pub fn bollinger_position(prices: &[f64]) -> f64 {
    let price = match prices.last() {
        Some(p) => *p,
        None => return 0.5,
    };
    match bollinger_bands(prices, BOLLINGER_PERIOD, BOLLINGER_STD_DEV) {
        Some(bands) if bands.upper > bands.lower => {
            ((price - bands.lower) / (bands.upper - bands.lower)).clamp(0.0, 1.0)
        }
        _ => 0.5,
    }
}

/// Least-squares slope and correlation-scaled signed strength of a window.
fn trend_strength(prices: &[f64]) -> (f64, f64) {
    let n = prices.len();
    if n < 2 {
        return (0.0, 0.0);
    }
    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let mean_y = prices.iter().sum::<f64>() / nf;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (i, y) in prices.iter().enumerate() {
        let dx = i as f64 - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return (0.0, 0.0);
    }
    let slope = sxy / sxx;
    let correlation = sxy / (sxx.sqrt() * syy.sqrt());
    (slope, correlation * slope * 1000.0)
}

/// Classifies the last 5 vs last 10 closes. Strong classes need both signed
/// strength scores past the 0.7/0.6 thresholds; plain up/down needs slope
/// sign agreement.
pub fn classify_trend(prices: &[f64]) -> TrendClass {
    if prices.len() < 10 {
        return TrendClass::Sideways;
    }
    let (short_slope, short_strength) = trend_strength(&prices[prices.len() - 5..]);
    let (long_slope, long_strength) = trend_strength(&prices[prices.len() - 10..]);

    if short_strength > 0.7 && long_strength > 0.6 {
        TrendClass::StrongUp
    } else if short_strength < -0.7 && long_strength < -0.6 {
        TrendClass::StrongDown
    } else if short_slope > 0.0 && long_slope > 0.0 {
        TrendClass::Up
    } else if short_slope < 0.0 && long_slope < 0.0 {
        TrendClass::Down
    } else {
        TrendClass::Sideways
    }
}

/// Full snapshot over an ordered close window. With fewer than `MIN_WINDOW`
/// closes this degrades to a randomized neutral snapshot; that path is the
/// documented short-history mode, not an error.
pub fn compute_snapshot(closes: &[f64]) -> IndicatorSnapshot {
    if closes.len() < MIN_WINDOW {
        debug!(
            "📐 [INDICATORS] Short window ({} closes), emitting degraded snapshot",
            closes.len()
        );
        return degraded_snapshot();
    }

    IndicatorSnapshot {
        rsi: rsi(closes, RSI_PERIOD),
        macd_histogram: macd(closes).histogram,
        bollinger_position: bollinger_position(closes),
        trend: classify_trend(closes),
        degraded: false,
    }
}

fn degraded_snapshot() -> IndicatorSnapshot {
    let mut rng = rand::thread_rng();
    let trend = match rng.gen_range(0..3) {
        0 => TrendClass::Up,
        1 => TrendClass::Down,
        _ => TrendClass::Sideways,
    };
    IndicatorSnapshot {
        rsi: rng.gen_range(35.0..65.0),
        macd_histogram: rng.gen_range(-0.001..0.001),
        bollinger_position: rng.gen_range(0.25..0.75),
        trend,
        degraded: true,
    }
}
