use super::{require, IndicatorResult};
use algo_trade_core::Candle;
use serde::{Deserialize, Serialize};

/// Trend strength plus the directional indicators of the last bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdxReading {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

/// Average directional index.
///
/// True range and directional movement are Wilder-smoothed as running sums
/// (`s = s - s/period + x`). The first ADX value is the simple average of
/// the first `period` DX values; later values use Wilder smoothing.
///
/// # Errors
/// Needs `2 * period` candles.
pub fn adx(candles: &[Candle], period: usize) -> IndicatorResult<AdxReading> {
    if period == 0 {
        require("ADX", 0, candles.len())?;
    }
    require("ADX", 2 * period, candles.len())?;

    let n = candles.len();
    let mut tr = vec![0.0; n];
    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];
    for i in 1..n {
        let (prev, bar) = (&candles[i - 1], &candles[i]);
        tr[i] = (bar.high - bar.low)
            .max((bar.high - prev.close).abs())
            .max((bar.low - prev.close).abs());
        let up = bar.high - prev.high;
        let down = prev.low - bar.low;
        if up > down && up > 0.0 {
            plus_dm[i] = up;
        }
        if down > up && down > 0.0 {
            minus_dm[i] = down;
        }
    }

    let p = period as f64;
    let mut s_tr: f64 = tr[1..=period].iter().sum();
    let mut s_plus: f64 = plus_dm[1..=period].iter().sum();
    let mut s_minus: f64 = minus_dm[1..=period].iter().sum();

    let mut dx = Vec::with_capacity(n - period);
    let (mut plus_di, mut minus_di) = directional(s_tr, s_plus, s_minus);
    dx.push(directional_index(plus_di, minus_di));

    for i in (period + 1)..n {
        s_tr = s_tr - s_tr / p + tr[i];
        s_plus = s_plus - s_plus / p + plus_dm[i];
        s_minus = s_minus - s_minus / p + minus_dm[i];
        (plus_di, minus_di) = directional(s_tr, s_plus, s_minus);
        dx.push(directional_index(plus_di, minus_di));
    }

    let seed = dx[..period].iter().sum::<f64>() / p;
    let adx = dx[period..]
        .iter()
        .fold(seed, |acc, &value| (acc * (p - 1.0) + value) / p);

    Ok(AdxReading {
        adx,
        plus_di,
        minus_di,
    })
}

fn directional(s_tr: f64, s_plus: f64, s_minus: f64) -> (f64, f64) {
    if s_tr == 0.0 {
        (0.0, 0.0)
    } else {
        (s_plus / s_tr * 100.0, s_minus / s_tr * 100.0)
    }
}

fn directional_index(plus_di: f64, minus_di: f64) -> f64 {
    let sum = plus_di + minus_di;
    if sum == 0.0 {
        0.0
    } else {
        (plus_di - minus_di).abs() / sum * 100.0
    }
}
