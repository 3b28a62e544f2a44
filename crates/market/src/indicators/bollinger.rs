use super::{require, IndicatorResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBand {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBand {
    /// Where `price` sits inside the band, 0 at the lower edge and 1 at the upper.
    #[must_use]
    pub fn percent_b(&self, price: f64) -> Option<f64> {
        let width = self.upper - self.lower;
        (width > 0.0).then(|| (price - self.lower) / width)
    }
}

/// Bands over the trailing `period` values, using population standard deviation.
///
/// # Errors
/// Needs `period` values.
pub fn bollinger(values: &[f64], period: usize, k: f64) -> IndicatorResult<BollingerBand> {
    require("Bollinger", period, values.len())?;
    Ok(band(&values[values.len() - period..], k))
}

/// Band for every window; element 0 lines up with input index `period - 1`.
///
/// # Errors
/// Needs `period` values.
pub fn bollinger_series(values: &[f64], period: usize, k: f64) -> IndicatorResult<Vec<BollingerBand>> {
    require("Bollinger", period, values.len())?;
    Ok(values.windows(period).map(|w| band(w, k)).collect())
}

fn band(window: &[f64], k: f64) -> BollingerBand {
    let n = window.len() as f64;
    let middle = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|x| (x - middle) * (x - middle)).sum::<f64>() / n;
    let offset = k * variance.sqrt();
    BollingerBand {
        upper: middle + offset,
        middle,
        lower: middle - offset,
    }
}
