//! Descriptive statistics of trade sizes.

use forensics_core::{LotProfile, TradeRecord};
use statrs::statistics::{Data, Median, Statistics};

/// Mean, median, sample standard deviation and maximum of lot sizes.
///
/// An empty tape gives an all-zero profile; a single trade has zero spread.
pub fn lot_profile(trades: &[TradeRecord]) -> LotProfile {
    if trades.is_empty() {
        return LotProfile::default();
    }

    let lots: Vec<f64> = trades.iter().map(|t| t.lot as f64).collect();
    let mean = Statistics::mean(lots.iter());
    let std_dev = if lots.len() > 1 {
        Statistics::std_dev(lots.iter())
    } else {
        0.0
    };
    let max = trades.iter().map(|t| t.lot).max().unwrap_or(0);
    let median = Data::new(lots).median();

    LotProfile {
        mean,
        median,
        std_dev,
        max,
    }
}
