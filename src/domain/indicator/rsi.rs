//! RSI (Relative Strength Index).
//!
//! Gains and losses are the positive and negated-negative close differences over a
//! window; both are averaged with a simple mean.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: the first `period` bars are invalid (need `period` price changes).
//! Bar `period - 1` is not filled in by treating the first difference as zero,
//! which would mix a made-up change into the window. Batch and streaming RSI
//! therefore start on the same bar.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

/// RSI over every close difference in `closes`. `None` with fewer than two closes.
pub fn rsi_from_window(closes: &[f64]) -> Option<f64> {
    if closes.len() < 2 {
        return None;
    }

    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for pair in closes.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gain_sum += change;
        } else if change < 0.0 {
            loss_sum -= change;
        }
    }

    let n = (closes.len() - 1) as f64;
    let avg_gain = gain_sum / n;
    let avg_loss = loss_sum / n;

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    Some(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)))
}

/// Batch RSI: bar `i` uses the `period` differences ending at `i`.
pub fn calculate_rsi(closes: &[f64], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(closes.len());

    for i in 0..closes.len() {
        let point = if period == 0 || i < period {
            None
        } else {
            rsi_from_window(&closes[i - period..=i])
        };
        values.push(point.map_or_else(IndicatorPoint::warmup, IndicatorPoint::simple));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}
