//! Rolling sample standard deviation.
//!
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n) / (n - 1))
//! Warmup: first (n-1) bars are invalid. Periods below 2 are never valid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

pub fn calculate_stddev(closes: &[f64], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(closes.len());

    for i in 0..closes.len() {
        if period < 2 || i + 1 < period {
            values.push(IndicatorPoint::warmup());
            continue;
        }

        let window = &closes[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|c| {
                let diff = c - mean;
                diff * diff
            })
            .sum::<f64>()
            / (period - 1) as f64;

        values.push(IndicatorPoint::simple(variance.sqrt()));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Stddev(period),
        values,
    }
}
