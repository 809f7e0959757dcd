//! Bollinger Bands indicator.
//!
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the sample standard deviation (divides by N-1).
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::{
    calculate_sma, calculate_stddev, IndicatorPoint, IndicatorSeries, IndicatorType,
    IndicatorValue,
};

pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> IndicatorSeries {
    let middle = calculate_sma(closes, period).simple_values();
    let stddev = calculate_stddev(closes, period).simple_values();

    let values = middle
        .iter()
        .zip(&stddev)
        .map(|(m, s)| match (m, s) {
            (Some(middle), Some(sd)) => IndicatorPoint {
                valid: true,
                value: IndicatorValue::Bollinger {
                    upper: middle + num_std * sd,
                    middle: *middle,
                    lower: middle - num_std * sd,
                },
            },
            _ => IndicatorPoint {
                valid: false,
                value: IndicatorValue::Bollinger {
                    upper: 0.0,
                    middle: 0.0,
                    lower: 0.0,
                },
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100: (num_std * 100.0).round() as u32,
        },
        values,
    }
}
