//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

pub fn calculate_sma(closes: &[f64], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(closes.len());

    if period == 0 {
        values.resize(closes.len(), IndicatorPoint::warmup());
        return IndicatorSeries {
            indicator_type: IndicatorType::Sma(period),
            values,
        };
    }

    let mut sum = 0.0;
    for (i, &close) in closes.iter().enumerate() {
        sum += close;
        if i >= period {
            sum -= closes[i - period];
        }
        if i + 1 < period {
            values.push(IndicatorPoint::warmup());
        } else {
            values.push(IndicatorPoint::simple(sum / period as f64));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup_and_values() {
        let series = calculate_sma(&[10.0, 20.0, 30.0, 40.0], 3);
        assert_eq!(
            series.simple_values(),
            vec![None, None, Some(20.0), Some(30.0)]
        );
    }

    #[test]
    fn sma_period_longer_than_input() {
        let series = calculate_sma(&[1.0, 2.0], 5);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn sma_zero_period() {
        let series = calculate_sma(&[1.0, 2.0], 0);
        assert_eq!(series.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}
