//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the first observation, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k). Every bar is valid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

pub fn calculate_ema(closes: &[f64], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(period),
            values: vec![IndicatorPoint::warmup(); closes.len()],
        };
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values: ema_values(closes, period)
            .into_iter()
            .map(IndicatorPoint::simple)
            .collect(),
    }
}

/// Raw EMA over any value slice; also used to smooth the MACD line.
pub fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut iter = values.iter();
    let Some(&first) = iter.next() else {
        return out;
    };

    let mut ema = first;
    out.push(ema);
    for &value in iter {
        ema = value * k + ema * (1.0 - k);
        out.push(ema);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorValue;
    use approx::assert_relative_eq;

    #[test]
    fn ema_seeded_from_first_value() {
        let series = calculate_ema(&[10.0, 20.0, 30.0], 3);
        assert!(series.values.iter().all(|p| p.valid));
        assert_eq!(series.values[0].value, IndicatorValue::Simple(10.0));
    }

    #[test]
    fn ema_recursive_calculation() {
        let values = ema_values(&[10.0, 20.0, 30.0], 3);
        let k = 2.0 / 4.0;
        let e1 = 20.0 * k + 10.0 * (1.0 - k);
        let e2 = 30.0 * k + e1 * (1.0 - k);
        assert_relative_eq!(values[1], e1);
        assert_relative_eq!(values[2], e2);
    }

    #[test]
    fn ema_period_1_tracks_input() {
        let values = ema_values(&[10.0, 20.0, 30.0], 1);
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn ema_equal_prices() {
        let values = ema_values(&[100.0; 6], 4);
        for v in values {
            assert_relative_eq!(v, 100.0);
        }
    }

    #[test]
    fn ema_empty_input() {
        assert!(ema_values(&[], 3).is_empty());
        assert!(calculate_ema(&[], 3).is_empty());
    }

    #[test]
    fn ema_zero_period_is_invalid() {
        let series = calculate_ema(&[1.0, 2.0], 0);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}
