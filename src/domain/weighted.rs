//! Weighted blend of boolean signals under a [`StrategyDescriptor`].
//!
//! score[i] = Σ weight(s) × signal_s[i]. When the largest score exceeds 1 the whole
//! series is divided by it, so scores stay in [0, 1].

use crate::domain::error::SigsweepError;
use crate::domain::grid::StrategyDescriptor;
use std::collections::HashMap;

pub fn weighted_blend(
    descriptor: &StrategyDescriptor,
    signals: &HashMap<String, Vec<bool>>,
) -> Result<Vec<f64>, SigsweepError> {
    if descriptor.is_empty() {
        return Err(SigsweepError::invalid_argument(
            "descriptor names no signals",
        ));
    }

    let mut scores: Option<Vec<f64>> = None;
    for name in descriptor.signals() {
        let series = signals.get(name).ok_or_else(|| {
            SigsweepError::invalid_argument(format!("no signal series named '{}'", name))
        })?;
        let weight = descriptor.weight(name).unwrap_or(0.0);

        let acc = scores.get_or_insert_with(|| vec![0.0; series.len()]);
        if acc.len() != series.len() {
            return Err(SigsweepError::configuration(format!(
                "signal '{}' has {} bars, expected {}",
                name,
                series.len(),
                acc.len()
            )));
        }
        for (score, &on) in acc.iter_mut().zip(series) {
            if on {
                *score += weight;
            }
        }
    }

    let mut scores = scores.unwrap_or_default();
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > 1.0 {
        for score in &mut scores {
            *score /= max;
        }
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn signals(entries: &[(&str, &[bool])]) -> HashMap<String, Vec<bool>> {
        entries
            .iter()
            .map(|(name, s)| (name.to_string(), s.to_vec()))
            .collect()
    }

    #[test]
    fn sums_weights_of_active_signals() {
        let d = StrategyDescriptor::new()
            .with_weight("rsi", 0.3)
            .with_weight("macd", 0.5);
        let s = signals(&[
            ("rsi", &[true, false, true, false]),
            ("macd", &[false, false, true, true]),
        ]);
        let scores = weighted_blend(&d, &s).unwrap();
        assert_relative_eq!(scores[0], 0.3);
        assert_relative_eq!(scores[1], 0.0);
        assert_relative_eq!(scores[2], 0.8);
        assert_relative_eq!(scores[3], 0.5);
    }

    #[test]
    fn normalises_when_max_exceeds_one() {
        let d = StrategyDescriptor::new()
            .with_weight("a", 1.0)
            .with_weight("b", 0.6);
        let s = signals(&[("a", &[true, true]), ("b", &[true, false])]);
        let scores = weighted_blend(&d, &s).unwrap();
        assert_relative_eq!(scores[0], 1.0);
        assert_relative_eq!(scores[1], 1.0 / 1.6);
    }

    #[test]
    fn unknown_signal_is_invalid() {
        let d = StrategyDescriptor::new().with_weight("adx", 0.5);
        let err = weighted_blend(&d, &signals(&[("rsi", &[true])])).unwrap_err();
        assert!(matches!(err, SigsweepError::InvalidArgument { .. }));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let d = StrategyDescriptor::new()
            .with_weight("a", 0.5)
            .with_weight("b", 0.5);
        let s = signals(&[("a", &[true, true]), ("b", &[true])]);
        assert!(weighted_blend(&d, &s).is_err());
    }

    #[test]
    fn empty_descriptor_is_invalid() {
        assert!(weighted_blend(&StrategyDescriptor::new(), &HashMap::new()).is_err());
    }
}
