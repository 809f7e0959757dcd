//! Strategy combination: many filters, one decision per candle.
//!
//! Policy is fixed: `buy` only when every filter votes buy, otherwise `sell` when any
//! sell-capable filter votes sell, otherwise no decision.

use crate::domain::candle::{Candle, CandleSeries};
use crate::domain::error::SigsweepError;
use crate::domain::filter::{BatchFilter, CandleFilter, Signal};
use tracing::debug;

pub struct StrategyCombinator {
    filters: Vec<Box<dyn CandleFilter>>,
    sell_capable: Vec<bool>,
}

impl StrategyCombinator {
    pub fn new(filters: Vec<Box<dyn CandleFilter>>) -> Result<Self, SigsweepError> {
        if filters.is_empty() {
            return Err(SigsweepError::configuration(
                "a strategy needs at least one filter",
            ));
        }
        if let Some(f) = filters.iter().find(|f| !f.capabilities().buy) {
            return Err(SigsweepError::configuration(format!(
                "filter '{}' cannot vote buy",
                f.name()
            )));
        }

        let sell_capable = filters.iter().map(|f| f.capabilities().sell).collect();
        Ok(Self {
            filters,
            sell_capable,
        })
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Every filter sees the candle, even after the outcome is already known.
    pub fn generate_signal(&mut self, candle: &Candle) -> Option<Signal> {
        for filter in &mut self.filters {
            filter.observe(candle);
        }

        let buy = self.filters.iter().all(|f| f.buy_vote());
        if buy {
            return Some(Signal::Buy);
        }

        let sell = self
            .filters
            .iter()
            .zip(&self.sell_capable)
            .any(|(f, &capable)| capable && f.sell_vote());
        if sell {
            debug!(timestamp = %candle.timestamp, "sell vote");
            return Some(Signal::Sell);
        }
        None
    }

    /// Streams a whole series, one decision per candle.
    pub fn run(&mut self, series: &CandleSeries) -> Vec<Option<Signal>> {
        series.iter().map(|c| self.generate_signal(c)).collect()
    }
}

/// Per-bar AND over batch filter signals.
pub fn allowed_bars(filters: &[&dyn BatchFilter]) -> Result<Vec<bool>, SigsweepError> {
    let mut signals = filters.iter().map(|f| (f.name(), f.get_signal()));
    let Some((_, mut allowed)) = signals.next() else {
        return Err(SigsweepError::configuration(
            "at least one batch filter is required",
        ));
    };

    for (name, signal) in signals {
        if signal.len() != allowed.len() {
            return Err(SigsweepError::configuration(format!(
                "filter '{}' produced {} bars, expected {}",
                name,
                signal.len(),
                allowed.len()
            )));
        }
        for (a, s) in allowed.iter_mut().zip(signal) {
            *a = *a && s;
        }
    }
    Ok(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::Capabilities;

    /// Replays scripted votes, one entry per observed candle.
    struct ScriptedFilter {
        name: String,
        capabilities: Capabilities,
        buys: Vec<bool>,
        sells: Vec<bool>,
        seen: usize,
    }

    impl ScriptedFilter {
        fn boxed(name: &str, buys: &[bool], sells: Option<&[bool]>) -> Box<dyn CandleFilter> {
            Box::new(Self {
                name: name.into(),
                capabilities: Capabilities {
                    buy: true,
                    sell: sells.is_some(),
                },
                buys: buys.to_vec(),
                sells: sells.map(|s| s.to_vec()).unwrap_or_default(),
                seen: 0,
            })
        }
    }

    impl CandleFilter for ScriptedFilter {
        fn name(&self) -> &str {
            &self.name
        }

        fn capabilities(&self) -> Capabilities {
            self.capabilities
        }

        fn observe(&mut self, _candle: &Candle) {
            self.seen += 1;
        }

        fn buy_vote(&self) -> bool {
            self.buys[self.seen - 1]
        }

        fn sell_vote(&self) -> bool {
            self.sells.get(self.seen - 1).copied().unwrap_or(true)
        }
    }

    struct NoBuyFilter;

    impl CandleFilter for NoBuyFilter {
        fn name(&self) -> &str {
            "exit-only"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities {
                buy: false,
                sell: true,
            }
        }

        fn observe(&mut self, _candle: &Candle) {}

        fn buy_vote(&self) -> bool {
            false
        }
    }

    struct FixedBatch(&'static str, Vec<bool>);

    impl BatchFilter for FixedBatch {
        fn name(&self) -> &str {
            self.0
        }

        fn get_signal(&self) -> Vec<bool> {
            self.1.clone()
        }
    }

    fn candle() -> Candle {
        Candle::from_millis(0, 1.0, 1.0, 1.0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn all_buy_votes_buy() {
        let mut strategy = StrategyCombinator::new(vec![
            ScriptedFilter::boxed("a", &[true], None),
            ScriptedFilter::boxed("b", &[true], None),
            ScriptedFilter::boxed("c", &[true], None),
        ])
        .unwrap();
        assert_eq!(strategy.generate_signal(&candle()), Some(Signal::Buy));
    }

    #[test]
    fn one_missing_buy_vote_is_not_buy() {
        let mut strategy = StrategyCombinator::new(vec![
            ScriptedFilter::boxed("a", &[true], None),
            ScriptedFilter::boxed("b", &[true], None),
            ScriptedFilter::boxed("c", &[false], None),
        ])
        .unwrap();
        assert_eq!(strategy.generate_signal(&candle()), None);
    }

    #[test]
    fn any_sell_vote_sells_when_buy_is_not_unanimous() {
        let mut strategy = StrategyCombinator::new(vec![
            ScriptedFilter::boxed("a", &[true], Some(&[false])),
            ScriptedFilter::boxed("b", &[false], Some(&[true])),
        ])
        .unwrap();
        assert_eq!(strategy.generate_signal(&candle()), Some(Signal::Sell));
    }

    #[test]
    fn unanimous_buy_takes_precedence_over_sell() {
        let mut strategy = StrategyCombinator::new(vec![
            ScriptedFilter::boxed("a", &[true], Some(&[false])),
            ScriptedFilter::boxed("b", &[true], Some(&[true])),
        ])
        .unwrap();
        assert_eq!(strategy.generate_signal(&candle()), Some(Signal::Buy));
    }

    #[test]
    fn sell_vote_ignored_without_capability() {
        // a filter without sell capability would answer `true` if asked
        let mut strategy =
            StrategyCombinator::new(vec![ScriptedFilter::boxed("a", &[false], None)]).unwrap();
        assert_eq!(strategy.generate_signal(&candle()), None);
    }

    #[test]
    fn every_filter_observes_every_candle() {
        let mut strategy = StrategyCombinator::new(vec![
            ScriptedFilter::boxed("a", &[false, true, true], None),
            ScriptedFilter::boxed("b", &[true, false, true], None),
        ])
        .unwrap();
        let decisions: Vec<_> = (0..3).map(|_| strategy.generate_signal(&candle())).collect();
        assert_eq!(decisions, vec![None, None, Some(Signal::Buy)]);
    }

    #[test]
    fn rejects_filter_without_buy_capability() {
        let err = StrategyCombinator::new(vec![
            ScriptedFilter::boxed("a", &[true], None),
            Box::new(NoBuyFilter),
        ])
        .err()
        .unwrap();
        assert!(matches!(err, SigsweepError::Configuration { .. }));
    }

    #[test]
    fn rejects_empty_filter_list() {
        assert!(StrategyCombinator::new(vec![]).is_err());
    }

    #[test]
    fn filter_names_in_order() {
        let strategy = StrategyCombinator::new(vec![
            ScriptedFilter::boxed("rsi", &[true], None),
            ScriptedFilter::boxed("trend", &[true], None),
        ])
        .unwrap();
        assert_eq!(strategy.filter_names(), vec!["rsi", "trend"]);
    }

    #[test]
    fn allowed_bars_is_per_bar_and() {
        let a = FixedBatch("a", vec![true, true, false, true]);
        let b = FixedBatch("b", vec![true, false, false, true]);
        let allowed = allowed_bars(&[&a, &b]).unwrap();
        assert_eq!(allowed, vec![true, false, false, true]);
    }

    #[test]
    fn allowed_bars_rejects_length_mismatch() {
        let a = FixedBatch("a", vec![true, true]);
        let b = FixedBatch("b", vec![true]);
        assert!(allowed_bars(&[&a, &b]).is_err());
        assert!(allowed_bars(&[]).is_err());
    }
}
