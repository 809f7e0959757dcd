//! Weighted signal grid for strategy-space search.
//!
//! For N signal names, every k-subset (combinatorial order of the input) is paired
//! with the k-fold cartesian product of a discretised weight grid over [0.1, 1.0].
//! Each result is a [`StrategyDescriptor`]: inert data a sweep evaluator turns into a
//! strategy later.
//!
//! Row count is C(N, k) × G^k where G is the weight grid size (10 for step 0.1).

use crate::domain::error::SigsweepError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

pub const DEFAULT_STEP: f64 = 0.1;
pub const DEFAULT_ORDER: usize = 2;
pub const WEIGHT_MIN: f64 = 0.1;
pub const WEIGHT_MAX: f64 = 1.0;

const KEY_SUFFIX: &str = "_signal";
const MAX_DECIMALS: i32 = 10;
/// Weights per signal above this are rejected before anything is allocated.
pub const MAX_WEIGHTS: usize = 100_000;

/// Weights from 0.1 to 1.0 inclusive, `step` apart, rounded to the step's precision
/// (never coarser than one decimal, so the first weight stays 0.1).
///
/// Values come from an integer counter (`0.1 + step * i`), never from repeated addition.
pub fn weight_grid(step: f64) -> Result<Vec<f64>, SigsweepError> {
    if !step.is_finite() || step <= 0.0 {
        return Err(SigsweepError::invalid_argument(format!(
            "weight step must be a positive number (got {})",
            step
        )));
    }

    let span = (WEIGHT_MAX - WEIGHT_MIN) / step;
    let count = (span + 1e-9).floor() + 1.0;
    if !count.is_finite() || count > MAX_WEIGHTS as f64 {
        return Err(SigsweepError::invalid_argument(format!(
            "weight step {} yields more than {} weights",
            step, MAX_WEIGHTS
        )));
    }
    let count = count as usize;
    let decimals = step_decimals(step).max(1);

    Ok((0..count)
        .map(|i| round_to(WEIGHT_MIN + step * i as f64, decimals))
        .collect())
}

fn step_decimals(step: f64) -> i32 {
    (0..MAX_DECIMALS)
        .find(|&d| {
            let scaled = step * 10f64.powi(d);
            (scaled - scaled.round()).abs() < 1e-9 * scaled.max(1.0)
        })
        .unwrap_or(MAX_DECIMALS)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Mapping from `<name>_signal` to a weight, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyDescriptor {
    weights: BTreeMap<String, f64>,
}

impl StrategyDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `weight` under the key `<signal>_signal`.
    pub fn with_weight(mut self, signal: &str, weight: f64) -> Self {
        self.weights.insert(signal_key(signal), weight);
        self
    }

    /// Weight for a signal name (without the `_signal` suffix).
    pub fn weight(&self, signal: &str) -> Option<f64> {
        self.weights.get(&signal_key(signal)).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Signal names in key order, suffix stripped.
    pub fn signals(&self) -> Vec<&str> {
        self.weights
            .keys()
            .map(|k| k.strip_suffix(KEY_SUFFIX).unwrap_or(k))
            .collect()
    }

    pub fn weights(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }

    /// Sorted-key JSON object, e.g. `{"a_signal": 0.1, "b_signal": 1.0}`.
    ///
    /// Equal descriptors always serialise to identical bytes. Output is pure ASCII:
    /// other characters in keys are written as `\uXXXX` escapes.
    pub fn to_canonical_string(&self) -> Result<String, SigsweepError> {
        let mut entries = Vec::with_capacity(self.weights.len());
        for (key, weight) in &self.weights {
            entries.push(format!(
                "{}: {}",
                escape_non_ascii(&serde_json::to_string(key)?),
                serde_json::to_string(weight)?
            ));
        }
        Ok(format!("{{{}}}", entries.join(", ")))
    }

    pub fn parse(text: &str) -> Result<Self, SigsweepError> {
        let weights: BTreeMap<String, f64> = serde_json::from_str(text)?;
        Ok(Self { weights })
    }
}

impl fmt::Display for StrategyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_canonical_string() {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

fn signal_key(signal: &str) -> String {
    format!("{}{}", signal, KEY_SUFFIX)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub step: f64,
    pub order: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            order: DEFAULT_ORDER,
        }
    }
}

/// A validated enumeration plan; descriptors are produced lazily by [`Grid::iter`].
#[derive(Debug, Clone)]
pub struct Grid {
    names: Vec<String>,
    weights: Vec<f64>,
    order: usize,
    subset_count: usize,
    row_count: usize,
}

impl Grid {
    pub fn new<S: AsRef<str>>(signals: &[S], config: &GridConfig) -> Result<Self, SigsweepError> {
        let names: Vec<&str> = signals.iter().map(|s| s.as_ref()).collect();
        validate_signals(&names)?;

        let k = config.order;
        if k < 2 || k > names.len() {
            return Err(SigsweepError::invalid_argument(format!(
                "order must be between 2 and the number of signals ({}), got {}",
                names.len(),
                k
            )));
        }

        let weights = weight_grid(config.step)?;
        let too_large = || SigsweepError::invalid_argument("grid is too large to enumerate");
        let subset_count = binomial(names.len(), k).ok_or_else(too_large)?;
        let row_count = grid_size(names.len(), k, weights.len()).ok_or_else(too_large)?;

        Ok(Self {
            names: names.into_iter().map(str::to_string).collect(),
            weights,
            order: k,
            subset_count,
            row_count,
        })
    }

    /// Number of signal subsets (pairs for order 2).
    pub fn subset_count(&self) -> usize {
        self.subset_count
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Subsets in input order; within a subset the last signal's weight varies fastest.
    pub fn iter(&self) -> GridIter<'_> {
        let mut subsets = Combinations::new(self.names.len(), self.order);
        let subset = subsets.next();
        GridIter {
            grid: self,
            subsets,
            subset,
            odometer: vec![0; self.order],
        }
    }
}

pub struct GridIter<'a> {
    grid: &'a Grid,
    subsets: Combinations,
    subset: Option<Vec<usize>>,
    odometer: Vec<usize>,
}

impl Iterator for GridIter<'_> {
    type Item = StrategyDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let subset = self.subset.as_ref()?;
        let descriptor = subset
            .iter()
            .zip(&self.odometer)
            .fold(StrategyDescriptor::new(), |d, (&s, &w)| {
                d.with_weight(&self.grid.names[s], self.grid.weights[w])
            });

        if !advance_odometer(&mut self.odometer, self.grid.weights.len()) {
            self.subset = self.subsets.next();
        }
        Some(descriptor)
    }
}

/// Eagerly enumerates every descriptor of the grid.
pub fn generate_grid<S: AsRef<str>>(
    signals: &[S],
    config: &GridConfig,
) -> Result<Vec<StrategyDescriptor>, SigsweepError> {
    Ok(Grid::new(signals, config)?.iter().collect())
}

fn validate_signals(names: &[&str]) -> Result<(), SigsweepError> {
    if names.len() < 2 {
        return Err(SigsweepError::invalid_argument(format!(
            "at least 2 signal names are required, got {}",
            names.len()
        )));
    }
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(SigsweepError::invalid_argument("signal names must not be empty"));
        }
        if !seen.insert(*name) {
            return Err(SigsweepError::invalid_argument(format!(
                "duplicate signal name '{}'",
                name
            )));
        }
    }
    Ok(())
}

/// C(n, k) × g^k, or `None` on overflow.
pub fn grid_size(n: usize, k: usize, g: usize) -> Option<usize> {
    let subsets = binomial(n, k)?;
    let per_subset = g.checked_pow(u32::try_from(k).ok()?)?;
    subsets.checked_mul(per_subset)
}

fn binomial(n: usize, k: usize) -> Option<usize> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut acc: usize = 1;
    for i in 0..k {
        acc = acc.checked_mul(n - i)? / (i + 1);
    }
    Some(acc)
}

/// Last position varies fastest; returns false once every position wrapped.
fn advance_odometer(digits: &mut [usize], base: usize) -> bool {
    for digit in digits.iter_mut().rev() {
        *digit += 1;
        if *digit < base {
            return true;
        }
        *digit = 0;
    }
    false
}

/// k-subsets of `0..n` as ascending index vectors, in lexicographic order.
struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.indices.clone();

        let k = self.indices.len();
        match (0..k).rev().find(|&i| self.indices[i] < self.n - k + i) {
            Some(i) => {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => self.done = true,
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_grid_is_exact() {
        let grid = weight_grid(DEFAULT_STEP).unwrap();
        assert_eq!(
            grid,
            vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]
        );
        assert_eq!(grid.len(), 10);
        assert_eq!(grid.first(), Some(&0.1));
        assert_eq!(grid.last(), Some(&1.0));
    }

    #[test]
    fn finer_step_keeps_endpoint() {
        let grid = weight_grid(0.05).unwrap();
        assert_eq!(grid.len(), 19);
        assert_eq!(grid[1], 0.15);
        assert_eq!(grid.last(), Some(&1.0));
    }

    #[test]
    fn coarse_step_stops_before_max() {
        assert_eq!(weight_grid(0.25).unwrap(), vec![0.1, 0.35, 0.6, 0.85]);
        assert_eq!(weight_grid(2.0).unwrap(), vec![0.1]);
    }

    #[test]
    fn non_ascii_keys_are_escaped() {
        let descriptor = StrategyDescriptor::new()
            .with_weight("\u{df}", 0.1)
            .with_weight("\u{1f4c8}", 1.0);
        let text = descriptor.to_canonical_string().unwrap();
        assert_eq!(
            text,
            r#"{"\u00df_signal": 0.1, "\ud83d\udcc8_signal": 1.0}"#
        );
        assert!(text.is_ascii());
        assert_eq!(StrategyDescriptor::parse(&text).unwrap(), descriptor);
    }

    #[test]
    fn whole_number_steps_keep_minimum_weight() {
        assert_eq!(weight_grid(1.0).unwrap(), vec![0.1]);
        assert_eq!(weight_grid(0.9).unwrap(), vec![0.1, 1.0]);
        let grid = Grid::new(
            &["a", "b"],
            &GridConfig {
                step: 1.0,
                order: 2,
            },
        )
        .unwrap();
        let first = grid.iter().next().unwrap();
        assert_eq!(
            first.to_canonical_string().unwrap(),
            r#"{"a_signal": 0.1, "b_signal": 0.1}"#
        );
    }

    #[test]
    fn tiny_step_is_rejected_without_allocating() {
        for step in [1e-300, f64::MIN_POSITIVE, 5e-324, 1e-9] {
            let err = weight_grid(step).unwrap_err();
            assert!(matches!(err, SigsweepError::InvalidArgument { .. }));
        }
        let config = GridConfig {
            step: 1e-300,
            order: 2,
        };
        assert!(Grid::new(&["a", "b"], &config).is_err());
        assert_eq!(weight_grid(1e-5).unwrap().len(), 90_001);
    }

    #[test]
    fn rejects_bad_step() {
        for step in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let err = weight_grid(step).unwrap_err();
            assert!(matches!(err, SigsweepError::InvalidArgument { .. }));
        }
    }

    #[test]
    fn canonical_string_sorts_keys() {
        let d = StrategyDescriptor::new()
            .with_weight("rsi", 1.0)
            .with_weight("adx", 0.3);
        assert_eq!(
            d.to_canonical_string().unwrap(),
            r#"{"adx_signal": 0.3, "rsi_signal": 1.0}"#
        );
        assert_eq!(d.to_string(), d.to_canonical_string().unwrap());
    }

    #[test]
    fn canonical_string_parses_back() {
        let d = StrategyDescriptor::new()
            .with_weight("mfi", 0.7)
            .with_weight("obv", 0.2);
        let parsed = StrategyDescriptor::parse(&d.to_canonical_string().unwrap()).unwrap();
        assert_eq!(parsed, d);
        assert_eq!(parsed.weight("mfi"), Some(0.7));
        assert_eq!(parsed.signals(), vec!["mfi", "obv"]);
    }

    #[test]
    fn parse_accepts_compact_json() {
        let d = StrategyDescriptor::parse(r#"{"b_signal":0.5,"a_signal":0.1}"#).unwrap();
        assert_eq!(d.signals(), vec!["a", "b"]);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            StrategyDescriptor::parse("not json"),
            Err(SigsweepError::Json(_))
        ));
    }

    #[test]
    fn three_signals_make_300_rows() {
        let grid = Grid::new(&["a", "b", "c"], &GridConfig::default()).unwrap();
        assert_eq!(grid.subset_count(), 3);
        assert_eq!(grid.row_count(), 300);

        let descriptors: Vec<StrategyDescriptor> = grid.iter().collect();
        assert_eq!(descriptors.len(), 300);
        let keys: HashSet<String> = descriptors
            .iter()
            .map(|d| d.to_canonical_string().unwrap())
            .collect();
        assert_eq!(keys.len(), 300);
    }

    #[test]
    fn enumeration_order_is_pair_then_weights() {
        let d = generate_grid(&["x", "y", "z"], &GridConfig::default()).unwrap();
        let xy = |wx: f64, wy: f64| {
            StrategyDescriptor::new()
                .with_weight("x", wx)
                .with_weight("y", wy)
        };

        assert_eq!(d[0], xy(0.1, 0.1));
        assert_eq!(d[1], xy(0.1, 0.2));
        assert_eq!(d[10], xy(0.2, 0.1));
        assert_eq!(d[99], xy(1.0, 1.0));
        assert_eq!(d[100].signals(), vec!["x", "z"]);
        assert_eq!(d[200].signals(), vec!["y", "z"]);
    }

    #[test]
    fn input_order_drives_pair_order() {
        let d = generate_grid(&["zeta", "alpha", "mid"], &GridConfig::default()).unwrap();
        // first pair is (zeta, alpha); keys are still sorted inside each descriptor
        assert_eq!(d[0].signals(), vec!["alpha", "zeta"]);
        assert_eq!(d[1].weight("alpha"), Some(0.2));
        assert_eq!(d[1].weight("zeta"), Some(0.1));
        assert_eq!(d[100].signals(), vec!["mid", "zeta"]);
    }

    #[test]
    fn single_signal_is_invalid() {
        let err = generate_grid(&["rsi"], &GridConfig::default()).unwrap_err();
        assert!(matches!(err, SigsweepError::InvalidArgument { .. }));
    }

    #[test]
    fn duplicate_signal_is_invalid() {
        let err = generate_grid(&["rsi", "macd", "rsi"], &GridConfig::default()).unwrap_err();
        assert!(matches!(err, SigsweepError::InvalidArgument { .. }));
    }

    #[test]
    fn order_out_of_range_is_invalid() {
        let config = GridConfig {
            step: 0.1,
            order: 3,
        };
        assert!(generate_grid(&["a", "b"], &config).is_err());
        let config = GridConfig {
            step: 0.1,
            order: 1,
        };
        assert!(generate_grid(&["a", "b"], &config).is_err());
    }

    #[test]
    fn triples_grid() {
        let config = GridConfig {
            step: 0.5,
            order: 3,
        };
        let grid = Grid::new(&["a", "b", "c", "d"], &config).unwrap();
        assert_eq!(grid.weights(), &[0.1, 0.6]);
        assert_eq!(grid.subset_count(), 4);
        let descriptors: Vec<_> = grid.iter().collect();
        assert_eq!(descriptors.len(), 4 * 8);
        assert_eq!(grid.row_count(), descriptors.len());
        assert!(descriptors.iter().all(|d| d.len() == 3));
    }

    #[test]
    fn grid_size_formula() {
        assert_eq!(grid_size(3, 2, 10), Some(300));
        assert_eq!(grid_size(6, 2, 10), Some(1500));
        assert_eq!(grid_size(12, 12, 10), Some(1_000_000_000_000));
        assert_eq!(grid_size(64, 32, 1000), None);
    }

    #[test]
    fn combinations_lexicographic() {
        let all: Vec<Vec<usize>> = Combinations::new(4, 2).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
    }

    proptest! {
        #[test]
        fn pairwise_row_count_matches_formula(n in 2usize..7) {
            let names: Vec<String> = (0..n).map(|i| format!("s{}", i)).collect();
            let descriptors = generate_grid(&names, &GridConfig::default()).unwrap();
            prop_assert_eq!(descriptors.len(), n * (n - 1) / 2 * 100);
            prop_assert!(descriptors.iter().all(|d| d.len() == 2));
        }

        #[test]
        fn grid_values_stay_in_range(steps in 1u32..=300) {
            let step = f64::from(steps) / 100.0;
            let grid = weight_grid(step).unwrap();
            prop_assert_eq!(grid[0], WEIGHT_MIN);
            prop_assert!(grid.iter().all(|&w| (WEIGHT_MIN..=WEIGHT_MAX).contains(&w)));
            prop_assert!(grid.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
