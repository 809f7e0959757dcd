//! MACD filters.
//!
//! - [`MacdFilter`] (batch): true while the MACD line is above its signal line.
//! - [`MacdCrossFilter`] (streaming): votes buy on the candle where the MACD line
//!   crosses from below to above the signal line. It never votes sell.

use crate::domain::candle::{Candle, CandleSeries};
use crate::domain::error::SigsweepError;
use crate::domain::filter::{require_windows, BatchFilter, Capabilities, CandleFilter};
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::{calculate_macd, IndicatorValue};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdLines {
    pub macd: f64,
    pub signal: f64,
}

#[derive(Debug, Clone)]
pub struct MacdFilter {
    series: Arc<CandleSeries>,
    short_window: usize,
    long_window: usize,
    signal_window: usize,
    lines: Vec<Option<MacdLines>>,
}

impl MacdFilter {
    pub fn new(
        series: Arc<CandleSeries>,
        short_window: usize,
        long_window: usize,
        signal_window: usize,
    ) -> Result<Self, SigsweepError> {
        require_windows(short_window, long_window, signal_window)?;
        let lines = calculate_macd(&series.closes(), short_window, long_window, signal_window)
            .values
            .iter()
            .map(|p| match (p.valid, p.value) {
                (true, IndicatorValue::Macd { line, signal, .. }) => Some(MacdLines {
                    macd: line,
                    signal,
                }),
                _ => None,
            })
            .collect();
        Ok(Self {
            series,
            short_window,
            long_window,
            signal_window,
            lines,
        })
    }

    pub fn with_defaults(series: Arc<CandleSeries>) -> Result<Self, SigsweepError> {
        Self::new(series, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
    }

    pub fn windows(&self) -> (usize, usize, usize) {
        (self.short_window, self.long_window, self.signal_window)
    }

    pub fn series(&self) -> &CandleSeries {
        &self.series
    }

    pub fn lines(&self) -> &[Option<MacdLines>] {
        &self.lines
    }
}

impl BatchFilter for MacdFilter {
    fn name(&self) -> &str {
        "macd"
    }

    fn get_signal(&self) -> Vec<bool> {
        self.lines
            .iter()
            .map(|l| l.is_some_and(|l| l.macd > l.signal))
            .collect()
    }
}

/// Incremental EMA seeded from the first observation.
#[derive(Debug, Clone)]
struct StreamingEma {
    k: f64,
    value: Option<f64>,
}

impl StreamingEma {
    fn new(period: usize) -> Self {
        Self {
            k: 2.0 / (period as f64 + 1.0),
            value: None,
        }
    }

    fn update(&mut self, x: f64) -> f64 {
        let next = match self.value {
            Some(prev) => x * self.k + prev * (1.0 - self.k),
            None => x,
        };
        self.value = Some(next);
        next
    }
}

#[derive(Debug, Clone)]
pub struct MacdCrossFilter {
    long_window: usize,
    signal_window: usize,
    fast: StreamingEma,
    slow: StreamingEma,
    signal: StreamingEma,
    observed: usize,
    prev: Option<MacdLines>,
    crossed: bool,
}

impl MacdCrossFilter {
    pub fn new(
        short_window: usize,
        long_window: usize,
        signal_window: usize,
    ) -> Result<Self, SigsweepError> {
        require_windows(short_window, long_window, signal_window)?;
        Ok(Self {
            long_window,
            signal_window,
            fast: StreamingEma::new(short_window),
            slow: StreamingEma::new(long_window),
            signal: StreamingEma::new(signal_window),
            observed: 0,
            prev: None,
            crossed: false,
        })
    }

    pub fn with_defaults() -> Result<Self, SigsweepError> {
        Self::new(DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
    }

    /// Observations needed before a cross can be reported.
    pub fn warmup(&self) -> usize {
        self.long_window + self.signal_window
    }
}

impl CandleFilter for MacdCrossFilter {
    fn name(&self) -> &str {
        "macd"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::BUY_ONLY
    }

    fn observe(&mut self, candle: &Candle) {
        self.observed += 1;
        let macd = self.fast.update(candle.close) - self.slow.update(candle.close);
        let signal = self.signal.update(macd);

        if self.observed < self.warmup() {
            self.crossed = false;
            return;
        }

        let now = MacdLines { macd, signal };
        self.crossed = self
            .prev
            .is_some_and(|prev| prev.macd < prev.signal && now.macd > now.signal);
        self.prev = Some(now);
    }

    fn buy_vote(&self) -> bool {
        self.crossed
    }
}
