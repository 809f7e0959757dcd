//! RSI filters.
//!
//! - [`RsiFilter`] (batch): true while `lower < RSI < upper`.
//! - [`RsiStreamFilter`] (streaming): recomputes RSI over the trailing `period + 1`
//!   closes on every candle and votes buy below the oversold threshold, sell above
//!   the overbought threshold.

use crate::domain::candle::{Candle, CandleSeries};
use crate::domain::error::SigsweepError;
use crate::domain::filter::{
    require_positive, BatchFilter, Capabilities, CandleFilter, Signal, RSI_OVERBOUGHT,
    RSI_OVERSOLD,
};
use crate::domain::indicator::{calculate_rsi, rsi_from_window};
use std::sync::Arc;

pub const DEFAULT_PERIOD: usize = 14;
pub const DEFAULT_LOWER: f64 = 30.0;
pub const DEFAULT_UPPER: f64 = 70.0;

#[derive(Debug, Clone)]
pub struct RsiFilter {
    series: Arc<CandleSeries>,
    period: usize,
    lower: f64,
    upper: f64,
    rsi: Vec<Option<f64>>,
}

impl RsiFilter {
    pub fn new(series: Arc<CandleSeries>, period: usize) -> Result<Self, SigsweepError> {
        Self::with_bounds(series, period, DEFAULT_LOWER, DEFAULT_UPPER)
    }

    pub fn with_bounds(
        series: Arc<CandleSeries>,
        period: usize,
        lower: f64,
        upper: f64,
    ) -> Result<Self, SigsweepError> {
        require_positive("period", period)?;
        validate_bounds(lower, upper)?;
        let rsi = calculate_rsi(&series.closes(), period).simple_values();
        Ok(Self {
            series,
            period,
            lower,
            upper,
            rsi,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn series(&self) -> &CandleSeries {
        &self.series
    }

    /// Per-bar RSI, `None` during warmup.
    pub fn rsi_values(&self) -> &[Option<f64>] {
        &self.rsi
    }
}

impl BatchFilter for RsiFilter {
    fn name(&self) -> &str {
        "rsi"
    }

    fn get_signal(&self) -> Vec<bool> {
        self.rsi
            .iter()
            .map(|v| v.is_some_and(|rsi| self.lower < rsi && rsi < self.upper))
            .collect()
    }
}

fn validate_bounds(lower: f64, upper: f64) -> Result<(), SigsweepError> {
    if !lower.is_finite() || !upper.is_finite() || lower >= upper {
        return Err(SigsweepError::configuration(format!(
            "RSI thresholds must be finite with lower < upper (got {} / {})",
            lower, upper
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct RsiStreamFilter {
    period: usize,
    buy_threshold: f64,
    sell_threshold: f64,
    closes: Vec<f64>,
    last_rsi: Option<f64>,
}

impl RsiStreamFilter {
    pub fn new(period: usize) -> Result<Self, SigsweepError> {
        Self::with_thresholds(period, RSI_OVERSOLD, RSI_OVERBOUGHT)
    }

    pub fn with_thresholds(
        period: usize,
        buy_threshold: f64,
        sell_threshold: f64,
    ) -> Result<Self, SigsweepError> {
        require_positive("period", period)?;
        validate_bounds(buy_threshold, sell_threshold)?;
        Ok(Self {
            period,
            buy_threshold,
            sell_threshold,
            closes: Vec::with_capacity(period + 1),
            last_rsi: None,
        })
    }

    /// RSI of the most recent observation, `None` until `period + 1` closes exist.
    pub fn last_rsi(&self) -> Option<f64> {
        self.last_rsi
    }

    /// Appends the candle and classifies the trailing RSI against 30 / 70.
    pub fn generate_signal(&mut self, candle: &Candle) -> Option<Signal> {
        self.observe(candle);
        let rsi = self.last_rsi?;
        if rsi < RSI_OVERSOLD {
            Some(Signal::Buy)
        } else if rsi > RSI_OVERBOUGHT {
            Some(Signal::Sell)
        } else {
            None
        }
    }
}

impl CandleFilter for RsiStreamFilter {
    fn name(&self) -> &str {
        "rsi"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::BUY_AND_SELL
    }

    fn observe(&mut self, candle: &Candle) {
        self.closes.push(candle.close);
        let window = self.period + 1;
        if self.closes.len() > window {
            self.closes.remove(0);
        }
        self.last_rsi = if self.closes.len() == window {
            rsi_from_window(&self.closes)
        } else {
            None
        };
    }

    fn buy_vote(&self) -> bool {
        self.last_rsi.is_some_and(|rsi| rsi < self.buy_threshold)
    }

    fn sell_vote(&self) -> bool {
        self.last_rsi.is_some_and(|rsi| rsi > self.sell_threshold)
    }
}
