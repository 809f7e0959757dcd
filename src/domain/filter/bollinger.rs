//! Bollinger band filter (batch): true while the close sits strictly inside the bands.

use crate::domain::candle::CandleSeries;
use crate::domain::error::SigsweepError;
use crate::domain::filter::BatchFilter;
use crate::domain::indicator::{calculate_bollinger, IndicatorValue};
use std::sync::Arc;

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_NUM_STD: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct BollingerFilter {
    series: Arc<CandleSeries>,
    window: usize,
    num_std: f64,
    bands: Vec<Option<(f64, f64)>>,
}

impl BollingerFilter {
    pub fn new(
        series: Arc<CandleSeries>,
        window: usize,
        num_std: f64,
    ) -> Result<Self, SigsweepError> {
        if window < 2 {
            return Err(SigsweepError::configuration(format!(
                "bollinger window must be at least 2 (got {})",
                window
            )));
        }
        if !num_std.is_finite() || num_std <= 0.0 {
            return Err(SigsweepError::configuration(format!(
                "bollinger num_std must be positive (got {})",
                num_std
            )));
        }

        let bands = calculate_bollinger(&series.closes(), window, num_std)
            .values
            .iter()
            .map(|p| match (p.valid, p.value) {
                (true, IndicatorValue::Bollinger { upper, lower, .. }) => Some((lower, upper)),
                _ => None,
            })
            .collect();

        Ok(Self {
            series,
            window,
            num_std,
            bands,
        })
    }

    pub fn with_defaults(series: Arc<CandleSeries>) -> Result<Self, SigsweepError> {
        Self::new(series, DEFAULT_WINDOW, DEFAULT_NUM_STD)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn num_std(&self) -> f64 {
        self.num_std
    }
}

impl BatchFilter for BollingerFilter {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn get_signal(&self) -> Vec<bool> {
        self.series
            .iter()
            .zip(&self.bands)
            .map(|(candle, band)| {
                band.is_some_and(|(lower, upper)| lower < candle.close && candle.close < upper)
            })
            .collect()
    }
}
