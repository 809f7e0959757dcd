//! Trend filter (streaming): votes buy while the close is above its simple moving
//! average over the trailing `period` closes. Never votes sell.

use crate::domain::candle::Candle;
use crate::domain::error::SigsweepError;
use crate::domain::filter::{require_positive, Capabilities, CandleFilter};
use std::collections::VecDeque;

pub const DEFAULT_PERIOD: usize = 200;

#[derive(Debug, Clone)]
pub struct TrendFilter {
    period: usize,
    closes: VecDeque<f64>,
    above: bool,
}

impl TrendFilter {
    pub fn new(period: usize) -> Result<Self, SigsweepError> {
        require_positive("period", period)?;
        Ok(Self {
            period,
            closes: VecDeque::with_capacity(period),
            above: false,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl CandleFilter for TrendFilter {
    fn name(&self) -> &str {
        "trend"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::BUY_ONLY
    }

    fn observe(&mut self, candle: &Candle) {
        self.closes.push_back(candle.close);
        if self.closes.len() > self.period {
            self.closes.pop_front();
        }
        self.above = if self.closes.len() < self.period {
            false
        } else {
            let sma = self.closes.iter().sum::<f64>() / self.period as f64;
            candle.close > sma
        };
    }

    fn buy_vote(&self) -> bool {
        self.above
    }
}
