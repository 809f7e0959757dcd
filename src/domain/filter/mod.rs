//! Indicator filters: stateful transforms from candles to trading signals.
//!
//! Two usage modes share this module:
//! - [`BatchFilter`]: built once over a whole [`CandleSeries`], yields one boolean per bar.
//! - [`CandleFilter`]: fed one candle at a time, votes buy/sell on the latest candle.
//!
//! Streaming filters declare what they can vote on through [`Capabilities`]; the
//! strategy combinator reads those flags once instead of probing at call time.
//!
//! [`CandleSeries`]: crate::domain::candle::CandleSeries

pub mod bollinger;
pub mod macd;
pub mod rsi;
pub mod trend;

pub use bollinger::BollingerFilter;
pub use macd::{MacdCrossFilter, MacdFilter};
pub use rsi::{RsiFilter, RsiStreamFilter};
pub use trend::TrendFilter;

use crate::domain::candle::Candle;
use crate::domain::error::SigsweepError;
use std::fmt;

/// RSI below this is oversold (streaming buy).
pub const RSI_OVERSOLD: f64 = 30.0;
/// RSI above this is overbought (streaming sell).
pub const RSI_OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Sell,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "buy"),
            Signal::Sell => write!(f, "sell"),
        }
    }
}

/// Batch mode: a boolean series aligned 1:1 with the candle series.
pub trait BatchFilter {
    fn name(&self) -> &str;

    /// Undefined bars (warmup, division by zero) resolve to `false`.
    fn get_signal(&self) -> Vec<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub buy: bool,
    pub sell: bool,
}

impl Capabilities {
    pub const BUY_ONLY: Capabilities = Capabilities {
        buy: true,
        sell: false,
    };
    pub const BUY_AND_SELL: Capabilities = Capabilities {
        buy: true,
        sell: true,
    };
}

/// Streaming mode: observe each candle exactly once, then answer votes about it.
pub trait CandleFilter {
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    fn observe(&mut self, candle: &Candle);

    fn buy_vote(&self) -> bool;

    /// Only consulted when `capabilities().sell` is set.
    fn sell_vote(&self) -> bool {
        false
    }
}

pub(crate) fn require_positive(param: &str, value: usize) -> Result<(), SigsweepError> {
    if value == 0 {
        return Err(SigsweepError::configuration(format!(
            "{} must be a positive integer",
            param
        )));
    }
    Ok(())
}

pub(crate) fn require_windows(
    short: usize,
    long: usize,
    signal: usize,
) -> Result<(), SigsweepError> {
    require_positive("short_window", short)?;
    require_positive("long_window", long)?;
    require_positive("signal_window", signal)?;
    if long <= short {
        return Err(SigsweepError::configuration(format!(
            "long_window ({}) must be greater than short_window ({})",
            long, short
        )));
    }
    Ok(())
}
