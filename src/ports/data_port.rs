//! Candle data access port.

use crate::domain::candle::CandleSeries;
use crate::domain::error::SigsweepError;

pub trait DataPort {
    /// Every candle for `symbol`, validated into ascending timestamp order.
    fn fetch_candles(&self, symbol: &str) -> Result<CandleSeries, SigsweepError>;

    fn list_symbols(&self) -> Result<Vec<String>, SigsweepError>;
}
