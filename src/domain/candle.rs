//! OHLCV candle and the ordered candle series every filter reads.

use crate::domain::error::SigsweepError;
use chrono::{DateTime, NaiveDateTime};

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Builds a candle from an exchange kline open time in epoch milliseconds.
    pub fn from_millis(
        open_time_ms: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, SigsweepError> {
        let timestamp = DateTime::from_timestamp_millis(open_time_ms)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| SigsweepError::Data {
                reason: format!("timestamp {} ms is out of range", open_time_ms),
            })?;
        Ok(Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Candles in strictly increasing timestamp order with finite prices.
///
/// The series is immutable once built; filters share it read-only.
#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self, SigsweepError> {
        for (i, candle) in candles.iter().enumerate() {
            let prices = [candle.open, candle.high, candle.low, candle.close];
            if prices.iter().any(|p| !p.is_finite()) {
                return Err(SigsweepError::DataOrder {
                    index: i,
                    reason: "missing or non-numeric price".into(),
                });
            }
            if i > 0 {
                let prev = candles[i - 1].timestamp;
                if candle.timestamp == prev {
                    return Err(SigsweepError::DataOrder {
                        index: i,
                        reason: format!("duplicate timestamp {}", candle.timestamp),
                    });
                }
                if candle.timestamp < prev {
                    return Err(SigsweepError::DataOrder {
                        index: i,
                        reason: format!("timestamp {} precedes {}", candle.timestamp, prev),
                    });
                }
            }
        }
        Ok(Self { candles })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.candles.iter().map(|c| c.timestamp).collect()
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}
