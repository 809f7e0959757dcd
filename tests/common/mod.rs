#![allow(dead_code)]

use sigsweep::domain::candle::{Candle, CandleSeries};
use sigsweep::domain::error::SigsweepError;
use sigsweep::ports::data_port::DataPort;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

pub const START_MS: i64 = 1_704_067_200_000;
pub const FIVE_MIN_MS: i64 = 300_000;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_candles(&self, symbol: &str) -> Result<CandleSeries, SigsweepError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SigsweepError::Data {
                reason: reason.clone(),
            });
        }
        CandleSeries::new(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigsweepError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn make_candle(index: usize, close: f64) -> Candle {
    Candle::from_millis(
        START_MS + index as i64 * FIVE_MIN_MS,
        close,
        close * 1.01,
        close * 0.99,
        close,
        100.0,
    )
    .unwrap()
}

pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_candle(i, c))
        .collect()
}

pub fn series_from_closes(closes: &[f64]) -> CandleSeries {
    CandleSeries::new(candles_from_closes(closes)).unwrap()
}

/// Oscillating closes with a slow drift: RSI visits both extremes.
pub fn wave_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + 8.0 * (t / 6.0).sin() + 3.0 * (t / 2.3).cos() + 0.05 * t
        })
        .collect()
}

/// Writes `closes` as a headerless kline file `<dir>/<name>`.
pub fn write_kline_file(dir: &Path, name: &str, first_index: usize, closes: &[f64]) {
    let mut content = String::new();
    for (i, close) in closes.iter().enumerate() {
        let open_time = START_MS + (first_index + i) as i64 * FIVE_MIN_MS;
        content.push_str(&format!(
            "{},{},{},{},{},100.0,{},0,0,0,0,0\n",
            open_time,
            close,
            close * 1.01,
            close * 0.99,
            close,
            open_time + FIVE_MIN_MS - 1
        ));
    }
    fs::write(dir.join(name), content).unwrap();
}

pub fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("sigsweep.ini");
    fs::write(&path, body).unwrap();
    path
}

pub fn exit_code_is(code: ExitCode, expected: u8) -> bool {
    format!("{:?}", code) == format!("{:?}", ExitCode::from(expected))
}
