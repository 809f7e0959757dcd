//! Exchange kline CSV data adapter.
//!
//! A symbol's history is split across monthly files (`BTCUSDT-5m-2024-01.csv`, ...).
//! Every file whose name starts with the requested prefix is read in file-name order,
//! rows are concatenated, sorted by open time and validated by [`CandleSeries::new`].

use crate::domain::candle::{Candle, CandleSeries};
use crate::domain::error::SigsweepError;
use crate::ports::data_port::DataPort;
use csv::StringRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct CsvCandleAdapter {
    base_path: PathBuf,
}

impl CsvCandleAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_files(&self) -> Result<Vec<PathBuf>, SigsweepError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SigsweepError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_file(path: &Path, candles: &mut Vec<Candle>) -> Result<(), SigsweepError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            if row == 0 && is_header(&record) {
                continue;
            }
            candles.push(parse_kline(&record).map_err(|reason| SigsweepError::Data {
                reason: format!("{} row {}: {}", path.display(), row + 1, reason),
            })?);
        }
        Ok(())
    }
}

fn is_header(record: &StringRecord) -> bool {
    record.get(0).is_some_and(|f| f.parse::<i64>().is_err())
}

fn field<'r>(record: &'r StringRecord, idx: usize, name: &str) -> Result<&'r str, String> {
    record
        .get(idx)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| format!("missing {} column", name))
}

fn number(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    field(record, idx, name)?
        .parse::<f64>()
        .map_err(|e| format!("invalid {} value: {}", name, e))
}

fn parse_kline(record: &StringRecord) -> Result<Candle, String> {
    let open_time: i64 = field(record, 0, "open time")?
        .parse()
        .map_err(|e| format!("invalid open time: {}", e))?;

    Candle::from_millis(
        open_time,
        number(record, 1, "open")?,
        number(record, 2, "high")?,
        number(record, 3, "low")?,
        number(record, 4, "close")?,
        number(record, 5, "volume")?,
    )
    .map_err(|e| e.to_string())
}

impl DataPort for CsvCandleAdapter {
    fn fetch_candles(&self, symbol: &str) -> Result<CandleSeries, SigsweepError> {
        let files: Vec<PathBuf> = self
            .csv_files()?
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with(symbol))
            })
            .collect();

        if files.is_empty() {
            return Err(SigsweepError::Data {
                reason: format!(
                    "no csv files for '{}' in {}",
                    symbol,
                    self.base_path.display()
                ),
            });
        }

        let mut candles = Vec::new();
        for path in &files {
            let before = candles.len();
            Self::read_file(path, &mut candles)?;
            debug!(file = %path.display(), rows = candles.len() - before, "loaded kline file");
        }

        candles.sort_by_key(|c| c.timestamp);
        info!(symbol, files = files.len(), candles = candles.len(), "loaded candles");
        CandleSeries::new(candles)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigsweepError> {
        let mut symbols: Vec<String> = self
            .csv_files()?
            .iter()
            .filter_map(|p| p.file_stem())
            .map(|stem| {
                let stem = stem.to_string_lossy();
                stem.split('-').next().unwrap_or_default().to_string()
            })
            .filter(|s| !s.is_empty())
            .collect();

        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }
}
