//! Configuration validation.
//!
//! Reads every filter/grid section through [`ConfigPort`], applies defaults and rejects
//! bad values before any candle is processed.

use crate::domain::error::SigsweepError;
use crate::domain::filter::{
    bollinger, rsi, trend, CandleFilter, MacdCrossFilter, RsiStreamFilter, TrendFilter,
};
use crate::domain::grid::{GridConfig, DEFAULT_ORDER, DEFAULT_STEP};
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const DEFAULT_STREAM_FILTERS: &str = "rsi";

#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub path: PathBuf,
    pub symbol: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiSettings {
    pub period: usize,
    pub lower: f64,
    pub upper: f64,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdSettings {
    pub short_window: usize,
    pub long_window: usize,
    pub signal_window: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerSettings {
    pub window: usize,
    pub num_std: f64,
}

pub fn load_data_settings(config: &dyn ConfigPort) -> Result<DataSettings, SigsweepError> {
    let path = required_string(config, "data", "path")?;
    let symbol = required_string(config, "data", "symbol")?;
    Ok(DataSettings {
        path: PathBuf::from(path),
        symbol,
    })
}

pub fn load_rsi_settings(config: &dyn ConfigPort) -> Result<RsiSettings, SigsweepError> {
    let settings = RsiSettings {
        period: positive_int(config, "rsi", "period", rsi::DEFAULT_PERIOD)?,
        lower: percent(config, "rsi", "lower", rsi::DEFAULT_LOWER)?,
        upper: percent(config, "rsi", "upper", rsi::DEFAULT_UPPER)?,
        buy_threshold: percent(config, "rsi", "buy_threshold", rsi::DEFAULT_LOWER)?,
        sell_threshold: percent(config, "rsi", "sell_threshold", rsi::DEFAULT_UPPER)?,
    };
    if settings.lower >= settings.upper {
        return Err(invalid("rsi", "lower", "lower must be below upper"));
    }
    if settings.buy_threshold >= settings.sell_threshold {
        return Err(invalid(
            "rsi",
            "buy_threshold",
            "buy_threshold must be below sell_threshold",
        ));
    }
    Ok(settings)
}

pub fn load_macd_settings(config: &dyn ConfigPort) -> Result<MacdSettings, SigsweepError> {
    let settings = MacdSettings {
        short_window: positive_int(config, "macd", "short_window", DEFAULT_FAST)?,
        long_window: positive_int(config, "macd", "long_window", DEFAULT_SLOW)?,
        signal_window: positive_int(config, "macd", "signal_window", DEFAULT_SIGNAL)?,
    };
    if settings.long_window <= settings.short_window {
        return Err(invalid(
            "macd",
            "long_window",
            "long_window must be greater than short_window",
        ));
    }
    Ok(settings)
}

pub fn load_bollinger_settings(
    config: &dyn ConfigPort,
) -> Result<BollingerSettings, SigsweepError> {
    let window = positive_int(config, "bollinger", "window", bollinger::DEFAULT_WINDOW)?;
    if window < 2 {
        return Err(invalid("bollinger", "window", "window must be at least 2"));
    }
    let num_std = config.get_double("bollinger", "num_std", bollinger::DEFAULT_NUM_STD);
    if !num_std.is_finite() || num_std <= 0.0 {
        return Err(invalid("bollinger", "num_std", "num_std must be positive"));
    }
    Ok(BollingerSettings { window, num_std })
}

pub fn load_trend_period(config: &dyn ConfigPort) -> Result<usize, SigsweepError> {
    positive_int(config, "trend", "period", trend::DEFAULT_PERIOD)
}

pub fn load_grid_config(config: &dyn ConfigPort) -> Result<GridConfig, SigsweepError> {
    let step = config.get_double("grid", "step", DEFAULT_STEP);
    if !step.is_finite() || step <= 0.0 {
        return Err(invalid("grid", "step", "step must be positive"));
    }
    let order = positive_int(config, "grid", "order", DEFAULT_ORDER)?;
    if order < 2 {
        return Err(invalid("grid", "order", "order must be at least 2"));
    }
    Ok(GridConfig { step, order })
}

/// Names listed under `[strategy] filters`, lower-cased, in order.
pub fn stream_filter_names(config: &dyn ConfigPort) -> Result<Vec<String>, SigsweepError> {
    let raw = config
        .get_string("strategy", "filters")
        .unwrap_or_else(|| DEFAULT_STREAM_FILTERS.to_string());
    let names: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        return Err(invalid("strategy", "filters", "at least one filter is required"));
    }
    Ok(names)
}

/// Builds the streaming filters named in `[strategy] filters` from their sections.
pub fn build_stream_filters(
    config: &dyn ConfigPort,
) -> Result<Vec<Box<dyn CandleFilter>>, SigsweepError> {
    let mut filters: Vec<Box<dyn CandleFilter>> = Vec::new();
    for name in stream_filter_names(config)? {
        let filter: Box<dyn CandleFilter> = match name.as_str() {
            "rsi" => {
                let s = load_rsi_settings(config)?;
                Box::new(RsiStreamFilter::with_thresholds(
                    s.period,
                    s.buy_threshold,
                    s.sell_threshold,
                )?)
            }
            "macd" => {
                let s = load_macd_settings(config)?;
                Box::new(MacdCrossFilter::new(
                    s.short_window,
                    s.long_window,
                    s.signal_window,
                )?)
            }
            "trend" => Box::new(TrendFilter::new(load_trend_period(config)?)?),
            other => {
                return Err(invalid(
                    "strategy",
                    "filters",
                    &format!("unknown filter '{}' (expected rsi, macd or trend)", other),
                ));
            }
        };
        filters.push(filter);
    }
    Ok(filters)
}

fn required_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, SigsweepError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(SigsweepError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, SigsweepError> {
    let value = config.get_int(section, key, default as i64);
    if value <= 0 {
        return Err(invalid(section, key, &format!("{} must be positive", key)));
    }
    usize::try_from(value).map_err(|_| invalid(section, key, "value is too large"))
}

fn percent(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SigsweepError> {
    let value = config.get_double(section, key, default);
    if !(0.0..=100.0).contains(&value) {
        return Err(invalid(
            section,
            key,
            &format!("{} must be between 0 and 100", key),
        ));
    }
    Ok(value)
}

fn invalid(section: &str, key: &str, reason: &str) -> SigsweepError {
    SigsweepError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
