//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::adapters::csv_adapter::CsvCandleAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::grid_csv_adapter::GridCsvAdapter;
use crate::domain::candle::CandleSeries;
use crate::domain::config_validation::{
    build_stream_filters, load_bollinger_settings, load_data_settings, load_grid_config,
    load_macd_settings, load_rsi_settings,
};
use crate::domain::error::SigsweepError;
use crate::domain::filter::{BatchFilter, BollingerFilter, MacdFilter, RsiFilter, Signal};
use crate::domain::grid::{Grid, GridConfig};
use crate::domain::strategy::{allowed_bars, StrategyCombinator};
use crate::domain::weighted::weighted_blend;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::grid_port::GridPort;

#[derive(Parser, Debug)]
#[command(name = "sigsweep", about = "Signal composition and strategy grid search")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enumerate weighted signal combinations into a CSV file
    Grid {
        /// Output CSV path
        output: PathBuf,
        /// Signal names (at least two, distinct)
        #[arg(required = true, num_args = 2..)]
        signals: Vec<String>,
        /// Weight grid step over [0.1, 1.0]
        #[arg(long)]
        step: Option<f64>,
        /// Signals per combination
        #[arg(long)]
        order: Option<usize>,
        /// INI file whose [grid] section supplies defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Compute per-bar batch filter signals
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Stream candles through the configured strategy
    Scan {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Score each bar with one descriptor from a grid file
    Blend {
        #[arg(short, long)]
        config: PathBuf,
        /// Grid CSV written by `grid`
        #[arg(short, long)]
        grid: PathBuf,
        /// Zero-based row of the grid file
        #[arg(long, default_value_t = 0)]
        row: usize,
    },
    /// List symbols available in the configured data directory
    Symbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Installs the stderr log subscriber; `RUST_LOG` overrides the default `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Grid {
            output,
            signals,
            step,
            order,
            config,
        } => run_grid(&output, &signals, step, order, config.as_deref()),
        Command::Signals { config, output } => run_signals(&config, output.as_deref()),
        Command::Scan { config } => run_scan(&config),
        Command::Blend { config, grid, row } => run_blend(&config, &grid, row),
        Command::Symbols { config } => run_symbols(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_grid(
    output: &Path,
    signals: &[String],
    step: Option<f64>,
    order: Option<usize>,
    config_path: Option<&Path>,
) -> Result<(), SigsweepError> {
    let defaults = match config_path {
        Some(path) => load_grid_config(&FileConfigAdapter::from_file(path)?)?,
        None => GridConfig::default(),
    };
    let config = GridConfig {
        step: step.unwrap_or(defaults.step),
        order: order.unwrap_or(defaults.order),
    };

    // validated before the output file is created
    let grid = Grid::new(signals, &config)?;
    info!(
        signals = signals.len(),
        order = config.order,
        weights = grid.weights().len(),
        rows = grid.row_count(),
        "enumerating grid"
    );

    let rows = GridCsvAdapter::new(output).write_grid(&grid)?;
    println!(
        "pairs: {} rows: {} -> {}",
        grid.subset_count(),
        rows,
        output.display()
    );
    Ok(())
}

pub fn load_series(config: &dyn ConfigPort) -> Result<Arc<CandleSeries>, SigsweepError> {
    let data = load_data_settings(config)?;
    let adapter = CsvCandleAdapter::new(data.path);
    Ok(Arc::new(adapter.fetch_candles(&data.symbol)?))
}

/// RSI, MACD and Bollinger batch filters over one shared series.
pub fn build_batch_filters(
    config: &dyn ConfigPort,
    series: &Arc<CandleSeries>,
) -> Result<Vec<Box<dyn BatchFilter>>, SigsweepError> {
    let rsi = load_rsi_settings(config)?;
    let macd = load_macd_settings(config)?;
    let bollinger = load_bollinger_settings(config)?;

    Ok(vec![
        Box::new(RsiFilter::with_bounds(
            Arc::clone(series),
            rsi.period,
            rsi.lower,
            rsi.upper,
        )?),
        Box::new(MacdFilter::new(
            Arc::clone(series),
            macd.short_window,
            macd.long_window,
            macd.signal_window,
        )?),
        Box::new(BollingerFilter::new(
            Arc::clone(series),
            bollinger.window,
            bollinger.num_std,
        )?),
    ])
}

fn run_signals(config_path: &Path, output: Option<&Path>) -> Result<(), SigsweepError> {
    let config = FileConfigAdapter::from_file(config_path)?;
    let series = load_series(&config)?;
    let filters = build_batch_filters(&config, &series)?;

    let refs: Vec<&dyn BatchFilter> = filters.iter().map(|f| f.as_ref()).collect();
    let allowed = allowed_bars(&refs)?;
    let columns: Vec<(&str, Vec<bool>)> = filters
        .iter()
        .map(|f| (f.name(), f.get_signal()))
        .collect();

    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    write_signal_table(sink, &series, &columns, &allowed)?;

    let count = allowed.iter().filter(|&&a| a).count();
    info!(bars = series.len(), allowed = count, "batch signals computed");
    Ok(())
}

/// `timestamp,close,<filter>...,allowed` with one row per bar.
pub fn write_signal_table<W: Write>(
    sink: W,
    series: &CandleSeries,
    columns: &[(&str, Vec<bool>)],
    allowed: &[bool],
) -> Result<(), SigsweepError> {
    let mut wtr = csv::Writer::from_writer(sink);

    let mut header = vec!["timestamp", "close"];
    header.extend(columns.iter().map(|(name, _)| *name));
    header.push("allowed");
    wtr.write_record(&header)?;

    for (i, candle) in series.iter().enumerate() {
        let mut record = vec![candle.timestamp.to_string(), candle.close.to_string()];
        record.extend(columns.iter().map(|(_, s)| s[i].to_string()));
        record.push(allowed[i].to_string());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn run_scan(config_path: &Path) -> Result<(), SigsweepError> {
    let config = FileConfigAdapter::from_file(config_path)?;
    let mut strategy = StrategyCombinator::new(build_stream_filters(&config)?)?;
    let series = load_series(&config)?;
    info!(filters = ?strategy.filter_names(), bars = series.len(), "scanning");

    let (mut buys, mut sells) = (0usize, 0usize);
    let mut out = io::stdout().lock();
    for candle in series.iter() {
        let Some(signal) = strategy.generate_signal(candle) else {
            continue;
        };
        match signal {
            Signal::Buy => buys += 1,
            Signal::Sell => sells += 1,
        }
        writeln!(out, "{} {}", candle.timestamp, signal)?;
    }
    writeln!(out, "bars: {} buy: {} sell: {}", series.len(), buys, sells)?;
    Ok(())
}

fn run_blend(config_path: &Path, grid_path: &Path, row: usize) -> Result<(), SigsweepError> {
    let descriptors = GridCsvAdapter::new(grid_path).read_grid()?;
    let descriptor = descriptors.get(row).ok_or_else(|| {
        SigsweepError::invalid_argument(format!(
            "row {} is out of range ({} rows in {})",
            row,
            descriptors.len(),
            grid_path.display()
        ))
    })?;

    let config = FileConfigAdapter::from_file(config_path)?;
    let series = load_series(&config)?;
    let signals: HashMap<String, Vec<bool>> = build_batch_filters(&config, &series)?
        .iter()
        .map(|f| (f.name().to_string(), f.get_signal()))
        .collect();

    let scores = weighted_blend(descriptor, &signals)?;
    info!(descriptor = %descriptor, bars = scores.len(), "blended");

    let mut wtr = csv::Writer::from_writer(io::stdout().lock());
    wtr.write_record(["timestamp", "score"])?;
    for (candle, score) in series.iter().zip(&scores) {
        wtr.write_record([candle.timestamp.to_string(), score.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

fn run_symbols(config_path: &Path) -> Result<(), SigsweepError> {
    let config = FileConfigAdapter::from_file(config_path)?;
    let data = load_data_settings(&config)?;
    let symbols = CsvCandleAdapter::new(data.path).list_symbols()?;

    if symbols.is_empty() {
        eprintln!("No symbols found");
        return Ok(());
    }
    let mut out = io::stdout().lock();
    for symbol in &symbols {
        writeln!(out, "{}", symbol)?;
    }
    Ok(())
}
