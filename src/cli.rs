//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::console_report::{self, DEFAULT_TAIL_ROWS};
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_export::CsvExportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::typst_report::TypstReportAdapter;
use crate::domain::aligner::ResampleFrequency;
use crate::domain::backtest::{self, BacktestConfig, DEFAULT_ASSET_SYMBOL, DEFAULT_VOL_SYMBOL};
use crate::domain::config_validation::validate_backtest_config;
use crate::domain::error::VolgateError;
use crate::domain::price::Instrument;
use crate::domain::signal::{DEFAULT_MA_WINDOW, DEFAULT_VOL_THRESHOLD};
use crate::ports::config_port::{parse_value, ConfigPort};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_START_DATE: &str = "2010-01-01";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Parser, Debug)]
#[command(
    name = "volgate",
    about = "Volatility-gated leveraged equity backtester"
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Typst report path (overrides [report] typst_output)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Per-date CSV export path (overrides [report] csv_output)
        #[arg(long)]
        export: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the stored data range of both symbols
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Install the global stderr subscriber. Safe to call more than once.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "volgate=debug" } else { "volgate=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            output,
            export,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest(&config, output, export)
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { config } => run_info(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, VolgateError> {
    info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

fn parse_date(key: &str, raw: &str) -> Result<NaiveDate, VolgateError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        VolgateError::invalid(
            "backtest",
            key,
            format!("invalid date '{}' (expected YYYY-MM-DD)", raw.trim()),
        )
    })
}

/// Build and validate the `[backtest]` section.
pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, VolgateError> {
    let start_raw = adapter
        .get_string("backtest", "start_date")
        .unwrap_or_else(|| DEFAULT_START_DATE.to_string());
    let start_date = parse_date("start_date", &start_raw)?;

    let end_date = match adapter.get_string("backtest", "end_date") {
        Some(raw) => parse_date("end_date", &raw)?,
        None => chrono::Local::now().date_naive(),
    };

    let resample = match adapter.get_string("backtest", "resample") {
        Some(raw) => ResampleFrequency::from_str(&raw)
            .map_err(|reason| VolgateError::invalid("backtest", "resample", reason))?,
        None => ResampleFrequency::Daily,
    };

    let config = BacktestConfig {
        start_date,
        end_date,
        vol_symbol: adapter
            .get_string("backtest", "vol_symbol")
            .unwrap_or_else(|| DEFAULT_VOL_SYMBOL.to_string()),
        asset_symbol: adapter
            .get_string("backtest", "asset_symbol")
            .unwrap_or_else(|| DEFAULT_ASSET_SYMBOL.to_string()),
        vol_threshold: parse_value(adapter, "backtest", "vol_threshold", DEFAULT_VOL_THRESHOLD)?,
        ma_window: parse_value(adapter, "backtest", "ma_window", DEFAULT_MA_WINDOW)?,
        trade_cost_rate: parse_value(adapter, "backtest", "trade_cost_rate", 0.0)?,
        risk_free_rate: parse_value(adapter, "backtest", "risk_free_rate", 0.0)?,
        resample,
    };

    validate_backtest_config(&config)?;
    Ok(config)
}

/// Output settings from `[report]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub typst_output: Option<PathBuf>,
    pub csv_output: Option<PathBuf>,
    pub template_path: Option<PathBuf>,
    pub tail_rows: usize,
}

pub fn build_report_settings(adapter: &dyn ConfigPort) -> Result<ReportSettings, VolgateError> {
    Ok(ReportSettings {
        typst_output: adapter.get_string("report", "typst_output").map(PathBuf::from),
        csv_output: adapter.get_string("report", "csv_output").map(PathBuf::from),
        template_path: adapter.get_string("report", "template_path").map(PathBuf::from),
        tail_rows: parse_value(adapter, "report", "tail_rows", DEFAULT_TAIL_ROWS)?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Csv,
    Sqlite,
}

pub fn data_source(adapter: &dyn ConfigPort) -> Result<DataSource, VolgateError> {
    match adapter
        .get_string("data", "source")
        .map(|s| s.to_lowercase())
        .as_deref()
    {
        None | Some("csv") => Ok(DataSource::Csv),
        Some("sqlite") => Ok(DataSource::Sqlite),
        Some(other) => Err(VolgateError::invalid(
            "data",
            "source",
            format!("unknown data source '{}' (expected csv or sqlite)", other),
        )),
    }
}

#[cfg(feature = "sqlite")]
fn sqlite_port(adapter: &dyn ConfigPort) -> Result<Box<dyn DataPort>, VolgateError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    Ok(Box::new(SqliteAdapter::from_config(adapter)?))
}

#[cfg(not(feature = "sqlite"))]
fn sqlite_port(_adapter: &dyn ConfigPort) -> Result<Box<dyn DataPort>, VolgateError> {
    Err(VolgateError::invalid(
        "data",
        "source",
        "sqlite feature is required for source = sqlite",
    ))
}

pub fn build_data_port(adapter: &dyn ConfigPort) -> Result<Box<dyn DataPort>, VolgateError> {
    match data_source(adapter)? {
        DataSource::Csv => {
            let dir = adapter
                .get_string("csv", "dir")
                .ok_or_else(|| VolgateError::ConfigMissing {
                    section: "csv".into(),
                    key: "dir".into(),
                })?;
            info!(dir = %dir, "reading closes from csv");
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        DataSource::Sqlite => sqlite_port(adapter),
    }
}

/// Human-readable dump of the resolved run parameters.
pub fn describe_config(config: &BacktestConfig, settings: &ReportSettings) -> String {
    let path_or_none = |p: &Option<PathBuf>| {
        p.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    };

    let mut out = String::new();
    let _ = writeln!(out, "start_date:      {}", config.start_date);
    let _ = writeln!(out, "end_date:        {}", config.end_date);
    let _ = writeln!(out, "vol_symbol:      {}", config.vol_symbol);
    let _ = writeln!(out, "asset_symbol:    {}", config.asset_symbol);
    let _ = writeln!(out, "vol_threshold:   {}", config.vol_threshold);
    let _ = writeln!(out, "ma_window:       {}", config.ma_window);
    let _ = writeln!(out, "trade_cost_rate: {}", config.trade_cost_rate);
    let _ = writeln!(out, "risk_free_rate:  {}", config.risk_free_rate);
    let _ = writeln!(
        out,
        "resample:        {} ({} periods/year)",
        config.resample,
        config.periods_per_year()
    );
    let _ = writeln!(out, "typst_output:    {}", path_or_none(&settings.typst_output));
    let _ = writeln!(out, "csv_output:      {}", path_or_none(&settings.csv_output));
    let _ = writeln!(out, "template_path:   {}", path_or_none(&settings.template_path));
    let _ = writeln!(out, "tail_rows:       {}", settings.tail_rows);
    out
}

fn run_backtest(
    config_path: &Path,
    output_override: Option<PathBuf>,
    export_override: Option<PathBuf>,
) -> Result<(), VolgateError> {
    let adapter = load_config(config_path)?;
    let config = build_backtest_config(&adapter)?;
    let mut settings = build_report_settings(&adapter)?;
    if output_override.is_some() {
        settings.typst_output = output_override;
    }
    if export_override.is_some() {
        settings.csv_output = export_override;
    }

    let data_port = build_data_port(&adapter)?;
    let report = backtest::fetch_and_run(data_port.as_ref(), &config)?;

    print!("{}", console_report::render(&report, settings.tail_rows));

    if let Some(path) = &settings.typst_output {
        TypstReportAdapter::new(settings.template_path.clone()).write(&report, path)?;
        eprintln!("Report written to: {}", path.display());
    }
    if let Some(path) = &settings.csv_output {
        CsvExportAdapter.write(&report, path)?;
        eprintln!("Series exported to: {}", path.display());
    }

    Ok(())
}

pub fn run_dry_run(config_path: &Path) -> Result<(), VolgateError> {
    let adapter = load_config(config_path)?;
    let config = build_backtest_config(&adapter)?;
    let settings = build_report_settings(&adapter)?;
    let source = data_source(&adapter)?;

    print!("{}", describe_config(&config, &settings));
    println!("data_source:     {:?}", source);
    eprintln!("Dry run complete: configuration is valid");
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), VolgateError> {
    let adapter = load_config(config_path)?;
    build_backtest_config(&adapter)?;
    build_report_settings(&adapter)?;
    data_source(&adapter)?;
    eprintln!("Configuration is valid.");
    Ok(())
}

fn run_info(config_path: &Path) -> Result<(), VolgateError> {
    let adapter = load_config(config_path)?;
    let config = build_backtest_config(&adapter)?;
    let data_port = build_data_port(&adapter)?;

    for instrument in [Instrument::VolIndex, Instrument::LeveragedAsset] {
        let symbol = config.symbol(instrument);
        match data_port.get_data_range(symbol)? {
            Some((first, last, count)) => {
                println!("{symbol} ({instrument}): {count} closes, {first} to {last}")
            }
            None => warn!(symbol, %instrument, "no data found"),
        }
    }
    Ok(())
}
