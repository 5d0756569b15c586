//! Backtest configuration and the pipeline entry points.
//!
//! Aligner -> signal -> position -> returns/NAV -> metrics -> report. Each
//! stage consumes the previous stage's output and nothing else.

use chrono::NaiveDate;
use tracing::info;

use crate::domain::aligner::{self, ResampleFrequency};
use crate::domain::config_validation::validate_backtest_config;
use crate::domain::error::VolgateError;
use crate::domain::position::{construct_positions, TradeStats};
use crate::domain::price::{Instrument, PricePoint};
use crate::domain::report::{self, BacktestReport};
use crate::domain::returns::simulate;
use crate::domain::signal::{generate_signals, DEFAULT_MA_WINDOW, DEFAULT_VOL_THRESHOLD};
use crate::ports::data_port::DataPort;

pub const DEFAULT_VOL_SYMBOL: &str = "^VIX";
pub const DEFAULT_ASSET_SYMBOL: &str = "UPRO";

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub vol_symbol: String,
    pub asset_symbol: String,
    pub vol_threshold: f64,
    pub ma_window: usize,
    /// Proportional cost charged once per entry or exit.
    pub trade_cost_rate: f64,
    pub risk_free_rate: f64,
    pub resample: ResampleFrequency,
}

impl BacktestConfig {
    /// Config over `[start_date, end_date]` with every other tunable at its default.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            vol_symbol: DEFAULT_VOL_SYMBOL.to_string(),
            asset_symbol: DEFAULT_ASSET_SYMBOL.to_string(),
            vol_threshold: DEFAULT_VOL_THRESHOLD,
            ma_window: DEFAULT_MA_WINDOW,
            trade_cost_rate: 0.0,
            risk_free_rate: 0.0,
            resample: ResampleFrequency::Daily,
        }
    }

    pub fn periods_per_year(&self) -> f64 {
        self.resample.periods_per_year()
    }

    pub fn symbol(&self, instrument: Instrument) -> &str {
        match instrument {
            Instrument::VolIndex => &self.vol_symbol,
            Instrument::LeveragedAsset => &self.asset_symbol,
        }
    }
}

/// Run the full pipeline over already-fetched closes.
pub fn run_backtest(
    vol: &[PricePoint],
    asset: &[PricePoint],
    config: &BacktestConfig,
) -> Result<BacktestReport, VolgateError> {
    validate_backtest_config(config)?;

    let series = aligner::align(
        vol,
        asset,
        &config.vol_symbol,
        &config.asset_symbol,
        config.ma_window,
        config.resample,
    )?;

    let signals = generate_signals(&series, config.ma_window, config.vol_threshold);
    let positions = construct_positions(&signals);
    let simulation = simulate(&series, &positions, config.trade_cost_rate);

    let stats = TradeStats::compute(&positions);
    info!(
        rows = series.len(),
        trades = stats.total_trades,
        days_in_market = stats.days_in_market,
        "simulation complete"
    );

    Ok(report::assemble(config, &series, &signals, &simulation, stats))
}

/// Validate, fetch both series from `data_port` and run the pipeline.
pub fn fetch_and_run(
    data_port: &dyn DataPort,
    config: &BacktestConfig,
) -> Result<BacktestReport, VolgateError> {
    validate_backtest_config(config)?;

    let mut fetched = Vec::with_capacity(2);
    for instrument in [Instrument::VolIndex, Instrument::LeveragedAsset] {
        let symbol = config.symbol(instrument);
        let points = data_port.fetch_closes(symbol, config.start_date, config.end_date)?;
        info!(
            %instrument,
            symbol,
            points = points.len(),
            "fetched closes from {} to {}",
            config.start_date,
            config.end_date
        );
        fetched.push(points);
    }

    run_backtest(&fetched[0], &fetched[1], config)
}
