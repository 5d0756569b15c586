//! Per-date series export as CSV.
//!
//! One row per aligned date with every intermediate column, so a run can be
//! inspected in a spreadsheet or reloaded elsewhere. Undefined moving averages
//! are written as empty cells.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::domain::error::VolgateError;
use crate::domain::report::{BacktestReport, ReportRow};
use crate::ports::report_port::ReportPort;

#[derive(Debug, Serialize)]
struct SeriesRecord {
    date: String,
    vol: f64,
    vol_ma: Option<f64>,
    desired_exposure: u8,
    position: u8,
    asset_price: f64,
    asset_return: f64,
    trade_cost: f64,
    strategy_return: f64,
    nav_buy_and_hold: f64,
    nav_strategy: f64,
    strategy_drawdown: f64,
}

impl From<&ReportRow> for SeriesRecord {
    fn from(row: &ReportRow) -> Self {
        SeriesRecord {
            date: row.date.format("%Y-%m-%d").to_string(),
            vol: row.vol,
            vol_ma: row.moving_average,
            desired_exposure: u8::from(row.desired_exposure),
            position: u8::from(row.position.is_long()),
            asset_price: row.asset_price,
            asset_return: row.asset_return,
            trade_cost: row.trade_cost,
            strategy_return: row.strategy_return,
            nav_buy_and_hold: row.nav_buy_and_hold,
            nav_strategy: row.nav_strategy,
            strategy_drawdown: row.strategy_drawdown,
        }
    }
}

fn csv_error(e: impl std::fmt::Display) -> VolgateError {
    VolgateError::Io(std::io::Error::other(e.to_string()))
}

/// Serialize every report row, header included.
pub fn export_series_csv(report: &BacktestReport) -> Result<String, VolgateError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in &report.rows {
        wtr.serialize(SeriesRecord::from(row)).map_err(csv_error)?;
    }
    let data = wtr.into_inner().map_err(csv_error)?;
    String::from_utf8(data).map_err(csv_error)
}

pub struct CsvExportAdapter;

impl ReportPort for CsvExportAdapter {
    fn write(&self, report: &BacktestReport, output_path: &Path) -> Result<(), VolgateError> {
        let content = export_series_csv(report)?;
        fs::write(output_path, content)?;
        info!(
            path = %output_path.display(),
            rows = report.rows.len(),
            "series exported"
        );
        Ok(())
    }
}
