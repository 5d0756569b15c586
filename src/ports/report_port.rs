//! Report output port trait.

use crate::domain::error::VolgateError;
use crate::domain::report::BacktestReport;
use std::path::Path;

/// Port for writing a finished backtest report somewhere durable.
pub trait ReportPort {
    fn write(&self, report: &BacktestReport, output_path: &Path) -> Result<(), VolgateError>;
}
