//! CSV file data adapter.
//!
//! One file per symbol under a base directory, named after the symbol with
//! anything but `[A-Za-z0-9._-]` stripped (`^VIX` -> `VIX.csv`). The file needs
//! a header row with `date` and `close` columns (case-insensitive, other
//! columns ignored). Blank, `null` and `nan` closes are read as missing.

use crate::domain::error::VolgateError;
use crate::domain::price::PricePoint;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn file_stem(symbol: &str) -> String {
        symbol
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            .collect()
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.csv", Self::file_stem(symbol)))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<PricePoint>, VolgateError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| VolgateError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| VolgateError::DataSource {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| VolgateError::DataSource {
                    reason: format!("missing {} column in {}", name, path.display()),
                })
        };
        let date_col = column("date")?;
        let close_col = column("close")?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| VolgateError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_col).unwrap_or_default().trim();
            // yfinance exports carry a time suffix; only the day matters.
            let day = date_str.get(..10).unwrap_or(date_str);
            let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
                VolgateError::DataSource {
                    reason: format!("invalid date '{}': {}", date_str, e),
                }
            })?;

            let close_str = record.get(close_col).unwrap_or_default().trim();
            let value = parse_close(close_str)?;

            points.push(PricePoint { date, value });
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

fn parse_close(raw: &str) -> Result<Option<f64>, VolgateError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|e| VolgateError::DataSource {
            reason: format!("invalid close value '{}': {}", raw, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, VolgateError> {
        let points = self.read_all(symbol)?;
        Ok(points
            .into_iter()
            .filter(|p| p.date >= start_date && p.date <= end_date)
            .collect())
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, VolgateError> {
        if !self.csv_path(symbol).exists() {
            return Ok(None);
        }
        let points = self.read_all(symbol)?;
        match (points.first(), points.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, points.len()))),
            _ => Ok(None),
        }
    }
}
