#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
use volgate::domain::backtest::BacktestConfig;
use volgate::domain::error::VolgateError;
pub use volgate::domain::price::PricePoint;
use volgate::ports::data_port::DataPort;

pub const VOL: &str = "^VIX";
pub const ASSET: &str = "UPRO";

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_points(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), points);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, VolgateError> {
        self.requests
            .borrow_mut()
            .push((symbol.to_string(), start_date, end_date));
        if let Some(reason) = self.errors.get(symbol) {
            return Err(VolgateError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, VolgateError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(VolgateError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(points) if !points.is_empty() => {
                let min = points.iter().map(|p| p.date).min().unwrap();
                let max = points.iter().map(|p| p.date).max().unwrap();
                Ok(Some((min, max, points.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Consecutive weekdays starting at `start` (weekends skipped).
pub fn weekdays(start: &str, n: usize) -> Vec<NaiveDate> {
    use chrono::Datelike;
    let mut out = Vec::with_capacity(n);
    let mut d = date(start);
    while out.len() < n {
        if d.weekday().num_days_from_monday() < 5 {
            out.push(d);
        }
        d = d.succ_opt().unwrap();
    }
    out
}

pub fn points(dates: &[NaiveDate], values: &[f64]) -> Vec<PricePoint> {
    dates
        .iter()
        .zip(values)
        .map(|(&d, &v)| PricePoint::new(d, v))
        .collect()
}

/// Asset path compounding the given per-period returns from 100.
pub fn prices_from_returns(returns: &[f64]) -> Vec<f64> {
    let mut price = 100.0;
    let mut out = vec![price];
    for r in returns {
        price *= 1.0 + r;
        out.push(price);
    }
    out
}

pub fn make_config(start: &str, end: &str) -> BacktestConfig {
    BacktestConfig::new(date(start), date(end))
}
