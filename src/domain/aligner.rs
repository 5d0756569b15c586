//! Time-series alignment: inner join of the volatility and asset closes on date.
//!
//! Rows with a missing or non-finite value on either side are dropped, never
//! forward-filled. An optional resampling step keeps the last row of every
//! week or month.

use crate::domain::error::VolgateError;
use crate::domain::price::PricePoint;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DAILY_PERIODS_PER_YEAR: f64 = 252.0;
pub const WEEKLY_PERIODS_PER_YEAR: f64 = 52.0;
pub const MONTHLY_PERIODS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleFrequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl ResampleFrequency {
    pub fn periods_per_year(self) -> f64 {
        match self {
            ResampleFrequency::Daily => DAILY_PERIODS_PER_YEAR,
            ResampleFrequency::Weekly => WEEKLY_PERIODS_PER_YEAR,
            ResampleFrequency::Monthly => MONTHLY_PERIODS_PER_YEAR,
        }
    }

    /// Key identifying the resampling bucket a date falls in.
    fn bucket(self, date: NaiveDate) -> (i32, u32) {
        match self {
            ResampleFrequency::Daily => (date.year(), date.ordinal()),
            ResampleFrequency::Weekly => {
                let week = date.iso_week();
                (week.year(), week.week())
            }
            ResampleFrequency::Monthly => (date.year(), date.month()),
        }
    }
}

impl FromStr for ResampleFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "daily" | "d" => Ok(ResampleFrequency::Daily),
            "weekly" | "w" => Ok(ResampleFrequency::Weekly),
            "monthly" | "m" => Ok(ResampleFrequency::Monthly),
            other => Err(format!(
                "unknown frequency '{}' (expected none, daily, weekly or monthly)",
                other
            )),
        }
    }
}

impl fmt::Display for ResampleFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResampleFrequency::Daily => write!(f, "daily"),
            ResampleFrequency::Weekly => write!(f, "weekly"),
            ResampleFrequency::Monthly => write!(f, "monthly"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub vol: f64,
    pub asset: f64,
}

/// Date-ordered rows with both closes present. Dates are strictly increasing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedSeries {
    pub rows: Vec<AlignedRow>,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn vol_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.vol).collect()
    }

    pub fn asset_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.asset).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Keep the last row of every bucket. Daily is the identity.
    pub fn resample(&self, frequency: ResampleFrequency) -> AlignedSeries {
        if frequency == ResampleFrequency::Daily {
            return self.clone();
        }

        let mut rows: Vec<AlignedRow> = Vec::new();
        let mut current: Option<(i32, u32)> = None;
        for row in &self.rows {
            let bucket = frequency.bucket(row.date);
            match current {
                Some(b) if b == bucket => {
                    if let Some(last) = rows.last_mut() {
                        *last = *row;
                    }
                }
                _ => {
                    rows.push(*row);
                    current = Some(bucket);
                }
            }
        }
        AlignedSeries { rows }
    }
}

fn usable_by_date(points: &[PricePoint]) -> BTreeMap<NaiveDate, f64> {
    let mut by_date = BTreeMap::new();
    for point in points {
        match point.usable_value() {
            Some(v) => {
                by_date.insert(point.date, v);
            }
            None => {
                by_date.remove(&point.date);
            }
        }
    }
    by_date
}

/// Inner-join two close series on date, dropping any row with a missing value.
pub fn join(vol: &[PricePoint], asset: &[PricePoint]) -> AlignedSeries {
    let vol_by_date = usable_by_date(vol);
    let asset_by_date = usable_by_date(asset);

    let rows = vol_by_date
        .iter()
        .filter_map(|(date, &v)| {
            asset_by_date.get(date).map(|&a| AlignedRow {
                date: *date,
                vol: v,
                asset: a,
            })
        })
        .collect();

    AlignedSeries { rows }
}

/// Minimum aligned rows for a moving average, its one-period lag and at
/// least one comparison period.
pub fn minimum_rows(ma_window: usize) -> usize {
    ma_window + 2
}

/// Join, optionally resample and check there is enough history for the
/// signal. Symbols are only used for error messages.
pub fn align(
    vol: &[PricePoint],
    asset: &[PricePoint],
    vol_symbol: &str,
    asset_symbol: &str,
    ma_window: usize,
    frequency: ResampleFrequency,
) -> Result<AlignedSeries, VolgateError> {
    if vol.iter().all(|p| p.usable_value().is_none()) {
        return Err(VolgateError::NoData {
            symbol: vol_symbol.to_string(),
        });
    }
    if asset.iter().all(|p| p.usable_value().is_none()) {
        return Err(VolgateError::NoData {
            symbol: asset_symbol.to_string(),
        });
    }

    let joined = join(vol, asset);
    if joined.is_empty() {
        return Err(VolgateError::NoOverlap {
            vol_symbol: vol_symbol.to_string(),
            asset_symbol: asset_symbol.to_string(),
        });
    }

    tracing::debug!(
        vol_points = vol.len(),
        asset_points = asset.len(),
        rows = joined.len(),
        "aligned {} and {}",
        vol_symbol,
        asset_symbol
    );

    let series = joined.resample(frequency);
    if frequency != ResampleFrequency::Daily {
        tracing::info!(
            frequency = %frequency,
            before = joined.len(),
            after = series.len(),
            "resampled aligned series"
        );
    }

    let minimum = minimum_rows(ma_window);
    if series.len() < minimum {
        return Err(VolgateError::InsufficientData {
            rows: series.len(),
            minimum,
        });
    }

    Ok(series)
}
