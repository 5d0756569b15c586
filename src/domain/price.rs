//! Raw closing-price observations as delivered by a data port.

use chrono::NaiveDate;
use std::fmt;

/// The two series the rule is evaluated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    VolIndex,
    LeveragedAsset,
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::VolIndex => write!(f, "VOL_INDEX"),
            Instrument::LeveragedAsset => write!(f, "LEVERAGED_ASSET"),
        }
    }
}

/// A single daily close. `value` is `None` when the source reported the day
/// without a usable price (holiday row, delisting gap, blank cell).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl PricePoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value: Some(value),
        }
    }

    pub fn missing(date: NaiveDate) -> Self {
        Self { date, value: None }
    }

    /// The close if present, finite and positive. A zero or negative close
    /// cannot anchor a period return, so it counts as missing.
    pub fn usable_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite() && *v > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn usable_value_present() {
        let p = PricePoint::new(day(2), 17.5);
        assert_eq!(p.usable_value(), Some(17.5));
    }

    #[test]
    fn usable_value_rejects_missing_and_nan() {
        assert_eq!(PricePoint::missing(day(2)).usable_value(), None);
        assert_eq!(PricePoint::new(day(2), f64::NAN).usable_value(), None);
        assert_eq!(PricePoint::new(day(2), f64::INFINITY).usable_value(), None);
    }

    #[test]
    fn usable_value_rejects_non_positive() {
        assert_eq!(PricePoint::new(day(2), 0.0).usable_value(), None);
        assert_eq!(PricePoint::new(day(2), -3.0).usable_value(), None);
        assert_eq!(PricePoint::new(day(2), 1e-9).usable_value(), Some(1e-9));
    }

    #[test]
    fn instrument_display() {
        assert_eq!(Instrument::VolIndex.to_string(), "VOL_INDEX");
        assert_eq!(Instrument::LeveragedAsset.to_string(), "LEVERAGED_ASSET");
    }
}
