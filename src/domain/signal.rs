//! Volatility signal: trailing simple moving average and desired exposure.
//!
//! SMA(W)[t] = mean(VOL[t-W+1..=t]); warmup: first (W-1) rows have no average.
//! desired[t] = VOL[t] < threshold && VOL[t] < SMA(W)[t]; no average => false.

use crate::domain::aligner::AlignedSeries;
use chrono::NaiveDate;

pub const DEFAULT_MA_WINDOW: usize = 5;
pub const DEFAULT_VOL_THRESHOLD: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalRow {
    pub date: NaiveDate,
    pub vol: f64,
    pub moving_average: Option<f64>,
    pub desired_exposure: bool,
}

/// Trailing mean over `window` values ending at each index, `None` during warmup.
pub fn trailing_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let warmup = window - 1;

    (0..values.len())
        .map(|i| {
            if i < warmup {
                None
            } else {
                let slice = &values[i + 1 - window..=i];
                Some(slice.iter().sum::<f64>() / window as f64)
            }
        })
        .collect()
}

fn wants_exposure(vol: f64, moving_average: Option<f64>, threshold: f64) -> bool {
    match moving_average {
        Some(ma) => vol < threshold && vol < ma,
        None => false,
    }
}

pub fn generate_signals(series: &AlignedSeries, window: usize, threshold: f64) -> Vec<SignalRow> {
    let vols = series.vol_values();
    let averages = trailing_mean(&vols, window);

    series
        .rows
        .iter()
        .zip(averages)
        .map(|(row, moving_average)| SignalRow {
            date: row.date,
            vol: row.vol,
            moving_average,
            desired_exposure: wants_exposure(row.vol, moving_average, threshold),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aligner::AlignedRow;
    use approx::assert_relative_eq;

    fn series_from_vol(vols: &[f64]) -> AlignedSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        AlignedSeries {
            rows: vols
                .iter()
                .enumerate()
                .map(|(i, &vol)| AlignedRow {
                    date: start + chrono::Duration::days(i as i64),
                    vol,
                    asset: 100.0,
                })
                .collect(),
        }
    }

    #[test]
    fn trailing_mean_warmup() {
        let means = trailing_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(means[0], None);
        assert_eq!(means[1], None);
        assert_relative_eq!(means[2].unwrap(), 2.0);
        assert_relative_eq!(means[3].unwrap(), 3.0);
        assert_relative_eq!(means[4].unwrap(), 4.0);
    }

    #[test]
    fn trailing_mean_window_one_is_identity() {
        let means = trailing_mean(&[7.0, 8.0], 1);
        assert_eq!(means, vec![Some(7.0), Some(8.0)]);
    }

    #[test]
    fn trailing_mean_window_longer_than_input() {
        let means = trailing_mean(&[1.0, 2.0], 5);
        assert_eq!(means, vec![None, None]);
    }

    #[test]
    fn trailing_mean_zero_window_is_undefined() {
        assert_eq!(trailing_mean(&[1.0, 2.0], 0), vec![None, None]);
    }

    #[test]
    fn signal_scenario_turns_on_with_valid_average() {
        let series = series_from_vol(&[20.0, 20.0, 20.0, 20.0, 10.0, 10.0]);
        let signals = generate_signals(&series, 5, 15.0);

        let desired: Vec<bool> = signals.iter().map(|s| s.desired_exposure).collect();
        assert_eq!(desired, vec![false, false, false, false, true, true]);

        assert!(signals[3].moving_average.is_none());
        assert_relative_eq!(signals[4].moving_average.unwrap(), 18.0);
        assert_relative_eq!(signals[5].moving_average.unwrap(), 16.0);
    }

    #[test]
    fn signal_requires_both_conditions() {
        // Below threshold but above its average: no exposure.
        let series = series_from_vol(&[10.0, 10.0, 12.0]);
        let signals = generate_signals(&series, 2, 15.0);
        assert!(!signals[2].desired_exposure);

        // Below its average but above threshold: no exposure.
        let series = series_from_vol(&[30.0, 30.0, 20.0]);
        let signals = generate_signals(&series, 2, 15.0);
        assert!(!signals[2].desired_exposure);
    }

    #[test]
    fn signal_uses_strict_comparisons() {
        // VOL equal to threshold is not below it.
        let series = series_from_vol(&[16.0, 15.0]);
        let signals = generate_signals(&series, 2, 15.0);
        assert!(!signals[1].desired_exposure);

        // VOL equal to its average is not below it.
        let series = series_from_vol(&[10.0, 10.0]);
        let signals = generate_signals(&series, 2, 15.0);
        assert!(!signals[1].desired_exposure);
    }

    #[test]
    fn signal_keeps_dates_and_vol() {
        let series = series_from_vol(&[20.0, 19.0, 18.0]);
        let signals = generate_signals(&series, 2, 15.0);
        assert_eq!(signals.len(), 3);
        for (signal, row) in signals.iter().zip(&series.rows) {
            assert_eq!(signal.date, row.date);
            assert_eq!(signal.vol, row.vol);
        }
    }
}
