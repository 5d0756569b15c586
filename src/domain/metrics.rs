//! Performance metrics and statistics.
//!
//! Every metric that can be undefined is an `Option`: too few observations,
//! a non-finite annualization or zero volatility yield `None`, never 0 or inf.

use super::returns::NavSeries;
use chrono::NaiveDate;

/// Deepest peak-to-trough decline of a NAV curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawdown {
    /// Fraction in [-1, 0].
    pub max_drawdown: f64,
    /// Date of the peak the trough fell from.
    pub start: NaiveDate,
    /// Date of the trough.
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub final_nav: f64,
    pub total_return: f64,
    pub annualized_return: Option<f64>,
    pub annualized_volatility: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub drawdown: Option<Drawdown>,
}

impl Metrics {
    pub fn compute(
        nav: &NavSeries,
        returns: &[f64],
        periods_per_year: f64,
        risk_free_rate: f64,
    ) -> Self {
        let values = nav.values();

        let final_nav = values.last().copied().unwrap_or(f64::NAN);
        let total_return = match (values.first(), values.last()) {
            (Some(&first), Some(&last)) if first != 0.0 => last / first - 1.0,
            _ => f64::NAN,
        };

        let annualized_return = annualized_return(&values, periods_per_year);
        let annualized_volatility = annualized_volatility(returns, periods_per_year);
        let sharpe_ratio = sharpe_ratio(annualized_return, annualized_volatility, risk_free_rate);
        let drawdown = max_drawdown(nav);

        Metrics {
            final_nav,
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            drawdown,
        }
    }
}

/// Geometric annual growth: (NAV[last] / NAV[first])^(1 / years) - 1,
/// with years = observations / periods_per_year.
pub fn annualized_return(nav: &[f64], periods_per_year: f64) -> Option<f64> {
    if nav.len() < 2 {
        return None;
    }
    if periods_per_year.is_nan() || periods_per_year <= 0.0 {
        return None;
    }
    let years = nav.len() as f64 / periods_per_year;
    let growth = nav[nav.len() - 1] / nav[0];
    let annualized = growth.powf(1.0 / years) - 1.0;
    annualized.is_finite().then_some(annualized)
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> Option<f64> {
    sample_std(returns)
        .map(|sd| sd * periods_per_year.sqrt())
        .filter(|v| v.is_finite())
}

pub fn sharpe_ratio(
    annualized_return: Option<f64>,
    annualized_volatility: Option<f64>,
    risk_free_rate: f64,
) -> Option<f64> {
    match (annualized_return, annualized_volatility) {
        (Some(ret), Some(vol)) if vol != 0.0 => Some((ret - risk_free_rate) / vol),
        _ => None,
    }
}

/// dd[t] = (NAV[t] - max(NAV[0..=t])) / max(NAV[0..=t]); 0 where the peak is not positive.
pub fn drawdown_series(nav: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    nav.iter()
        .map(|&v| {
            if v > peak {
                peak = v;
            }
            if peak > 0.0 { (v - peak) / peak } else { 0.0 }
        })
        .collect()
}

/// Deepest drawdown with its boundaries. The trough is the first row that
/// attains the minimum; the peak is the last row at or before the trough
/// holding the highest NAV of that range.
pub fn max_drawdown(nav: &NavSeries) -> Option<Drawdown> {
    if nav.is_empty() {
        return None;
    }
    let values = nav.values();
    let dd = drawdown_series(&values);

    let mut trough = 0;
    for (i, &d) in dd.iter().enumerate() {
        if d < dd[trough] {
            trough = i;
        }
    }

    let mut peak = 0;
    for i in 0..=trough {
        if values[i] >= values[peak] {
            peak = i;
        }
    }

    Some(Drawdown {
        max_drawdown: dd[trough],
        start: nav.points[peak].date,
        end: nav.points[trough].date,
    })
}
