//! Return and NAV engine.
//!
//! asset_return[t]    = price[t] / price[t-1] - 1, 0 on the first row
//! trade_cost[t]      = changed[t] * cost_rate
//! strategy_return[t] = asset_return[t] * position[t] - trade_cost[t]
//! NAV[0] = 1, NAV[t] = NAV[t-1] * (1 + r[t])

use crate::domain::aligner::AlignedSeries;
use crate::domain::position::{Position, PositionRow};
use chrono::NaiveDate;

pub const NAV_BASE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnRow {
    pub date: NaiveDate,
    pub asset_return: f64,
    pub position: Position,
    pub position_changed: bool,
    pub trade_cost: f64,
    pub strategy_return: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavSeries {
    pub points: Vec<NavPoint>,
}

impl NavSeries {
    /// Compound `returns` from [`NAV_BASE`]. The first return is applied to
    /// the base, which is why engines emit a zero return on the first row.
    pub fn accumulate(dates: &[NaiveDate], returns: &[f64]) -> Self {
        let mut nav = NAV_BASE;
        let points = dates
            .iter()
            .zip(returns)
            .map(|(&date, &r)| {
                nav *= 1.0 + r;
                NavPoint { date, nav }
            })
            .collect();
        NavSeries { points }
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.nav).collect()
    }

    pub fn final_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.nav)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Output of the engine: per-row returns plus both NAV curves.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub rows: Vec<ReturnRow>,
    pub buy_and_hold: NavSeries,
    pub strategy: NavSeries,
}

impl Simulation {
    pub fn asset_returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.asset_return).collect()
    }

    pub fn strategy_returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.strategy_return).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }
}

/// Simple period returns of a price sequence; the first element is 0.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(prices.len());
    for i in 0..prices.len() {
        if i == 0 {
            returns.push(0.0);
        } else {
            returns.push(prices[i] / prices[i - 1] - 1.0);
        }
    }
    returns
}

/// Run the strategy over `series` with the given lagged positions.
/// `positions` must have been constructed from the same series.
pub fn simulate(series: &AlignedSeries, positions: &[PositionRow], cost_rate: f64) -> Simulation {
    debug_assert_eq!(series.len(), positions.len());

    let asset_returns = simple_returns(&series.asset_values());

    let rows: Vec<ReturnRow> = positions
        .iter()
        .zip(asset_returns)
        .map(|(p, asset_return)| {
            let trade_cost = if p.position_changed { cost_rate } else { 0.0 };
            ReturnRow {
                date: p.date,
                asset_return,
                position: p.position,
                position_changed: p.position_changed,
                trade_cost,
                strategy_return: asset_return * p.position.weight() - trade_cost,
            }
        })
        .collect();

    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    let buy_and_hold = NavSeries::accumulate(
        &dates,
        &rows.iter().map(|r| r.asset_return).collect::<Vec<_>>(),
    );
    let strategy = NavSeries::accumulate(
        &dates,
        &rows.iter().map(|r| r.strategy_return).collect::<Vec<_>>(),
    );

    Simulation {
        rows,
        buy_and_hold,
        strategy,
    }
}
