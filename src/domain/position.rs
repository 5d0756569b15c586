//! Position construction from the desired-exposure signal.
//!
//! The position held over period t is the exposure decided at the close of
//! t-1, so a signal can never trade on the bar that produced it.

use crate::domain::signal::SignalRow;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long,
}

impl Position {
    pub fn from_exposure(desired: bool) -> Self {
        if desired {
            Position::Long
        } else {
            Position::Flat
        }
    }

    /// Fraction of the asset return earned while holding this position.
    pub fn weight(self) -> f64 {
        match self {
            Position::Flat => 0.0,
            Position::Long => 1.0,
        }
    }

    pub fn is_long(self) -> bool {
        self == Position::Long
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionRow {
    pub date: NaiveDate,
    pub position: Position,
    pub position_changed: bool,
}

/// Lag the desired exposure by one row. The first row is always flat and
/// never counts as a change.
pub fn construct_positions(signals: &[SignalRow]) -> Vec<PositionRow> {
    let mut rows = Vec::with_capacity(signals.len());
    let mut previous: Option<Position> = None;

    for (i, signal) in signals.iter().enumerate() {
        let position = if i == 0 {
            Position::Flat
        } else {
            Position::from_exposure(signals[i - 1].desired_exposure)
        };
        let position_changed = previous.is_some_and(|p| p != position);

        rows.push(PositionRow {
            date: signal.date,
            position,
            position_changed,
        });
        previous = Some(position);
    }

    rows
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TradeStats {
    /// Entries and exits, each counted once.
    pub total_trades: usize,
    /// Periods spent holding the asset.
    pub days_in_market: usize,
}

impl TradeStats {
    pub fn compute(positions: &[PositionRow]) -> Self {
        TradeStats {
            total_trades: positions.iter().filter(|p| p.position_changed).count(),
            days_in_market: positions.iter().filter(|p| p.position.is_long()).count(),
        }
    }

    /// Buy-and-hold: never trades, holds every period.
    pub fn always_invested(periods: usize) -> Self {
        TradeStats {
            total_trades: 0,
            days_in_market: periods,
        }
    }
}
