//! Report assembly: metrics for both legs plus the per-date series consumed
//! by the console, CSV and Typst report adapters.

use chrono::NaiveDate;

use crate::domain::aligner::AlignedSeries;
use crate::domain::backtest::BacktestConfig;
use crate::domain::metrics::{drawdown_series, Metrics};
use crate::domain::position::{Position, TradeStats};
use crate::domain::returns::Simulation;
use crate::domain::signal::SignalRow;

/// Metrics and trade counts for one leg (strategy or buy-and-hold).
#[derive(Debug, Clone, PartialEq)]
pub struct LegSummary {
    pub metrics: Metrics,
    pub trades: TradeStats,
}

/// Everything known about a single aligned date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub vol: f64,
    pub moving_average: Option<f64>,
    pub desired_exposure: bool,
    pub position: Position,
    pub asset_price: f64,
    pub asset_return: f64,
    pub trade_cost: f64,
    pub strategy_return: f64,
    pub nav_buy_and_hold: f64,
    pub nav_strategy: f64,
    pub strategy_drawdown: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub config: BacktestConfig,
    pub data_start: NaiveDate,
    pub data_end: NaiveDate,
    pub periods_per_year: f64,
    pub strategy: LegSummary,
    pub buy_and_hold: LegSummary,
    pub rows: Vec<ReportRow>,
}

impl BacktestReport {
    /// The last `n` rows (all rows if fewer).
    pub fn tail(&self, n: usize) -> &[ReportRow] {
        let start = self.rows.len().saturating_sub(n);
        &self.rows[start..]
    }

    pub fn strategy_nav(&self) -> Vec<(NaiveDate, f64)> {
        self.rows.iter().map(|r| (r.date, r.nav_strategy)).collect()
    }

    pub fn buy_and_hold_nav(&self) -> Vec<(NaiveDate, f64)> {
        self.rows
            .iter()
            .map(|r| (r.date, r.nav_buy_and_hold))
            .collect()
    }
}

/// Combine the outputs of every pipeline stage into a report. All slices
/// are row-aligned with `series`.
pub fn assemble(
    config: &BacktestConfig,
    series: &AlignedSeries,
    signals: &[SignalRow],
    simulation: &Simulation,
    strategy_trades: TradeStats,
) -> BacktestReport {
    let periods_per_year = config.periods_per_year();

    let strategy_metrics = Metrics::compute(
        &simulation.strategy,
        &simulation.strategy_returns(),
        periods_per_year,
        config.risk_free_rate,
    );
    let buy_and_hold_metrics = Metrics::compute(
        &simulation.buy_and_hold,
        &simulation.asset_returns(),
        periods_per_year,
        config.risk_free_rate,
    );

    let strategy_dd = drawdown_series(&simulation.strategy.values());

    let rows = series
        .rows
        .iter()
        .zip(signals)
        .zip(&simulation.rows)
        .enumerate()
        .map(|(i, ((aligned, signal), ret))| ReportRow {
            date: aligned.date,
            vol: aligned.vol,
            moving_average: signal.moving_average,
            desired_exposure: signal.desired_exposure,
            position: ret.position,
            asset_price: aligned.asset,
            asset_return: ret.asset_return,
            trade_cost: ret.trade_cost,
            strategy_return: ret.strategy_return,
            nav_buy_and_hold: simulation.buy_and_hold.points[i].nav,
            nav_strategy: simulation.strategy.points[i].nav,
            strategy_drawdown: strategy_dd[i],
        })
        .collect::<Vec<_>>();

    let data_start = series.first_date().unwrap_or(config.start_date);
    let data_end = series.last_date().unwrap_or(config.end_date);

    BacktestReport {
        config: config.clone(),
        data_start,
        data_end,
        periods_per_year,
        strategy: LegSummary {
            metrics: strategy_metrics,
            trades: strategy_trades,
        },
        buy_and_hold: LegSummary {
            metrics: buy_and_hold_metrics,
            trades: TradeStats::always_invested(series.len()),
        },
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aligner::AlignedRow;
    use crate::domain::position::construct_positions;
    use crate::domain::returns::simulate;
    use crate::domain::signal::generate_signals;
    use approx::assert_relative_eq;

    fn date(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Duration::days(i as i64)
    }

    fn build(vols: &[f64], prices: &[f64], config: &BacktestConfig) -> BacktestReport {
        let series = AlignedSeries {
            rows: vols
                .iter()
                .zip(prices)
                .enumerate()
                .map(|(i, (&vol, &asset))| AlignedRow {
                    date: date(i),
                    vol,
                    asset,
                })
                .collect(),
        };
        let signals = generate_signals(&series, config.ma_window, config.vol_threshold);
        let positions = construct_positions(&signals);
        let simulation = simulate(&series, &positions, config.trade_cost_rate);
        assemble(
            config,
            &series,
            &signals,
            &simulation,
            TradeStats::compute(&positions),
        )
    }

    fn config() -> BacktestConfig {
        BacktestConfig {
            ma_window: 2,
            ..BacktestConfig::new(date(0), date(100))
        }
    }

    #[test]
    fn assemble_carries_data_range_and_rows() {
        let report = build(
            &[20.0, 12.0, 11.0, 25.0],
            &[100.0, 110.0, 121.0, 99.0],
            &config(),
        );

        assert_eq!(report.data_start, date(0));
        assert_eq!(report.data_end, date(3));
        assert_eq!(report.rows.len(), 4);
        assert_relative_eq!(report.periods_per_year, 252.0);
    }

    #[test]
    fn assemble_rows_follow_pipeline() {
        // MA(2): -, 16, 11.5, 18 ; desired: F, T, T, F ; position: 0, 0, 1, 1
        let report = build(
            &[20.0, 12.0, 11.0, 25.0],
            &[100.0, 110.0, 121.0, 99.0],
            &config(),
        );

        let desired: Vec<bool> = report.rows.iter().map(|r| r.desired_exposure).collect();
        assert_eq!(desired, vec![false, true, true, false]);
        let held: Vec<Position> = report.rows.iter().map(|r| r.position).collect();
        assert_eq!(
            held,
            vec![Position::Flat, Position::Flat, Position::Long, Position::Long]
        );

        assert_relative_eq!(report.rows[2].nav_strategy, 1.1, epsilon = 1e-12);
        assert_relative_eq!(report.rows[3].nav_strategy, 0.9, epsilon = 1e-12);
        assert_relative_eq!(report.rows[3].nav_buy_and_hold, 0.99, epsilon = 1e-12);
        assert_relative_eq!(
            report.rows[3].strategy_drawdown,
            (0.9 - 1.1) / 1.1,
            epsilon = 1e-12
        );
    }

    #[test]
    fn assemble_trade_stats_for_both_legs() {
        let report = build(
            &[20.0, 12.0, 11.0, 25.0],
            &[100.0, 110.0, 121.0, 99.0],
            &config(),
        );

        assert_eq!(report.strategy.trades.total_trades, 1);
        assert_eq!(report.strategy.trades.days_in_market, 2);
        assert_eq!(report.buy_and_hold.trades.total_trades, 0);
        assert_eq!(report.buy_and_hold.trades.days_in_market, 4);
    }

    #[test]
    fn assemble_final_navs_match_metrics() {
        let report = build(
            &[20.0, 12.0, 11.0, 25.0],
            &[100.0, 110.0, 121.0, 99.0],
            &config(),
        );
        let last = report.rows.last().unwrap();
        assert_eq!(report.strategy.metrics.final_nav, last.nav_strategy);
        assert_eq!(report.buy_and_hold.metrics.final_nav, last.nav_buy_and_hold);
    }

    #[test]
    fn tail_returns_last_rows() {
        let report = build(
            &[20.0, 12.0, 11.0, 25.0],
            &[100.0, 110.0, 121.0, 99.0],
            &config(),
        );
        assert_eq!(report.tail(2).len(), 2);
        assert_eq!(report.tail(2)[0].date, date(2));
        assert_eq!(report.tail(10).len(), 4);
    }
}
