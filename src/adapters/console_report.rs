//! Plain-text backtest summary for the terminal.

use std::fmt::Write;

use crate::domain::metrics::Metrics;
use crate::domain::position::Position;
use crate::domain::report::{BacktestReport, LegSummary, ReportRow};

pub const DEFAULT_TAIL_ROWS: usize = 10;

const NOT_AVAILABLE: &str = "n/a";

fn pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}%", v * 100.0),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn ratio(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn nav(value: f64) -> String {
    if value.is_finite() {
        format!("{:.4}", value)
    } else {
        NOT_AVAILABLE.to_string()
    }
}

fn drawdown_dates(metrics: &Metrics) -> (String, String) {
    match &metrics.drawdown {
        Some(dd) => (dd.start.to_string(), dd.end.to_string()),
        None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
    }
}

fn leg_lines(strategy: &LegSummary, buy_and_hold: &LegSummary) -> Vec<(&'static str, String, String)> {
    let s = &strategy.metrics;
    let b = &buy_and_hold.metrics;
    let (s_dd_start, s_dd_end) = drawdown_dates(s);
    let (b_dd_start, b_dd_end) = drawdown_dates(b);

    vec![
        ("Final NAV", nav(s.final_nav), nav(b.final_nav)),
        ("Total Return", pct(Some(s.total_return)), pct(Some(b.total_return))),
        ("Annualized Return", pct(s.annualized_return), pct(b.annualized_return)),
        (
            "Annualized Volatility",
            pct(s.annualized_volatility),
            pct(b.annualized_volatility),
        ),
        ("Sharpe Ratio", ratio(s.sharpe_ratio), ratio(b.sharpe_ratio)),
        (
            "Max Drawdown",
            pct(s.drawdown.map(|d| d.max_drawdown)),
            pct(b.drawdown.map(|d| d.max_drawdown)),
        ),
        ("Drawdown Start", s_dd_start, b_dd_start),
        ("Drawdown End", s_dd_end, b_dd_end),
        (
            "Total Trades",
            strategy.trades.total_trades.to_string(),
            buy_and_hold.trades.total_trades.to_string(),
        ),
        (
            "Periods In Market",
            strategy.trades.days_in_market.to_string(),
            buy_and_hold.trades.days_in_market.to_string(),
        ),
    ]
}

fn position_label(position: Position) -> &'static str {
    match position {
        Position::Long => "LONG",
        Position::Flat => "FLAT",
    }
}

fn tail_line(row: &ReportRow) -> String {
    let ma = row
        .moving_average
        .map(|m| format!("{:.2}", m))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    format!(
        "{:<10}  {:>8.2}  {:>8}  {:>7}  {:>5}  {:>8.2}%  {:>8.2}%  {:>9.4}  {:>9.4}",
        row.date,
        row.vol,
        ma,
        if row.desired_exposure { "yes" } else { "no" },
        position_label(row.position),
        row.asset_return * 100.0,
        row.strategy_return * 100.0,
        row.nav_buy_and_hold,
        row.nav_strategy,
    )
}

/// Full console summary: header, side-by-side metrics and the last `tail_rows` rows.
pub fn render(report: &BacktestReport, tail_rows: usize) -> String {
    let config = &report.config;
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "=== {} gated by {} ===",
        config.asset_symbol, config.vol_symbol
    );
    let _ = writeln!(
        out,
        "Data range:       {} to {} ({} periods, {})",
        report.data_start,
        report.data_end,
        report.rows.len(),
        config.resample
    );
    let _ = writeln!(
        out,
        "Rule:             long when {} < {:.2} and below its {}-period average",
        config.vol_symbol, config.vol_threshold, config.ma_window
    );
    let _ = writeln!(
        out,
        "Trade cost:       {:.4}% per change",
        config.trade_cost_rate * 100.0
    );
    let _ = writeln!(
        out,
        "Risk-free rate:   {:.2}%",
        config.risk_free_rate * 100.0
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "{:<24}{:>14}{:>14}", "", "Strategy", "Buy & Hold");
    for (label, strategy, buy_and_hold) in leg_lines(&report.strategy, &report.buy_and_hold) {
        let _ = writeln!(out, "{:<24}{:>14}{:>14}", label, strategy, buy_and_hold);
    }

    let tail = report.tail(tail_rows);
    if !tail.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "=== Last {} rows ===", tail.len());
        let _ = writeln!(
            out,
            "{:<10}  {:>8}  {:>8}  {:>7}  {:>5}  {:>9}  {:>9}  {:>9}  {:>9}",
            "date", "vol", "vol_ma", "desired", "pos", "asset", "strategy", "nav_bh", "nav_strat"
        );
        for row in tail {
            let _ = writeln!(out, "{}", tail_line(row));
        }
    }

    out
}
