//! Typst table markup for the report.
//!
//! - Run parameters
//! - Strategy vs buy-and-hold metrics comparison
//! - Monthly/yearly returns heatmap

use crate::domain::backtest::BacktestConfig;
use crate::domain::report::LegSummary;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

const NOT_AVAILABLE: &str = "n/a";

pub struct MonthlyReturns {
    pub year: i32,
    pub month: u32,
    pub return_pct: f64,
}

/// Typst content brackets treat a handful of characters as markup.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '#' | '[' | ']' | '*' | '_' | '$' | '@' | '<' | '>' | '^' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn opt_pct(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| format!("{:.2}%", v * 100.0))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn opt_ratio(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn render_parameters_table(
    config: &BacktestConfig,
    data_start: NaiveDate,
    data_end: NaiveDate,
    periods: usize,
) -> String {
    let rows = [
        ("Volatility index", escape(&config.vol_symbol)),
        ("Leveraged asset", escape(&config.asset_symbol)),
        ("Requested range", format!("{} to {}", config.start_date, config.end_date)),
        ("Data range", format!("{} to {}", data_start, data_end)),
        ("Periods", format!("{} ({})", periods, config.resample)),
        ("Volatility threshold", format!("{:.2}", config.vol_threshold)),
        ("Moving average window", config.ma_window.to_string()),
        ("Trade cost rate", format!("{:.4}%", config.trade_cost_rate * 100.0)),
        ("Risk-free rate", format!("{:.2}%", config.risk_free_rate * 100.0)),
    ];

    let mut output = String::from("#table(\n  columns: 2,\n  align: (left, right),\n");
    output.push_str("  [*Parameter*], [*Value*],\n");
    for (name, value) in rows {
        output.push_str(&format!("  [{}], [{}],\n", name, value));
    }
    output.push_str(")\n");
    output
}

pub fn render_metrics_table(strategy: &LegSummary, buy_and_hold: &LegSummary) -> String {
    let s = &strategy.metrics;
    let b = &buy_and_hold.metrics;
    let dd_dates = |leg: &LegSummary| {
        leg.metrics
            .drawdown
            .map(|d| format!("{} to {}", d.start, d.end))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    let rows = [
        ("Final NAV", format!("{:.4}", s.final_nav), format!("{:.4}", b.final_nav)),
        ("Total return", opt_pct(Some(s.total_return)), opt_pct(Some(b.total_return))),
        ("Annualized return", opt_pct(s.annualized_return), opt_pct(b.annualized_return)),
        (
            "Annualized volatility",
            opt_pct(s.annualized_volatility),
            opt_pct(b.annualized_volatility),
        ),
        ("Sharpe ratio", opt_ratio(s.sharpe_ratio), opt_ratio(b.sharpe_ratio)),
        (
            "Max drawdown",
            opt_pct(s.drawdown.map(|d| d.max_drawdown)),
            opt_pct(b.drawdown.map(|d| d.max_drawdown)),
        ),
        ("Drawdown period", dd_dates(strategy), dd_dates(buy_and_hold)),
        (
            "Total trades",
            strategy.trades.total_trades.to_string(),
            buy_and_hold.trades.total_trades.to_string(),
        ),
        (
            "Periods in market",
            strategy.trades.days_in_market.to_string(),
            buy_and_hold.trades.days_in_market.to_string(),
        ),
    ];

    let mut output = String::from("#table(\n  columns: 3,\n  align: (left, right, right),\n");
    output.push_str("  [*Metric*], [*Strategy*], [*Buy & Hold*],\n");
    for (name, strat, bh) in rows {
        output.push_str(&format!("  [{}], [{}], [{}],\n", name, strat, bh));
    }
    output.push_str(")\n");
    output
}

/// Month-end over previous month-end NAV. The first month is measured from
/// the first observation.
pub fn compute_monthly_returns(nav: &[(NaiveDate, f64)]) -> Vec<MonthlyReturns> {
    let Some(&(_, first_nav)) = nav.first() else {
        return Vec::new();
    };

    let mut month_end: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for &(date, value) in nav {
        month_end.insert((date.year(), date.month()), value);
    }

    let mut returns = Vec::with_capacity(month_end.len());
    let mut prev = first_nav;
    for ((year, month), end) in month_end {
        let return_pct = if prev > 0.0 { end / prev - 1.0 } else { 0.0 };
        returns.push(MonthlyReturns {
            year,
            month,
            return_pct,
        });
        prev = end;
    }

    returns
}

pub fn format_returns_heatmap(returns: &[MonthlyReturns]) -> String {
    if returns.is_empty() {
        return String::new();
    }

    let mut years: BTreeMap<i32, [Option<f64>; 12]> = BTreeMap::new();
    for r in returns {
        let entry = years.entry(r.year).or_insert([None; 12]);
        entry[(r.month - 1) as usize] = Some(r.return_pct);
    }

    let mut output = String::new();
    output.push_str("#table(\n");
    output.push_str("  columns: 14,\n");
    output.push_str("  [*Year*], [*Jan*], [*Feb*], [*Mar*], [*Apr*], [*May*], [*Jun*], ");
    output.push_str("[*Jul*], [*Aug*], [*Sep*], [*Oct*], [*Nov*], [*Dec*], [*YTD*],\n");

    for (year, monthly) in &years {
        output.push_str(&format!("  [{}],", year));

        let mut ytd = 1.0_f64;
        for opt_ret in monthly {
            match opt_ret {
                Some(ret) => {
                    ytd *= 1.0 + ret;
                    output.push_str(&format!(" {},", format_heatmap_cell(*ret)));
                }
                None => output.push_str(" [-],"),
            }
        }
        output.push_str(&format!(" {},\n", format_heatmap_cell(ytd - 1.0)));
    }

    output.push_str(")\n");
    output
}

/// Returns (fill_color, needs_white_text) for a given return value.
fn return_color(ret: f64) -> (&'static str, bool) {
    if ret >= 0.10 {
        ("rgb(\"#006400\")", true)
    } else if ret >= 0.05 {
        ("rgb(\"#228B22\")", true)
    } else if ret >= 0.02 {
        ("rgb(\"#90EE90\")", false)
    } else if ret > 0.0 {
        ("rgb(\"#E0FFE0\")", false)
    } else if ret == 0.0 {
        ("rgb(\"#FFFFFF\")", false)
    } else if ret > -0.02 {
        ("rgb(\"#FFE0E0\")", false)
    } else if ret > -0.05 {
        ("rgb(\"#FF9090\")", false)
    } else if ret > -0.10 {
        ("rgb(\"#FF4444\")", true)
    } else {
        ("rgb(\"#8B0000\")", true)
    }
}

fn format_heatmap_cell(ret: f64) -> String {
    let (color, white_text) = return_color(ret);
    let formatted = format!("{:+.1}%", ret * 100.0);
    if white_text {
        format!("table.cell(fill: {}, text(fill: white, [{}]))", color, formatted)
    } else {
        format!("table.cell(fill: {}, [{}])", color, formatted)
    }
}
