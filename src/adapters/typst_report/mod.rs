//! Typst report generation.
//!
//! Reads a Typst template (the built-in default or a custom file via
//! `[report] template_path`), resolves every `{{PLACEHOLDER}}` marker with
//! helpers from `chart_svg` and `tables`, and writes the final `.typ` file.
//! Compiling it to PDF is left to the `typst` CLI.

pub mod chart_svg;
pub mod default_template;
pub mod tables;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::error::VolgateError;
use crate::domain::report::BacktestReport;
use crate::ports::report_port::ReportPort;

/// Wrap an SVG document in a Typst `image.decode` call, or fall back to an
/// italic note when the chart had nothing to draw.
fn svg_image(svg: &str, empty_note: &str) -> String {
    if svg.is_empty() {
        return format!("_{}_", empty_note);
    }
    format!(
        "#image.decode(\n\"{}\",\n  width: 100%,\n)",
        svg.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

fn heatmap_or_note(nav: &[(chrono::NaiveDate, f64)]) -> String {
    let heatmap = tables::format_returns_heatmap(&tables::compute_monthly_returns(nav));
    if heatmap.is_empty() {
        "_Insufficient data for monthly returns._".to_string()
    } else {
        heatmap
    }
}

/// Resolve all `{{PLACEHOLDER}}`s in `template` against `report`.
pub fn resolve(template: &str, report: &BacktestReport) -> String {
    let config = &report.config;
    let dates: Vec<_> = report.rows.iter().map(|r| r.date).collect();
    let strategy_nav: Vec<f64> = report.rows.iter().map(|r| r.nav_strategy).collect();
    let buy_and_hold_nav: Vec<f64> = report.rows.iter().map(|r| r.nav_buy_and_hold).collect();
    let drawdown: Vec<f64> = report.rows.iter().map(|r| r.strategy_drawdown).collect();

    let title = format!(
        "{} Gated by {}",
        tables::escape(&config.asset_symbol),
        tables::escape(&config.vol_symbol)
    );

    let replacements = [
        ("{{TITLE}}", title),
        (
            "{{PARAMETERS_TABLE}}",
            tables::render_parameters_table(
                config,
                report.data_start,
                report.data_end,
                report.rows.len(),
            ),
        ),
        (
            "{{METRICS_TABLE}}",
            tables::render_metrics_table(&report.strategy, &report.buy_and_hold),
        ),
        (
            "{{NAV_CHART}}",
            svg_image(
                &chart_svg::nav_comparison_svg(&dates, &strategy_nav, &buy_and_hold_nav),
                "No NAV data.",
            ),
        ),
        (
            "{{VOL_CHART}}",
            svg_image(
                &chart_svg::vol_regime_svg(&report.rows, config.vol_threshold),
                "No volatility data.",
            ),
        ),
        (
            "{{DRAWDOWN_CHART}}",
            svg_image(
                &chart_svg::drawdown_svg(&dates, &drawdown),
                "No drawdown data.",
            ),
        ),
        (
            "{{MONTHLY_RETURNS_STRATEGY}}",
            heatmap_or_note(&report.strategy_nav()),
        ),
        (
            "{{MONTHLY_RETURNS_BUY_AND_HOLD}}",
            heatmap_or_note(&report.buy_and_hold_nav()),
        ),
    ];

    let mut output = template.to_string();
    for (placeholder, value) in &replacements {
        output = output.replace(placeholder, value);
    }
    output
}

pub struct TypstReportAdapter {
    template_path: Option<PathBuf>,
}

impl TypstReportAdapter {
    pub fn new(template_path: Option<PathBuf>) -> Self {
        Self { template_path }
    }

    fn load_template(&self) -> Result<String, VolgateError> {
        match &self.template_path {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                VolgateError::Io(std::io::Error::new(
                    e.kind(),
                    format!("failed to read template {}: {}", path.display(), e),
                ))
            }),
            None => Ok(default_template::template().to_string()),
        }
    }
}

impl ReportPort for TypstReportAdapter {
    fn write(&self, report: &BacktestReport, output_path: &Path) -> Result<(), VolgateError> {
        let template = self.load_template()?;
        let content = resolve(&template, report);
        fs::write(output_path, content)?;
        info!(path = %output_path.display(), "typst report written");
        Ok(())
    }
}
