//! Inline SVG charts for the Typst report.
//!
//! Every chart shares one fixed canvas. Series are indexed by row, so gaps in
//! the calendar (weekends, holidays) do not show up as flat segments. Each
//! generator returns an empty string when there are fewer than two rows.

use chrono::NaiveDate;
use std::fmt::Write;

use crate::domain::position::Position;
use crate::domain::report::ReportRow;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 260.0;
const PAD_LEFT: f64 = 56.0;
const PAD_RIGHT: f64 = 16.0;
const PAD_TOP: f64 = 16.0;
const PAD_BOTTOM: f64 = 28.0;

const STRATEGY_COLOR: &str = "#1f77b4";
const BUY_AND_HOLD_COLOR: &str = "#ff7f0e";
const VOL_COLOR: &str = "#444444";
const MA_COLOR: &str = "#9467bd";
const THRESHOLD_COLOR: &str = "#d62728";
const IN_MARKET_FILL: &str = "#2ca02c";
const DRAWDOWN_FILL: &str = "#d62728";

/// Maps row index and value onto the plot area.
struct Frame {
    rows: usize,
    min: f64,
    max: f64,
}

impl Frame {
    fn fit<'a>(rows: usize, series: impl IntoIterator<Item = &'a f64>) -> Self {
        let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &v in series.into_iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
        }
        if !min.is_finite() || !max.is_finite() {
            (min, max) = (0.0, 1.0);
        }
        if max - min < f64::EPSILON {
            min -= 0.5;
            max += 0.5;
        }
        Frame { rows, min, max }
    }

    fn plot_width(&self) -> f64 {
        WIDTH - PAD_LEFT - PAD_RIGHT
    }

    fn plot_height(&self) -> f64 {
        HEIGHT - PAD_TOP - PAD_BOTTOM
    }

    fn step(&self) -> f64 {
        if self.rows > 1 {
            self.plot_width() / (self.rows - 1) as f64
        } else {
            0.0
        }
    }

    fn x(&self, i: usize) -> f64 {
        PAD_LEFT + i as f64 * self.step()
    }

    fn y(&self, v: f64) -> f64 {
        let clamped = v.clamp(self.min, self.max);
        PAD_TOP + (self.max - clamped) / (self.max - self.min) * self.plot_height()
    }
}

fn open_svg() -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="10">"#,
        w = WIDTH,
        h = HEIGHT
    )
}

fn axes(out: &mut String, frame: &Frame, dates: &[NaiveDate], label: impl Fn(f64) -> String) {
    let bottom = HEIGHT - PAD_BOTTOM;
    let right = WIDTH - PAD_RIGHT;
    let _ = write!(
        out,
        r##"<rect x="0" y="0" width="{WIDTH}" height="{HEIGHT}" fill="white"/><line x1="{PAD_LEFT}" y1="{PAD_TOP}" x2="{PAD_LEFT}" y2="{bottom}" stroke="#888"/><line x1="{PAD_LEFT}" y1="{bottom}" x2="{right}" y2="{bottom}" stroke="#888"/>"##
    );
    let _ = write!(
        out,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{}</text><text x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"#,
        PAD_LEFT - 4.0,
        frame.y(frame.max) + 4.0,
        label(frame.max),
        PAD_LEFT - 4.0,
        frame.y(frame.min),
        label(frame.min),
    );
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        let _ = write!(
            out,
            r#"<text x="{PAD_LEFT}" y="{:.1}">{first}</text><text x="{right}" y="{:.1}" text-anchor="end">{last}</text>"#,
            HEIGHT - 8.0,
            HEIGHT - 8.0,
        );
    }
}

fn polyline(out: &mut String, frame: &Frame, points: &[(usize, f64)], color: &str) {
    if points.len() < 2 {
        return;
    }
    let coords: Vec<String> = points
        .iter()
        .map(|&(i, v)| format!("{:.1},{:.1}", frame.x(i), frame.y(v)))
        .collect();
    let _ = write!(
        out,
        r#"<polyline fill="none" stroke="{color}" stroke-width="1.2" points="{}"/>"#,
        coords.join(" ")
    );
}

fn legend(out: &mut String, entries: &[(&str, &str)]) {
    for (k, (name, color)) in entries.iter().enumerate() {
        let x = PAD_LEFT + 8.0 + k as f64 * 130.0;
        let _ = write!(
            out,
            r#"<rect x="{x:.1}" y="{:.1}" width="10" height="10" fill="{color}"/><text x="{:.1}" y="{:.1}">{name}</text>"#,
            PAD_TOP + 2.0,
            x + 14.0,
            PAD_TOP + 11.0,
            name = name.replace('&', "&amp;"),
        );
    }
}

/// Maximal runs of consecutive indices where `pred` holds, as inclusive ranges.
fn runs(len: usize, pred: impl Fn(usize) -> bool) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = None;
    for i in 0..len {
        match (pred(i), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push((s, i - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, len - 1));
    }
    out
}

/// Strategy and buy-and-hold NAV on one axis.
pub fn nav_comparison_svg(dates: &[NaiveDate], strategy: &[f64], buy_and_hold: &[f64]) -> String {
    let rows = dates.len().min(strategy.len()).min(buy_and_hold.len());
    if rows < 2 {
        return String::new();
    }
    let frame = Frame::fit(rows, strategy[..rows].iter().chain(&buy_and_hold[..rows]));

    let mut out = open_svg();
    axes(&mut out, &frame, &dates[..rows], |v| format!("{:.2}", v));
    let indexed = |values: &[f64]| -> Vec<(usize, f64)> {
        values[..rows].iter().copied().enumerate().collect()
    };
    polyline(&mut out, &frame, &indexed(buy_and_hold), BUY_AND_HOLD_COLOR);
    polyline(&mut out, &frame, &indexed(strategy), STRATEGY_COLOR);
    legend(
        &mut out,
        &[("Strategy", STRATEGY_COLOR), ("Buy & Hold", BUY_AND_HOLD_COLOR)],
    );
    out.push_str("</svg>");
    out
}

/// Volatility index with its moving average and the threshold, shaded where
/// the strategy held the asset.
pub fn vol_regime_svg(rows: &[ReportRow], threshold: f64) -> String {
    if rows.len() < 2 {
        return String::new();
    }
    let values: Vec<f64> = rows
        .iter()
        .flat_map(|r| [Some(r.vol), r.moving_average])
        .flatten()
        .chain([threshold])
        .collect();
    let frame = Frame::fit(rows.len(), &values);
    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();

    let mut out = open_svg();
    axes(&mut out, &frame, &dates, |v| format!("{:.1}", v));

    let half = frame.step() / 2.0;
    for (start, end) in runs(rows.len(), |i| rows[i].position == Position::Long) {
        let x0 = (frame.x(start) - half).max(PAD_LEFT);
        let x1 = (frame.x(end) + half).min(WIDTH - PAD_RIGHT);
        let _ = write!(
            out,
            r#"<rect x="{x0:.1}" y="{PAD_TOP}" width="{:.1}" height="{:.1}" fill="{IN_MARKET_FILL}" fill-opacity="0.15"/>"#,
            (x1 - x0).max(1.0),
            frame.plot_height(),
        );
    }

    let ty = frame.y(threshold);
    let _ = write!(
        out,
        r#"<line x1="{PAD_LEFT}" y1="{ty:.1}" x2="{:.1}" y2="{ty:.1}" stroke="{THRESHOLD_COLOR}" stroke-dasharray="4 3"/>"#,
        WIDTH - PAD_RIGHT,
    );

    let vol: Vec<(usize, f64)> = rows.iter().map(|r| r.vol).enumerate().collect();
    polyline(&mut out, &frame, &vol, VOL_COLOR);
    for (start, end) in runs(rows.len(), |i| rows[i].moving_average.is_some()) {
        let segment: Vec<(usize, f64)> = (start..=end)
            .filter_map(|i| rows[i].moving_average.map(|m| (i, m)))
            .collect();
        polyline(&mut out, &frame, &segment, MA_COLOR);
    }

    legend(
        &mut out,
        &[
            ("Volatility", VOL_COLOR),
            ("Moving average", MA_COLOR),
            ("Threshold", THRESHOLD_COLOR),
            ("In market", IN_MARKET_FILL),
        ],
    );
    out.push_str("</svg>");
    out
}

/// Strategy drawdown as a filled area hanging from zero.
pub fn drawdown_svg(dates: &[NaiveDate], drawdown: &[f64]) -> String {
    let rows = dates.len().min(drawdown.len());
    if rows < 2 {
        return String::new();
    }
    let frame = Frame::fit(rows, drawdown[..rows].iter().chain(&[0.0]));

    let mut out = open_svg();
    axes(&mut out, &frame, &dates[..rows], |v| format!("{:.0}%", v * 100.0));

    let zero = frame.y(0.0);
    let mut coords = vec![format!("{:.1},{:.1}", frame.x(0), zero)];
    coords.extend(
        drawdown[..rows]
            .iter()
            .enumerate()
            .map(|(i, &d)| format!("{:.1},{:.1}", frame.x(i), frame.y(d))),
    );
    coords.push(format!("{:.1},{:.1}", frame.x(rows - 1), zero));
    let _ = write!(
        out,
        r#"<polygon fill="{DRAWDOWN_FILL}" fill-opacity="0.35" stroke="{DRAWDOWN_FILL}" stroke-width="0.8" points="{}"/>"#,
        coords.join(" ")
    );
    out.push_str("</svg>");
    out
}
