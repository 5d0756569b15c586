//! Built-in Typst report template.
//!
//! Placeholders are resolved by [`super::resolve`]; a custom template may use
//! any subset of them.

pub const TEMPLATE: &str = r#"#set page(paper: "a4", margin: 2cm)
#set text(size: 10pt)

= {{TITLE}}

Generated by volgate. Positions are taken one period after the volatility
signal, so every trade uses only information available at the prior close.

== Parameters

{{PARAMETERS_TABLE}}

== Performance

{{METRICS_TABLE}}

== Net Asset Value

{{NAV_CHART}}

== Volatility Regime

{{VOL_CHART}}

== Strategy Drawdown

{{DRAWDOWN_CHART}}

== Monthly Returns: Strategy

{{MONTHLY_RETURNS_STRATEGY}}

== Monthly Returns: Buy & Hold

{{MONTHLY_RETURNS_BUY_AND_HOLD}}
"#;

pub fn template() -> &'static str {
    TEMPLATE
}
