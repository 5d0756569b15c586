//! Configuration validation.
//!
//! Runs before any data is fetched; every check maps to a `[backtest]` key.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::VolgateError;

const SECTION: &str = "backtest";

pub fn validate_backtest_config(config: &BacktestConfig) -> Result<(), VolgateError> {
    validate_symbols(config)?;
    validate_dates(config)?;
    validate_ma_window(config)?;
    validate_vol_threshold(config)?;
    validate_trade_cost(config)?;
    validate_risk_free_rate(config)?;
    Ok(())
}

fn validate_symbols(config: &BacktestConfig) -> Result<(), VolgateError> {
    if config.vol_symbol.trim().is_empty() {
        return Err(VolgateError::invalid(SECTION, "vol_symbol", "vol_symbol must not be empty"));
    }
    if config.asset_symbol.trim().is_empty() {
        return Err(VolgateError::invalid(
            SECTION,
            "asset_symbol",
            "asset_symbol must not be empty",
        ));
    }
    if config.vol_symbol == config.asset_symbol {
        return Err(VolgateError::invalid(
            SECTION,
            "asset_symbol",
            "asset_symbol must differ from vol_symbol",
        ));
    }
    Ok(())
}

fn validate_dates(config: &BacktestConfig) -> Result<(), VolgateError> {
    if config.start_date >= config.end_date {
        return Err(VolgateError::invalid(
            SECTION,
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

fn validate_ma_window(config: &BacktestConfig) -> Result<(), VolgateError> {
    if config.ma_window == 0 {
        return Err(VolgateError::invalid(SECTION, "ma_window", "ma_window must be at least 1"));
    }
    Ok(())
}

fn validate_vol_threshold(config: &BacktestConfig) -> Result<(), VolgateError> {
    let value = config.vol_threshold;
    if !value.is_finite() || value <= 0.0 {
        return Err(VolgateError::invalid(
            SECTION,
            "vol_threshold",
            "vol_threshold must be a positive number",
        ));
    }
    Ok(())
}

fn validate_trade_cost(config: &BacktestConfig) -> Result<(), VolgateError> {
    let value = config.trade_cost_rate;
    if !value.is_finite() || value < 0.0 {
        return Err(VolgateError::invalid(
            SECTION,
            "trade_cost_rate",
            "trade_cost_rate must be non-negative",
        ));
    }
    if value >= 1.0 {
        return Err(VolgateError::invalid(
            SECTION,
            "trade_cost_rate",
            "trade_cost_rate is a fraction and must be below 1",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &BacktestConfig) -> Result<(), VolgateError> {
    let value = config.risk_free_rate;
    if !value.is_finite() || value <= -1.0 || value >= 1.0 {
        return Err(VolgateError::invalid(
            SECTION,
            "risk_free_rate",
            "risk_free_rate must be between -1 and 1",
        ));
    }
    Ok(())
}
