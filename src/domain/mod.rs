//! Core domain types and the backtest pipeline.

pub mod price;
pub mod aligner;
pub mod signal;
pub mod position;
pub mod returns;
pub mod metrics;
pub mod report;
pub mod backtest;
pub mod config_validation;
pub mod error;
