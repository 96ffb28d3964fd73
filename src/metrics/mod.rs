//! Performance metrics module.
//!
//! Summarises a run's outcomes:
//! - Win rate, profit factor
//! - Average and extreme trade P&L
//! - Maximum drawdown of cumulative P&L
//! - Exit status breakdown and holding times

pub mod calculator;

pub use calculator::{MetricsCalculator, PerformanceMetrics};
