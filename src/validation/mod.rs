//! Validation module for tick data.
//!
//! Checks a loaded tick stream before it is backtested:
//! - Grouping and expiry consistency
//! - Quote validity (bid/ask/midpoint)
//! - Symbol/strike agreement and underlying coverage

pub mod tick_integrity;

pub use tick_integrity::{CheckResult, TickIntegrityReport, TickStreamValidator};
