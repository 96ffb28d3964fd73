//! Backtesting engine for the 0DTE put credit spread strategy.
//!
//! This module provides the trade loop:
//! - Spread selection by delta bands and strike width
//! - Trade lifecycle simulation with ordered exit conditions
//! - The orchestrating engine and its progress events

pub mod engine;
pub mod events;
pub mod finder;
pub mod simulator;
pub mod trade;

pub use engine::{BacktestEngine, BacktestResult, StopReason};
pub use events::{BacktestEvent, EventSink, NullSink, TracingSink};
pub use finder::{SpreadFinder, SpreadFinderConfig};
pub use simulator::{ExitRules, ExitThresholds, SpreadMetrics, TradeSimulator};
pub use trade::{ExitStatus, OptionLeg, Spread, TradeOutcome, CONTRACT_MULTIPLIER};
