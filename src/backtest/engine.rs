//! Core backtesting engine.
//!
//! Runs the trade loop over one tick stream:
//! 1. Search for a spread from the cursor onwards
//! 2. Simulate the trade over the ticks after entry
//! 3. Record the outcome and move the cursor one minute past the exit
//!
//! The loop stops when no spread can be formed, the data runs out, or
//! the iteration cap is reached. Trades never overlap.

use std::fmt;

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::BacktestConfig;
use crate::data::TickStream;

use super::events::{BacktestEvent, EventSink, TracingSink};
use super::finder::SpreadFinder;
use super::simulator::TradeSimulator;
use super::trade::TradeOutcome;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `max_iterations` searches were made.
    IterationCap,
    /// The finder found no spread in the remaining data.
    NoSpreadFound,
    /// No ticks left at or after the cursor.
    StreamExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::IterationCap => "iteration cap reached",
            Self::NoSpreadFound => "no spread found",
            Self::StreamExhausted => "stream exhausted",
        })
    }
}

/// Result of a completed backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    /// Completed trades in time order.
    pub outcomes: Vec<TradeOutcome>,
    pub stop_reason: StopReason,
    /// Number of spread searches made.
    pub iterations: usize,
}

impl BacktestResult {
    pub fn total_trades(&self) -> usize {
        self.outcomes.len()
    }

    /// Sum of theoretical P&L.
    pub fn total_pnl(&self) -> Decimal {
        self.outcomes.iter().map(|o| o.theoretical_pnl).sum()
    }

    /// Running P&L after each trade.
    pub fn cumulative_pnl(&self) -> Vec<Decimal> {
        self.outcomes
            .iter()
            .scan(Decimal::ZERO, |total, o| {
                *total += o.theoretical_pnl;
                Some(*total)
            })
            .collect()
    }
}

/// The main backtesting engine.
pub struct BacktestEngine<S: EventSink = TracingSink> {
    config: BacktestConfig,
    finder: SpreadFinder,
    simulator: TradeSimulator,
    events: S,
}

impl BacktestEngine {
    /// Create a new backtest engine that logs progress through `tracing`.
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            finder: SpreadFinder::new(config.finder_config()),
            simulator: TradeSimulator::new(config.exit_rules()),
            config,
            events: TracingSink,
        }
    }
}

impl<S: EventSink> BacktestEngine<S> {
    /// Replace the event sink.
    pub fn with_events<T: EventSink>(self, events: T) -> BacktestEngine<T> {
        BacktestEngine {
            config: self.config,
            finder: self.finder,
            simulator: self.simulator,
            events,
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run the trade loop over `stream`.
    pub fn run(&mut self, stream: &TickStream) -> BacktestResult {
        let mut outcomes: Vec<TradeOutcome> = Vec::new();
        let mut iterations = 0;
        let mut cursor = stream.first_timestamp();

        let stop_reason = loop {
            if iterations >= self.config.max_iterations {
                break StopReason::IterationCap;
            }

            let Some(start) = cursor.filter(|c| stream.range_from(*c).next().is_some()) else {
                break StopReason::StreamExhausted;
            };

            iterations += 1;
            self.events.emit(&BacktestEvent::IterationStarted {
                iteration: iterations,
                cursor: start,
            });

            let Some(spread) = self.finder.find(stream.range_from(start)) else {
                break StopReason::NoSpreadFound;
            };
            self.events.emit(&BacktestEvent::SpreadOpened {
                iteration: iterations,
                spread: spread.clone(),
            });

            let outcome = self
                .simulator
                .simulate(&spread, stream.after(spread.entry_timestamp));
            cursor = Some(outcome.exit_time + Duration::minutes(1));

            self.events.emit(&BacktestEvent::TradeClosed {
                iteration: iterations,
                outcome: outcome.clone(),
            });
            outcomes.push(outcome);
        };

        self.events.emit(&BacktestEvent::Stopped {
            reason: stop_reason,
            trades: outcomes.len(),
        });

        BacktestResult {
            outcomes,
            stop_reason,
            iterations,
        }
    }
}
