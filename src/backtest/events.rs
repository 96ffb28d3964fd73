//! Progress events emitted by the backtest loop.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::engine::StopReason;
use super::trade::{Spread, TradeOutcome};

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum BacktestEvent {
    /// A new search window starts at `cursor`.
    IterationStarted {
        iteration: usize,
        cursor: DateTime<Utc>,
    },
    /// The finder produced a spread.
    SpreadOpened { iteration: usize, spread: Spread },
    /// The simulator closed the trade.
    TradeClosed {
        iteration: usize,
        outcome: TradeOutcome,
    },
    /// The loop ended.
    Stopped { reason: StopReason, trades: usize },
}

/// Trait for consuming backtest events (logging, recording, etc.)
pub trait EventSink {
    fn emit(&mut self, event: &BacktestEvent);
}

/// Sink that logs events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: &BacktestEvent) {
        match event {
            BacktestEvent::IterationStarted { iteration, cursor } => {
                debug!(iteration, %cursor, "searching for spread");
            }
            BacktestEvent::SpreadOpened { iteration, spread } => {
                info!(
                    iteration,
                    entry = %spread.entry_timestamp,
                    short = %spread.short_leg.symbol,
                    long = %spread.long_leg.symbol,
                    credit = %spread.credit_received,
                    width = %spread.width,
                    max_loss = %spread.max_loss(),
                    "spread opened"
                );
            }
            BacktestEvent::TradeClosed { iteration, outcome } => {
                info!(
                    iteration,
                    status = %outcome.status,
                    exit = %outcome.exit_time,
                    pnl = %outcome.theoretical_pnl,
                    "trade closed"
                );
            }
            BacktestEvent::Stopped { reason, trades } => {
                info!(%reason, trades, "backtest stopped");
            }
        }
    }
}

/// No-op sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &BacktestEvent) {}
}

/// Records every event in memory.
impl EventSink for Vec<BacktestEvent> {
    fn emit(&mut self, event: &BacktestEvent) {
        self.push(event.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: &BacktestEvent) {
        (**self).emit(event);
    }
}
