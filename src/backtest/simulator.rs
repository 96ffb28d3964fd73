//! Open-trade lifecycle: replays ticks after entry and decides the exit.
//!
//! Exit conditions are evaluated per timestamp in a fixed order, first hit wins:
//! 1. Target profit: spread price at or below `credit * target fraction`
//! 2. Delta stop loss: net delta at or above `initial net delta * multiplier`
//! 3. Assignment risk: underlying at or below the short strike
//!
//! A trade that never exits keeps its full credit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::data::Tick;
use crate::pricing::BlackScholes;

use super::finder::put_delta;
use super::trade::{ExitStatus, Spread, TradeOutcome, CONTRACT_MULTIPLIER};

/// Exit parameters for an open spread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitRules {
    pub risk_free_rate: f64,
    /// Multiple of the entry net delta that stops the trade out.
    pub delta_stop_loss_multiplier: f64,
    /// Fraction of the credit at which the spread is bought back (0 to 1).
    pub target_profit_fraction: Decimal,
}

impl Default for ExitRules {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.01,
            delta_stop_loss_multiplier: 2.5,
            target_profit_fraction: Decimal::new(5, 1),
        }
    }
}

/// Thresholds fixed once when a trade opens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitThresholds {
    pub delta_stop_loss: f64,
    pub target_profit_price: Decimal,
}

/// Live values of an open spread at one timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadMetrics {
    pub timestamp: DateTime<Utc>,
    pub short_price: Decimal,
    pub long_price: Decimal,
    pub underlying_price: Decimal,
    pub short_delta: f64,
    pub long_delta: f64,
    /// Short price minus long price (cost to close).
    pub spread_price: Decimal,
    /// `|short delta| - |long delta|`.
    pub total_delta: f64,
}

/// Replays ticks against an open spread.
#[derive(Debug, Clone)]
pub struct TradeSimulator {
    rules: ExitRules,
    pricer: BlackScholes,
}

impl TradeSimulator {
    pub fn new(rules: ExitRules) -> Self {
        Self {
            rules,
            pricer: BlackScholes::new(rules.risk_free_rate),
        }
    }

    pub fn rules(&self) -> &ExitRules {
        &self.rules
    }

    pub fn thresholds(&self, spread: &Spread) -> ExitThresholds {
        ExitThresholds {
            delta_stop_loss: spread.initial_total_delta() * self.rules.delta_stop_loss_multiplier,
            target_profit_price: spread.credit_received * self.rules.target_profit_fraction,
        }
    }

    /// Run the trade over `groups` until an exit fires or the data ends.
    ///
    /// Groups at or before the entry timestamp are ignored. When nothing
    /// fires the trade expires at the last timestamp seen (the entry
    /// timestamp if there is none later).
    pub fn simulate<'a, I>(&self, spread: &Spread, groups: I) -> TradeOutcome
    where
        I: IntoIterator<Item = (&'a DateTime<Utc>, &'a Vec<Tick>)>,
    {
        let thresholds = self.thresholds(spread);
        let mut last_seen = spread.entry_timestamp;

        for (timestamp, ticks) in groups {
            if *timestamp <= spread.entry_timestamp {
                continue;
            }
            last_seen = *timestamp;

            let Some(metrics) = self.metrics_at(spread, *timestamp, ticks) else {
                continue;
            };

            if let Some((status, pnl)) = self.check_exit(spread, &thresholds, &metrics) {
                return TradeOutcome::close(spread, status, pnl, *timestamp);
            }
        }

        TradeOutcome::close(
            spread,
            ExitStatus::Expired,
            spread.credit_received * CONTRACT_MULTIPLIER,
            last_seen,
        )
    }

    /// Live metrics for `spread` from one timestamp group.
    ///
    /// Returns `None` when either leg, the underlying, or a delta is
    /// unavailable, or when a price is zero; the timestamp is then skipped.
    /// A leg quoted more than once in the group takes its last quote.
    pub fn metrics_at(
        &self,
        spread: &Spread,
        timestamp: DateTime<Utc>,
        ticks: &[Tick],
    ) -> Option<SpreadMetrics> {
        let short_tick = ticks
            .iter()
            .rev()
            .find(|t| t.option_symbol == spread.short_leg.symbol);
        let long_tick = ticks
            .iter()
            .rev()
            .find(|t| t.option_symbol == spread.long_leg.symbol);

        let (Some(short_tick), Some(long_tick)) = (short_tick, long_tick) else {
            trace!(%timestamp, "leg quote missing, skipping timestamp");
            return None;
        };

        let Some(underlying_price) = short_tick
            .underlying_price
            .or(long_tick.underlying_price)
        else {
            trace!(%timestamp, "underlying quote missing, skipping timestamp");
            return None;
        };

        let short_price = short_tick.midpoint;
        let long_price = long_tick.midpoint;

        if short_price.is_zero() || long_price.is_zero() || underlying_price.is_zero() {
            trace!(%timestamp, "zero quote, skipping timestamp");
            return None;
        }

        let deltas = put_delta(
            &self.pricer,
            short_price,
            spread.short_leg.strike_price,
            spread.short_leg.expiry,
            underlying_price,
            timestamp,
        )
        .and_then(|short| {
            put_delta(
                &self.pricer,
                long_price,
                spread.long_leg.strike_price,
                spread.long_leg.expiry,
                underlying_price,
                timestamp,
            )
            .map(|long| (short, long))
        });

        let (short_delta, long_delta) = match deltas {
            Ok(pair) => pair,
            Err(e) => {
                trace!(%timestamp, error = %e, "leg delta unavailable, skipping timestamp");
                return None;
            }
        };

        Some(SpreadMetrics {
            timestamp,
            short_price,
            long_price,
            underlying_price,
            short_delta,
            long_delta,
            spread_price: short_price - long_price,
            total_delta: short_delta.abs() - long_delta.abs(),
        })
    }

    /// First exit condition that holds, with its P&L.
    pub fn check_exit(
        &self,
        spread: &Spread,
        thresholds: &ExitThresholds,
        metrics: &SpreadMetrics,
    ) -> Option<(ExitStatus, Decimal)> {
        let close_pnl = (spread.credit_received - metrics.spread_price) * CONTRACT_MULTIPLIER;

        if metrics.spread_price <= thresholds.target_profit_price {
            return Some((ExitStatus::TargetProfit, close_pnl));
        }

        if metrics.total_delta >= thresholds.delta_stop_loss {
            return Some((ExitStatus::DeltaStopLoss, close_pnl));
        }

        let short_strike = spread.short_leg.strike_price;
        if metrics.underlying_price <= short_strike {
            let intrinsic = short_strike - metrics.underlying_price;
            return Some((
                ExitStatus::AssignmentRisk,
                (spread.credit_received - intrinsic) * CONTRACT_MULTIPLIER,
            ));
        }

        None
    }
}
