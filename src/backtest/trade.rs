//! Spread and trade records for the put credit spread strategy.
//!
//! Covers the trade lifecycle data:
//! - Legs (entry-time snapshot of one contract)
//! - Spread (short put + long put, credit, width)
//! - Exit status and the per-trade outcome

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Shares per contract; converts per-share P&L into contract dollars.
pub const CONTRACT_MULTIPLIER: Decimal = Decimal::ONE_HUNDRED;

/// One contract of a spread as observed when it was selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    /// OCC option symbol.
    pub symbol: String,
    /// Strike price.
    pub strike_price: Decimal,
    /// Underlying price at selection.
    pub underlying_price: Decimal,
    /// Implied delta at selection.
    pub delta: f64,
    /// Mid price at selection.
    pub price: Decimal,
    /// Quote time.
    pub timestamp: DateTime<Utc>,
    /// Contract expiry.
    pub expiry: DateTime<Utc>,
}

/// A vertical put credit spread: short the higher delta put, long the lower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub short_leg: OptionLeg,
    pub long_leg: OptionLeg,
    /// Short price minus long price (may be negative if mids invert).
    pub credit_received: Decimal,
    /// Timestamp of the tick that completed the pair.
    pub entry_timestamp: DateTime<Utc>,
    /// Absolute strike distance.
    pub width: Decimal,
}

impl Spread {
    /// Build a spread from its two legs.
    pub fn new(short_leg: OptionLeg, long_leg: OptionLeg, entry_timestamp: DateTime<Utc>) -> Self {
        let credit_received = short_leg.price - long_leg.price;
        let width = (short_leg.strike_price - long_leg.strike_price).abs();
        Self {
            short_leg,
            long_leg,
            credit_received,
            entry_timestamp,
            width,
        }
    }

    /// Net delta exposure at entry: `|short delta| - |long delta|`.
    pub fn initial_total_delta(&self) -> f64 {
        self.short_leg.delta.abs() - self.long_leg.delta.abs()
    }

    /// Maximum loss per share if the spread finishes fully in the money.
    pub fn max_loss(&self) -> Decimal {
        self.width - self.credit_received
    }
}

impl fmt::Display for Spread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "short {} @ {} (delta {:.3}) / long {} @ {} (delta {:.3}), credit {}, width {}",
            self.short_leg.symbol,
            self.short_leg.price,
            self.short_leg.delta,
            self.long_leg.symbol,
            self.long_leg.price,
            self.long_leg.delta,
            self.credit_received,
            self.width
        )
    }
}

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    /// Spread decayed to the profit target.
    TargetProfit,
    /// Net delta grew past the stop multiple.
    DeltaStopLoss,
    /// Underlying traded at or below the short strike.
    AssignmentRisk,
    /// Data ran out with no exit; full credit kept.
    Expired,
}

impl ExitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TargetProfit => "target_profit",
            Self::DeltaStopLoss => "delta_stop_loss",
            Self::AssignmentRisk => "assignment_risk",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed trade, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub status: ExitStatus,
    /// P&L in contract dollars, from mid prices.
    pub theoretical_pnl: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub credit_received: Decimal,
    pub spread_width: Decimal,
    pub short_symbol: String,
    pub long_symbol: String,
}

impl TradeOutcome {
    /// Outcome of `spread` closing with `status` at `exit_time`.
    pub fn close(
        spread: &Spread,
        status: ExitStatus,
        theoretical_pnl: Decimal,
        exit_time: DateTime<Utc>,
    ) -> Self {
        Self {
            status,
            theoretical_pnl,
            entry_time: spread.entry_timestamp,
            exit_time,
            credit_received: spread.credit_received,
            spread_width: spread.width,
            short_symbol: spread.short_leg.symbol.clone(),
            long_symbol: spread.long_leg.symbol.clone(),
        }
    }

    /// Check if trade was profitable.
    pub fn is_winner(&self) -> bool {
        self.theoretical_pnl > Decimal::ZERO
    }

    /// Whole minutes the position was held.
    pub fn holding_minutes(&self) -> i64 {
        (self.exit_time - self.entry_time).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, expiry};
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn leg(symbol: &str, strike: Decimal, delta: f64, price: Decimal) -> OptionLeg {
        OptionLeg {
            symbol: symbol.to_string(),
            strike_price: strike,
            underlying_price: dec!(572),
            delta,
            price,
            timestamp: at(14, 0),
            expiry: expiry(),
        }
    }

    #[test]
    fn test_spread_derived_fields() {
        let spread = Spread::new(
            leg("SPY250616P00570000", dec!(570), -0.30, dec!(2.00)),
            leg("SPY250616P00567000", dec!(567), -0.25, dec!(0.80)),
            at(14, 0),
        );

        assert_eq!(spread.credit_received, dec!(1.20));
        assert_eq!(spread.width, dec!(3));
        assert_eq!(spread.max_loss(), dec!(1.80));
        assert_relative_eq!(spread.initial_total_delta(), 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_credit_is_kept() {
        let spread = Spread::new(
            leg("SPY250616P00567000", dec!(567), -0.30, dec!(0.50)),
            leg("SPY250616P00570000", dec!(570), -0.25, dec!(0.90)),
            at(14, 0),
        );
        assert_eq!(spread.credit_received, dec!(-0.40));
        assert_eq!(spread.width, dec!(3));
    }

    #[test]
    fn test_outcome_from_spread() {
        let spread = Spread::new(
            leg("SPY250616P00570000", dec!(570), -0.30, dec!(2.00)),
            leg("SPY250616P00567000", dec!(567), -0.25, dec!(0.80)),
            at(14, 0),
        );
        let outcome = TradeOutcome::close(&spread, ExitStatus::TargetProfit, dec!(65), at(14, 45));

        assert!(outcome.is_winner());
        assert_eq!(outcome.holding_minutes(), 45);
        assert_eq!(outcome.short_symbol, "SPY250616P00570000");
        assert_eq!(outcome.spread_width, dec!(3));
    }

    #[test]
    fn test_exit_status_names() {
        assert_eq!(ExitStatus::DeltaStopLoss.to_string(), "delta_stop_loss");
        assert_eq!(ExitStatus::Expired.as_str(), "expired");
    }
}
