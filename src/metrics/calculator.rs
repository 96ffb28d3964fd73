//! Performance metrics calculator.
//!
//! Reduces the outcome sequence of a run into summary statistics.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backtest::{BacktestResult, ExitStatus, TradeOutcome};

/// Trading performance statistics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    // Basic statistics
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,

    // P&L metrics
    pub total_pnl: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub profit_factor: f64,
    pub avg_trade_pnl: Decimal,
    pub avg_winner: Decimal,
    pub avg_loser: Decimal,
    pub largest_winner: Decimal,
    pub largest_loser: Decimal,

    // Risk metrics
    /// Largest peak-to-trough fall of the cumulative P&L curve.
    pub max_drawdown: Decimal,

    // Exit breakdown
    pub status_counts: BTreeMap<ExitStatus, usize>,

    // Time metrics
    pub avg_minutes_in_trade: f64,
    pub avg_minutes_to_target: f64,
    pub avg_minutes_to_stop: f64,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            total_pnl: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            profit_factor: 0.0,
            avg_trade_pnl: Decimal::ZERO,
            avg_winner: Decimal::ZERO,
            avg_loser: Decimal::ZERO,
            largest_winner: Decimal::ZERO,
            largest_loser: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            status_counts: BTreeMap::new(),
            avg_minutes_in_trade: 0.0,
            avg_minutes_to_target: 0.0,
            avg_minutes_to_stop: 0.0,
        }
    }
}

impl PerformanceMetrics {
    /// Calculate all metrics from an outcome sequence.
    pub fn from_outcomes(trades: &[TradeOutcome]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }

        // Basic counts
        let total_trades = trades.len();
        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        let losing_trades = total_trades - winning_trades;
        let win_rate = winning_trades as f64 / total_trades as f64;

        // P&L calculations
        let total_pnl: Decimal = trades.iter().map(|t| t.theoretical_pnl).sum();
        let gross_profit: Decimal = trades
            .iter()
            .filter(|t| t.is_winner())
            .map(|t| t.theoretical_pnl)
            .sum();
        let gross_loss: Decimal = trades
            .iter()
            .filter(|t| !t.is_winner())
            .map(|t| t.theoretical_pnl)
            .sum();

        let avg_trade_pnl = total_pnl / Decimal::from(total_trades);
        let avg_winner = average(gross_profit, winning_trades);
        let avg_loser = average(gross_loss, losing_trades);

        let largest_winner = trades
            .iter()
            .map(|t| t.theoretical_pnl)
            .max()
            .unwrap_or(Decimal::ZERO);
        let largest_loser = trades
            .iter()
            .map(|t| t.theoretical_pnl)
            .min()
            .unwrap_or(Decimal::ZERO);

        let mut status_counts = BTreeMap::new();
        for trade in trades {
            *status_counts.entry(trade.status).or_insert(0) += 1;
        }

        Self {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            total_pnl,
            gross_profit,
            gross_loss,
            profit_factor: MetricsCalculator::calculate_profit_factor(gross_profit, gross_loss),
            avg_trade_pnl,
            avg_winner,
            avg_loser,
            largest_winner,
            largest_loser,
            max_drawdown: MetricsCalculator::max_drawdown(trades),
            status_counts,
            avg_minutes_in_trade: MetricsCalculator::avg_minutes(trades.iter()),
            avg_minutes_to_target: MetricsCalculator::avg_minutes_by_status(
                trades,
                ExitStatus::TargetProfit,
            ),
            avg_minutes_to_stop: MetricsCalculator::avg_minutes_by_status(
                trades,
                ExitStatus::DeltaStopLoss,
            ),
        }
    }

    /// Number of trades that closed with `status`.
    pub fn count(&self, status: ExitStatus) -> usize {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }

    /// Generate a summary report.
    pub fn summary(&self) -> String {
        let mut breakdown = String::new();
        for (status, count) in &self.status_counts {
            breakdown.push_str(&format!("  {status}: {count}\n"));
        }

        format!(
            "Performance Summary\n\
             ====================\n\
             \n\
             Trades: {} (W: {}, L: {})\n\
             Win Rate: {:.1}%\n\
             Profit Factor: {:.2}\n\
             \n\
             Total P&L: ${:.2}\n\
             Avg Trade: ${:.2}\n\
             Avg Winner: ${:.2}\n\
             Avg Loser: ${:.2}\n\
             Largest Win: ${:.2}\n\
             Largest Loss: ${:.2}\n\
             Max Drawdown: ${:.2}\n\
             \n\
             Avg Minutes in Trade: {:.1}\n\
             \n\
             Exit Status:\n\
             {}",
            self.total_trades,
            self.winning_trades,
            self.losing_trades,
            self.win_rate * 100.0,
            self.profit_factor,
            self.total_pnl,
            self.avg_trade_pnl,
            self.avg_winner,
            self.avg_loser,
            self.largest_winner,
            self.largest_loser,
            self.max_drawdown,
            self.avg_minutes_in_trade,
            breakdown
        )
    }
}

fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    total / Decimal::from(count)
}

/// Metrics calculator.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Calculate all metrics from a backtest result.
    pub fn calculate(result: &BacktestResult) -> PerformanceMetrics {
        PerformanceMetrics::from_outcomes(&result.outcomes)
    }

    /// Gross profit over absolute gross loss.
    ///
    /// Infinite when there is profit but no loss; zero when there is neither.
    fn calculate_profit_factor(gross_profit: Decimal, gross_loss: Decimal) -> f64 {
        let loss: f64 = gross_loss.abs().try_into().unwrap_or(0.0);
        let profit: f64 = gross_profit.try_into().unwrap_or(0.0);
        if loss == 0.0 {
            return if profit > 0.0 { f64::INFINITY } else { 0.0 };
        }
        profit / loss
    }

    /// Largest drop of cumulative P&L from its running peak (starting at 0).
    fn max_drawdown(trades: &[TradeOutcome]) -> Decimal {
        let mut equity = Decimal::ZERO;
        let mut peak = Decimal::ZERO;
        let mut max_drawdown = Decimal::ZERO;

        for trade in trades {
            equity += trade.theoretical_pnl;
            peak = peak.max(equity);
            max_drawdown = max_drawdown.max(peak - equity);
        }

        max_drawdown
    }

    fn avg_minutes<'a>(trades: impl Iterator<Item = &'a TradeOutcome>) -> f64 {
        let (total, count) = trades.fold((0i64, 0usize), |(total, count), t| {
            (total + t.holding_minutes(), count + 1)
        });
        if count == 0 {
            return 0.0;
        }
        total as f64 / count as f64
    }

    /// Calculate average minutes in trade by exit status.
    fn avg_minutes_by_status(trades: &[TradeOutcome], status: ExitStatus) -> f64 {
        Self::avg_minutes(trades.iter().filter(|t| t.status == status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::StopReason;
    use crate::test_support::at;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn outcome(status: ExitStatus, pnl: Decimal, entry: u32, exit: u32) -> TradeOutcome {
        TradeOutcome {
            status,
            theoretical_pnl: pnl,
            entry_time: at(14, entry),
            exit_time: at(14, exit),
            credit_received: dec!(1.20),
            spread_width: dec!(3),
            short_symbol: "SPY250616P00570000".to_string(),
            long_symbol: "SPY250616P00567000".to_string(),
        }
    }

    fn sample() -> Vec<TradeOutcome> {
        vec![
            outcome(ExitStatus::TargetProfit, dec!(65), 0, 10),
            outcome(ExitStatus::DeltaStopLoss, dec!(-40), 11, 31),
            outcome(ExitStatus::AssignmentRisk, dec!(-20), 32, 36),
            outcome(ExitStatus::Expired, dec!(120), 37, 59),
        ]
    }

    #[test]
    fn test_counts_and_pnl() {
        let metrics = PerformanceMetrics::from_outcomes(&sample());

        assert_eq!(metrics.total_trades, 4);
        assert_eq!(metrics.winning_trades, 2);
        assert_eq!(metrics.losing_trades, 2);
        assert_relative_eq!(metrics.win_rate, 0.5);

        assert_eq!(metrics.total_pnl, dec!(125));
        assert_eq!(metrics.gross_profit, dec!(185));
        assert_eq!(metrics.gross_loss, dec!(-60));
        assert_eq!(metrics.avg_trade_pnl, dec!(31.25));
        assert_eq!(metrics.avg_winner, dec!(92.5));
        assert_eq!(metrics.avg_loser, dec!(-30));
        assert_eq!(metrics.largest_winner, dec!(120));
        assert_eq!(metrics.largest_loser, dec!(-40));
        assert_relative_eq!(metrics.profit_factor, 185.0 / 60.0, epsilon = 1e-12);
    }

    #[test]
    fn test_drawdown_and_breakdown() {
        let metrics = PerformanceMetrics::from_outcomes(&sample());

        // Curve: 65, 25, 5, 125
        assert_eq!(metrics.max_drawdown, dec!(60));
        assert_eq!(metrics.count(ExitStatus::TargetProfit), 1);
        assert_eq!(metrics.count(ExitStatus::Expired), 1);
        assert_eq!(metrics.status_counts.len(), 4);

        // (10 + 20 + 4 + 22) / 4
        assert_relative_eq!(metrics.avg_minutes_in_trade, 14.0);
        assert_relative_eq!(metrics.avg_minutes_to_target, 10.0);
        assert_relative_eq!(metrics.avg_minutes_to_stop, 20.0);
    }

    #[test]
    fn test_profit_factor() {
        assert_eq!(
            MetricsCalculator::calculate_profit_factor(dec!(15000), dec!(-5000)),
            3.0
        );
        assert!(MetricsCalculator::calculate_profit_factor(dec!(100), Decimal::ZERO).is_infinite());
        assert_eq!(
            MetricsCalculator::calculate_profit_factor(Decimal::ZERO, Decimal::ZERO),
            0.0
        );
    }

    #[test]
    fn test_empty_outcomes() {
        let metrics = PerformanceMetrics::from_outcomes(&[]);
        assert_eq!(metrics, PerformanceMetrics::default());
        assert_eq!(metrics.count(ExitStatus::Expired), 0);
        assert!(metrics.summary().contains("Trades: 0"));
    }

    #[test]
    fn test_calculate_from_result() {
        let result = BacktestResult {
            outcomes: sample(),
            stop_reason: StopReason::NoSpreadFound,
            iterations: 5,
        };
        let metrics = MetricsCalculator::calculate(&result);
        assert_eq!(metrics.total_pnl, result.total_pnl());

        let summary = metrics.summary();
        assert!(summary.contains("Win Rate: 50.0%"));
        assert!(summary.contains("delta_stop_loss: 1"));
    }
}
