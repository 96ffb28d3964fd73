pub mod backtest;
pub mod config;
pub mod data;
pub mod metrics;
pub mod pricing;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use backtest::{
    BacktestEngine, BacktestEvent, BacktestResult, EventSink, ExitRules, ExitStatus, OptionLeg,
    Spread, SpreadFinder, SpreadFinderConfig, StopReason, TradeOutcome, TradeSimulator,
};
pub use config::{BacktestConfig, ConfigError};
pub use data::{LoaderError, OccSymbol, OptionType, Tick, TickLoader, TickStream};
pub use metrics::{MetricsCalculator, PerformanceMetrics};
pub use pricing::{BlackScholes, PricingError, PricingResult};
pub use validation::{TickIntegrityReport, TickStreamValidator};
