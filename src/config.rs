//! Backtest configuration.
//!
//! Loaded from a TOML file; every key is optional and falls back to the
//! default below. Example:
//!
//! ```toml
//! short_put_delta_range = [-0.60, -0.20]
//! long_put_delta_range = [-0.40, -0.20]
//! spread_width_range = [2, 4]
//! risk_free_rate = 0.01
//! delta_stop_loss_multiplier = 2.5
//! target_profit_percentage = 0.5
//! max_iterations = 5000
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backtest::{ExitRules, SpreadFinderConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Strategy and run parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Put delta band for the short leg.
    pub short_put_delta_range: (f64, f64),

    /// Put delta band for the long leg.
    pub long_put_delta_range: (f64, f64),

    /// Allowed strike width, in points.
    pub spread_width_range: (Decimal, Decimal),

    pub risk_free_rate: f64,

    /// Stop out when net delta reaches this multiple of the entry net delta.
    pub delta_stop_loss_multiplier: f64,

    /// Take profit once the spread is worth this fraction of the credit.
    pub target_profit_percentage: Decimal,

    /// Maximum number of spread searches per run.
    pub max_iterations: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            short_put_delta_range: (-0.60, -0.20),
            long_put_delta_range: (-0.40, -0.20),
            spread_width_range: (Decimal::TWO, Decimal::from(4)),
            risk_free_rate: 0.01,
            delta_stop_loss_multiplier: 2.5,
            target_profit_percentage: Decimal::new(5, 1),
            max_iterations: 5000,
        }
    }
}

impl BacktestConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_overrides(&mut self, max_iterations: Option<usize>) {
        if let Some(max) = max_iterations {
            self.max_iterations = max;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_band("short_put_delta_range", self.short_put_delta_range)?;
        check_band("long_put_delta_range", self.long_put_delta_range)?;

        let (min_width, max_width) = self.spread_width_range;
        if min_width <= Decimal::ZERO || min_width > max_width {
            return Err(ConfigError::Invalid(format!(
                "spread_width_range must satisfy 0 < min <= max, got ({min_width}, {max_width})"
            )));
        }

        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::Invalid("risk_free_rate must be finite".into()));
        }

        if !(self.delta_stop_loss_multiplier.is_finite() && self.delta_stop_loss_multiplier > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "delta_stop_loss_multiplier must be positive, got {}",
                self.delta_stop_loss_multiplier
            )));
        }

        if self.target_profit_percentage < Decimal::ZERO
            || self.target_profit_percentage > Decimal::ONE
        {
            return Err(ConfigError::Invalid(format!(
                "target_profit_percentage must be within [0, 1], got {}",
                self.target_profit_percentage
            )));
        }

        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid("max_iterations must be positive".into()));
        }

        Ok(())
    }

    pub fn finder_config(&self) -> SpreadFinderConfig {
        SpreadFinderConfig {
            short_delta_range: self.short_put_delta_range,
            long_delta_range: self.long_put_delta_range,
            width_range: self.spread_width_range,
            risk_free_rate: self.risk_free_rate,
        }
    }

    pub fn exit_rules(&self) -> ExitRules {
        ExitRules {
            risk_free_rate: self.risk_free_rate,
            delta_stop_loss_multiplier: self.delta_stop_loss_multiplier,
            target_profit_fraction: self.target_profit_percentage,
        }
    }
}

fn check_band(name: &str, (low, high): (f64, f64)) -> Result<(), ConfigError> {
    if !(low.is_finite() && high.is_finite()) || low > high {
        return Err(ConfigError::Invalid(format!(
            "{name} must satisfy low <= high, got ({low}, {high})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = BacktestConfig::default();
        assert_eq!(config.short_put_delta_range, (-0.60, -0.20));
        assert_eq!(config.long_put_delta_range, (-0.40, -0.20));
        assert_eq!(config.spread_width_range, (dec!(2), dec!(4)));
        assert_eq!(config.target_profit_percentage, dec!(0.5));
        assert_eq!(config.max_iterations, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = BacktestConfig::from_toml_str(
            r#"
            short_put_delta_range = [-0.35, -0.25]
            spread_width_range = [1, 5]
            target_profit_percentage = 0.4
            "#,
        )
        .unwrap();

        assert_eq!(config.short_put_delta_range, (-0.35, -0.25));
        assert_eq!(config.spread_width_range, (dec!(1), dec!(5)));
        assert_eq!(config.target_profit_percentage, dec!(0.4));
        assert_eq!(config.long_put_delta_range, (-0.40, -0.20));
        assert_eq!(config.delta_stop_loss_multiplier, 2.5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            "short_put_delta_range = [-0.2, -0.6]",
            "spread_width_range = [0, 4]",
            "spread_width_range = [5, 4]",
            "delta_stop_loss_multiplier = 0.0",
            "target_profit_percentage = 1.5",
            "max_iterations = 0",
        ];
        for case in cases {
            assert!(
                matches!(
                    BacktestConfig::from_toml_str(case),
                    Err(ConfigError::Invalid(_))
                ),
                "accepted: {case}"
            );
        }

        assert!(matches!(
            BacktestConfig::from_toml_str("max_iterations = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_conversions() {
        let config = BacktestConfig::default();
        let finder = config.finder_config();
        assert_eq!(finder.short_delta_range, config.short_put_delta_range);
        assert_eq!(finder.width_range, config.spread_width_range);

        let rules = config.exit_rules();
        assert_eq!(rules.target_profit_fraction, dec!(0.5));
        assert_eq!(rules.delta_stop_loss_multiplier, 2.5);
    }

    #[test]
    fn test_from_file_and_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_iterations = 12").unwrap();

        let mut config = BacktestConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_iterations, 12);

        config.apply_overrides(Some(3));
        assert_eq!(config.max_iterations, 3);
        config.apply_overrides(None);
        assert_eq!(config.max_iterations, 3);

        assert!(matches!(
            BacktestConfig::from_file("/nonexistent/backtest.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
