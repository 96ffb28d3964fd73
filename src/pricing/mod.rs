//! Option pricing: Black-Scholes prices, implied volatility and delta.
//!
//! Nothing here holds state. Every fallible computation returns a
//! [`PricingResult`]; callers treat an error as "unavailable for this
//! tick" and move on.

pub mod black_scholes;
pub mod brent;

use thiserror::Error;

pub use black_scholes::{
    expiry_delta, intrinsic_value, year_fraction, BlackScholes, INTRINSIC_EPSILON,
    MAX_VOLATILITY, MIN_TIME_TO_EXPIRY, MIN_VOLATILITY,
};

/// Why a price could not be turned into a volatility or delta.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PricingError {
    #[error("no volatility in [{low}, {high}] reproduces the quoted price")]
    NotBracketed { low: f64, high: f64 },

    #[error("root finding did not converge after {0} iterations")]
    NoConvergence(usize),

    #[error("invalid pricing input: {0}")]
    InvalidInput(&'static str),
}

pub type PricingResult<T> = Result<T, PricingError>;
