//! Black-Scholes pricing, implied volatility and implied delta.
//!
//! Deltas are always derived from the volatility implied by the observed
//! mid-price, so the delta used to select and monitor a leg is consistent
//! with the quote that was actually seen.

use chrono::{DateTime, Utc};
use statrs::distribution::{ContinuousCDF, Normal};

use super::brent;
use super::{PricingError, PricingResult};
use crate::data::OptionType;

/// Lower bound of the implied volatility search.
pub const MIN_VOLATILITY: f64 = 1e-6;

/// Upper bound of the implied volatility search.
pub const MAX_VOLATILITY: f64 = 5.0;

/// Quotes within this distance of intrinsic value imply zero volatility.
pub const INTRINSIC_EPSILON: f64 = 1e-6;

/// Floor on time to expiry, in years.
pub const MIN_TIME_TO_EXPIRY: f64 = 1e-6;

pub const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 60.0 * 60.0;

/// Black-Scholes calculator for European options without dividends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholes {
    /// Risk-free interest rate
    pub rate: f64,
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self { rate: 0.01 }
    }
}

impl BlackScholes {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Calculate d1 parameter.
    ///
    /// At zero volatility d1 collapses to +/- infinity depending on the
    /// sign of the forward moneyness.
    pub fn d1(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        let numerator = (spot / strike).ln() + (self.rate + 0.5 * vol * vol) * time;
        if vol <= 0.0 {
            return if numerator > 0.0 {
                f64::INFINITY
            } else if numerator < 0.0 {
                f64::NEG_INFINITY
            } else {
                0.0
            };
        }
        numerator / (vol * time.sqrt())
    }

    /// Calculate d2 parameter.
    pub fn d2(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        self.d1(spot, strike, time, vol) - vol * time.sqrt()
    }

    /// Standard normal CDF.
    fn norm_cdf(x: f64) -> f64 {
        Normal::standard().cdf(x)
    }

    /// Calculate call option price.
    pub fn call_price(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        if time <= 0.0 {
            return (spot - strike).max(0.0);
        }

        let d1 = self.d1(spot, strike, time, vol);
        let d2 = self.d2(spot, strike, time, vol);

        spot * Self::norm_cdf(d1) - strike * (-self.rate * time).exp() * Self::norm_cdf(d2)
    }

    /// Calculate put option price.
    pub fn put_price(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        if time <= 0.0 {
            return (strike - spot).max(0.0);
        }

        let d1 = self.d1(spot, strike, time, vol);
        let d2 = self.d2(spot, strike, time, vol);

        strike * (-self.rate * time).exp() * Self::norm_cdf(-d2) - spot * Self::norm_cdf(-d1)
    }

    /// Calculate option price based on type.
    pub fn price(&self, spot: f64, strike: f64, time: f64, vol: f64, opt_type: OptionType) -> f64 {
        match opt_type {
            OptionType::Call => self.call_price(spot, strike, time, vol),
            OptionType::Put => self.put_price(spot, strike, time, vol),
        }
    }

    /// Calculate delta for a known volatility.
    pub fn delta(&self, spot: f64, strike: f64, time: f64, vol: f64, opt_type: OptionType) -> f64 {
        if time <= 0.0 {
            return expiry_delta(spot, strike, opt_type);
        }

        let d1 = self.d1(spot, strike, time, vol);

        match opt_type {
            OptionType::Call => Self::norm_cdf(d1),
            OptionType::Put => Self::norm_cdf(d1) - 1.0,
        }
    }

    /// Calculate implied volatility from an observed option price.
    ///
    /// Quotes at or below intrinsic value (within [`INTRINSIC_EPSILON`])
    /// imply zero volatility. Otherwise the price is inverted with Brent's
    /// method over `[MIN_VOLATILITY, MAX_VOLATILITY]`.
    pub fn implied_vol(
        &self,
        spot: f64,
        strike: f64,
        time: f64,
        price: f64,
        opt_type: OptionType,
    ) -> PricingResult<f64> {
        check_inputs(spot, strike, time)?;
        if !price.is_finite() {
            return Err(PricingError::InvalidInput("option price is not finite"));
        }

        if price <= intrinsic_value(spot, strike, opt_type) + INTRINSIC_EPSILON {
            return Ok(0.0);
        }

        brent::find_root(
            |vol| self.price(spot, strike, time, vol, opt_type) - price,
            MIN_VOLATILITY,
            MAX_VOLATILITY,
        )
    }

    /// Delta implied by an observed price at `now`.
    ///
    /// Time to expiry is floored at [`MIN_TIME_TO_EXPIRY`]; a floored
    /// contract is treated as expiring and gets the intrinsic indicator
    /// delta without inverting for volatility.
    pub fn implied_delta(
        &self,
        price: f64,
        strike: f64,
        expiry: DateTime<Utc>,
        spot: f64,
        opt_type: OptionType,
        now: DateTime<Utc>,
    ) -> PricingResult<f64> {
        let time = year_fraction(expiry, now);
        if time <= MIN_TIME_TO_EXPIRY {
            return Ok(expiry_delta(spot, strike, opt_type));
        }

        let vol = self.implied_vol(spot, strike, time, price, opt_type)?;
        Ok(self.delta(spot, strike, time, vol, opt_type))
    }
}

/// Intrinsic value of an option.
pub fn intrinsic_value(spot: f64, strike: f64, opt_type: OptionType) -> f64 {
    match opt_type {
        OptionType::Call => (spot - strike).max(0.0),
        OptionType::Put => (strike - spot).max(0.0),
    }
}

/// Delta of an option at expiry: 1/-1 when in the money, 0 otherwise.
pub fn expiry_delta(spot: f64, strike: f64, opt_type: OptionType) -> f64 {
    match opt_type {
        OptionType::Call => {
            if spot > strike {
                1.0
            } else {
                0.0
            }
        }
        OptionType::Put => {
            if spot < strike {
                -1.0
            } else {
                0.0
            }
        }
    }
}

/// Years between `now` and `expiry` (negative once expired).
pub fn year_fraction(expiry: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (expiry - now).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_YEAR
}

fn check_inputs(spot: f64, strike: f64, time: f64) -> PricingResult<()> {
    if !(spot.is_finite() && spot > 0.0) {
        return Err(PricingError::InvalidInput("underlying price must be positive"));
    }
    if !(strike.is_finite() && strike > 0.0) {
        return Err(PricingError::InvalidInput("strike must be positive"));
    }
    if !(time.is_finite() && time > 0.0) {
        return Err(PricingError::InvalidInput("time to expiry must be positive"));
    }
    Ok(())
}
