//! Two-leg put credit spread selection from a tick stream.
//!
//! The finder makes one greedy forward pass:
//! - A tick whose put delta falls in the short band fills the empty short slot
//! - Otherwise a tick in the long band replaces the long candidate
//! - Once both slots are filled the strike width is checked; a width outside
//!   the range clears both slots and scanning resumes
//!
//! The first pair with an acceptable width is returned.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::data::{OptionType, Tick};
use crate::pricing::{BlackScholes, PricingError, PricingResult};

use super::trade::{OptionLeg, Spread};

/// Selection bands for the finder. All ranges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadFinderConfig {
    /// Put delta band for the short leg, `(low, high)`.
    pub short_delta_range: (f64, f64),
    /// Put delta band for the long leg, `(low, high)`.
    pub long_delta_range: (f64, f64),
    /// Acceptable strike width, `(min, max)`.
    pub width_range: (Decimal, Decimal),
    pub risk_free_rate: f64,
}

impl Default for SpreadFinderConfig {
    fn default() -> Self {
        Self {
            short_delta_range: (-0.60, -0.20),
            long_delta_range: (-0.40, -0.20),
            width_range: (Decimal::TWO, Decimal::from(4)),
            risk_free_rate: 0.01,
        }
    }
}

impl SpreadFinderConfig {
    fn in_short_band(&self, delta: f64) -> bool {
        in_range(delta, self.short_delta_range)
    }

    fn in_long_band(&self, delta: f64) -> bool {
        in_range(delta, self.long_delta_range)
    }

    fn width_ok(&self, width: Decimal) -> bool {
        width >= self.width_range.0 && width <= self.width_range.1
    }
}

fn in_range(value: f64, (low, high): (f64, f64)) -> bool {
    value >= low && value <= high
}

/// Greedy spread finder.
#[derive(Debug, Clone)]
pub struct SpreadFinder {
    config: SpreadFinderConfig,
    pricer: BlackScholes,
}

impl SpreadFinder {
    pub fn new(config: SpreadFinderConfig) -> Self {
        Self {
            config,
            pricer: BlackScholes::new(config.risk_free_rate),
        }
    }

    pub fn config(&self) -> &SpreadFinderConfig {
        &self.config
    }

    /// Scan timestamp groups in order and return the first valid spread.
    ///
    /// Returns `None` when the groups run out without a pairing.
    pub fn find<'a, I>(&self, groups: I) -> Option<Spread>
    where
        I: IntoIterator<Item = (&'a DateTime<Utc>, &'a Vec<Tick>)>,
    {
        let mut short: Option<OptionLeg> = None;
        let mut long: Option<OptionLeg> = None;

        for (timestamp, ticks) in groups {
            for tick in ticks {
                let Some(underlying) = tick.underlying_price else {
                    trace!(symbol = %tick.option_symbol, %timestamp, "no underlying quote, skipping tick");
                    continue;
                };

                let delta = match self.tick_delta(tick, underlying) {
                    Ok(delta) => delta,
                    Err(e) => {
                        trace!(symbol = %tick.option_symbol, %timestamp, error = %e, "delta unavailable, skipping tick");
                        continue;
                    }
                };

                if short.is_none() && self.config.in_short_band(delta) {
                    short = Some(snapshot_leg(tick, underlying, delta));
                } else if self.config.in_long_band(delta) {
                    long = Some(snapshot_leg(tick, underlying, delta));
                } else {
                    continue;
                }

                let (Some(s), Some(l)) = (&short, &long) else {
                    continue;
                };

                let width = (s.strike_price - l.strike_price).abs();
                if self.config.width_ok(width) {
                    return Some(Spread::new(s.clone(), l.clone(), *timestamp));
                }

                debug!(
                    %width,
                    short = %s.symbol,
                    long = %l.symbol,
                    "width outside range, resetting both legs"
                );
                short = None;
                long = None;
            }
        }

        None
    }

    fn tick_delta(&self, tick: &Tick, underlying: Decimal) -> PricingResult<f64> {
        put_delta(
            &self.pricer,
            tick.midpoint,
            tick.strike_price,
            tick.expiry,
            underlying,
            tick.timestamp,
        )
    }
}

/// Implied put delta from decimal quote fields.
pub(crate) fn put_delta(
    pricer: &BlackScholes,
    price: Decimal,
    strike: Decimal,
    expiry: DateTime<Utc>,
    underlying: Decimal,
    now: DateTime<Utc>,
) -> PricingResult<f64> {
    pricer.implied_delta(
        to_f64(price)?,
        to_f64(strike)?,
        expiry,
        to_f64(underlying)?,
        OptionType::Put,
        now,
    )
}

fn to_f64(value: Decimal) -> PricingResult<f64> {
    value
        .to_f64()
        .ok_or(PricingError::InvalidInput("decimal out of f64 range"))
}

fn snapshot_leg(tick: &Tick, underlying: Decimal, delta: f64) -> OptionLeg {
    OptionLeg {
        symbol: tick.option_symbol.clone(),
        strike_price: tick.strike_price,
        underlying_price: underlying,
        delta,
        price: tick.midpoint,
        timestamp: tick.timestamp,
        expiry: tick.expiry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TickStream;
    use crate::test_support::{at, priced_put, quote, tick_delta, RATE};
    use rust_decimal_macros::dec;

    const BAND: f64 = 1e-3;

    fn band_around(deltas: &[f64]) -> (f64, f64) {
        let low = deltas.iter().cloned().fold(f64::INFINITY, f64::min);
        let high = deltas.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        (low - BAND, high + BAND)
    }

    fn finder(short: (f64, f64), long: (f64, f64)) -> SpreadFinder {
        SpreadFinder::new(SpreadFinderConfig {
            short_delta_range: short,
            long_delta_range: long,
            width_range: (dec!(2), dec!(4)),
            risk_free_rate: RATE,
        })
    }

    #[test]
    fn test_finds_first_valid_pair() {
        let short = priced_put("SPY250616P00570000", dec!(570), dec!(572), 0.20, at(14, 0));
        let long = priced_put("SPY250616P00567000", dec!(567), dec!(572), 0.20, at(14, 0));
        let (ds, dl) = (tick_delta(&short), tick_delta(&long));
        let stream = TickStream::from_ticks(vec![short.clone(), long.clone()]);

        let spread = finder(band_around(&[ds]), band_around(&[dl]))
            .find(stream.iter())
            .unwrap();

        assert_eq!(spread.short_leg.symbol, short.option_symbol);
        assert_eq!(spread.long_leg.symbol, long.option_symbol);
        assert_eq!(spread.width, dec!(3));
        assert_eq!(spread.credit_received, short.midpoint - long.midpoint);
        assert_eq!(spread.entry_timestamp, at(14, 0));
        assert_eq!(spread.short_leg.underlying_price, dec!(572));
        assert!((spread.short_leg.delta - ds).abs() < 1e-12);
    }

    #[test]
    fn test_tick_in_both_bands_fills_short_first() {
        let first = priced_put("SPY250616P00567000", dec!(567), dec!(572), 0.20, at(14, 0));
        let second = priced_put("SPY250616P00570000", dec!(570), dec!(572), 0.20, at(14, 0));
        let stream = TickStream::from_ticks(vec![first, second]);

        let spread = finder((-1.0, 0.0), (-1.0, 0.0)).find(stream.iter()).unwrap();

        assert_eq!(spread.short_leg.strike_price, dec!(567));
        assert_eq!(spread.long_leg.strike_price, dec!(570));
        assert_eq!(spread.credit_received, spread.short_leg.price - spread.long_leg.price);
    }

    #[test]
    fn test_later_long_candidate_overwrites_earlier() {
        let far = priced_put("SPY250616P00564000", dec!(564), dec!(572), 0.30, at(14, 0));
        let near = priced_put("SPY250616P00567000", dec!(567), dec!(572), 0.20, at(14, 1));
        let short = priced_put("SPY250616P00570000", dec!(570), dec!(572), 0.20, at(14, 2));
        let long_band = band_around(&[tick_delta(&far), tick_delta(&near)]);
        let short_band = band_around(&[tick_delta(&short)]);
        let stream = TickStream::from_ticks(vec![far, near, short]);

        let spread = finder(short_band, long_band).find(stream.iter()).unwrap();

        assert_eq!(spread.long_leg.strike_price, dec!(567));
        assert_eq!(spread.long_leg.timestamp, at(14, 1));
        assert_eq!(spread.entry_timestamp, at(14, 2));
    }

    #[test]
    fn test_width_mismatch_resets_both_legs() {
        let short_a = priced_put("SPY250616P00570000", dec!(570), dec!(572), 0.20, at(14, 0));
        let too_far = priced_put("SPY250616P00564000", dec!(564), dec!(572), 0.30, at(14, 1));
        let near = priced_put("SPY250616P00567000", dec!(567), dec!(572), 0.20, at(14, 2));
        let short_b = priced_put("SPY250616P00570000", dec!(570), dec!(572), 0.20, at(14, 3));

        let short_band = band_around(&[tick_delta(&short_a), tick_delta(&short_b)]);
        let long_band = band_around(&[tick_delta(&too_far), tick_delta(&near)]);
        let stream = TickStream::from_ticks(vec![short_a, too_far, near, short_b]);

        let spread = finder(short_band, long_band).find(stream.iter()).unwrap();

        // The 14:00 short was discarded with the 564 long; a fresh short completes the pair
        assert_eq!(spread.short_leg.timestamp, at(14, 3));
        assert_eq!(spread.long_leg.timestamp, at(14, 2));
        assert_eq!(spread.entry_timestamp, at(14, 3));
        assert_eq!(spread.width, dec!(3));
    }

    #[test]
    fn test_unpriceable_ticks_are_skipped() {
        let no_underlying = quote("SPY250616P00571000", dec!(571), dec!(2.00), None, at(14, 0));
        let above_bound = quote(
            "SPY250616P00569000",
            dec!(569),
            dec!(600),
            Some(dec!(572)),
            at(14, 0),
        );
        let short = priced_put("SPY250616P00570000", dec!(570), dec!(572), 0.20, at(14, 1));
        let long = priced_put("SPY250616P00567000", dec!(567), dec!(572), 0.20, at(14, 1));
        let stream = TickStream::from_ticks(vec![no_underlying, above_bound, short, long]);

        let spread = finder((-1.0, 0.0), (-1.0, 0.0)).find(stream.iter()).unwrap();

        assert_eq!(spread.short_leg.strike_price, dec!(570));
        assert_eq!(spread.long_leg.strike_price, dec!(567));
    }

    #[test]
    fn test_no_spread_found() {
        let short = priced_put("SPY250616P00570000", dec!(570), dec!(572), 0.20, at(14, 0));
        let ds = tick_delta(&short);
        let stream = TickStream::from_ticks(vec![short]);

        assert!(finder(band_around(&[ds]), (0.5, 0.6)).find(stream.iter()).is_none());
        assert!(finder((-1.0, 0.0), (-1.0, 0.0))
            .find(TickStream::new().iter())
            .is_none());
    }

    #[test]
    fn test_returned_width_always_in_range() {
        let ticks: Vec<Tick> = [575, 574, 573, 572, 571, 570, 569, 568, 566, 563]
            .iter()
            .enumerate()
            .map(|(i, strike)| {
                let strike = Decimal::from(*strike);
                priced_put(
                    &format!("SPY250616P00{}000", strike),
                    strike,
                    dec!(572),
                    0.25,
                    at(14, i as u32),
                )
            })
            .collect();
        let stream = TickStream::from_ticks(ticks);
        let finder = finder((-1.0, 0.0), (-1.0, 0.0));

        let mut cursor = stream.first_timestamp().unwrap();
        while let Some(spread) = finder.find(stream.range_from(cursor)) {
            assert!(spread.width >= dec!(2) && spread.width <= dec!(4));
            assert_ne!(spread.short_leg.symbol, spread.long_leg.symbol);
            cursor = spread.entry_timestamp + chrono::Duration::minutes(1);
        }
    }
}
