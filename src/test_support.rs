//! Fixtures shared by the in-module tests.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::data::{OptionType, Tick};
use crate::pricing::BlackScholes;

pub const RATE: f64 = 0.01;

/// 2025-06-16 at `hour:minute` UTC.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 16, hour, minute, 0).unwrap()
}

/// Same-day expiry at the 16:00 ET close.
pub fn expiry() -> DateTime<Utc> {
    at(20, 0)
}

/// A put tick with a flat bid/ask at `mid`, expiring [`expiry`].
pub fn quote(
    symbol: &str,
    strike: Decimal,
    mid: Decimal,
    underlying: Option<Decimal>,
    timestamp: DateTime<Utc>,
) -> Tick {
    Tick {
        option_symbol: symbol.to_string(),
        timestamp,
        bid: mid,
        ask: mid,
        midpoint: mid,
        strike_price: strike,
        expiry: expiry(),
        underlying_price: underlying,
    }
}

/// A put tick priced by Black-Scholes at `vol`, rounded to 4 places.
pub fn priced_put(
    symbol: &str,
    strike: Decimal,
    spot: Decimal,
    vol: f64,
    timestamp: DateTime<Utc>,
) -> Tick {
    let bs = BlackScholes::new(RATE);
    let years = crate::pricing::year_fraction(expiry(), timestamp);
    let price = bs.put_price(
        spot.to_f64().unwrap(),
        strike.to_f64().unwrap(),
        years,
        vol,
    );
    let mid = Decimal::from_f64(price).unwrap().round_dp(4);
    quote(symbol, strike, mid, Some(spot), timestamp)
}

/// Put delta the pricing engine implies from a tick's own quote.
pub fn tick_delta(tick: &Tick) -> f64 {
    BlackScholes::new(RATE)
        .implied_delta(
            tick.midpoint.to_f64().unwrap(),
            tick.strike_price.to_f64().unwrap(),
            tick.expiry,
            tick.underlying_price.unwrap().to_f64().unwrap(),
            OptionType::Put,
            tick.timestamp,
        )
        .unwrap()
}
