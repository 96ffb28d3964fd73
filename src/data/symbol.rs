//! OCC option symbol parsing.
//!
//! Symbols follow the OSI layout `ROOT YYMMDD C|P STRIKE`, where the
//! strike is the price times 1000, zero-padded to 8 digits. Vendors
//! sometimes pad the root with spaces ("SPY   250616P00571000"); both
//! forms are accepted.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::OptionType;

const STRIKE_DIGITS: usize = 8;
const DATE_DIGITS: usize = 6;
const STRIKE_SCALE: u32 = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("Symbol too short: {0}")]
    TooShort(String),

    #[error("Invalid expiration in symbol: {0}")]
    InvalidExpiration(String),

    #[error("Invalid option type in symbol: {0}")]
    InvalidOptionType(String),

    #[error("Invalid strike in symbol: {0}")]
    InvalidStrike(String),
}

/// A parsed OCC option symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OccSymbol {
    pub underlying: String,
    pub expiration: NaiveDate,
    pub option_type: OptionType,
    pub strike: Decimal,
}

impl OccSymbol {
    /// Parse a symbol such as `SPY250616P00571000`.
    pub fn parse(symbol: &str) -> Result<Self, SymbolError> {
        let compact: String = symbol.chars().filter(|c| !c.is_whitespace()).collect();
        let min_len = 1 + DATE_DIGITS + 1 + STRIKE_DIGITS;
        if compact.len() < min_len || !compact.is_ascii() {
            return Err(SymbolError::TooShort(symbol.to_string()));
        }

        let strike_start = compact.len() - STRIKE_DIGITS;
        let type_pos = strike_start - 1;
        let date_start = type_pos - DATE_DIGITS;

        let strike = parse_strike(&compact[strike_start..])
            .ok_or_else(|| SymbolError::InvalidStrike(symbol.to_string()))?;

        let option_type = OptionType::from_str(&compact[type_pos..strike_start])
            .ok_or_else(|| SymbolError::InvalidOptionType(symbol.to_string()))?;

        let expiration = NaiveDate::parse_from_str(&compact[date_start..type_pos], "%y%m%d")
            .map_err(|_| SymbolError::InvalidExpiration(symbol.to_string()))?;

        Ok(Self {
            underlying: compact[..date_start].to_string(),
            expiration,
            option_type,
            strike,
        })
    }
}

fn parse_strike(digits: &str) -> Option<Decimal> {
    if digits.len() != STRIKE_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let raw: i64 = digits.parse().ok()?;
    Some(Decimal::new(raw, STRIKE_SCALE).normalize())
}

/// Read the strike from the trailing 8 digits of a symbol.
pub fn strike_from_symbol(symbol: &str) -> Option<Decimal> {
    let trimmed = symbol.trim_end();
    if trimmed.len() < STRIKE_DIGITS || !trimmed.is_ascii() {
        return None;
    }
    parse_strike(&trimmed[trimmed.len() - STRIKE_DIGITS..])
}
