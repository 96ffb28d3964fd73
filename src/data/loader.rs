//! CSV tick loader.
//!
//! Reads option ticks exported by the market-data layer into a
//! [`TickStream`]. Expected header:
//!
//! `option_symbol,timestamp,bid,ask,midpoint,strike_price,expiry,underlying_price`
//!
//! - `timestamp` and `expiry` are RFC 3339 (a naive `YYYY-MM-DD HH:MM:SS`
//!   is read as UTC)
//! - `midpoint` may be empty, in which case `(bid + ask) / 2` is used
//! - `strike_price` may be empty, in which case it is read from the symbol
//! - `underlying_price` may be empty when no underlying quote was matched

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::symbol::strike_from_symbol;
use super::types::{Tick, TickStream};

/// Columns that must be present in the CSV header.
pub const REQUIRED_COLUMNS: &[&str] = &["option_symbol", "timestamp", "bid", "ask", "expiry"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Row {row}: missing required field '{field}'")]
    MissingField { row: usize, field: &'static str },

    #[error("Row {row}: invalid {field} '{value}'")]
    InvalidValue {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One CSV row before validation.
#[derive(Debug, Deserialize)]
struct TickRecord {
    option_symbol: String,
    timestamp: String,
    bid: String,
    ask: String,
    #[serde(default)]
    midpoint: String,
    #[serde(default)]
    strike_price: String,
    expiry: String,
    #[serde(default)]
    underlying_price: String,
}

/// Loads a tick CSV file into a [`TickStream`].
pub struct TickLoader {
    path: PathBuf,
}

impl TickLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the file this loader points at.
    pub fn load(&self) -> Result<TickStream, LoaderError> {
        if !self.path.exists() {
            return Err(LoaderError::FileNotFound(self.path.display().to_string()));
        }
        let file = File::open(&self.path)?;
        let stream = Self::from_reader(file)?;
        debug!(
            path = %self.path.display(),
            timestamps = stream.len(),
            ticks = stream.tick_count(),
            "loaded tick file"
        );
        Ok(stream)
    }

    /// Parse CSV tick data from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<TickStream, LoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        for required in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == *required) {
                return Err(LoaderError::MissingColumn(required.to_string()));
            }
        }

        let mut stream = TickStream::new();
        for (idx, record) in csv_reader.deserialize::<TickRecord>().enumerate() {
            // Header is line 1
            let row = idx + 2;
            stream.insert(record_to_tick(record?, row)?);
        }
        Ok(stream)
    }
}

fn record_to_tick(record: TickRecord, row: usize) -> Result<Tick, LoaderError> {
    let option_symbol = required(&record.option_symbol, row, "option_symbol")?.to_string();
    let timestamp =
        parse_timestamp(required(&record.timestamp, row, "timestamp")?, row, "timestamp")?;
    let expiry = parse_timestamp(required(&record.expiry, row, "expiry")?, row, "expiry")?;
    let bid = parse_decimal(required(&record.bid, row, "bid")?, row, "bid")?;
    let ask = parse_decimal(required(&record.ask, row, "ask")?, row, "ask")?;

    let midpoint = match optional(&record.midpoint) {
        Some(raw) => parse_decimal(raw, row, "midpoint")?,
        None => (bid + ask) / Decimal::TWO,
    };

    let strike_price = match optional(&record.strike_price) {
        Some(raw) => parse_decimal(raw, row, "strike_price")?,
        None => strike_from_symbol(&option_symbol).ok_or(LoaderError::MissingField {
            row,
            field: "strike_price",
        })?,
    };

    let underlying_price = optional(&record.underlying_price)
        .map(|raw| parse_decimal(raw, row, "underlying_price"))
        .transpose()?;

    Ok(Tick {
        option_symbol,
        timestamp,
        bid,
        ask,
        midpoint,
        strike_price,
        expiry,
        underlying_price,
    })
}

fn optional(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn required<'a>(raw: &'a str, row: usize, field: &'static str) -> Result<&'a str, LoaderError> {
    optional(raw).ok_or(LoaderError::MissingField { row, field })
}

fn parse_decimal(raw: &str, row: usize, field: &'static str) -> Result<Decimal, LoaderError> {
    Decimal::from_str(raw).map_err(|_| LoaderError::InvalidValue {
        row,
        field,
        value: raw.to_string(),
    })
}

fn parse_timestamp(
    raw: &str,
    row: usize,
    field: &'static str,
) -> Result<DateTime<Utc>, LoaderError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| LoaderError::InvalidValue {
            row,
            field,
            value: raw.to_string(),
        })
}
