//! Core data types for tick-level options backtesting.
//!
//! A backtest consumes one [`TickStream`]: option quotes for a single
//! underlying, grouped by timestamp and iterable in ascending time order.

use std::collections::btree_map::{self, BTreeMap};
use std::ops::Bound;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "C" | "CALL" => Some(Self::Call),
            "P" | "PUT" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }
}

/// A single option quote observed at one instant.
///
/// Ticks are produced by the data layer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// OCC option symbol (e.g., "SPY250616P00570000")
    pub option_symbol: String,

    /// Quote time
    pub timestamp: DateTime<Utc>,

    /// Best bid
    pub bid: Decimal,

    /// Best ask
    pub ask: Decimal,

    /// Mid price used for pricing and P&L
    pub midpoint: Decimal,

    /// Strike price
    pub strike_price: Decimal,

    /// Contract expiry instant
    pub expiry: DateTime<Utc>,

    /// Underlying price matched to this quote, if one was found
    pub underlying_price: Option<Decimal>,
}

impl Tick {
    /// Whether the tick carries an underlying quote and can be priced.
    pub fn has_underlying(&self) -> bool {
        self.underlying_price.is_some()
    }
}

/// Borrowed, time-ordered view over timestamp groups.
pub type TickGroups<'a> = btree_map::Range<'a, DateTime<Utc>, Vec<Tick>>;

/// Time-ordered ticks grouped by timestamp.
///
/// Within a group, ticks keep the order in which they were inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickStream {
    groups: BTreeMap<DateTime<Utc>, Vec<Tick>>,
}

impl TickStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stream from ticks in arrival order.
    pub fn from_ticks<I: IntoIterator<Item = Tick>>(ticks: I) -> Self {
        let mut stream = Self::new();
        for tick in ticks {
            stream.insert(tick);
        }
        stream
    }

    /// Append a tick to its timestamp group.
    pub fn insert(&mut self, tick: Tick) {
        self.groups.entry(tick.timestamp).or_default().push(tick);
    }

    /// Number of distinct timestamps.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of ticks across all timestamps.
    pub fn tick_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.groups.keys().next().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.groups.keys().next_back().copied()
    }

    /// Ticks at a single timestamp.
    pub fn at(&self, timestamp: DateTime<Utc>) -> Option<&[Tick]> {
        self.groups.get(&timestamp).map(Vec::as_slice)
    }

    /// All groups in ascending time order.
    pub fn iter(&self) -> TickGroups<'_> {
        self.groups.range::<DateTime<Utc>, _>(..)
    }

    /// Groups at or after `cursor`.
    pub fn range_from(&self, cursor: DateTime<Utc>) -> TickGroups<'_> {
        self.groups.range(cursor..)
    }

    /// Groups strictly after `timestamp`.
    pub fn after(&self, timestamp: DateTime<Utc>) -> TickGroups<'_> {
        self.groups
            .range((Bound::Excluded(timestamp), Bound::Unbounded))
    }
}

impl FromIterator<Tick> for TickStream {
    fn from_iter<I: IntoIterator<Item = Tick>>(iter: I) -> Self {
        Self::from_ticks(iter)
    }
}
