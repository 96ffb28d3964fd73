//! Integrity checks for a loaded tick stream.
//!
//! Validates:
//! - Stream is non-empty
//! - Every tick sits in the group of its own timestamp
//! - Price validity (bid >= 0, bid <= ask)
//! - Midpoint inside the quote
//! - Expiry not before the quote time
//! - OCC symbol names a put with the tick's strike and expiry date
//! - Underlying coverage (share of ticks that can be priced)

use rust_decimal::Decimal;

use crate::data::{OccSymbol, OptionType, Tick, TickStream};

/// Offending examples kept per failed check.
const MAX_EXAMPLES: usize = 5;

/// Result of a single validation check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    pub fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

/// Integrity report for one tick stream.
#[derive(Debug, Clone)]
pub struct TickIntegrityReport {
    pub timestamps: usize,
    pub tick_count: usize,
    pub checks: Vec<CheckResult>,
}

impl TickIntegrityReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }

    pub fn summary(&self) -> String {
        let passed = self.checks.iter().filter(|c| c.passed).count();
        format!(
            "{} ticks over {} timestamps: {}/{} checks passed",
            self.tick_count,
            self.timestamps,
            passed,
            self.checks.len()
        )
    }
}

/// Validator for tick stream integrity.
#[derive(Debug, Clone)]
pub struct TickStreamValidator {
    /// Minimum share of ticks carrying an underlying price.
    pub min_underlying_coverage: f64,
}

impl Default for TickStreamValidator {
    fn default() -> Self {
        Self {
            min_underlying_coverage: 0.5,
        }
    }
}

impl TickStreamValidator {
    pub fn new(min_underlying_coverage: f64) -> Self {
        Self {
            min_underlying_coverage,
        }
    }

    /// Run all validation checks.
    pub fn validate(&self, stream: &TickStream) -> TickIntegrityReport {
        let checks = vec![
            self.check_non_empty(stream),
            self.check_grouping(stream),
            check_ticks(stream, "price_validity", "bid/ask", |t| {
                t.bid >= Decimal::ZERO && t.bid <= t.ask
            }),
            check_ticks(stream, "midpoint_within_quote", "midpoint", |t| {
                t.midpoint >= t.bid && t.midpoint <= t.ask
            }),
            check_ticks(stream, "expiry_validity", "expiry", |t| {
                t.expiry >= t.timestamp
            }),
            check_ticks(stream, "symbol_contract", "symbol", |t| {
                OccSymbol::parse(&t.option_symbol).is_ok_and(|sym| {
                    sym.option_type == OptionType::Put
                        && sym.strike == t.strike_price
                        && sym.expiration == t.expiry.date_naive()
                })
            }),
            self.check_underlying_coverage(stream),
        ];

        TickIntegrityReport {
            timestamps: stream.len(),
            tick_count: stream.tick_count(),
            checks,
        }
    }

    fn check_non_empty(&self, stream: &TickStream) -> CheckResult {
        if stream.is_empty() {
            CheckResult::fail("non_empty", "Stream has no ticks", None)
        } else {
            CheckResult::pass(
                "non_empty",
                &format!("{} timestamps", stream.len()),
            )
        }
    }

    fn check_grouping(&self, stream: &TickStream) -> CheckResult {
        let misplaced: Vec<String> = stream
            .iter()
            .flat_map(|(ts, ticks)| {
                ticks
                    .iter()
                    .filter(move |t| t.timestamp != *ts)
                    .map(move |t| format!("{} at {} filed under {}", t.option_symbol, t.timestamp, ts))
            })
            .collect();

        if misplaced.is_empty() {
            CheckResult::pass("timestamp_grouping", "All ticks grouped by timestamp")
        } else {
            CheckResult::fail(
                "timestamp_grouping",
                &format!("{} ticks in the wrong group", misplaced.len()),
                Some(examples(&misplaced)),
            )
        }
    }

    fn check_underlying_coverage(&self, stream: &TickStream) -> CheckResult {
        let total = stream.tick_count();
        if total == 0 {
            return CheckResult::fail("underlying_coverage", "No ticks to check", None);
        }

        let priced = stream
            .iter()
            .flat_map(|(_, ticks)| ticks.iter())
            .filter(|t| t.has_underlying())
            .count();
        let coverage = priced as f64 / total as f64;
        let message = format!(
            "{:.1}% of ticks have an underlying price (minimum {:.1}%)",
            coverage * 100.0,
            self.min_underlying_coverage * 100.0
        );

        if coverage >= self.min_underlying_coverage {
            CheckResult::pass("underlying_coverage", &message)
        } else {
            CheckResult::fail("underlying_coverage", &message, None)
        }
    }
}

fn check_ticks<F>(stream: &TickStream, name: &str, field: &str, valid: F) -> CheckResult
where
    F: Fn(&Tick) -> bool,
{
    let invalid: Vec<String> = stream
        .iter()
        .flat_map(|(_, ticks)| ticks.iter())
        .filter(|t| !valid(t))
        .map(|t| format!("{} at {}", t.option_symbol, t.timestamp))
        .collect();

    if invalid.is_empty() {
        CheckResult::pass(name, &format!("All {field} values valid"))
    } else {
        CheckResult::fail(
            name,
            &format!("{} ticks with invalid {field}", invalid.len()),
            Some(examples(&invalid)),
        )
    }
}

fn examples(items: &[String]) -> String {
    let mut shown = items
        .iter()
        .take(MAX_EXAMPLES)
        .cloned()
        .collect::<Vec<_>>()
        .join("; ");
    if items.len() > MAX_EXAMPLES {
        shown.push_str(&format!("; ... and {} more", items.len() - MAX_EXAMPLES));
    }
    shown
}
