//! Derived read-only views and export tables.
//!
//! # Responsibility
//! - Compute percentages, display bands and the consolidated class view.
//! - Produce header/row tables consumed by PDF or console renderers.
//!
//! # Invariants
//! - Nothing here mutates or persists records.
//! - Numbers render the way the legacy UI printed them: integral values
//!   without a decimal point.

pub mod performance;
pub mod tables;

use serde::Serialize;

/// Renderer-agnostic table: one header row plus string cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn new<S: Into<String>>(title: impl Into<String>, headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            title: title.into(),
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Formats a number without a trailing `.0` for integral values.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Collapses -0.
        return "0".to_string();
    }
    format!("{value}")
}

/// Fixed-point rendering with `digits` decimals.
///
/// Nearest value wins; an exact decimal tie rounds away from zero, the way
/// the legacy UI's `toFixed` did (`0.125` -> `0.13`).
pub fn to_fixed(value: f64, digits: u32) -> String {
    let width = digits as usize;
    if !is_decimal_tie(value, digits) {
        return format!("{value:.width$}");
    }
    let scale = 10f64.powi(digits as i32);
    let rounded = (value.abs() * scale).floor() + 1.0;
    format!("{:.width$}", value.signum() * rounded / scale)
}

/// True when `value` lies exactly halfway between two `digits`-decimal
/// neighbours, i.e. `value * 2 * 10^digits` is an odd integer.
fn is_decimal_tie(value: f64, digits: u32) -> bool {
    if !value.is_finite() || value == 0.0 {
        return false;
    }
    let bits = value.abs().to_bits();
    let exponent_bits = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if exponent_bits == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), exponent_bits - 1075)
    };
    // value = odd * 2^-k
    let k = -(exponent + i64::from(mantissa.trailing_zeros()));
    k == i64::from(digits) + 1
}
