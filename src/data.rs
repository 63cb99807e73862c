//! Cell-level normalization: quantities, identifiers, and line labels.
//!
//! Quantities are read in a single target locale where `.` groups thousands
//! and `,` marks the decimal point (`1.234,5` is one thousand two hundred
//! thirty-four and a half). Textual quantities written with a dotted decimal
//! (`100.5`) are therefore read as `1005`; numeric spreadsheet cells are
//! passed through untouched. Anything unreadable becomes zero.

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};

use crate::frame::{Cell, format_number};

/// Parses a quantity cell, returning `None` when a non-empty cell had to be
/// coerced to zero.
pub fn try_parse_quantity(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Empty => Some(0.0),
        Cell::Number(n) => n.is_finite().then_some(*n),
        Cell::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Some(0.0);
            }
            let canonical = trimmed.replace('.', "").replace(',', ".");
            canonical
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
        }
    }
}

/// Total quantity parser: unreadable or empty cells yield `0.0`.
pub fn parse_quantity(cell: &Cell) -> f64 {
    try_parse_quantity(cell).unwrap_or(0.0)
}

/// Text form of a join key: trimmed text, or integral numbers without `.0`.
pub fn normalize_id(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(n) => format_number(*n),
    }
}

/// Keeps the last two whitespace-separated tokens of a verbose line label,
/// e.g. `PT ABC ASSEMBLY LINE 05` becomes `LINE 05`.
pub fn shorten_line_label(label: &str) -> String {
    let tokens = label.split_whitespace().collect::<Vec<_>>();
    if tokens.len() < 2 {
        return label.to_string();
    }
    tokens[tokens.len() - 2..].join(" ")
}

/// Rounds half away from zero to `places` decimals. Values outside the
/// decimal range are returned unchanged.
pub fn round_quantity(value: f64, places: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}
