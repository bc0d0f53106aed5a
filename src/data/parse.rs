//! Cell-level parsers for the raw text columns.
//!
//! None of these fail: a cell that cannot be understood comes back as `None`
//! and is imputed later by [`super::clean`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::model::OwnerType;

/// First run of digits with an optional fractional part.
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.?\d*").expect("number pattern is valid"));

/// One lakh, the unit source prices are quoted in.
pub const LAKH: f64 = 100_000.0;

/// Unit the `Price` column is expressed in after cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUnit {
    /// Source values are in lakhs and get scaled to rupees.
    #[default]
    Lakh,
    /// Source values are left as they are.
    Rupee,
}

/// Treat blank cells and the usual null spellings as missing.
pub fn non_missing(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.is_empty()
        || s.eq_ignore_ascii_case("nan")
        || s.eq_ignore_ascii_case("null")
        || s.eq_ignore_ascii_case("none")
    {
        None
    } else {
        Some(s)
    }
}

/// Extract the first `\d+\.?\d*` token, e.g. `"26.6 kmpl"` → `26.6`.
pub fn leading_number(s: &str) -> Option<f64> {
    NUMBER.find(s)?.as_str().parse::<f64>().ok()
}

/// Parse a plain decimal cell.
pub fn decimal(s: &str) -> Option<f64> {
    non_missing(s)?.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a whole-number cell. Accepts `"2015"` and `"2015.0"`.
pub fn integer(s: &str) -> Option<i64> {
    let s = non_missing(s)?;
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    decimal(s).map(|f| f.round() as i64)
}

/// `Price` in the configured unit.
pub fn price(s: &str, unit: PriceUnit) -> Option<f64> {
    let v = decimal(s)?;
    Some(match unit {
        PriceUnit::Lakh => v * LAKH,
        PriceUnit::Rupee => v,
    })
}

/// `New_Price`: drop the `Lakh` literal, trim, parse, scale to rupees.
/// `"8.61 Lakh"` → `861000.0`; `"Lakh"` alone → `None`.
pub fn new_price(s: &str) -> Option<f64> {
    let stripped = s.replace("Lakh", "");
    decimal(stripped.trim()).map(|v| v * LAKH)
}

/// Text cell, trimmed; `None` when missing.
pub fn text(s: &str) -> Option<String> {
    non_missing(s).map(str::to_string)
}

/// First whitespace-delimited token of a car name.
pub fn brand(name: &str) -> Option<String> {
    non_missing(name)?.split_whitespace().next().map(str::to_string)
}

pub fn owner_type(s: &str) -> Option<OwnerType> {
    non_missing(s)?.parse().ok()
}
