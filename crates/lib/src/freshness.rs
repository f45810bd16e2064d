//! # Freshness Gate
//!
//! Parses `MM/YYYY` recommendation dates and compares them against the
//! content-current baseline.

use crate::errors::MalformedDateError;
use crate::types::{ContentCurrentDate, YearMonth};

/// Parses a `MM/YYYY` value. Both parts are trimmed before parsing.
pub fn parse_month_year(value: &str) -> Result<YearMonth, MalformedDateError> {
    let mut parts = value.split('/');
    let (Some(month), Some(year), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(MalformedDateError::Shape(value.to_string()));
    };
    let month: u32 = month
        .trim()
        .parse()
        .map_err(|_| MalformedDateError::NotNumeric(value.to_string()))?;
    let year: i32 = year
        .trim()
        .parse()
        .map_err(|_| MalformedDateError::NotNumeric(value.to_string()))?;
    YearMonth::new(year, month).ok_or_else(|| MalformedDateError::OutOfRange(value.to_string()))
}

/// True iff `date_recommended` is the same month as `reference` or later.
pub fn is_fresh_or_later(
    date_recommended: Option<&str>,
    reference: ContentCurrentDate,
) -> Result<bool, MalformedDateError> {
    let value = date_recommended.ok_or(MalformedDateError::Missing)?;
    Ok(parse_month_year(value)? >= reference)
}
