use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// The raw `RLD or RS Number` cell, as the table collaborator typed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RldValue {
    Int(i64),
    Str(String),
    Null,
}

impl RldValue {
    /// Types a scraped cell: empty is `Null`, an integer literal is `Int`,
    /// anything else is kept verbatim as `Str`.
    pub fn from_cell_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            RldValue::Null
        } else if let Ok(n) = trimmed.parse::<i64>() {
            RldValue::Int(n)
        } else {
            RldValue::Str(text.to_string())
        }
    }

    pub fn kind(&self) -> RldKind {
        match self {
            RldValue::Int(_) => RldKind::Int,
            RldValue::Str(_) => RldKind::Str,
            RldValue::Null => RldKind::Other,
        }
    }
}

impl fmt::Display for RldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RldValue::Int(n) => write!(f, "{n}"),
            RldValue::Str(s) => f.write_str(s),
            RldValue::Null => f.write_str("null"),
        }
    }
}

impl From<i64> for RldValue {
    fn from(value: i64) -> Self {
        RldValue::Int(value)
    }
}

impl From<&str> for RldValue {
    fn from(value: &str) -> Self {
        RldValue::Str(value.to_string())
    }
}

/// The representational kind of a raw identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RldKind {
    Int,
    Str,
    Other,
}

impl RldKind {
    pub const ALL: [RldKind; 3] = [RldKind::Int, RldKind::Str, RldKind::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            RldKind::Int => "int",
            RldKind::Str => "str",
            RldKind::Other => "other",
        }
    }
}

impl fmt::Display for RldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A calendar month. Ordering is chronological: year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Returns `None` unless `(year, month, 1)` is a valid date.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// The regulator's "content current as of" baseline, day fixed at 1.
pub type ContentCurrentDate = YearMonth;

/// One scraped ingredient row. Produced once by the table collaborator and
/// only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientRecord {
    pub pdf_url: Option<String>,
    pub rld_identifier: RldValue,
    pub date_recommended: Option<String>,
    /// Every other column of the row, keyed by header.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl IngredientRecord {
    pub fn new(
        pdf_url: Option<&str>,
        rld_identifier: impl Into<RldValue>,
        date_recommended: Option<&str>,
    ) -> Self {
        Self {
            pdf_url: pdf_url.map(String::from),
            rld_identifier: rld_identifier.into(),
            date_recommended: date_recommended.map(String::from),
            extra: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cell_text() {
        assert_eq!(RldValue::from_cell_text("20977"), RldValue::Int(20977));
        assert_eq!(RldValue::from_cell_text(" 20977 "), RldValue::Int(20977));
        assert_eq!(
            RldValue::from_cell_text("18603 21478"),
            RldValue::Str("18603 21478".to_string())
        );
        assert_eq!(
            RldValue::from_cell_text("N020977"),
            RldValue::Str("N020977".to_string())
        );
        assert_eq!(RldValue::from_cell_text("  "), RldValue::Null);
    }

    #[test]
    fn test_year_month_ordering_and_validation() {
        let dec_2023 = YearMonth::new(2023, 12).unwrap();
        let jan_2024 = YearMonth::new(2024, 1).unwrap();
        assert!(jan_2024 > dec_2023);
        assert!(YearMonth::new(2024, 13).is_none());
        assert!(YearMonth::new(2024, 0).is_none());
        assert_eq!(dec_2023.to_string(), "12/2023");
    }
}
