use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid decimal '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Trims whitespace and removes the currency symbol and thousands separators.
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(['$', ','], "")
}

/// Parses a currency or percentage cell into a [`Decimal`].
///
/// Accepts `"$1,234.56"`, `"1234.56"` and `" 40 "`.
/// Empty or whitespace-only input is treated as 0.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    Ok(parse_optional_decimal(s)?.unwrap_or(Decimal::ZERO))
}

/// Like [`parse_decimal`] but returns `None` for empty input.
pub fn parse_optional_decimal(s: &str) -> Result<Option<Decimal>, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Ok(None);
    }
    normalized.parse().map(Some).map_err(|e| {
        tracing::error!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError {
            input: s.to_string(),
            source: e,
        }
    })
}

pub(crate) fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_decimal(&s).map_err(serde::de::Error::custom)
}

pub(crate) fn deserialize_optional_decimal<'de, D>(
    deserializer: D
) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) => parse_optional_decimal(&s).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Reads an optional text cell, treating an empty cell as absent.
pub(crate) fn deserialize_optional_string<'de, D>(
    deserializer: D
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}
