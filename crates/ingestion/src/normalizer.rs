//! Field normalization for collaborator payloads.
//!
//! Turns the textual time, numeral and code fields of the exchange feed into
//! canonical values. Every function here is pure; record-level callers attach
//! the offending record index when a field fails.

use forensics_core::{InvestorType, MarketBoard, SecondsOfDay, Side};
use thiserror::Error;

/// Why a single field failed to normalize.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// Time string without exactly two ':' separators.
    #[error("expected HH:MM:SS with two ':' separators, found {found}")]
    Separators { found: usize },

    /// Time component that is not a plain decimal number.
    #[error("non-numeric time component `{0}`")]
    NonNumericComponent(String),

    /// Well-formed time outside the trading day.
    #[error("time `{0}` is outside 00:00:00..=23:59:59")]
    TimeOutOfRange(String),

    #[error("invalid numeral `{0}`")]
    InvalidNumeral(String),

    #[error("negative numeral `{0}`")]
    NegativeNumeral(String),

    /// Unrecognized side, investor type or board code.
    #[error("unknown {kind} `{value}`")]
    UnknownCode { kind: &'static str, value: String },
}

/// Parse `HH:MM:SS` into seconds since midnight.
pub fn parse_time_of_day(raw: &str) -> Result<SecondsOfDay, NormalizeError> {
    let trimmed = raw.trim();
    let found = trimmed.matches(':').count();
    if found != 2 {
        return Err(NormalizeError::Separators { found });
    }

    let mut parts = [0u32; 3];
    for (slot, component) in parts.iter_mut().zip(trimmed.split(':')) {
        if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NormalizeError::NonNumericComponent(component.to_string()));
        }
        *slot = component
            .parse()
            .map_err(|_| NormalizeError::NonNumericComponent(component.to_string()))?;
    }

    let [hours, minutes, seconds] = parts;
    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(NormalizeError::TimeOutOfRange(trimmed.to_string()));
    }
    Ok(hours * 3600 + minutes * 60 + seconds)
}

/// Parse a thousands-separated numeral into a non-negative integer.
///
/// Absent or blank input is 0. Integers parse exactly; anything else that
/// reads as a float (scientific notation, decimals) is rounded to the nearest
/// integer.
pub fn parse_numeral(raw: Option<&str>) -> Result<u64, NormalizeError> {
    let Some(raw) = raw else {
        return Ok(0);
    };
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Ok(0);
    }
    if let Ok(value) = cleaned.parse::<u64>() {
        return Ok(value);
    }

    let value: f64 = cleaned
        .parse()
        .map_err(|_| NormalizeError::InvalidNumeral(raw.to_string()))?;
    if !value.is_finite() {
        return Err(NormalizeError::InvalidNumeral(raw.to_string()));
    }
    let rounded = value.round();
    if rounded < 0.0 {
        return Err(NormalizeError::NegativeNumeral(raw.to_string()));
    }
    if rounded >= u64::MAX as f64 {
        return Err(NormalizeError::InvalidNumeral(raw.to_string()));
    }
    Ok(rounded as u64)
}

pub fn parse_side(raw: &str) -> Result<Side, NormalizeError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "b" | "buy" => Ok(Side::Buy),
        "s" | "sell" => Ok(Side::Sell),
        _ => Err(unknown("side", raw)),
    }
}

pub fn parse_investor_type(raw: &str) -> Result<InvestorType, NormalizeError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "d" | "domestic" => Ok(InvestorType::Domestic),
        "f" | "foreign" => Ok(InvestorType::Foreign),
        "g" | "government" => Ok(InvestorType::Government),
        _ => Err(unknown("investor type", raw)),
    }
}

pub fn parse_market_board(raw: &str) -> Result<MarketBoard, NormalizeError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "rg" | "regular" => Ok(MarketBoard::Regular),
        "ng" | "negotiated" => Ok(MarketBoard::Negotiated),
        "tn" | "cash" => Ok(MarketBoard::Cash),
        _ => Err(unknown("market board", raw)),
    }
}

/// Upper-cased, trimmed broker code; empty codes are rejected.
pub fn parse_broker_code(raw: &str) -> Result<String, NormalizeError> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(unknown("broker code", raw));
    }
    Ok(code.to_ascii_uppercase())
}

fn unknown(kind: &'static str, value: &str) -> NormalizeError {
    NormalizeError::UnknownCode {
        kind,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time_of_day("00:00:00"), Ok(0));
        assert_eq!(parse_time_of_day("10:00:01"), Ok(36_001));
        assert_eq!(parse_time_of_day(" 23:59:59 "), Ok(86_399));
    }

    #[test]
    fn test_parse_time_separator_count() {
        assert_eq!(
            parse_time_of_day("10:00"),
            Err(NormalizeError::Separators { found: 1 })
        );
        assert_eq!(
            parse_time_of_day("10:00:00:00"),
            Err(NormalizeError::Separators { found: 3 })
        );
    }

    #[test]
    fn test_parse_time_non_numeric() {
        assert!(matches!(
            parse_time_of_day("10:x0:00"),
            Err(NormalizeError::NonNumericComponent(c)) if c == "x0"
        ));
        assert!(matches!(
            parse_time_of_day("10::00"),
            Err(NormalizeError::NonNumericComponent(_))
        ));
        assert!(matches!(
            parse_time_of_day("-1:00:00"),
            Err(NormalizeError::NonNumericComponent(_))
        ));
    }

    #[test]
    fn test_parse_time_out_of_range() {
        assert!(matches!(
            parse_time_of_day("24:00:00"),
            Err(NormalizeError::TimeOutOfRange(_))
        ));
        assert!(matches!(
            parse_time_of_day("09:60:00"),
            Err(NormalizeError::TimeOutOfRange(_))
        ));
    }

    #[test]
    fn test_parse_numeral() {
        assert_eq!(parse_numeral(Some("1,234,567")), Ok(1_234_567));
        assert_eq!(parse_numeral(Some("42")), Ok(42));
        assert_eq!(parse_numeral(Some("")), Ok(0));
        assert_eq!(parse_numeral(Some("  ")), Ok(0));
        assert_eq!(parse_numeral(None), Ok(0));
    }

    #[test]
    fn test_parse_numeral_scientific() {
        assert_eq!(parse_numeral(Some("1.5e3")), Ok(1500));
        assert_eq!(parse_numeral(Some("2.4E2")), Ok(240));
        assert_eq!(parse_numeral(Some("1.23456789e2")), Ok(123));
        assert_eq!(parse_numeral(Some("99.5")), Ok(100));
    }

    #[test]
    fn test_parse_numeral_rejects_garbage() {
        assert!(matches!(
            parse_numeral(Some("12a")),
            Err(NormalizeError::InvalidNumeral(_))
        ));
        assert!(matches!(
            parse_numeral(Some("-5")),
            Err(NormalizeError::NegativeNumeral(_))
        ));
        assert!(matches!(
            parse_numeral(Some("inf")),
            Err(NormalizeError::InvalidNumeral(_))
        ));
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!(parse_side("B"), Ok(Side::Buy));
        assert_eq!(parse_side("sell"), Ok(Side::Sell));
        assert_eq!(parse_investor_type("F"), Ok(InvestorType::Foreign));
        assert_eq!(parse_investor_type("Government"), Ok(InvestorType::Government));
        assert_eq!(parse_market_board("ng"), Ok(MarketBoard::Negotiated));
        assert_eq!(parse_broker_code(" yp "), Ok("YP".to_string()));
        assert!(parse_side("X").is_err());
        assert!(parse_broker_code("  ").is_err());
    }
}
