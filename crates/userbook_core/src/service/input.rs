//! Raw, untrusted operation inputs and their parsing rules.
//!
//! # Invariants
//! - Integer inputs use leading-integer semantics: optional leading
//!   whitespace, optional sign, then decimal digits. Trailing text is
//!   ignored; no digits at all means "absent".
//! - Out-of-range integers saturate instead of wrapping.
//! - A record field sent as `null` is present, not absent: `"age": null`
//!   reaches validation as "not a number".

use crate::model::user::AgeValue;
use serde::{Deserialize, Deserializer};

/// Raw list parameters, typically taken verbatim from a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

/// Age as submitted: a JSON number, text, or an explicit `null`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AgeInput {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl AgeInput {
    /// Parses the submitted value; anything without a leading integer
    /// becomes `AgeValue::NotANumber`.
    pub fn to_age_value(&self) -> AgeValue {
        let parsed = match self {
            Self::Int(value) => Some(*value),
            Self::Float(value) if value.is_finite() => Some(value.trunc() as i64),
            Self::Float(_) => None,
            Self::Text(value) => parse_leading_int(value),
            Self::Null => None,
        };
        parsed.map_or(AgeValue::NotANumber, AgeValue::Value)
    }
}

impl From<i64> for AgeInput {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for AgeInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Raw create payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateUserInput {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present_age")]
    pub age: Option<AgeInput>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Raw partial-update payload. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present_age")]
    pub age: Option<AgeInput>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Only runs when the key exists, so `null` becomes `Some(AgeInput::Null)`
/// while a missing key falls back to `None` through `#[serde(default)]`.
fn present_age<'de, D>(deserializer: D) -> Result<Option<AgeInput>, D::Error>
where
    D: Deserializer<'de>,
{
    AgeInput::deserialize(deserializer).map(Some)
}

/// Parses the leading integer of `raw`.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let text = raw.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let digit_len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if digit_len == 0 {
        return None;
    }

    let magnitude = digits[..digit_len]
        .bytes()
        .fold(0_i64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
        });

    Some(if negative { -magnitude } else { magnitude })
}
