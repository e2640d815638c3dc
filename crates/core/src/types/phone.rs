//! Phone number type.
//!
//! Customer phone numbers feed the Twilio SMS/WhatsApp sync, which requires
//! E.164 formatting (`+` followed by country code and subscriber number).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input does not start with `+`.
    #[error("phone number must start with + and a country code")]
    MissingPlus,
    /// The digits are out of the E.164 range.
    #[error("phone number must have 8 to 15 digits")]
    BadLength,
    /// The input contains a non-digit after the `+`.
    #[error("phone number contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// An E.164 phone number.
///
/// Spaces, dashes, dots, and parentheses are stripped before validation, so
/// `+52 1 (55) 1234-5678` and `+5215512345678` parse to the same value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse a `Phone` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, lacks a leading `+`, contains
    /// characters other than digits and common separators, or has a digit
    /// count outside 8..=15.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        let Some(rest) = s.strip_prefix('+') else {
            return Err(PhoneError::MissingPlus);
        };

        let mut digits = String::with_capacity(rest.len());
        for c in rest.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
            } else if !matches!(c, ' ' | '-' | '.' | '(' | ')') {
                return Err(PhoneError::InvalidCharacter(c));
            }
        }

        if !(8..=15).contains(&digits.len()) {
            return Err(PhoneError::BadLength);
        }

        Ok(Self(format!("+{digits}")))
    }

    /// Returns the normalized phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Phone {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Phone {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Phone {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(Phone::parse("+5215512345678").unwrap().as_str(), "+5215512345678");
        assert_eq!(Phone::parse("+1 415 555 0100").unwrap().as_str(), "+14155550100");
        assert_eq!(
            Phone::parse("+52 1 (55) 1234-5678").unwrap().as_str(),
            "+5215512345678"
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Phone::parse(""), Err(PhoneError::Empty)));
    }

    #[test]
    fn test_parse_missing_plus() {
        assert!(matches!(
            Phone::parse("5215512345678"),
            Err(PhoneError::MissingPlus)
        ));
    }

    #[test]
    fn test_parse_bad_length() {
        assert!(matches!(Phone::parse("+1234567"), Err(PhoneError::BadLength)));
        assert!(matches!(
            Phone::parse("+1234567890123456"),
            Err(PhoneError::BadLength)
        ));
    }

    #[test]
    fn test_parse_invalid_character() {
        assert!(matches!(
            Phone::parse("+52abc5512345"),
            Err(PhoneError::InvalidCharacter('a'))
        ));
    }

    #[test]
    fn test_serde_roundtrip() {
        let phone = Phone::parse("+5215512345678").unwrap();
        let json = serde_json::to_string(&phone).unwrap();
        assert_eq!(json, "\"+5215512345678\"");
        let back: Phone = serde_json::from_str(&json).unwrap();
        assert_eq!(back, phone);
    }
}
