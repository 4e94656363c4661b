//! One-time passcode type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`OtpCode`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum OtpCodeError {
    /// The input is not exactly six characters long.
    #[error("one-time passcode must be exactly {len} digits", len = OtpCode::LENGTH)]
    WrongLength,
    /// The input contains a non-digit character.
    #[error("one-time passcode may only contain digits")]
    NonDigit,
}

/// A six-digit one-time passcode.
///
/// Codes are compared exactly, including leading zeros, so the value is
/// kept as a string rather than a number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OtpCode(String);

impl OtpCode {
    /// Number of digits in a passcode.
    pub const LENGTH: usize = 6;

    /// Parse an `OtpCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly six ASCII digits.
    pub fn parse(s: &str) -> Result<Self, OtpCodeError> {
        if s.len() != Self::LENGTH {
            return Err(OtpCodeError::WrongLength);
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OtpCodeError::NonDigit);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OtpCode {
    type Err = OtpCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for OtpCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(OtpCode::parse("482913").is_ok());
        assert!(OtpCode::parse("000000").is_ok());
        assert!(OtpCode::parse("999999").is_ok());
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            OtpCode::parse("12345"),
            Err(OtpCodeError::WrongLength)
        ));
        assert!(matches!(
            OtpCode::parse("1234567"),
            Err(OtpCodeError::WrongLength)
        ));
        assert!(matches!(OtpCode::parse(""), Err(OtpCodeError::WrongLength)));
    }

    #[test]
    fn test_parse_non_digit() {
        assert!(matches!(
            OtpCode::parse("12a456"),
            Err(OtpCodeError::NonDigit)
        ));
        assert!(matches!(
            OtpCode::parse("１２３４５６"), // full-width digits are not ASCII
            Err(OtpCodeError::WrongLength)
        ));
    }

    #[test]
    fn test_leading_zeros_preserved() {
        let code = OtpCode::parse("012345").unwrap();
        assert_eq!(code.as_str(), "012345");
    }
}
