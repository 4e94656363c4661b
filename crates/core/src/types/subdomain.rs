//! Tenant subdomain type.
//!
//! A subdomain identifies an external tenant and is interpolated into
//! outbound URLs (`https://{subdomain}.<base-domain>/...`), so parsing is
//! strict: anything that is not a plain DNS label is rejected before it can
//! reach a URL.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Subdomain`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum SubdomainError {
    /// The input string is empty.
    #[error("subdomain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("subdomain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[a-z0-9-]`.
    #[error("subdomain may only contain lowercase letters, digits, and hyphens")]
    InvalidCharacter,
    /// The input starts or ends with a hyphen.
    #[error("subdomain cannot start or end with a hyphen")]
    EdgeHyphen,
}

/// A tenant subdomain: a single DNS label.
///
/// ## Constraints
///
/// - Length: 1-63 characters (DNS label limit)
/// - Characters: `a-z`, `0-9`, `-`
/// - Must not start or end with a hyphen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Subdomain(String);

impl Subdomain {
    /// Maximum length of a DNS label.
    pub const MAX_LENGTH: usize = 63;

    /// Parse a `Subdomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 63 characters,
    /// contains characters outside `[a-z0-9-]`, or has a leading or
    /// trailing hyphen.
    pub fn parse(s: &str) -> Result<Self, SubdomainError> {
        if s.is_empty() {
            return Err(SubdomainError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(SubdomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(SubdomainError::InvalidCharacter);
        }

        if s.starts_with('-') || s.ends_with('-') {
            return Err(SubdomainError::EdgeHyphen);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the subdomain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Subdomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Subdomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Subdomain {
    type Err = SubdomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Subdomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Subdomain {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Subdomain {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Subdomain {
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
        assert!(Subdomain::parse("acme").is_ok());
        assert!(Subdomain::parse("acme-east-2").is_ok());
        assert!(Subdomain::parse("a").is_ok());
        assert!(Subdomain::parse("0store").is_ok());
    }

    #[test]
    fn test_parse_rejects_url_breaking_input() {
        assert!(Subdomain::parse("acme.evil.com").is_err());
        assert!(Subdomain::parse("acme/profile").is_err());
        assert!(Subdomain::parse("acme:8443").is_err());
        assert!(Subdomain::parse("ACME").is_err());
        assert!(Subdomain::parse("ac me").is_err());
    }

    #[test]
    fn test_parse_edge_hyphens() {
        assert!(matches!(
            Subdomain::parse("-acme"),
            Err(SubdomainError::EdgeHyphen)
        ));
        assert!(matches!(
            Subdomain::parse("acme-"),
            Err(SubdomainError::EdgeHyphen)
        ));
    }

    #[test]
    fn test_parse_length_bounds() {
        assert!(matches!(Subdomain::parse(""), Err(SubdomainError::Empty)));
        let long = "a".repeat(64);
        assert!(matches!(
            Subdomain::parse(&long),
            Err(SubdomainError::TooLong { max: 63 })
        ));
        assert!(Subdomain::parse(&"a".repeat(63)).is_ok());
    }
}
