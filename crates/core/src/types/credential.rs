//! Tenant credential type.
//!
//! The bearer credential a company supplies at onboarding. It is persisted
//! as the tenant's stored secret and replayed on later calls to the
//! tenant's external API, so `Debug` is implemented manually to redact it.

use serde::{Deserialize, Serialize};

/// A tenant's stored bearer credential.
///
/// The value is expected to carry its authorization scheme prefix
/// (`Bearer ...`) and is sent verbatim in the `Authorization` header of
/// outbound calls.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TenantCredential(String);

impl TenantCredential {
    /// Create a credential from its raw header value.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// The credential as an `Authorization` header value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the credential carries the `Bearer ` scheme prefix.
    #[must_use]
    pub fn has_bearer_prefix(&self) -> bool {
        self.0
            .strip_prefix("Bearer ")
            .is_some_and(|rest| !rest.is_empty())
    }
}

impl std::fmt::Debug for TenantCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TenantCredential")
            .field(&"[REDACTED]")
            .finish()
    }
}

impl From<String> for TenantCredential {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for TenantCredential {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for TenantCredential {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for TenantCredential {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
