//! `PostgreSQL` store implementation.
//!
//! Queries are runtime-checked (no compile-time database needed). Rows are
//! decoded into internal row types and converted into domain models via
//! `TryFrom`, surfacing invalid stored data as
//! [`StoreError::DataCorruption`].
//!
//! # Schema
//!
//! Migrations live in `crates/api/migrations/`:
//!
//! - `users` - unique `email`; nullable paired `otp_code`/`otp_expires_at`
//! - `companies` - unique `subdomain`; `owner_id` references `users`
//! - `memberships` - unique `(user_id, company_id)`

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use oxgate_core::{CompanyId, Email, OtpCode, Role, Subdomain, UserId};

use super::{AuthStore, StoreError};
use crate::models::{Company, Membership, PendingOtp, User};

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    role: String,
    otp_code: Option<String>,
    otp_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            StoreError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role: Role = row.role.parse().map_err(|e| {
            StoreError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        let pending_otp = match (row.otp_code, row.otp_expires_at) {
            (Some(code), Some(expires_at)) => {
                let code = OtpCode::parse(&code).map_err(|e| {
                    StoreError::DataCorruption(format!("invalid passcode in database: {e}"))
                })?;
                Some(PendingOtp { code, expires_at })
            }
            (None, None) => None,
            _ => {
                return Err(StoreError::DataCorruption(
                    "otp_code and otp_expires_at must be set together".to_owned(),
                ));
            }
        };

        Ok(Self {
            id: UserId::new(row.id),
            email,
            role,
            pending_otp,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CompanyRow {
    id: Uuid,
    subdomain: String,
    credential: String,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<CompanyRow> for Company {
    type Error = StoreError;

    fn try_from(row: CompanyRow) -> Result<Self, Self::Error> {
        let subdomain = Subdomain::parse(&row.subdomain).map_err(|e| {
            StoreError::DataCorruption(format!("invalid subdomain in database: {e}"))
        })?;

        Ok(Self {
            id: CompanyId::new(row.id),
            subdomain,
            credential: row.credential.into(),
            owner_id: UserId::new(row.owner_id),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    user_id: Uuid,
    company_id: Uuid,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = StoreError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse().map_err(|e| {
            StoreError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            user_id: UserId::new(row.user_id),
            company_id: CompanyId::new(row.company_id),
            role,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Store
// =============================================================================

/// `PostgreSQL`-backed [`AuthStore`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique-constraint violation to [`StoreError::Conflict`].
fn map_insert_error(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(what.to_owned())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl AuthStore for PgStore {
    async fn upsert_login_otp(
        &self,
        email: &Email,
        otp: PendingOtp,
    ) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (id, email, role, otp_code, otp_expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO UPDATE
                SET otp_code = EXCLUDED.otp_code,
                    otp_expires_at = EXCLUDED.otp_expires_at
            RETURNING id, email, role, otp_code, otp_expires_at, created_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(Role::Manager)
        .bind(otp.code.as_str())
        .bind(otp.expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn consume_otp(
        &self,
        email: &Email,
        code: &OtpCode,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        // Single-statement compare-and-clear: matching and clearing the
        // passcode happen in one row update, so a retried verify with the
        // same code finds nothing to match.
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users
            SET otp_code = NULL, otp_expires_at = NULL
            WHERE email = $1 AND otp_code = $2 AND otp_expires_at > $3
            RETURNING id, email, role, otp_code, otp_expires_at, created_at
            ",
        )
        .bind(email)
        .bind(code.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, role, otp_code, otp_expires_at, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn set_user_role(&self, id: UserId, role: Role) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_company(&self, company: &Company) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO companies (id, subdomain, credential, owner_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(company.id)
        .bind(&company.subdomain)
        .bind(&company.credential)
        .bind(company.owner_id)
        .bind(company.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "subdomain already registered"))?;

        Ok(())
    }

    async fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r"
            SELECT id, subdomain, credential, owner_id, created_at
            FROM companies
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_company_by_subdomain(
        &self,
        subdomain: &Subdomain,
    ) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r"
            SELECT id, subdomain, credential, owner_id, created_at
            FROM companies
            WHERE subdomain = $1
            ",
        )
        .bind(subdomain)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create_membership(&self, membership: &Membership) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO memberships (user_id, company_id, role, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(membership.user_id)
        .bind(membership.company_id)
        .bind(membership.role)
        .bind(membership.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "membership already exists"))?;

        Ok(())
    }

    async fn find_membership(
        &self,
        user_id: UserId,
        company_id: CompanyId,
    ) -> Result<Option<Membership>, StoreError> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r"
            SELECT user_id, company_id, role, created_at
            FROM memberships
            WHERE user_id = $1 AND company_id = $2
            ",
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn memberships_for_user(&self, user_id: UserId) -> Result<Vec<Membership>, StoreError> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r"
            SELECT user_id, company_id, role, created_at
            FROM memberships
            WHERE user_id = $1
            ORDER BY created_at ASC, company_id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM memberships WHERE company_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn row_with_unpaired_otp_columns_is_corrupt() {
        let row = UserRow {
            id: Uuid::new_v4(),
            email: "u@x.com".to_owned(),
            role: "MANAGER".to_owned(),
            otp_code: Some("123456".to_owned()),
            otp_expires_at: None,
            created_at: Utc::now(),
        };
        assert!(matches!(
            User::try_from(row),
            Err(StoreError::DataCorruption(_))
        ));
    }

    #[test]
    fn row_with_unknown_role_is_corrupt() {
        let row = UserRow {
            id: Uuid::new_v4(),
            email: "u@x.com".to_owned(),
            role: "SUPERUSER".to_owned(),
            otp_code: None,
            otp_expires_at: None,
            created_at: Utc::now(),
        };
        assert!(matches!(
            User::try_from(row),
            Err(StoreError::DataCorruption(_))
        ));
    }

    #[test]
    fn complete_row_decodes() {
        let row = UserRow {
            id: Uuid::new_v4(),
            email: "u@x.com".to_owned(),
            role: "ADMIN".to_owned(),
            otp_code: Some("123456".to_owned()),
            otp_expires_at: Some(Utc::now()),
            created_at: Utc::now(),
        };
        let user = User::try_from(row).unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(user.pending_otp.is_some());
    }
}
