//! Credential store boundary.
//!
//! The service treats persistence as an abstract store with atomic per-row
//! operations. Two implementations exist:
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx; unique indexes arbitrate races
//! - [`MemoryStore`] - mutex-guarded maps for tests and local development
//!
//! # Atomicity contract
//!
//! Every method is a single atomic step from the caller's point of view.
//! The two spots where this matters:
//!
//! - [`AuthStore::consume_otp`] is compare-and-clear: the passcode columns
//!   are cleared in the same step that validates them, so a code can be
//!   consumed at most once even under a retried verify.
//! - [`AuthStore::create_company`] and [`AuthStore::create_membership`]
//!   report [`StoreError::Conflict`] when a uniqueness constraint loses a
//!   race; callers map the conflict to the join / already-a-member path
//!   instead of failing.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use oxgate_core::{CompanyId, Email, OtpCode, Role, Subdomain, UserId};

use crate::models::{Company, Membership, PendingOtp, User};

pub use memory::MemoryStore;
pub use postgres::{PgStore, create_pool};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A uniqueness constraint rejected the write.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Durable store for users, companies, and memberships.
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Set a pending passcode for `email`, creating the user if absent.
    ///
    /// A new user starts with [`Role::Manager`]; an existing user keeps
    /// their role and has any prior pending passcode overwritten.
    async fn upsert_login_otp(
        &self,
        email: &Email,
        otp: PendingOtp,
    ) -> Result<User, StoreError>;

    /// Atomically validate and clear a pending passcode.
    ///
    /// Returns the user with the passcode cleared when `email` exists, a
    /// passcode is pending, `code` matches it exactly, and `now` is before
    /// its expiry. Returns `None` (without mutating anything) otherwise.
    async fn consume_otp(
        &self,
        email: &Email,
        code: &OtpCode,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError>;

    /// Look up a user by id.
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Overwrite a user's global role.
    async fn set_user_role(&self, id: UserId, role: Role) -> Result<(), StoreError>;

    /// Insert a company row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the subdomain is already taken.
    async fn create_company(&self, company: &Company) -> Result<(), StoreError>;

    /// Look up a company by id.
    async fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError>;

    /// Look up a company by its unique subdomain.
    async fn find_company_by_subdomain(
        &self,
        subdomain: &Subdomain,
    ) -> Result<Option<Company>, StoreError>;

    /// Insert a membership row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the `(user, company)` pair
    /// already has a membership.
    async fn create_membership(&self, membership: &Membership) -> Result<(), StoreError>;

    /// Look up one user's membership in one company.
    async fn find_membership(
        &self,
        user_id: UserId,
        company_id: CompanyId,
    ) -> Result<Option<Membership>, StoreError>;

    /// All memberships for a user, ordered by `(created_at, company_id)`
    /// ascending. The first entry is the stable "default" company used by
    /// the catalog proxy.
    async fn memberships_for_user(&self, user_id: UserId) -> Result<Vec<Membership>, StoreError>;

    /// Delete a company and all of its memberships, memberships first, so
    /// no membership ever references a missing company.
    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError>;
}
