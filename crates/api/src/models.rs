//! Domain models for users, companies, and memberships.

use chrono::{DateTime, Utc};
use serde::Serialize;

use oxgate_core::{CompanyId, Email, OtpCode, Role, Subdomain, TenantCredential, UserId};

/// A passcode issued by a login call, pending verification.
///
/// Code and expiry always travel together; a user either has a complete
/// pending passcode or none at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOtp {
    /// The six-digit code.
    pub code: OtpCode,
    /// Instant at and after which the code is no longer accepted.
    pub expires_at: DateTime<Utc>,
}

/// An identity record.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    /// The user's global role. Mutated only by company onboarding, never by
    /// the auth flow.
    pub role: Role,
    /// The passcode currently awaiting verification, if any.
    pub pending_otp: Option<PendingOtp>,
    pub created_at: DateTime<Utc>,
}

/// A tenant record.
#[derive(Debug, Clone, Serialize)]
pub struct Company {
    pub id: CompanyId,
    /// Globally unique; identifies the external tenant.
    pub subdomain: Subdomain,
    /// The bearer credential supplied at onboarding, replayed on later
    /// calls to the tenant's API.
    #[serde(skip)]
    pub credential: TenantCredential,
    /// The user who created this company; the only party allowed to
    /// delete it.
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A user's role assignment within one company.
///
/// The `(user_id, company_id)` pair is unique; membership rows are created
/// once and never updated in place.
#[derive(Debug, Clone, Serialize)]
pub struct Membership {
    pub user_id: UserId,
    pub company_id: CompanyId,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a company registration call.
#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    /// The subdomain was new; the caller created and now owns the company.
    Created(Company),
    /// The company existed; the caller joined it as a manager.
    Joined(Company),
    /// The caller was already a member; nothing changed.
    AlreadyMember(Company),
}

impl RegistrationOutcome {
    /// The company involved, whichever way registration went.
    #[must_use]
    pub const fn company(&self) -> &Company {
        match self {
            Self::Created(c) | Self::Joined(c) | Self::AlreadyMember(c) => c,
        }
    }
}
