//! One-time-passcode login flow.
//!
//! Per-user state machine:
//!
//! ```text
//! NoAccount --login--> OtpPending(code, expiry) --verify ok--> Verified (code cleared)
//!                      OtpPending --repeated login--> OtpPending (code/expiry reset)
//! ```
//!
//! Expiry is checked lazily at verify time; there is no background sweep.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use thiserror::Error;
use tracing::info;

use oxgate_core::{Email, OtpCode};

use crate::error::ApiError;
use crate::models::{PendingOtp, User};
use crate::services::TokenService;
use crate::store::{AuthStore, StoreError};

/// Errors from the login/verify flow.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email, no pending code, wrong code, or expired code. The
    /// caller cannot tell which; all four read the same from outside.
    #[error("invalid or expired OTP")]
    InvalidCredential,

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Token signing failed (broken signing-key configuration).
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredential => Self::BadRequest("Invalid or expired OTP".to_owned()),
            AuthError::Store(e) => Self::Store(e),
            AuthError::Signing(e) => Self::Internal(e.to_string()),
        }
    }
}

/// A successful verification: the identity plus its fresh session token.
#[derive(Debug)]
pub struct VerifiedSession {
    pub access_token: String,
    pub user: User,
}

/// Issues and verifies one-time passcodes against the credential store.
pub struct OtpService {
    store: Arc<dyn AuthStore>,
    tokens: TokenService,
}

impl OtpService {
    /// How long an issued passcode stays valid.
    pub const OTP_TTL: Duration = Duration::minutes(10);

    /// Create the service.
    #[must_use]
    pub fn new(store: Arc<dyn AuthStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// Start a login: draw a fresh six-digit code and attach it to the
    /// user, creating the account on first contact.
    ///
    /// A repeated login replaces any earlier pending code, which
    /// invalidates it even if it had not expired yet.
    ///
    /// The code is returned to the caller so it can be handed to an
    /// out-of-band delivery channel. The HTTP layer currently echoes it in
    /// the response, which is a development placeholder; a deployment with
    /// a message dispatcher must route the code there instead.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the upsert fails.
    pub async fn login(&self, email: &Email) -> Result<OtpCode, AuthError> {
        let code = generate_code();
        let otp = PendingOtp {
            code: code.clone(),
            expires_at: Utc::now() + Self::OTP_TTL,
        };

        let user = self.store.upsert_login_otp(email, otp).await?;
        info!(user_id = %user.id, "issued login passcode");

        Ok(code)
    }

    /// Complete a login: consume the pending code and mint a session token.
    ///
    /// The store clears the code in the same atomic step that validates
    /// it, so a given code verifies at most once even under retries.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredential`] when the email is unknown,
    /// no code is pending, the code does not match, or the code has
    /// expired.
    pub async fn verify(
        &self,
        email: &Email,
        code: &OtpCode,
    ) -> Result<VerifiedSession, AuthError> {
        let user = self
            .store
            .consume_otp(email, code, Utc::now())
            .await?
            .ok_or(AuthError::InvalidCredential)?;

        let access_token = self
            .tokens
            .issue(user.id, user.email.clone(), user.role)?;
        info!(user_id = %user.id, "login verified");

        Ok(VerifiedSession { access_token, user })
    }
}

/// Draw a uniform six-digit code.
fn generate_code() -> OtpCode {
    let n: u32 = rand::rng().random_range(100_000..=999_999);
    // Six digits by construction of the range.
    #[allow(clippy::unwrap_used)]
    OtpCode::parse(&n.to_string()).unwrap()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use oxgate_core::Role;

    use super::*;
    use crate::store::MemoryStore;

    fn service(store: Arc<dyn AuthStore>) -> OtpService {
        let tokens = TokenService::new(
            &SecretString::from("test-signing-key-0123456789abcdef"),
            "oxgate-test".to_owned(),
        );
        OtpService::new(store, tokens)
    }

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[test]
    fn generated_codes_are_six_digits_in_range() {
        for _ in 0..1000 {
            let code = generate_code();
            let n: u32 = code.as_str().parse().unwrap();
            assert!((100_000..=999_999).contains(&n), "out of range: {n}");
        }
    }

    #[tokio::test]
    async fn login_then_verify_succeeds_once() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store);
        let addr = email("u@x.com");

        let code = svc.login(&addr).await.unwrap();
        let session = svc.verify(&addr, &code).await.unwrap();
        assert_eq!(session.user.email, addr);
        assert_eq!(session.user.role, Role::Manager);
        assert!(!session.access_token.is_empty());

        // The code was consumed; a second verify fails.
        assert!(matches!(
            svc.verify(&addr, &code).await,
            Err(AuthError::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn relogin_invalidates_previous_code() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store);
        let addr = email("u@x.com");

        let first = svc.login(&addr).await.unwrap();
        let second = svc.login(&addr).await.unwrap();

        if first != second {
            assert!(matches!(
                svc.verify(&addr, &first).await,
                Err(AuthError::InvalidCredential)
            ));
        }
        assert!(svc.verify(&addr, &second).await.is_ok());
    }

    #[tokio::test]
    async fn verify_unknown_email_fails() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store);

        let code = OtpCode::parse("123456").unwrap();
        assert!(matches!(
            svc.verify(&email("nobody@x.com"), &code).await,
            Err(AuthError::InvalidCredential)
        ));
    }
}
