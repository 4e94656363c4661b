//! Session-credential extractor and role guard.
//!
//! Routes that need a caller declare [`AuthUser`] as a handler argument;
//! extraction rejects missing, malformed, unsigned, and expired tokens
//! with `401 Unauthorized`. Role checks happen afterwards via
//! [`AuthUser::require`], which rejects with `403 Forbidden`.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use oxgate_core::{Capability, Email, Role, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller, as asserted by a verified session token.
///
/// The role here is the user's **global** role claim from token issuance,
/// not a per-company membership role.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: UserId,
    pub email: Email,
    pub role: Role,
}

impl AuthUser {
    /// Check this caller against a route's declared capability.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Forbidden`] if the caller's role does not
    /// satisfy the capability.
    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        if self.role.satisfies(capability) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Insufficient role for this operation".to_owned(),
            ))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_owned()))?;

        let value = header
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Malformed authorization header".to_owned()))?;

        // Accept both "Bearer <token>" and a raw token
        let token = value.strip_prefix("Bearer ").unwrap_or(value);

        let claims = state
            .tokens()
            .verify(token)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_owned()))?;

        Ok(Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::*;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            user_id: UserId::generate(),
            email: Email::parse("u@x.com").unwrap(),
            role,
        }
    }

    #[test]
    fn manager_passes_manager_only_but_not_admin_only() {
        let user = caller(Role::Manager);
        assert!(user.require(Capability::ManagerOnly).is_ok());

        let rejection = user.require(Capability::AdminOnly).unwrap_err();
        assert_eq!(rejection.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn admin_passes_both_capabilities() {
        let user = caller(Role::Admin);
        assert!(user.require(Capability::AdminOnly).is_ok());
        assert!(user.require(Capability::ManagerOnly).is_ok());
    }
}
