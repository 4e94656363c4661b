//! Company onboarding and deletion routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, post},
};
use serde::{Deserialize, Serialize};

use oxgate_core::{Capability, CompanyId, Subdomain, TenantCredential};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{Company, RegistrationOutcome};
use crate::state::AppState;

/// Build the company router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register-company", post(register_company))
        .route("/company/{id}", delete(delete_company))
}

#[derive(Debug, Deserialize)]
pub struct RegisterCompanyRequest {
    /// External bearer credential, including the `Bearer ` prefix.
    pub token: String,
    pub subdomain: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterCompanyResponse {
    pub message: &'static str,
    pub company: Company,
}

/// Register the caller with a company, creating it if needed.
///
/// POST /register-company
///
/// Requires a session token. The supplied external credential is
/// validated against the tenant's profile endpoint before anything is
/// stored.
async fn register_company(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<RegisterCompanyRequest>,
) -> Result<Json<RegisterCompanyResponse>, ApiError> {
    let credential = TenantCredential::new(req.token);
    if !credential.has_bearer_prefix() {
        return Err(ApiError::BadRequest(
            "Token must start with \"Bearer \"".to_owned(),
        ));
    }

    let subdomain =
        Subdomain::parse(&req.subdomain).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let outcome = state
        .companies()
        .register_company(credential, subdomain, caller.user_id)
        .await?;

    let (message, company) = match outcome {
        RegistrationOutcome::Created(c) => ("Company created successfully", c),
        RegistrationOutcome::Joined(c) => ("Added as manager to existing company", c),
        RegistrationOutcome::AlreadyMember(c) => ("Already a member of this company", c),
    };

    Ok(Json(RegisterCompanyResponse { message, company }))
}

#[derive(Debug, Serialize)]
pub struct DeleteCompanyResponse {
    pub message: &'static str,
}

/// Delete a company.
///
/// DELETE /company/{id}
///
/// Requires a session token with the ADMIN role; beyond that, only the
/// company's owner is allowed through.
async fn delete_company(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<CompanyId>,
) -> Result<Json<DeleteCompanyResponse>, ApiError> {
    caller.require(Capability::AdminOnly)?;

    state
        .companies()
        .delete_company(id, caller.user_id)
        .await?;

    Ok(Json(DeleteCompanyResponse {
        message: "Company deleted successfully",
    }))
}
