//! Login and verification routes.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use oxgate_core::{Email, OtpCode, Role, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/verify", post(verify))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    /// Development placeholder: a production deployment delivers the code
    /// out of band and omits it here.
    pub otp: OtpCode,
}

/// Start a login for an email address.
///
/// POST /auth/login
///
/// Creates the account on first contact; a repeated login resets the
/// pending passcode.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = Email::parse(&req.email).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let otp = state.otp().login(&email).await?;

    Ok(Json(LoginResponse {
        message: "OTP sent successfully",
        otp,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub access_token: String,
    pub user: UserPayload,
}

/// Complete a login with the one-time passcode.
///
/// POST /auth/verify
///
/// On success the passcode is consumed and a 24-hour session token is
/// returned.
async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let email = Email::parse(&req.email).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let otp = OtpCode::parse(&req.otp).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let session = state.otp().verify(&email, &otp).await?;

    Ok(Json(VerifyResponse {
        access_token: session.access_token,
        user: UserPayload {
            id: session.user.id,
            email: session.user.email,
            role: session.user.role,
        },
    }))
}
