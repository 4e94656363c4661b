//! HTTP surface.
//!
//! | Method | Path               | Auth                      |
//! |--------|--------------------|---------------------------|
//! | GET    | /health            | none                      |
//! | POST   | /auth/login        | none                      |
//! | POST   | /auth/verify       | none                      |
//! | POST   | /register-company  | session token             |
//! | DELETE | /company/{id}      | session token + AdminOnly |
//! | GET    | /products          | session token + ManagerOnly |

pub mod auth;
pub mod company;
pub mod products;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(company::router())
        .merge(products::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe.
async fn health() -> &'static str {
    "ok"
}
