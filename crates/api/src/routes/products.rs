//! Product catalog passthrough route.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use oxgate_core::Capability;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new().route("/products", get(products))
}

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// Fetch one page of the caller's company catalog.
///
/// GET /products?page=1&size=10
///
/// Requires a session token with at least the MANAGER role. `size` is
/// capped at 20; `page` and `size` must be at least 1.
async fn products(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    caller.require(Capability::ManagerOnly)?;

    let page = query.page.unwrap_or(1);
    let size = query.size.unwrap_or(10);
    if page < 1 {
        return Err(ApiError::BadRequest("Page must be at least 1".to_owned()));
    }
    if size < 1 {
        return Err(ApiError::BadRequest("Size must be at least 1".to_owned()));
    }

    let payload = state.catalog().variations(caller.user_id, page, size).await?;

    Ok(Json(payload))
}
