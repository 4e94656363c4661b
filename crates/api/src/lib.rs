//! Oxgate API library.
//!
//! Multi-tenant identity and authorization service: OTP login, signed
//! session tokens, role-guarded company onboarding, and a thin paginated
//! proxy to each tenant's external product catalog.
//!
//! The binary lives in `main.rs`; everything is exported as a library so
//! the router can be driven in-process by the integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod ox;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
