//! Oxgate Core - Shared types library.
//!
//! This crate provides common types used across all Oxgate components:
//! - `api` - The HTTP identity and authorization service
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, subdomains,
//!   one-time passcodes, roles, and tenant credentials

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
