//! Core types for Oxgate.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod otp;
pub mod role;
pub mod subdomain;

pub use credential::TenantCredential;
pub use email::{Email, EmailError};
pub use id::*;
pub use otp::{OtpCode, OtpCodeError};
pub use role::{Capability, Role, RoleParseError};
pub use subdomain::{Subdomain, SubdomainError};
