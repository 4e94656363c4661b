//! Service layer: the operations behind each route.
//!
//! Each service owns one protocol and returns its own error enum; the
//! route layer converts those into [`crate::error::ApiError`] responses.

pub mod catalog;
pub mod company;
pub mod otp;
pub mod token;

pub use catalog::{CatalogError, CatalogService};
pub use company::{CompanyError, CompanyService};
pub use otp::{AuthError, OtpService};
pub use token::{Claims, TokenService};
