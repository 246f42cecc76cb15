//! # LMS Auth
//!
//! Authentication and authorization building blocks:
//!
//! - [`jwt`]: Issuing and verifying access/refresh tokens
//! - [`claims`]: Token claim structures
//! - [`identity`]: The authenticated caller of a request
//! - [`access`]: Requirement evaluation and the self-service guard
//!
//! The HTTP extractors that tie these to request handling live in the
//! application crate, where the database pool is available.

pub mod access;
pub mod claims;
pub mod identity;
pub mod jwt;

// Re-export commonly used types at crate root
pub use access::{AccessDenied, Requirement, ensure_current_user, evaluate};
pub use claims::{AccessClaims, RefreshClaims};
pub use identity::Identity;
pub use jwt::{
    TokenPair, TokenSubject, create_access_token, create_refresh_token, issue_tokens,
    verify_access_token, verify_refresh_token,
};
