//! # LMS Core
//!
//! Core types, errors, and utilities shared by every LMS crate:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`error_codes`]: Stable message codes sent to clients
//! - [`permissions`]: Permission tokens, role types and statuses
//! - [`pagination`]: `pageSize`/`pageNumber` pagination with `remaining` counts
//! - [`password`]: Password hashing and verification
//! - [`file_storage`]: Upload storage on the local filesystem
//! - [`serde`]: Query-string deserialization helpers
//!
//! # Example
//!
//! ```ignore
//! use lms_core::{AppError, error_codes};
//! use lms_core::password::{hash_password, verify_password};
//!
//! let error = AppError::coded(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, "subject");
//! let hash = hash_password("Secret123")?;
//! ```

pub mod error_codes;
pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod password;
pub mod permissions;
pub mod serde;

// Re-export commonly used types at crate root
pub use errors::{AppError, ErrorResponse};
pub use pagination::{Paginated, PaginationParams};
pub use password::{hash_password, verify_password};
pub use permissions::{Permission, RoleType, Status};
