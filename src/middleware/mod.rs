//! Authentication extractors and access guards.
//!
//! # Authentication Flow
//!
//! 1. Client sends request with `Authorization: Bearer <token>` header
//! 2. [`auth::AuthUser`] verifies the token and loads the caller's user and
//!    role rows into an [`Identity`](lms_auth::Identity)
//! 3. Guard extractors declared with [`require_access!`](crate::require_access)
//!    evaluate their constant requirement against that identity
//! 4. Handler executes if all checks pass
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::{AuthUser, RequireManageSubjects};
//!
//! // Any authenticated caller
//! async fn get_subjects(AuthUser(identity): AuthUser) -> impl IntoResponse { ... }
//!
//! // Requirement-checked caller
//! async fn create_subject(RequireManageSubjects(auth_user): RequireManageSubjects) { ... }
//! ```

pub mod auth;
