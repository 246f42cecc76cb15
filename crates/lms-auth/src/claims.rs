//! JWT claim structures.
//!
//! - [`AccessClaims`]: carried by the bearer token on every guarded request
//! - [`RefreshClaims`]: exchanged for a fresh token pair
//!
//! The role type and permissions in [`AccessClaims`] describe the role at
//! issue time. Guards never read them: the caller's
//! [`Identity`](crate::Identity) is rebuilt from the user and role rows on
//! each request, so a role edit applies without reissuing tokens.

use lms_core::{Permission, RoleType};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    /// User id.
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub role_id: Uuid,
    pub role_type: RoleType,
    pub permissions: Vec<Permission>,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
}
