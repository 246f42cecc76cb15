//! User role models and forms.
//!
//! A role's permission array is the only source of what its holders may do.

use chrono::{DateTime, Utc};
use lms_core::{Permission, RoleType, Status};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_lowercase, validate_unique};

/// Fixed ids of the built-in roles seeded by the initial migration.
pub mod builtin {
    use uuid::Uuid;

    pub const ADMIN: Uuid = Uuid::from_u128(1);
    pub const DEFAULT_TEACHER: Uuid = Uuid::from_u128(2);
    pub const DEFAULT_STUDENT: Uuid = Uuid::from_u128(3);
    pub const DEFAULT_PARENT: Uuid = Uuid::from_u128(4);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRole {
    pub id: Uuid,
    #[schema(example = "default teacher")]
    pub title: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub role_type: RoleType,
    pub status: Status,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRoleDto {
    #[validate(
        length(min = 5, message = "title must be at least 5 characters long"),
        custom(function = "validate_lowercase")
    )]
    #[schema(example = "self student")]
    pub title: String,
    #[serde(rename = "type")]
    pub role_type: RoleType,
    #[validate(
        length(min = 1, message = "permissions must not be empty"),
        custom(function = "validate_unique")
    )]
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRoleDto {
    #[validate(
        length(min = 5, message = "title must be at least 5 characters long"),
        custom(function = "validate_lowercase")
    )]
    pub title: Option<String>,
    #[validate(
        length(min = 1, message = "permissions must not be empty"),
        custom(function = "validate_unique")
    )]
    pub permissions: Option<Vec<Permission>>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserRoleFilterParams {
    /// Substring of the title.
    pub query_line: Option<String>,
    pub role_type: Option<RoleType>,
}
