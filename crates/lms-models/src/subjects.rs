use chrono::{DateTime, Utc};
use lms_core::Status;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_lowercase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: Uuid,
    #[schema(example = "math")]
    pub title: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSubjectDto {
    #[validate(
        length(min = 1, message = "title must not be empty"),
        custom(function = "validate_lowercase")
    )]
    #[schema(example = "math")]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateSubjectDto {
    #[validate(
        length(min = 1, message = "title must not be empty"),
        custom(function = "validate_lowercase")
    )]
    #[schema(example = "physics")]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SubjectFilterParams {
    /// Substring of the title.
    pub query_line: Option<String>,
}
