//! Teacher-to-student connections.
//!
//! A connection is created by one side and confirmed by the other. An admin
//! may create it on behalf of either side and confirm it at any stage.

use chrono::{DateTime, Utc};
use lms_core::RoleType;
use lms_core::serde::deserialize_optional_uuid;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

lms_core::text_enum! {
    /// Which side still has to accept the connection.
    pub enum ConfirmationStatus {
        NeedsTeacherConfirmation,
        NeedsStudentConfirmation,
        Confirmed,
    }
}

impl ConfirmationStatus {
    /// Status of a connection created by a caller of `role_type`.
    ///
    /// `from_teacher` is only consulted for admins, who act on behalf of
    /// one of the sides. Parents never create connections.
    pub fn initial(role_type: RoleType, from_teacher: bool) -> Option<Self> {
        match role_type {
            RoleType::Admin if from_teacher => Some(Self::NeedsStudentConfirmation),
            RoleType::Admin => Some(Self::NeedsTeacherConfirmation),
            RoleType::Teacher => Some(Self::NeedsStudentConfirmation),
            RoleType::Student => Some(Self::NeedsTeacherConfirmation),
            RoleType::Parent => None,
        }
    }

    /// Statuses a caller of `role_type` may move to [`Confirmed`](Self::Confirmed).
    pub fn confirmable_by(role_type: RoleType) -> &'static [Self] {
        match role_type {
            RoleType::Admin => &[Self::NeedsTeacherConfirmation, Self::NeedsStudentConfirmation],
            RoleType::Teacher => &[Self::NeedsTeacherConfirmation],
            RoleType::Student => &[Self::NeedsStudentConfirmation],
            RoleType::Parent => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherToStudent {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub confirmation_status: ConfirmationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnectionDto {
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    /// Admin only: create the connection on behalf of the teacher.
    #[serde(default)]
    pub from_teacher: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ConnectionFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub teacher_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    pub confirmation_status: Option<ConfirmationStatus>,
}
