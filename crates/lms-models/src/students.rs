//! Student models and forms.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::users::{NewUser, UserDto, UserWithRole};
use crate::validation::{
    PERSON_NAME, default_name, validate_lowercase, validate_password, validate_username,
};

pub const DEFAULT_STUDENT_ROLE: &str = "default student";

#[derive(Debug, Clone, FromRow)]
pub struct StudentRow {
    #[sqlx(flatten)]
    pub user: UserWithRole,
    pub institution: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub institution: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl From<StudentRow> for StudentDto {
    fn from(row: StudentRow) -> Self {
        Self {
            user: row.user.into(),
            institution: row.institution,
            birth_date: row.birth_date,
        }
    }
}

/// Side record fields of a new student.
#[derive(Debug, Clone, Default)]
pub struct StudentProfile {
    pub institution: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDefaultStudentDto {
    #[validate(
        length(min = 6, max = 40, message = "name must be 6-40 characters long"),
        regex(path = *PERSON_NAME, message = "name must be 2 or 3 words long, each word must start with a capital letter, name must not contain digits")
    )]
    pub name: Option<String>,
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[validate(length(min = 8, max = 40, message = "institution title must be 8-40 characters long"))]
    pub institution: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl CreateDefaultStudentDto {
    pub fn into_parts(self) -> (NewUser, StudentProfile) {
        (
            NewUser {
                name: self
                    .name
                    .unwrap_or_else(|| default_name(DEFAULT_STUDENT_ROLE)),
                email: self.email,
                password: self.password,
            },
            StudentProfile {
                institution: self.institution,
                birth_date: self.birth_date,
            },
        )
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpecialStudentDto {
    #[validate(
        length(min = 6, max = 40, message = "name must be 6-40 characters long"),
        regex(path = *PERSON_NAME, message = "name must be 2 or 3 words long, each word must start with a capital letter, name must not contain digits")
    )]
    pub name: Option<String>,
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    /// Title of a role of type Student.
    #[validate(custom(function = "validate_lowercase"))]
    #[schema(example = "self student")]
    pub role_title: String,
    #[validate(length(min = 8, max = 40, message = "institution title must be 8-40 characters long"))]
    pub institution: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl CreateSpecialStudentDto {
    pub fn into_parts(self) -> (NewUser, StudentProfile, String) {
        (
            NewUser {
                name: self.name.unwrap_or_else(|| default_name(&self.role_title)),
                email: self.email,
                password: self.password,
            },
            StudentProfile {
                institution: self.institution,
                birth_date: self.birth_date,
            },
            self.role_title,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentDto {
    #[validate(
        length(min = 6, max = 40, message = "name must be 6-40 characters long"),
        regex(path = *PERSON_NAME, message = "name must be 2 or 3 words long, each word must start with a capital letter, name must not contain digits")
    )]
    pub name: Option<String>,
    #[validate(
        length(min = 6, max = 40, message = "username must be 6-40 characters long"),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,
    #[validate(email(message = "email must be an email"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_password"))]
    pub password: Option<String>,
    #[validate(length(min = 8, max = 40, message = "institution title must be 8-40 characters long"))]
    pub institution: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StudentFilterParams {
    /// Substring of the name, username or institution.
    pub query_line: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_student_parts() {
        let dto: CreateDefaultStudentDto = serde_json::from_str(
            r#"{"email":"kid@example.com","password":"qwerty12","institution":"Central School","birthDate":"2010-05-01"}"#,
        )
        .unwrap();
        assert!(dto.validate().is_ok());

        let (user, profile) = dto.into_parts();
        assert_eq!(user.name, "New Default Student");
        assert_eq!(profile.institution.as_deref(), Some("Central School"));
        assert_eq!(profile.birth_date, NaiveDate::from_ymd_opt(2010, 5, 1));
    }

    #[test]
    fn test_institution_length() {
        let dto = UpdateStudentDto {
            institution: Some("School".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_rejects_uppercase_username() {
        let dto = UpdateStudentDto {
            username: Some("JohnDoeJunior".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }
}
