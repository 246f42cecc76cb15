//! Teacher models and forms.

use lms_core::serde::deserialize_comma_list;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::users::{NewUser, UserDto, UserWithRole};
use crate::validation::{
    PERSON_NAME, default_name, validate_lowercase, validate_lowercase_list, validate_password,
};

pub const DEFAULT_TEACHER_ROLE: &str = "default teacher";

#[derive(Debug, Clone, FromRow)]
pub struct TeacherRow {
    #[sqlx(flatten)]
    pub user: UserWithRole,
    pub institution: Option<String>,
    pub post: Option<String>,
    /// Titles of the taught subjects.
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub institution: Option<String>,
    pub post: Option<String>,
    pub subjects: Vec<String>,
}

impl From<TeacherRow> for TeacherDto {
    fn from(row: TeacherRow) -> Self {
        Self {
            user: row.user.into(),
            institution: row.institution,
            post: row.post,
            subjects: row.subjects,
        }
    }
}

/// Side record fields of a new teacher.
#[derive(Debug, Clone, Default)]
pub struct TeacherProfile {
    pub institution: Option<String>,
    pub post: Option<String>,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDefaultTeacherDto {
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
    #[validate(length(min = 6, max = 40, message = "post title must be 6-40 characters long"))]
    pub post: Option<String>,
    /// Subject titles; every one must exist.
    #[validate(
        length(min = 1, message = "subjects must not be empty"),
        custom(function = "validate_lowercase_list")
    )]
    pub subjects: Option<Vec<String>>,
}

impl CreateDefaultTeacherDto {
    pub fn into_parts(self) -> (NewUser, TeacherProfile) {
        (
            NewUser {
                name: self
                    .name
                    .unwrap_or_else(|| default_name(DEFAULT_TEACHER_ROLE)),
                email: self.email,
                password: self.password,
            },
            TeacherProfile {
                institution: self.institution,
                post: self.post,
                subjects: self.subjects.unwrap_or_default(),
            },
        )
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpecialTeacherDto {
    #[validate(
        length(min = 6, max = 40, message = "name must be 6-40 characters long"),
        regex(path = *PERSON_NAME, message = "name must be 2 or 3 words long, each word must start with a capital letter, name must not contain digits")
    )]
    pub name: Option<String>,
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    /// Title of a role of type Teacher.
    #[validate(custom(function = "validate_lowercase"))]
    #[schema(example = "head teacher")]
    pub role_title: String,
    #[validate(length(min = 8, max = 40, message = "institution title must be 8-40 characters long"))]
    pub institution: Option<String>,
    #[validate(length(min = 6, max = 40, message = "post title must be 6-40 characters long"))]
    pub post: Option<String>,
    #[validate(
        length(min = 1, message = "subjects must not be empty"),
        custom(function = "validate_lowercase_list")
    )]
    pub subjects: Option<Vec<String>>,
}

impl CreateSpecialTeacherDto {
    pub fn into_parts(self) -> (NewUser, TeacherProfile, String) {
        (
            NewUser {
                name: self.name.unwrap_or_else(|| default_name(&self.role_title)),
                email: self.email,
                password: self.password,
            },
            TeacherProfile {
                institution: self.institution,
                post: self.post,
                subjects: self.subjects.unwrap_or_default(),
            },
            self.role_title,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeacherDto {
    #[validate(
        length(min = 6, max = 40, message = "name must be 6-40 characters long"),
        regex(path = *PERSON_NAME, message = "name must be 2 or 3 words long, each word must start with a capital letter, name must not contain digits")
    )]
    pub name: Option<String>,
    #[validate(length(min = 8, max = 40, message = "institution title must be 8-40 characters long"))]
    pub institution: Option<String>,
    #[validate(length(min = 6, max = 40, message = "post title must be 6-40 characters long"))]
    pub post: Option<String>,
    /// Replaces the whole taught set.
    #[validate(
        length(min = 1, message = "subjects must not be empty"),
        custom(function = "validate_lowercase_list")
    )]
    pub subjects: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TeacherFilterParams {
    /// Substring of the name, username, institution or post.
    pub query_line: Option<String>,
    /// Comma separated subject titles; a teacher must teach all of them.
    #[serde(default, deserialize_with = "deserialize_comma_list")]
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>)]
    pub subjects: Vec<String>,
}

impl TeacherFilterParams {
    /// Lowercased and deduplicated subject titles.
    pub fn subject_titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = Vec::with_capacity(self.subjects.len());
        for title in self.subjects.iter().map(|s| s.trim().to_lowercase()) {
            if !title.is_empty() && !titles.contains(&title) {
                titles.push(title);
            }
        }
        titles
    }
}
