//! User models, forms and responses.
//!
//! Responses never carry the password hash. Creation responses echo the plain
//! password once so the creator can hand it over.

use chrono::{DateTime, Utc};
use lms_core::{RoleType, Status};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{
    PERSON_NAME, default_name, validate_lowercase, validate_password, validate_username,
};

/// A `users` row joined with its role, as every user-facing query selects it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserWithRole {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<String>,
    pub role_id: Uuid,
    pub role_title: String,
    pub role_type: RoleType,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list matching [`UserWithRole`]; expects `users u JOIN user_roles r`.
pub const USER_WITH_ROLE_COLUMNS: &str = "u.id, u.name, u.username, u.email, u.password, u.avatar, \
     u.role_id, r.title AS role_title, r.type AS role_type, u.status, u.created_at, u.updated_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    #[schema(example = "John Doe Junior")]
    pub name: String,
    #[schema(example = "johndoejunior")]
    pub username: String,
    pub email: String,
    /// Only present in creation responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub avatar: Option<String>,
    pub role_id: Uuid,
    #[schema(example = "default parent")]
    pub role_title: String,
    pub role_type: RoleType,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserWithRole> for UserDto {
    fn from(user: UserWithRole) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            password: None,
            avatar: user.avatar,
            role_id: user.role_id,
            role_title: user.role_title,
            role_type: user.role_type,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl UserDto {
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// The three built-in non-admin roles a default user may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DefaultRoleTitle {
    #[serde(rename = "default student")]
    DefaultStudent,
    #[serde(rename = "default teacher")]
    DefaultTeacher,
    #[serde(rename = "default parent")]
    DefaultParent,
}

impl DefaultRoleTitle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DefaultStudent => "default student",
            Self::DefaultTeacher => "default teacher",
            Self::DefaultParent => "default parent",
        }
    }
}

/// Fields every new user carries, however it was created.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDefaultUserDto {
    #[validate(
        length(min = 6, max = 40, message = "name must be 6-40 characters long"),
        regex(path = *PERSON_NAME, message = "name must be 2 or 3 words long, each word must start with a capital letter, name must not contain digits")
    )]
    #[schema(example = "John Doe Junior")]
    pub name: Option<String>,
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    #[schema(example = "qwerty12")]
    pub password: String,
    pub role_title: DefaultRoleTitle,
}

impl CreateDefaultUserDto {
    pub fn into_new_user(self) -> NewUser {
        NewUser {
            name: self
                .name
                .unwrap_or_else(|| default_name(self.role_title.as_str())),
            email: self.email,
            password: self.password,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpecialUserDto {
    #[validate(
        length(min = 6, max = 40, message = "name must be 6-40 characters long"),
        regex(path = *PERSON_NAME, message = "name must be 2 or 3 words long, each word must start with a capital letter, name must not contain digits")
    )]
    pub name: Option<String>,
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    /// Title of any non-admin role.
    #[validate(custom(function = "validate_lowercase"))]
    #[schema(example = "self student")]
    pub role: String,
}

impl CreateSpecialUserDto {
    pub fn into_new_user(self) -> (NewUser, String) {
        let name = self.name.unwrap_or_else(|| default_name(&self.role));
        (
            NewUser {
                name,
                email: self.email,
                password: self.password,
            },
            self.role,
        )
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeUsernameDto {
    #[validate(
        length(min = 6, max = 40, message = "username must be 6-40 characters long"),
        custom(function = "validate_username")
    )]
    #[schema(example = "johndoejunior")]
    pub new_username: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEmailDto {
    #[validate(email(message = "email must be an email"))]
    pub new_email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordDto {
    #[validate(custom(function = "validate_password"))]
    pub new_password: String,
    #[validate(custom(function = "validate_password"))]
    pub old_password: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserFilterParams {
    /// Substring of the name or username.
    pub query_line: Option<String>,
    pub role_type: Option<RoleType>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AdminFilterParams {
    /// Substring of the name, username or email.
    pub query_line: Option<String>,
}

/// `"John Doe Junior"` → `"johndoejunior"`.
pub fn username_base(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect()
}

/// Picks the username for `base` given the existing usernames containing it.
///
/// The tail is whatever follows the first occurrence of `base`: an empty
/// tail counts as 0, a numeric one as its value, anything else is ignored.
/// Returns `base` when no username contains it, otherwise `base` with the
/// largest tail plus one.
pub fn next_username(base: &str, taken: &[String]) -> String {
    let mut contained = taken
        .iter()
        .filter_map(|username| username.split_once(base).map(|(_, tail)| tail))
        .peekable();
    if contained.peek().is_none() {
        return base.to_string();
    }

    let max_tail = contained
        .filter_map(|tail| {
            if tail.is_empty() {
                Some(0)
            } else if tail.chars().all(|c| c.is_ascii_digit()) {
                tail.parse::<u64>().ok()
            } else {
                None
            }
        })
        .max()
        .unwrap_or(0);

    format!("{}{}", base, max_tail + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_user(name: Option<&str>) -> CreateDefaultUserDto {
        CreateDefaultUserDto {
            name: name.map(str::to_string),
            email: "john@example.com".to_string(),
            password: "qwerty12".to_string(),
            role_title: DefaultRoleTitle::DefaultTeacher,
        }
    }

    #[test]
    fn test_default_user_name_falls_back_to_role_title() {
        let dto = default_user(None);
        assert!(dto.validate().is_ok());
        assert_eq!(dto.into_new_user().name, "New Default Teacher");
    }

    #[test]
    fn test_default_user_name_rules() {
        assert!(default_user(Some("John Doe")).validate().is_ok());
        assert!(default_user(Some("john doe")).validate().is_err());
        assert!(default_user(Some("John")).validate().is_err());
    }

    #[test]
    fn test_default_role_title_wire_names() {
        let dto: CreateDefaultUserDto = serde_json::from_str(
            r#"{"email":"a@b.com","password":"qwerty12","roleTitle":"default parent"}"#,
        )
        .unwrap();
        assert_eq!(dto.role_title, DefaultRoleTitle::DefaultParent);

        let unknown = serde_json::from_str::<CreateDefaultUserDto>(
            r#"{"email":"a@b.com","password":"qwerty12","roleTitle":"admin"}"#,
        );
        assert!(unknown.is_err());
    }

    #[test]
    fn test_change_username_rules() {
        let ok = ChangeUsernameDto {
            new_username: "johndoejunior".to_string(),
        };
        assert!(ok.validate().is_ok());

        let spaced = ChangeUsernameDto {
            new_username: "john doe".to_string(),
        };
        assert!(spaced.validate().is_err());

        let short = ChangeUsernameDto {
            new_username: "jd".to_string(),
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_user_dto_hides_absent_password() {
        let now = Utc::now();
        let dto = UserDto::from(UserWithRole {
            id: Uuid::nil(),
            name: "John Doe".to_string(),
            username: "johndoe".to_string(),
            email: "john@example.com".to_string(),
            password: "$2b$12$hash".to_string(),
            avatar: None,
            role_id: Uuid::nil(),
            role_title: "default parent".to_string(),
            role_type: RoleType::Parent,
            status: Status::Active,
            created_at: now,
            updated_at: now,
        });

        let json = serde_json::to_value(&dto).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["roleType"], "Parent");

        let json = serde_json::to_value(dto.with_password("qwerty12")).unwrap();
        assert_eq!(json["password"], "qwerty12");
    }

    fn taken(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_username_base() {
        assert_eq!(username_base("John Doe Junior"), "johndoejunior");
        assert_eq!(username_base("New Default Teacher"), "newdefaultteacher");
    }

    #[test]
    fn test_next_username_free_base() {
        assert_eq!(next_username("annasmith", &[]), "annasmith");
        assert_eq!(
            next_username("annasmith", &taken(&["annasmithson"])),
            "annasmith"
        );
    }

    #[test]
    fn test_next_username_appends_largest_tail() {
        assert_eq!(next_username("annasmith", &taken(&["annasmith"])), "annasmith1");
        assert_eq!(
            next_username("annasmith", &taken(&["annasmith", "annasmith1", "annasmith7"])),
            "annasmith8"
        );
        assert_eq!(
            next_username("annasmith", &taken(&["annasmith2", "annasmithson"])),
            "annasmith3"
        );
    }

    #[test]
    fn test_next_username_counts_names_containing_base() {
        assert_eq!(next_username("johndoe", &taken(&["bigjohndoe"])), "johndoe1");
        assert_eq!(
            next_username("johndoe", &taken(&["realjohndoe4", "johndoe2"])),
            "johndoe5"
        );
        assert_eq!(next_username("johndoe", &taken(&["johndoes"])), "johndoe1");
        assert_eq!(next_username("johndoe", &taken(&[])), "johndoe");
    }

    #[test]
    fn test_next_username_never_returns_a_taken_name() {
        let existing = taken(&["johndoe", "johndoe1", "johndoe10", "johndoex"]);
        let generated = next_username("johndoe", &existing);
        assert_eq!(generated, "johndoe11");
        assert!(!existing.contains(&generated));
    }
}
