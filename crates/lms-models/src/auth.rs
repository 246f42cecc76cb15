//! Sign-up, sign-in and token refresh forms.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::users::{DefaultRoleTitle, NewUser};
use crate::validation::{PERSON_NAME, validate_password};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignUpDto {
    #[validate(
        length(min = 6, max = 40, message = "name must be 6-40 characters long"),
        regex(path = *PERSON_NAME, message = "name must be 2 or 3 words long, each word must start with a capital letter, name must not contain digits")
    )]
    #[schema(example = "John Doe Junior")]
    pub name: String,
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    #[schema(example = "qwerty12")]
    pub password: String,
    /// One of the built-in non-admin roles.
    pub role: DefaultRoleTitle,
}

impl SignUpDto {
    pub fn into_new_user(self) -> (NewUser, DefaultRoleTitle) {
        (
            NewUser {
                name: self.name,
                email: self.email,
                password: self.password,
            },
            self.role,
        )
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignInDto {
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    #[schema(example = "qwerty12")]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenDto {
    #[validate(length(min = 1, message = "refreshToken must not be empty"))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}
