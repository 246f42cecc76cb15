//! Token issuing and verification.
//!
//! Every successful sign-up, sign-in and refresh returns a [`TokenPair`]:
//!
//! - **Access token**: short-lived bearer token for guarded endpoints
//! - **Refresh token**: long-lived token exchanged for a new pair
//!
//! Expiry is checked only when [`JwtConfig::validate_exp`] is set.
//!
//! # Example
//!
//! ```ignore
//! use lms_auth::{issue_tokens, verify_access_token};
//!
//! let tokens = issue_tokens(identity.token_subject(), &state.config.jwt)?;
//! let claims = verify_access_token(&tokens.access_token, &state.config.jwt)?;
//! ```

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use lms_config::JwtConfig;
use lms_core::{AppError, Permission, RoleType, error_codes};

use crate::claims::{AccessClaims, RefreshClaims};

/// The fields of a user a token is issued for.
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub role_id: Uuid,
    pub role_type: RoleType,
    pub permissions: &'a [Permission],
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn timestamps(lifetime_secs: i64) -> (usize, usize) {
    let now = Utc::now().timestamp();
    let exp = (now + lifetime_secs).max(0);
    (now as usize, exp as usize)
}

fn validation(jwt_config: &JwtConfig) -> Validation {
    let mut validation = Validation::default();
    validation.validate_exp = jwt_config.validate_exp;
    if !jwt_config.validate_exp {
        validation.required_spec_claims.clear();
    }
    validation
}

pub fn create_access_token(
    subject: TokenSubject<'_>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let (iat, exp) = timestamps(jwt_config.access_token_expiry);

    let claims = AccessClaims {
        sub: subject.id,
        username: subject.username.to_string(),
        email: subject.email.to_string(),
        role_id: subject.role_id,
        role_type: subject.role_type,
        permissions: subject.permissions.to_vec(),
        exp,
        iat,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

pub fn create_refresh_token(user_id: Uuid, jwt_config: &JwtConfig) -> Result<String, AppError> {
    let (iat, exp) = timestamps(jwt_config.refresh_token_expiry);

    let claims = RefreshClaims {
        sub: user_id,
        exp,
        iat,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create refresh token: {}", e)))
}

/// Issues a fresh access/refresh pair for `subject`.
pub fn issue_tokens(subject: TokenSubject<'_>, jwt_config: &JwtConfig) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access_token: create_access_token(subject, jwt_config)?,
        refresh_token: create_refresh_token(subject.id, jwt_config)?,
    })
}

/// Verifies a bearer token.
///
/// A bad signature or malformed token yields `errors.not-authorized`; an
/// expired one yields `errors.token-expired`. Both are 401.
pub fn verify_access_token(token: &str, jwt_config: &JwtConfig) -> Result<AccessClaims, AppError> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation(jwt_config),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::unauthorized(error_codes::TOKEN_EXPIRED),
        _ => AppError::unauthorized(error_codes::NOT_AUTHORIZED),
    })
}

pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshClaims, AppError> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation(jwt_config),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(error_codes::INVALID_REFRESH))
}
