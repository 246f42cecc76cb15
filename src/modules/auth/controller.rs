use axum::{Json, extract::State, http::StatusCode};
use lms_auth::TokenPair;
use lms_core::{AppError, ErrorResponse};
use lms_models::auth::{AccessTokenResponse, RefreshTokenDto, SignInDto, SignUpDto};
use tracing::instrument;

use crate::modules::auth::service::AuthService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Register under a default role and receive a token pair
#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    request_body = SignUpDto,
    responses(
        (status = 201, description = "User registered", body = TokenPair),
        (status = 400, description = "Invalid form or email taken", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 429, description = "Too many requests")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn sign_up(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<SignUpDto>,
) -> Result<(StatusCode, Json<TokenPair>), AppError> {
    let tokens = AuthService::sign_up(&state.db, dto, &state.config.jwt).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

/// Sign in with email and password
#[utoipa::path(
    put,
    path = "/api/auth/sign-in",
    request_body = SignInDto,
    responses(
        (status = 200, description = "Signed in", body = TokenPair),
        (status = 400, description = "Invalid form", body = ErrorResponse),
        (status = 401, description = "Wrong password", body = ErrorResponse),
        (status = 404, description = "No user with this email", body = ErrorResponse),
        (status = 429, description = "Too many requests")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<SignInDto>,
) -> Result<Json<TokenPair>, AppError> {
    let tokens = AuthService::sign_in(&state.db, dto, &state.config.jwt).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    patch,
    path = "/api/auth/get-access-token",
    request_body = RefreshTokenDto,
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Invalid refresh token or user gone", body = ErrorResponse),
        (status = 429, description = "Too many requests")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn get_access_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenDto>,
) -> Result<Json<AccessTokenResponse>, AppError> {
    let response = AuthService::refresh_access_token(&state.db, dto, &state.config.jwt).await?;
    Ok(Json(response))
}
