//! Request extractors that reject with the API's JSON error body.
//!
//! - [`ValidatedJson`]: JSON body checked with [`validator::Validate`]
//! - [`QueryParams`]: query string
//! - [`IdPath`]: a single `{id}` path segment holding a UUID
//!
//! Every rejection is a 400 `errors.invalid-form: ...`, except a malformed id
//! which is a 400 `errors.not-id-parameter: id`.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, rejection::JsonRejection},
    http::{StatusCode, request::Parts},
};
use lms_core::{AppError, error_codes};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

fn collect_messages(errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(errors) => {
                out.extend(errors.iter().map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, out),
            ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    collect_messages(inner, out);
                }
            }
        }
    }
}

fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, &mut messages);
    messages.sort();
    messages.dedup();
    messages.join(", ")
}

/// 400 listing every failed rule.
pub fn invalid_form(errors: &ValidationErrors) -> AppError {
    AppError::coded(
        StatusCode::BAD_REQUEST,
        error_codes::INVALID_FORM,
        format_errors(errors),
    )
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    let detail = match &rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "missing 'Content-Type: application/json' header".to_string()
        }
        _ => {
            let body = rejection.body_text();
            match body.split("missing field `").nth(1) {
                Some(rest) => {
                    let field = rest.split('`').next().unwrap_or("unknown");
                    format!("{} is required", field)
                }
                None => body,
            }
        }
    };

    AppError::coded(StatusCode::BAD_REQUEST, error_codes::INVALID_FORM, detail)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        value.validate().map_err(|errors| invalid_form(&errors))?;

        Ok(ValidatedJson(value))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                AppError::coded(
                    StatusCode::BAD_REQUEST,
                    error_codes::INVALID_FORM,
                    rejection.body_text(),
                )
            })?;

        Ok(QueryParams(value))
    }
}

/// The `{id}` of the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPath(pub Uuid);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                AppError::coded(StatusCode::BAD_REQUEST, error_codes::NOT_ID_PARAMETER, "id")
            })?;

        Ok(IdPath(id))
    }
}
