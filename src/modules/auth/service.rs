use lms_auth::{TokenPair, TokenSubject, create_access_token, issue_tokens, verify_refresh_token};
use lms_config::JwtConfig;
use lms_core::{AppError, Permission, RoleType, error_codes, verify_password};
use lms_models::auth::{AccessTokenResponse, RefreshTokenDto, SignInDto, SignUpDto};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::metrics::{track_sign_in_failure, track_sign_in_success, track_tokens_issued};
use crate::modules::user_roles::service::UserRoleService;
use crate::modules::users::service::{Profile, UserService, not_found};

/// A user with whatever role row it still points at.
#[derive(Debug, FromRow)]
struct CredentialsRow {
    id: Uuid,
    username: String,
    email: String,
    password: String,
    role_id: Uuid,
    role_type: Option<RoleType>,
    permissions: Option<Vec<Permission>>,
}

impl CredentialsRow {
    fn subject(&self) -> Option<TokenSubject<'_>> {
        let role_type = self.role_type?;
        let permissions = self.permissions.as_deref()?;
        Some(TokenSubject {
            id: self.id,
            username: &self.username,
            email: &self.email,
            role_id: self.role_id,
            role_type,
            permissions,
        })
    }
}

const CREDENTIALS_QUERY: &str = r#"
    SELECT u.id, u.username, u.email, u.password, u.role_id,
           r.type AS role_type, r.permissions
    FROM users u
    LEFT JOIN user_roles r ON r.id = u.role_id
"#;

pub struct AuthService;

impl AuthService {
    async fn credentials_by_email(
        db: &PgPool,
        email: &str,
    ) -> Result<Option<CredentialsRow>, AppError> {
        sqlx::query_as::<_, CredentialsRow>(&format!("{} WHERE u.email = $1", CREDENTIALS_QUERY))
            .bind(email)
            .fetch_optional(db)
            .await
            .map_err(AppError::database)
    }

    async fn credentials_by_id(
        db: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<CredentialsRow>, AppError> {
        sqlx::query_as::<_, CredentialsRow>(&format!("{} WHERE u.id = $1", CREDENTIALS_QUERY))
            .bind(user_id)
            .fetch_optional(db)
            .await
            .map_err(AppError::database)
    }

    /// Registers a user under one of the default roles and signs it in.
    #[instrument(skip(db, dto, jwt_config), fields(user.email = %dto.email, db.operation = "INSERT", db.table = "users"))]
    pub async fn sign_up(
        db: &PgPool,
        dto: SignUpDto,
        jwt_config: &JwtConfig,
    ) -> Result<TokenPair, AppError> {
        let (user, role_title) = dto.into_new_user();
        let role = UserRoleService::find_by_title(db, role_title.as_str()).await?;

        let mut tx = db.begin().await.map_err(AppError::database)?;
        let user_id = UserService::insert_user(&mut tx, &user, &role, &Profile::Empty).await?;
        tx.commit().await.map_err(AppError::database)?;

        let created = UserService::find_user(db, user_id).await?;
        let tokens = issue_tokens(
            TokenSubject {
                id: created.id,
                username: &created.username,
                email: &created.email,
                role_id: role.id,
                role_type: role.role_type,
                permissions: &role.permissions,
            },
            jwt_config,
        )?;

        track_tokens_issued();
        info!(user.id = %user_id, role.title = %role.title, "User signed up");
        Ok(tokens)
    }

    #[instrument(skip(db, dto, jwt_config), fields(user.email = %dto.email))]
    pub async fn sign_in(
        db: &PgPool,
        dto: SignInDto,
        jwt_config: &JwtConfig,
    ) -> Result<TokenPair, AppError> {
        let Some(user) = Self::credentials_by_email(db, &dto.email).await? else {
            warn!(user.email = %dto.email, "Sign-in for unknown email");
            track_sign_in_failure("unknown_email");
            return Err(not_found(format!("user with email {}", dto.email)));
        };

        let Some(subject) = user.subject() else {
            track_sign_in_failure("missing_role");
            return Err(not_found("user role"));
        };

        if !verify_password(&dto.password, &user.password)? {
            warn!(user.id = %user.id, "Sign-in with wrong password");
            track_sign_in_failure("invalid_password");
            return Err(AppError::unauthorized(error_codes::INVALID_PASSWORD));
        }

        let tokens = issue_tokens(subject, jwt_config)?;

        track_sign_in_success(subject.role_type);
        track_tokens_issued();
        info!(user.id = %user.id, "User signed in");
        Ok(tokens)
    }

    /// Exchanges a refresh token for an access token built from the user's
    /// current role, so permission edits since sign-in are reflected.
    #[instrument(skip(db, dto, jwt_config))]
    pub async fn refresh_access_token(
        db: &PgPool,
        dto: RefreshTokenDto,
        jwt_config: &JwtConfig,
    ) -> Result<AccessTokenResponse, AppError> {
        let claims = verify_refresh_token(&dto.refresh_token, jwt_config)?;

        // a deleted user or role makes the refresh token itself invalid
        let user = Self::credentials_by_id(db, claims.sub)
            .await?
            .ok_or_else(|| AppError::unauthorized(error_codes::INVALID_REFRESH))?;

        let subject = user
            .subject()
            .ok_or_else(|| AppError::unauthorized(error_codes::INVALID_REFRESH))?;

        let access_token = create_access_token(subject, jwt_config)?;

        track_tokens_issued();
        debug!(user.id = %user.id, "Access token refreshed");
        Ok(AccessTokenResponse { access_token })
    }
}
