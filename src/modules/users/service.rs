use axum::http::StatusCode;
use lms_core::file_storage::FileStorage;
use lms_core::{
    AppError, Paginated, PaginationParams, RoleType, Status, error_codes, hash_password,
    verify_password,
};
use lms_models::roles::UserRole;
use lms_models::students::StudentProfile;
use lms_models::teachers::TeacherProfile;
use lms_models::users::{
    AdminFilterParams, ChangePasswordDto, NewUser, USER_WITH_ROLE_COLUMNS, UserDto,
    UserFilterParams, UserWithRole, next_username, username_base,
};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::metrics::track_user_created;
use crate::modules::files::{FileService, UploadedFile};

/// Side record data that comes with a new user.
#[derive(Debug, Clone, Default)]
pub enum Profile {
    #[default]
    Empty,
    Teacher(TeacherProfile),
    Student(StudentProfile),
}

pub(crate) fn not_found(what: impl std::fmt::Display) -> AppError {
    AppError::coded(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, what)
}

fn already_exists(value: &str) -> AppError {
    AppError::coded(StatusCode::BAD_REQUEST, error_codes::USER_ALREADY_EXISTS, value)
}

/// Maps a unique violation on `users` to the matching client error.
pub(crate) fn user_write_error(e: sqlx::Error, email: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            warn!(user.email = %email, constraint = ?db_err.constraint(), "Unique violation writing user");
            return already_exists(email);
        }
    }
    error!(error = %e, "Database error writing user");
    AppError::database(e)
}

/// Optional changes to the `users` row, applied together.
#[derive(Debug, Default)]
pub struct AccountUpdate<'a> {
    pub name: Option<&'a str>,
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password: Option<&'a str>,
}

impl AccountUpdate<'_> {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
    }
}

pub struct UserService;

impl UserService {
    /// Generates a unique username from a display name.
    #[instrument(skip(conn))]
    pub async fn generate_username(conn: &mut PgConnection, name: &str) -> Result<String, AppError> {
        let base = username_base(name);

        let taken = sqlx::query_scalar::<_, String>(
            "SELECT username FROM users WHERE strpos(username, $1) > 0",
        )
        .bind(&base)
        .fetch_all(&mut *conn)
        .await
        .map_err(AppError::database)?;

        let username = next_username(&base, &taken);
        debug!(username = %username, candidates = taken.len(), "Username generated");
        Ok(username)
    }

    /// Fails with `user-already-exists` when any user holds `email`.
    pub async fn ensure_email_free(
        conn: &mut PgConnection,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<(), AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::UUID IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&mut *conn)
        .await
        .map_err(AppError::database)?;

        if exists {
            return Err(already_exists(email));
        }
        Ok(())
    }

    pub async fn ensure_username_free(
        conn: &mut PgConnection,
        username: &str,
        except: Uuid,
    ) -> Result<(), AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND id <> $2)",
        )
        .bind(username)
        .bind(except)
        .fetch_one(&mut *conn)
        .await
        .map_err(AppError::database)?;

        if exists {
            return Err(already_exists(username));
        }
        Ok(())
    }

    /// Inserts the row that matches the role type of a new user.
    async fn create_side_record(
        conn: &mut PgConnection,
        user_id: Uuid,
        role_type: RoleType,
        profile: &Profile,
    ) -> Result<(), sqlx::Error> {
        match role_type {
            RoleType::Admin => {
                sqlx::query("INSERT INTO admins (user_id) VALUES ($1)")
                    .bind(user_id)
                    .execute(&mut *conn)
                    .await?;
            }
            RoleType::Teacher => {
                let (institution, post) = match profile {
                    Profile::Teacher(p) => (p.institution.as_deref(), p.post.as_deref()),
                    _ => (None, None),
                };
                sqlx::query("INSERT INTO teachers (user_id, institution, post) VALUES ($1, $2, $3)")
                    .bind(user_id)
                    .bind(institution)
                    .bind(post)
                    .execute(&mut *conn)
                    .await?;
            }
            RoleType::Student => {
                let (institution, birth_date) = match profile {
                    Profile::Student(p) => (p.institution.as_deref(), p.birth_date),
                    _ => (None, None),
                };
                sqlx::query(
                    "INSERT INTO students (user_id, institution, birth_date) VALUES ($1, $2, $3)",
                )
                .bind(user_id)
                .bind(institution)
                .bind(birth_date)
                .execute(&mut *conn)
                .await?;
            }
            RoleType::Parent => {
                sqlx::query("INSERT INTO parents (user_id) VALUES ($1)")
                    .bind(user_id)
                    .execute(&mut *conn)
                    .await?;
            }
        }
        Ok(())
    }

    /// Creates a user of `role` together with its side record.
    ///
    /// Runs on the caller's connection so it can share a transaction with
    /// whatever the caller writes next.
    #[instrument(skip(conn, user, profile), fields(user.email = %user.email, role.title = %role.title, db.operation = "INSERT", db.table = "users"))]
    pub async fn insert_user(
        conn: &mut PgConnection,
        user: &NewUser,
        role: &UserRole,
        profile: &Profile,
    ) -> Result<Uuid, AppError> {
        Self::ensure_email_free(conn, &user.email, None).await?;

        let username = Self::generate_username(conn, &user.name).await?;
        let password_hash = hash_password(&user.password)?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (name, username, email, password, role_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .bind(&username)
        .bind(&user.email)
        .bind(&password_hash)
        .bind(role.id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| user_write_error(e, &user.email))?;

        Self::create_side_record(conn, user_id, role.role_type, profile)
            .await
            .map_err(|e| {
                error!(error = %e, user.id = %user_id, "Database error creating side record");
                AppError::database(e)
            })?;

        track_user_created(role.role_type);
        info!(user.id = %user_id, user.username = %username, role.role_type = %role.role_type, "User created");

        Ok(user_id)
    }

    /// Creates a non-admin user in its own transaction.
    pub async fn create_user(
        db: &PgPool,
        user: NewUser,
        role: &UserRole,
    ) -> Result<UserDto, AppError> {
        if role.role_type == RoleType::Admin {
            return Err(AppError::coded(
                StatusCode::BAD_REQUEST,
                error_codes::NOT_ADMIN_ROLE,
                &role.title,
            ));
        }

        let mut tx = db.begin().await.map_err(AppError::database)?;
        let user_id = Self::insert_user(&mut tx, &user, role, &Profile::Empty).await?;
        tx.commit().await.map_err(AppError::database)?;

        let created = Self::find_user(db, user_id).await?;
        Ok(UserDto::from(created).with_password(user.password))
    }

    /// Any user by id, whatever its status.
    pub async fn find_user(db: &PgPool, user_id: Uuid) -> Result<UserWithRole, AppError> {
        sqlx::query_as::<_, UserWithRole>(&format!(
            "SELECT {} FROM users u JOIN user_roles r ON r.id = u.role_id WHERE u.id = $1",
            USER_WITH_ROLE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| not_found(format!("user with id - {}", user_id)))
    }

    pub async fn find_active_user(db: &PgPool, user_id: Uuid) -> Result<UserWithRole, AppError> {
        let user = Self::find_user(db, user_id).await?;
        if user.status != Status::Active {
            return Err(not_found(format!("user with id - {}", user_id)));
        }
        Ok(user)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn get_active_users(
        db: &PgPool,
        filters: &UserFilterParams,
        pagination: &PaginationParams,
    ) -> Result<Paginated<UserDto>, AppError> {
        const WHERE: &str = r#"
            WHERE u.status = 'Active' AND r.type <> 'Admin'
              AND ($1::TEXT IS NULL OR u.name ILIKE '%' || $1 || '%' OR u.username ILIKE '%' || $1 || '%')
              AND ($2::TEXT IS NULL OR r.type = $2)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM users u JOIN user_roles r ON r.id = u.role_id {}",
            WHERE
        ))
        .bind(filters.query_line.as_deref())
        .bind(filters.role_type)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        let users = sqlx::query_as::<_, UserWithRole>(&format!(
            "SELECT {} FROM users u JOIN user_roles r ON r.id = u.role_id {} ORDER BY u.created_at DESC LIMIT $3 OFFSET $4",
            USER_WITH_ROLE_COLUMNS, WHERE
        ))
        .bind(filters.query_line.as_deref())
        .bind(filters.role_type)
        .bind(pagination.take())
        .bind(pagination.skip())
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        debug!(total = total, returned = users.len(), "Users fetched");

        Ok(Paginated::new(users, total, pagination).map(UserDto::from))
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn get_admins(
        db: &PgPool,
        filters: &AdminFilterParams,
        pagination: &PaginationParams,
    ) -> Result<Paginated<UserDto>, AppError> {
        const WHERE: &str = r#"
            WHERE r.type = 'Admin'
              AND ($1::TEXT IS NULL
                   OR u.name ILIKE '%' || $1 || '%'
                   OR u.username ILIKE '%' || $1 || '%'
                   OR u.email ILIKE '%' || $1 || '%')
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM users u JOIN user_roles r ON r.id = u.role_id {}",
            WHERE
        ))
        .bind(filters.query_line.as_deref())
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        let admins = sqlx::query_as::<_, UserWithRole>(&format!(
            "SELECT {} FROM users u JOIN user_roles r ON r.id = u.role_id {} ORDER BY u.created_at DESC LIMIT $2 OFFSET $3",
            USER_WITH_ROLE_COLUMNS, WHERE
        ))
        .bind(filters.query_line.as_deref())
        .bind(pagination.take())
        .bind(pagination.skip())
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        Ok(Paginated::new(admins, total, pagination).map(UserDto::from))
    }

    #[instrument(skip(db), fields(db.operation = "UPDATE", db.table = "users"))]
    pub async fn change_username(
        db: &PgPool,
        user_id: Uuid,
        new_username: &str,
    ) -> Result<UserDto, AppError> {
        Self::find_active_user(db, user_id).await?;

        let mut conn = db.acquire().await.map_err(AppError::database)?;
        Self::ensure_username_free(&mut conn, new_username, user_id).await?;

        sqlx::query("UPDATE users SET username = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(new_username)
            .execute(&mut *conn)
            .await
            .map_err(|e| user_write_error(e, new_username))?;

        info!(user.id = %user_id, "Username changed");
        Ok(Self::find_user(db, user_id).await?.into())
    }

    #[instrument(skip(db), fields(db.operation = "UPDATE", db.table = "users"))]
    pub async fn change_email(
        db: &PgPool,
        user_id: Uuid,
        new_email: &str,
    ) -> Result<UserDto, AppError> {
        Self::find_active_user(db, user_id).await?;

        let mut conn = db.acquire().await.map_err(AppError::database)?;
        Self::ensure_email_free(&mut conn, new_email, Some(user_id)).await?;

        sqlx::query("UPDATE users SET email = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(new_email)
            .execute(&mut *conn)
            .await
            .map_err(|e| user_write_error(e, new_email))?;

        info!(user.id = %user_id, "Email changed");
        Ok(Self::find_user(db, user_id).await?.into())
    }

    /// Replaces the password after checking the old one.
    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "users"))]
    pub async fn change_password(
        db: &PgPool,
        user_id: Uuid,
        dto: ChangePasswordDto,
    ) -> Result<UserDto, AppError> {
        let user = Self::find_active_user(db, user_id).await?;

        if !verify_password(&dto.old_password, &user.password)? {
            warn!(user.id = %user_id, "Password change with a wrong old password");
            return Err(AppError::unauthorized(error_codes::INVALID_PASSWORD));
        }

        let password_hash = hash_password(&dto.new_password)?;
        sqlx::query("UPDATE users SET password = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(&password_hash)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        info!(user.id = %user_id, "Password changed");
        Ok(UserDto::from(Self::find_user(db, user_id).await?).with_password(dto.new_password))
    }

    /// Applies `update` on the caller's connection after checking that a new
    /// username or email is not held by another user.
    #[instrument(skip(conn, update), fields(db.operation = "UPDATE", db.table = "users"))]
    pub async fn update_account(
        conn: &mut PgConnection,
        user_id: Uuid,
        update: &AccountUpdate<'_>,
    ) -> Result<(), AppError> {
        if update.is_empty() {
            return Ok(());
        }
        if let Some(username) = update.username {
            Self::ensure_username_free(conn, username, user_id).await?;
        }
        if let Some(email) = update.email {
            Self::ensure_email_free(conn, email, Some(user_id)).await?;
        }
        let password_hash = update.password.map(hash_password).transpose()?;

        sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                username = COALESCE($3, username),
                email = COALESCE($4, email),
                password = COALESCE($5, password),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(update.name)
        .bind(update.username)
        .bind(update.email)
        .bind(password_hash.as_deref())
        .execute(&mut *conn)
        .await
        .map_err(|e| user_write_error(e, update.email.or(update.username).unwrap_or_default()))?;

        debug!(user.id = %user_id, "Account fields updated");
        Ok(())
    }

    /// Stores a new avatar and drops the previous file.
    #[instrument(skip(db, storage, avatar), fields(db.operation = "UPDATE", db.table = "users"))]
    pub async fn change_avatar<S: FileStorage>(
        db: &PgPool,
        storage: &S,
        user_id: Uuid,
        avatar: &UploadedFile,
    ) -> Result<UserDto, AppError> {
        let user = Self::find_active_user(db, user_id).await?;

        let key = FileService::replace(storage, "avatar", avatar, user.avatar.as_deref()).await?;

        sqlx::query("UPDATE users SET avatar = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(&key)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        info!(user.id = %user_id, avatar = %key, "Avatar changed");
        Ok(Self::find_user(db, user_id).await?.into())
    }

    #[instrument(skip(db), fields(db.operation = "UPDATE", db.table = "users"))]
    pub async fn set_status(db: &PgPool, user_id: Uuid, status: Status) -> Result<UserDto, AppError> {
        let user = sqlx::query_as::<_, UserWithRole>(&format!(
            r#"
            WITH u AS (
                UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *
            )
            SELECT {} FROM u JOIN user_roles r ON r.id = u.role_id
            "#,
            USER_WITH_ROLE_COLUMNS
        ))
        .bind(user_id)
        .bind(status)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| not_found("user"))?;

        info!(user.id = %user_id, status = %status, "User status changed");
        Ok(user.into())
    }
}
