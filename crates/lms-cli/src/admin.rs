use lms_core::hash_password;
use lms_models::users::{next_username, username_base};
use sqlx::PgPool;
use uuid::Uuid;

use crate::CliResult;
use crate::roles::role_id;

/// Creates an active user holding the `admin` role, with its admin record.
pub async fn create_admin(db: &PgPool, name: &str, email: &str, password: &str) -> CliResult<Uuid> {
    let role_id = role_id(db, "admin").await?;
    let hashed_password =
        hash_password(password).map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let mut tx = db.begin().await?;

    let email_taken =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&mut *tx)
            .await?;
    if email_taken {
        return Err(format!("User with email {} already exists", email).into());
    }

    let base = username_base(name);
    let taken = sqlx::query_scalar::<_, String>(
        "SELECT username FROM users WHERE username LIKE $1 || '%'",
    )
    .bind(&base)
    .fetch_all(&mut *tx)
    .await?;
    let username = next_username(&base, &taken);

    let user_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (name, username, email, password, role_id)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(name)
    .bind(&username)
    .bind(email)
    .bind(&hashed_password)
    .bind(role_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO admins (user_id) VALUES ($1)")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(user_id)
}
