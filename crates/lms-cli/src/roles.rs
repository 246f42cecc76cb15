//! Built-in roles every deployment starts with.

use lms_core::{Permission, RoleType};
use sqlx::PgPool;

use crate::CliResult;

pub struct DefaultRole {
    pub title: &'static str,
    pub role_type: RoleType,
    pub permissions: &'static [Permission],
}

pub const DEFAULT_ROLES: &[DefaultRole] = &[
    DefaultRole {
        title: "admin",
        role_type: RoleType::Admin,
        permissions: &[Permission::All],
    },
    DefaultRole {
        title: "default teacher",
        role_type: RoleType::Teacher,
        permissions: &[
            Permission::ManageMyProfile,
            Permission::ConnectToStudents,
            Permission::CreateMyTests,
        ],
    },
    DefaultRole {
        title: "default student",
        role_type: RoleType::Student,
        permissions: &[Permission::ManageMyProfile, Permission::ConnectToTeachers],
    },
    DefaultRole {
        title: "default parent",
        role_type: RoleType::Parent,
        permissions: &[Permission::ManageMyProfile],
    },
];

/// Creates the default roles that are missing. Existing roles, including
/// edited or archived ones, are left as they are.
pub async fn seed_roles(db: &PgPool) -> CliResult<u64> {
    let mut created = 0;

    for role in DEFAULT_ROLES {
        created += sqlx::query(
            "INSERT INTO user_roles (title, type, permissions) VALUES ($1, $2, $3) ON CONFLICT (title) DO NOTHING",
        )
        .bind(role.title)
        .bind(role.role_type)
        .bind(role.permissions)
        .execute(db)
        .await?
        .rows_affected();
    }

    Ok(created)
}

/// Id of the active role with `title`.
pub async fn role_id(db: &PgPool, title: &str) -> CliResult<uuid::Uuid> {
    sqlx::query_scalar::<_, uuid::Uuid>(
        "SELECT id FROM user_roles WHERE title = $1 AND status = 'Active'",
    )
    .bind(title)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| format!("role '{}' not found, run `seed-roles` first", title).into())
}
