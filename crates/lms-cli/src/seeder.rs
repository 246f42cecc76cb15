//! Fake teachers, students and subjects for development databases.
//!
//! Seeded accounts use `@example.com` addresses so [`clear_seeded`] can find
//! them again. Every seeded account shares one password.

use std::time::Instant;

use fake::Fake;
use fake::faker::lorem::en::Word;
use fake::faker::name::en::{FirstName, LastName};
use lms_core::hash_password;
use lms_models::users::username_base;
use rayon::prelude::*;
use sqlx::PgPool;
use uuid::Uuid;

use crate::CliResult;
use crate::roles::role_id;

pub const SEED_PASSWORD: &str = "password123";

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub teachers: usize,
    pub students: usize,
    pub subjects: usize,
    /// Subjects attached to each seeded teacher.
    pub subjects_per_teacher: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            teachers: 10,
            students: 50,
            subjects: 8,
            subjects_per_teacher: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserSeed {
    pub name: String,
    pub username: String,
    pub email: String,
}

/// Generates `count` users whose usernames and emails are unique within a run
/// for the given `kind`.
pub fn generate_users(kind: &str, count: usize) -> Vec<UserSeed> {
    let run = Uuid::new_v4().simple().to_string();
    let run = &run[..6];

    (0..count)
        .into_par_iter()
        .map(|index| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let name = format!("{} {}", first_name, last_name);
            let tag = format!("{}{}{}", kind, run, index);

            UserSeed {
                username: format!("{}{}", username_base(&name), tag),
                email: format!(
                    "{}.{}+{}@example.com",
                    first_name.to_lowercase(),
                    last_name.to_lowercase(),
                    tag
                ),
                name,
            }
        })
        .collect()
}

/// Lowercase, distinct subject titles.
pub fn generate_subject_titles(count: usize) -> Vec<String> {
    let mut titles: Vec<String> = Vec::with_capacity(count);
    let mut attempts = 0;
    while titles.len() < count && attempts < count * 20 {
        let word: String = Word().fake();
        let title = word.to_lowercase();
        if !titles.contains(&title) {
            titles.push(title);
        }
        attempts += 1;
    }
    titles
}

async fn insert_users(
    db: &PgPool,
    users: &[UserSeed],
    role_id: Uuid,
    side_table: &str,
    password_hash: &str,
) -> CliResult<Vec<Uuid>> {
    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    let usernames: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
    let emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();

    let mut tx = db.begin().await?;

    let ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO users (name, username, email, password, role_id)
        SELECT name, username, email, $4, $5
        FROM UNNEST($1::TEXT[], $2::TEXT[], $3::TEXT[]) AS u(name, username, email)
        ON CONFLICT DO NOTHING
        RETURNING id
        "#,
    )
    .bind(&names)
    .bind(&usernames)
    .bind(&emails)
    .bind(password_hash)
    .bind(role_id)
    .fetch_all(&mut *tx)
    .await?;

    sqlx::query(&format!(
        "INSERT INTO {} (user_id) SELECT UNNEST($1::UUID[])",
        side_table
    ))
    .bind(&ids)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(ids)
}

pub async fn seed_subjects(db: &PgPool, count: usize) -> CliResult<u64> {
    let titles = generate_subject_titles(count);
    let created = sqlx::query(
        "INSERT INTO subjects (title) SELECT UNNEST($1::TEXT[]) ON CONFLICT (title) DO NOTHING",
    )
    .bind(&titles)
    .execute(db)
    .await?
    .rows_affected();
    Ok(created)
}

/// Gives each teacher `per_teacher` random active subjects.
async fn assign_subjects(db: &PgPool, teacher_ids: &[Uuid], per_teacher: usize) -> CliResult<u64> {
    let assigned = sqlx::query(
        r#"
        INSERT INTO teacher_subjects (teacher_id, subject_id)
        SELECT t.id, s.id
        FROM UNNEST($1::UUID[]) AS t(id)
        CROSS JOIN LATERAL (
            SELECT id FROM subjects
            WHERE status = 'Active' AND t.id IS NOT NULL
            ORDER BY random()
            LIMIT $2
        ) s
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(teacher_ids)
    .bind(per_teacher as i64)
    .execute(db)
    .await?
    .rows_affected();
    Ok(assigned)
}

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> CliResult<()> {
    let start_time = Instant::now();
    println!("🌱 Seeding database...");

    let password_hash =
        hash_password(SEED_PASSWORD).map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let subjects = seed_subjects(db, config.subjects).await?;
    println!("   ✓ Created {} subjects", subjects);

    let teacher_role = role_id(db, "default teacher").await?;
    let teachers = generate_users("teacher", config.teachers);
    let teacher_ids = insert_users(db, &teachers, teacher_role, "teachers", &password_hash).await?;
    println!("   ✓ Created {} teachers", teacher_ids.len());

    let assigned = assign_subjects(db, &teacher_ids, config.subjects_per_teacher).await?;
    println!("   ✓ Assigned {} teacher subjects", assigned);

    let student_role = role_id(db, "default student").await?;
    let students = generate_users("student", config.students);
    let student_ids = insert_users(db, &students, student_role, "students", &password_hash).await?;
    println!("   ✓ Created {} students", student_ids.len());

    println!(
        "✅ Seeding finished in {:?} (password: {})",
        start_time.elapsed(),
        SEED_PASSWORD
    );
    Ok(())
}

/// Deletes every `@example.com` account. Side records, connections and
/// subject links go with them.
pub async fn clear_seeded(db: &PgPool) -> CliResult<u64> {
    let deleted = sqlx::query("DELETE FROM users WHERE email LIKE '%@example.com'")
        .execute(db)
        .await?
        .rows_affected();
    Ok(deleted)
}
