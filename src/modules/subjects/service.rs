use axum::http::StatusCode;
use lms_core::{AppError, Paginated, PaginationParams, Status, error_codes};
use lms_models::subjects::{CreateSubjectDto, Subject, SubjectFilterParams, UpdateSubjectDto};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::modules::users::service::not_found;

const SUBJECT_COLUMNS: &str = "id, title, status, created_at, updated_at";

fn title_taken(e: sqlx::Error, title: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            warn!(subject.title = %title, "Subject title already taken");
            return AppError::coded(StatusCode::BAD_REQUEST, error_codes::FIELD_UNIQUE, "title");
        }
    }
    error!(error = %e, subject.title = %title, "Database error writing subject");
    AppError::database(e)
}

/// Titles from `requested` that are absent from `found`, in request order.
pub fn missing_titles<'a>(requested: &'a [String], found: &[String]) -> Vec<&'a str> {
    requested
        .iter()
        .filter(|title| !found.contains(title))
        .map(String::as_str)
        .collect()
}

pub struct SubjectService;

impl SubjectService {
    #[instrument(skip(db, dto), fields(subject.title = %dto.title, db.operation = "INSERT", db.table = "subjects"))]
    pub async fn create_subject(db: &PgPool, dto: CreateSubjectDto) -> Result<Subject, AppError> {
        let subject = sqlx::query_as::<_, Subject>(&format!(
            "INSERT INTO subjects (title) VALUES ($1) RETURNING {}",
            SUBJECT_COLUMNS
        ))
        .bind(&dto.title)
        .fetch_one(db)
        .await
        .map_err(|e| title_taken(e, &dto.title))?;

        info!(subject.id = %subject.id, "Subject created");
        Ok(subject)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "subjects"))]
    pub async fn get_subjects(
        db: &PgPool,
        filters: &SubjectFilterParams,
        pagination: &PaginationParams,
    ) -> Result<Paginated<Subject>, AppError> {
        const WHERE: &str = r#"
            WHERE status = 'Active'
              AND ($1::TEXT IS NULL OR title ILIKE '%' || $1 || '%')
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM subjects {}", WHERE))
            .bind(filters.query_line.as_deref())
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        let subjects = sqlx::query_as::<_, Subject>(&format!(
            "SELECT {} FROM subjects {} ORDER BY title ASC LIMIT $2 OFFSET $3",
            SUBJECT_COLUMNS, WHERE
        ))
        .bind(filters.query_line.as_deref())
        .bind(pagination.take())
        .bind(pagination.skip())
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        debug!(total = total, returned = subjects.len(), "Subjects fetched");
        Ok(Paginated::new(subjects, total, pagination))
    }

    pub async fn get_subject(db: &PgPool, subject_id: Uuid) -> Result<Subject, AppError> {
        sqlx::query_as::<_, Subject>(&format!(
            "SELECT {} FROM subjects WHERE id = $1 AND status = 'Active'",
            SUBJECT_COLUMNS
        ))
        .bind(subject_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| not_found(format!("subject with id - {}", subject_id)))
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "subjects"))]
    pub async fn update_subject(
        db: &PgPool,
        subject_id: Uuid,
        dto: UpdateSubjectDto,
    ) -> Result<Subject, AppError> {
        let subject = sqlx::query_as::<_, Subject>(&format!(
            "UPDATE subjects SET title = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            SUBJECT_COLUMNS
        ))
        .bind(subject_id)
        .bind(&dto.title)
        .fetch_optional(db)
        .await
        .map_err(|e| title_taken(e, &dto.title))?
        .ok_or_else(|| not_found(format!("subject with id - {}", subject_id)))?;

        info!(subject.id = %subject.id, subject.title = %subject.title, "Subject updated");
        Ok(subject)
    }

    #[instrument(skip(db), fields(db.operation = "UPDATE", db.table = "subjects"))]
    pub async fn set_status(db: &PgPool, subject_id: Uuid, status: Status) -> Result<Subject, AppError> {
        let subject = sqlx::query_as::<_, Subject>(&format!(
            "UPDATE subjects SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            SUBJECT_COLUMNS
        ))
        .bind(subject_id)
        .bind(status)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| not_found(format!("subject with id - {}", subject_id)))?;

        info!(subject.id = %subject_id, status = %status, "Subject status changed");
        Ok(subject)
    }

    /// Subjects with the given ids, whatever their status.
    pub async fn find_many(db: &PgPool, ids: &[Uuid]) -> Result<Vec<Subject>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Subject>(&format!(
            "SELECT {} FROM subjects WHERE id = ANY($1)",
            SUBJECT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(db)
        .await
        .map_err(AppError::database)
    }

    /// Ids of the active subjects titled `titles`.
    ///
    /// Fails with a 404 naming every title that has no active subject.
    pub async fn resolve_titles(
        conn: &mut PgConnection,
        titles: &[String],
    ) -> Result<Vec<Uuid>, AppError> {
        #[derive(FromRow)]
        struct IdTitle {
            id: Uuid,
            title: String,
        }

        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, IdTitle>(
            "SELECT id, title FROM subjects WHERE title = ANY($1) AND status = 'Active'",
        )
        .bind(titles)
        .fetch_all(&mut *conn)
        .await
        .map_err(AppError::database)?;

        let found: Vec<String> = rows.iter().map(|row| row.title.clone()).collect();
        let missing = missing_titles(titles, &found);
        if !missing.is_empty() {
            return Err(not_found(format!("subjects {}", missing.join(", "))));
        }

        Ok(rows.into_iter().map(|row| row.id).collect())
    }
}
