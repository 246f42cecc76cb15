use axum::http::StatusCode;
use lms_core::{AppError, Paginated, PaginationParams, RoleType, error_codes};
use lms_models::roles::UserRole;
use lms_models::teachers::{TeacherDto, TeacherFilterParams, TeacherProfile, TeacherRow, UpdateTeacherDto};
use lms_models::users::{NewUser, USER_WITH_ROLE_COLUMNS};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::modules::subjects::service::SubjectService;
use crate::modules::users::service::{AccountUpdate, Profile, UserService, not_found};

const TEACHER_FROM: &str = r#"
    FROM teachers t
    JOIN users u ON u.id = t.user_id
    JOIN user_roles r ON r.id = u.role_id
"#;

const TEACHER_SUBJECTS: &str = r#"
    COALESCE((
        SELECT array_agg(sub.title ORDER BY sub.title)
        FROM teacher_subjects ts
        JOIN subjects sub ON sub.id = ts.subject_id
        WHERE ts.teacher_id = t.user_id
    ), '{}') AS subjects
"#;

pub struct TeacherService;

impl TeacherService {
    fn select() -> String {
        format!(
            "SELECT {}, t.institution, t.post, {} {}",
            USER_WITH_ROLE_COLUMNS, TEACHER_SUBJECTS, TEACHER_FROM
        )
    }

    async fn replace_subjects(
        conn: &mut PgConnection,
        teacher_id: Uuid,
        subject_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM teacher_subjects WHERE teacher_id = $1")
            .bind(teacher_id)
            .execute(&mut *conn)
            .await
            .map_err(AppError::database)?;

        sqlx::query(
            "INSERT INTO teacher_subjects (teacher_id, subject_id) SELECT $1, UNNEST($2::UUID[])",
        )
        .bind(teacher_id)
        .bind(subject_ids)
        .execute(&mut *conn)
        .await
        .map_err(AppError::database)?;

        Ok(())
    }

    /// Creates a teacher under `role`, which must be of type Teacher, together
    /// with the subjects it teaches.
    #[instrument(skip(db, user, profile), fields(user.email = %user.email, role.title = %role.title, db.operation = "INSERT", db.table = "teachers"))]
    pub async fn create_teacher(
        db: &PgPool,
        user: NewUser,
        profile: TeacherProfile,
        role: &UserRole,
    ) -> Result<TeacherDto, AppError> {
        if role.role_type != RoleType::Teacher {
            return Err(AppError::coded(
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_ROLE,
                &role.title,
            ));
        }

        let mut tx = db.begin().await.map_err(AppError::database)?;

        let subject_ids = SubjectService::resolve_titles(&mut tx, &profile.subjects).await?;
        let user_id =
            UserService::insert_user(&mut tx, &user, role, &Profile::Teacher(profile)).await?;
        if !subject_ids.is_empty() {
            Self::replace_subjects(&mut tx, user_id, &subject_ids).await?;
        }

        tx.commit().await.map_err(AppError::database)?;

        let mut teacher = TeacherDto::from(Self::find_teacher(db, user_id).await?);
        teacher.user = teacher.user.with_password(user.password);
        info!(teacher.id = %user_id, subjects = subject_ids.len(), "Teacher created");
        Ok(teacher)
    }

    async fn find_teacher(db: &PgPool, teacher_id: Uuid) -> Result<TeacherRow, AppError> {
        sqlx::query_as::<_, TeacherRow>(&format!("{} WHERE u.id = $1", Self::select()))
            .bind(teacher_id)
            .fetch_optional(db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| not_found(format!("teacher with id - {}", teacher_id)))
    }

    pub async fn get_teacher(db: &PgPool, teacher_id: Uuid) -> Result<TeacherDto, AppError> {
        sqlx::query_as::<_, TeacherRow>(&format!(
            "{} WHERE u.id = $1 AND u.status = 'Active'",
            Self::select()
        ))
        .bind(teacher_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .map(TeacherDto::from)
        .ok_or_else(|| not_found(format!("teacher with id - {}", teacher_id)))
    }

    /// Teachers with the given ids, whatever their status.
    pub async fn find_many(db: &PgPool, ids: &[Uuid]) -> Result<Vec<TeacherDto>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, TeacherRow>(&format!("{} WHERE u.id = ANY($1)", Self::select()))
            .bind(ids)
            .fetch_all(db)
            .await
            .map_err(AppError::database)?;
        Ok(rows.into_iter().map(TeacherDto::from).collect())
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "teachers"))]
    pub async fn get_teachers(
        db: &PgPool,
        filters: &TeacherFilterParams,
        pagination: &PaginationParams,
    ) -> Result<Paginated<TeacherDto>, AppError> {
        // $2 lists subjects a teacher must teach all of
        const WHERE: &str = r#"
            WHERE u.status = 'Active'
              AND ($1::TEXT IS NULL
                   OR u.name ILIKE '%' || $1 || '%'
                   OR u.username ILIKE '%' || $1 || '%'
                   OR t.institution ILIKE '%' || $1 || '%'
                   OR t.post ILIKE '%' || $1 || '%')
              AND NOT EXISTS (
                  SELECT 1 FROM UNNEST($2::TEXT[]) AS wanted(title)
                  WHERE wanted.title NOT IN (
                      SELECT sub.title
                      FROM teacher_subjects ts
                      JOIN subjects sub ON sub.id = ts.subject_id
                      WHERE ts.teacher_id = t.user_id
                  )
              )
        "#;

        let subjects = filters.subject_titles();

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) {} {}", TEACHER_FROM, WHERE))
            .bind(filters.query_line.as_deref())
            .bind(&subjects)
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        let teachers = sqlx::query_as::<_, TeacherRow>(&format!(
            "{} {} ORDER BY u.created_at DESC LIMIT $3 OFFSET $4",
            Self::select(),
            WHERE
        ))
        .bind(filters.query_line.as_deref())
        .bind(&subjects)
        .bind(pagination.take())
        .bind(pagination.skip())
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        debug!(total = total, returned = teachers.len(), "Teachers fetched");
        Ok(Paginated::new(teachers, total, pagination).map(TeacherDto::from))
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "teachers"))]
    pub async fn update_teacher(
        db: &PgPool,
        teacher_id: Uuid,
        dto: UpdateTeacherDto,
    ) -> Result<TeacherDto, AppError> {
        Self::get_teacher(db, teacher_id).await?;

        let mut tx = db.begin().await.map_err(AppError::database)?;

        let account = AccountUpdate {
            name: dto.name.as_deref(),
            ..Default::default()
        };
        UserService::update_account(&mut tx, teacher_id, &account).await?;

        sqlx::query(
            r#"
            UPDATE teachers
            SET institution = COALESCE($2, institution),
                post = COALESCE($3, post)
            WHERE user_id = $1
            "#,
        )
        .bind(teacher_id)
        .bind(dto.institution.as_deref())
        .bind(dto.post.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(AppError::database)?;

        if let Some(titles) = dto.subjects.as_deref() {
            if !titles.is_empty() {
                let subject_ids = SubjectService::resolve_titles(&mut tx, titles).await?;
                Self::replace_subjects(&mut tx, teacher_id, &subject_ids).await?;
            }
        }

        tx.commit().await.map_err(AppError::database)?;
        info!(teacher.id = %teacher_id, "Teacher updated");

        Ok(Self::find_teacher(db, teacher_id).await?.into())
    }
}
