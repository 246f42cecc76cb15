use axum::http::StatusCode;
use lms_core::{AppError, Paginated, PaginationParams, RoleType, error_codes};
use lms_models::roles::UserRole;
use lms_models::students::{StudentDto, StudentFilterParams, StudentProfile, StudentRow, UpdateStudentDto};
use lms_models::users::{NewUser, USER_WITH_ROLE_COLUMNS};
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::modules::users::service::{AccountUpdate, Profile, UserService, not_found};

const STUDENT_FROM: &str = r#"
    FROM students s
    JOIN users u ON u.id = s.user_id
    JOIN user_roles r ON r.id = u.role_id
"#;

pub struct StudentService;

impl StudentService {
    fn select() -> String {
        format!(
            "SELECT {}, s.institution, s.birth_date {}",
            USER_WITH_ROLE_COLUMNS, STUDENT_FROM
        )
    }

    /// Creates a student under `role`, which must be of type Student.
    #[instrument(skip(db, user, profile), fields(user.email = %user.email, role.title = %role.title, db.operation = "INSERT", db.table = "students"))]
    pub async fn create_student(
        db: &PgPool,
        user: NewUser,
        profile: StudentProfile,
        role: &UserRole,
    ) -> Result<StudentDto, AppError> {
        if role.role_type != RoleType::Student {
            return Err(AppError::coded(
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_ROLE,
                &role.title,
            ));
        }

        let mut tx = db.begin().await.map_err(AppError::database)?;
        let user_id =
            UserService::insert_user(&mut tx, &user, role, &Profile::Student(profile)).await?;
        tx.commit().await.map_err(AppError::database)?;

        let mut student = StudentDto::from(Self::find_student(db, user_id).await?);
        student.user = student.user.with_password(user.password);
        info!(student.id = %user_id, "Student created");
        Ok(student)
    }

    async fn find_student(db: &PgPool, student_id: Uuid) -> Result<StudentRow, AppError> {
        sqlx::query_as::<_, StudentRow>(&format!("{} WHERE u.id = $1", Self::select()))
            .bind(student_id)
            .fetch_optional(db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| not_found(format!("student with id - {}", student_id)))
    }

    pub async fn get_student(db: &PgPool, student_id: Uuid) -> Result<StudentDto, AppError> {
        sqlx::query_as::<_, StudentRow>(&format!(
            "{} WHERE u.id = $1 AND u.status = 'Active'",
            Self::select()
        ))
        .bind(student_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .map(StudentDto::from)
        .ok_or_else(|| not_found(format!("student with id - {}", student_id)))
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "students"))]
    pub async fn get_students(
        db: &PgPool,
        filters: &StudentFilterParams,
        pagination: &PaginationParams,
    ) -> Result<Paginated<StudentDto>, AppError> {
        const WHERE: &str = r#"
            WHERE u.status = 'Active'
              AND ($1::TEXT IS NULL
                   OR u.name ILIKE '%' || $1 || '%'
                   OR u.username ILIKE '%' || $1 || '%'
                   OR s.institution ILIKE '%' || $1 || '%')
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) {} {}", STUDENT_FROM, WHERE))
            .bind(filters.query_line.as_deref())
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        let students = sqlx::query_as::<_, StudentRow>(&format!(
            "{} {} ORDER BY u.created_at DESC LIMIT $2 OFFSET $3",
            Self::select(),
            WHERE
        ))
        .bind(filters.query_line.as_deref())
        .bind(pagination.take())
        .bind(pagination.skip())
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        debug!(total = total, returned = students.len(), "Students fetched");
        Ok(Paginated::new(students, total, pagination).map(StudentDto::from))
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "students"))]
    pub async fn update_student(
        db: &PgPool,
        student_id: Uuid,
        dto: UpdateStudentDto,
    ) -> Result<StudentDto, AppError> {
        Self::get_student(db, student_id).await?;

        let mut tx = db.begin().await.map_err(AppError::database)?;

        let account = AccountUpdate {
            name: dto.name.as_deref(),
            username: dto.username.as_deref(),
            email: dto.email.as_deref(),
            password: dto.password.as_deref(),
        };
        UserService::update_account(&mut tx, student_id, &account).await?;

        sqlx::query(
            r#"
            UPDATE students
            SET institution = COALESCE($2, institution),
                birth_date = COALESCE($3, birth_date)
            WHERE user_id = $1
            "#,
        )
        .bind(student_id)
        .bind(dto.institution.as_deref())
        .bind(dto.birth_date)
        .execute(&mut *tx)
        .await
        .map_err(AppError::database)?;

        tx.commit().await.map_err(AppError::database)?;
        info!(student.id = %student_id, "Student updated");

        let mut student = StudentDto::from(Self::find_student(db, student_id).await?);
        if let Some(password) = dto.password {
            student.user = student.user.with_password(password);
        }
        Ok(student)
    }
}
