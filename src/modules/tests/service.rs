use std::collections::HashMap;

use axum::http::StatusCode;
use lms_auth::Identity;
use lms_config::StorageConfig;
use lms_core::file_storage::FileStorage;
use lms_core::{AppError, Paginated, PaginationParams, RoleType, error_codes};
use lms_models::tests::{
    CreateTestDto, NewTest, TestDto, TestFilterParams, TestItemAnswerRow, TestItemDto,
    TestItemOptionRow, TestItemOptionType, TestItemRow, TestRow, UploadedNames, Viewer,
    visible_accesses,
};
use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::metrics::track_test_created;
use crate::modules::files::{FileService, MultipartForm};
use crate::modules::subjects::service::SubjectService;
use crate::modules::teachers::service::TeacherService;
use crate::modules::users::service::not_found;
use crate::validator::invalid_form;

pub const TEST_FILE: &str = "testFile";
pub const TEST_ITEM_FILES: &str = "testItemFiles";
pub const TEST_ITEM_OPTION_FILES: &str = "testItemOptionFiles";

const TEST_COLUMNS: &str = "t.id, t.title, t.file, t.language, t.test_duration, t.text_selectable, \
     t.access, t.page_format, t.result_type, t.test_status, t.subject_id, t.teacher_id, t.status, \
     t.created_at, t.updated_at";

const ITEM_COLUMNS: &str =
    "id, test_id, position, text, question, points, media, media_type, answer_type, option_type";

/// Builds the form from multipart text parts, each holding one JSON value.
pub fn parse_form(texts: &HashMap<String, String>) -> Result<CreateTestDto, AppError> {
    let mut keys: Vec<&String> = texts.keys().collect();
    keys.sort();

    let mut object = Map::new();
    for key in keys {
        let value: Value = serde_json::from_str(&texts[key]).map_err(|e| {
            AppError::coded(
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_JSON,
                format!("{} - {}", key, e),
            )
        })?;
        object.insert(key.clone(), value);
    }

    serde_json::from_value(Value::Object(object))
        .map_err(|e| AppError::coded(StatusCode::BAD_REQUEST, error_codes::INVALID_FORM, e))
}

pub fn uploaded_names(form: &MultipartForm) -> UploadedNames {
    let names = |field| {
        form.files_of(field)
            .map(|f| f.file_name.clone())
            .collect::<Vec<_>>()
    };
    UploadedNames {
        test_file: names(TEST_FILE).into_iter().next(),
        test_item_files: names(TEST_ITEM_FILES),
        test_item_option_files: names(TEST_ITEM_OPTION_FILES),
    }
}

/// Teacher whose confirmed students may use `onlyMyTeachers`, if the viewer is one.
fn connected_student(viewer: Option<&Identity>, filters: &TestFilterParams) -> Option<Uuid> {
    let viewer = viewer?;
    (filters.only_my_teachers == Some(true) && viewer.role_type == RoleType::Student)
        .then_some(viewer.id)
}

pub struct TestService;

impl TestService {
    fn check_files(form: &MultipartForm, limits: &StorageConfig) -> Result<(), AppError> {
        let rules = [
            (TEST_FILE, 1, limits.test_file_max_bytes),
            (TEST_ITEM_FILES, 30, limits.test_item_file_max_bytes),
            (TEST_ITEM_OPTION_FILES, 150, limits.test_item_option_file_max_bytes),
        ];

        for (field, max_count, max_bytes) in rules {
            FileService::check_count(form, field, max_count)?;
            for file in form.files_of(field) {
                FileService::check(file, max_bytes)?;
            }
        }
        Ok(())
    }

    async fn store_named<S: FileStorage>(
        storage: &S,
        form: &MultipartForm,
        field: &'static str,
        name: &str,
        saved: &mut Vec<String>,
    ) -> Result<String, AppError> {
        let file = form
            .files_of(field)
            .find(|f| f.file_name == name)
            .ok_or_else(|| {
                AppError::coded(StatusCode::BAD_REQUEST, error_codes::FILE_IS_NOT_PROVIDED, name)
            })?;

        let key = FileService::save(storage, field, file).await?;
        saved.push(key.clone());
        Ok(key)
    }

    /// Saves every referenced upload and swaps original names for storage keys.
    /// Answers of image items follow their options to the new keys.
    async fn store_files<S: FileStorage>(
        storage: &S,
        form: &MultipartForm,
        test: &mut NewTest,
        saved: &mut Vec<String>,
    ) -> Result<(), AppError> {
        if let Some(name) = test.file.take() {
            test.file = Some(Self::store_named(storage, form, TEST_FILE, &name, saved).await?);
        }

        for item in &mut test.items {
            item.media = match (item.media.take(), item.media_type) {
                (Some(name), Some(_)) => {
                    Some(Self::store_named(storage, form, TEST_ITEM_FILES, &name, saved).await?)
                }
                _ => None,
            };

            if item.option_type != Some(TestItemOptionType::Image) {
                continue;
            }

            let mut keys: HashMap<String, String> = HashMap::new();
            for option in item.options.iter_mut().flatten() {
                if let Some(name) = option.media.take() {
                    let key = match keys.get(&name) {
                        Some(key) => key.clone(),
                        None => {
                            let key =
                                Self::store_named(storage, form, TEST_ITEM_OPTION_FILES, &name, saved)
                                    .await?;
                            keys.insert(name, key.clone());
                            key
                        }
                    };
                    option.media = Some(key);
                }
            }
            for answer in &mut item.answers {
                if let Some(key) = keys.get(answer.as_str()) {
                    *answer = key.clone();
                }
            }
        }

        Ok(())
    }

    #[instrument(skip(db, test), fields(test.title = %test.title, items = test.items.len(), db.operation = "INSERT", db.table = "tests"))]
    async fn insert_test(db: &PgPool, test: &NewTest) -> Result<Uuid, AppError> {
        let mut tx = db.begin().await.map_err(AppError::database)?;

        let test_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO tests (title, file, language, test_duration, text_selectable, access,
                               page_format, result_type, test_status, subject_id, teacher_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(&test.title)
        .bind(test.file.as_deref())
        .bind(test.language.as_deref())
        .bind(test.test_duration)
        .bind(test.text_selectable)
        .bind(test.access)
        .bind(test.page_format)
        .bind(test.result_type)
        .bind(test.test_status)
        .bind(test.subject_id)
        .bind(test.teacher_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::database)?;

        for (position, item) in test.items.iter().enumerate() {
            let item_id = sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO test_items (test_id, position, text, question, points, media,
                                        media_type, answer_type, option_type)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id
                "#,
            )
            .bind(test_id)
            .bind(position as i32)
            .bind(item.text.as_deref())
            .bind(item.question.as_deref())
            .bind(item.points)
            .bind(item.media.as_deref())
            .bind(item.media_type)
            .bind(item.answer_type)
            .bind(item.option_type)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::database)?;

            for (position, answer) in item.stored_answers().iter().enumerate() {
                sqlx::query(
                    "INSERT INTO test_item_answers (test_item_id, position, text) VALUES ($1, $2, $3)",
                )
                .bind(item_id)
                .bind(position as i32)
                .bind(answer)
                .execute(&mut *tx)
                .await
                .map_err(AppError::database)?;
            }

            if !item.answer_type.has_options() {
                continue;
            }
            for (position, option) in item.options.iter().flatten().enumerate() {
                sqlx::query(
                    "INSERT INTO test_item_options (test_item_id, position, text, media) VALUES ($1, $2, $3, $4)",
                )
                .bind(item_id)
                .bind(position as i32)
                .bind(option.text.as_deref())
                .bind(option.media.as_deref())
                .execute(&mut *tx)
                .await
                .map_err(AppError::database)?;
            }
        }

        tx.commit().await.map_err(AppError::database)?;
        Ok(test_id)
    }

    /// Creates a test from a multipart form.
    ///
    /// Text parts are parsed as JSON, files are matched to the form by their
    /// original names. Stored files are removed again if the insert fails.
    #[instrument(skip(db, storage, limits, identity, form), fields(caller.id = %identity.id))]
    pub async fn create_test<S: FileStorage>(
        db: &PgPool,
        storage: &S,
        limits: &StorageConfig,
        identity: &Identity,
        form: MultipartForm,
    ) -> Result<TestDto, AppError> {
        let dto = parse_form(&form.texts)?;
        dto.validate().map_err(|errors| invalid_form(&errors))?;

        Self::check_files(&form, limits)?;
        dto.check_uploads(&uploaded_names(&form))
            .map_err(AppError::bad_request)?;

        if let Some(subject_id) = dto.subject_id {
            SubjectService::get_subject(db, subject_id).await?;
        }

        let teacher_id = (identity.role_type == RoleType::Teacher).then_some(identity.id);
        let mut test = dto.into_new_test(teacher_id);

        let mut saved = Vec::new();
        let inserted = match Self::store_files(storage, &form, &mut test, &mut saved).await {
            Ok(()) => Self::insert_test(db, &test).await,
            Err(e) => Err(e),
        };
        let test_id = match inserted {
            Ok(id) => id,
            Err(e) => {
                warn!(files = saved.len(), "Test not created, removing stored files");
                FileService::delete_all(storage, &saved).await;
                return Err(e);
            }
        };

        track_test_created(test.items.len());
        info!(test.id = %test_id, files = saved.len(), "Test created");

        Self::get_test(db, test_id).await
    }

    /// One active test with items, answers and options.
    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "tests"))]
    pub async fn get_test(db: &PgPool, test_id: Uuid) -> Result<TestDto, AppError> {
        let row = sqlx::query_as::<_, TestRow>(&format!(
            "SELECT {} FROM tests t WHERE t.id = $1 AND t.status = 'Active'",
            TEST_COLUMNS
        ))
        .bind(test_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| not_found(format!("test with id - {}", test_id)))?;

        let items = sqlx::query_as::<_, TestItemRow>(&format!(
            "SELECT {} FROM test_items WHERE test_id = $1 ORDER BY position ASC",
            ITEM_COLUMNS
        ))
        .bind(test_id)
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        let item_ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();

        let answers = sqlx::query_as::<_, TestItemAnswerRow>(
            "SELECT id, test_item_id, text FROM test_item_answers WHERE test_item_id = ANY($1) ORDER BY position ASC",
        )
        .bind(&item_ids)
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        let options = sqlx::query_as::<_, TestItemOptionRow>(
            "SELECT id, test_item_id, text, media FROM test_item_options WHERE test_item_id = ANY($1) ORDER BY position ASC",
        )
        .bind(&item_ids)
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        let subject = SubjectService::find_many(db, row.subject_id.as_slice())
            .await?
            .pop();
        let teacher = TeacherService::find_many(db, row.teacher_id.as_slice())
            .await?
            .pop();

        let item_list = items
            .into_iter()
            .map(|item| TestItemDto::assemble(item, &answers, &options))
            .collect();

        Ok(TestDto::assemble(row, subject, teacher, item_list))
    }

    /// Active tests the viewer may see, newest first.
    #[instrument(skip(db, viewer, filters), fields(db.operation = "SELECT", db.table = "tests"))]
    pub async fn get_tests(
        db: &PgPool,
        viewer: Option<&Identity>,
        filters: &TestFilterParams,
        pagination: &PaginationParams,
    ) -> Result<Paginated<TestDto>, AppError> {
        const FROM: &str = "FROM tests t LEFT JOIN subjects sub ON sub.id = t.subject_id";
        const WHERE: &str = r#"
            WHERE t.status = 'Active'
              AND ($1::TEXT IS NULL OR t.title ILIKE '%' || $1 || '%')
              AND ($2::TEXT IS NULL OR t.language ILIKE '%' || $2 || '%')
              AND (t.test_duration IS NULL OR t.test_duration <= $3)
              AND ($4::TEXT[] IS NULL OR t.access = ANY($4))
              AND ($5::TEXT IS NULL OR t.test_status = $5)
              AND (cardinality($6::TEXT[]) = 0 OR sub.title = ANY($6))
              AND (cardinality($7::UUID[]) = 0 OR t.teacher_id = ANY($7))
              AND ($8::UUID IS NULL OR t.teacher_id IN (
                  SELECT c.teacher_id FROM teacher_to_student c
                  WHERE c.student_id = $8 AND c.confirmation_status = 'Confirmed'
              ))
        "#;

        let accesses = visible_accesses(
            viewer.map(|identity| Viewer {
                role_type: identity.role_type,
                permissions: &identity.permissions,
            }),
            filters.access,
        );
        let subjects: Vec<String> = filters
            .subjects
            .iter()
            .map(|title| title.to_lowercase())
            .collect();
        let student_id = connected_student(viewer, filters);

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) {} {}", FROM, WHERE))
            .bind(filters.query_line.as_deref())
            .bind(filters.language.as_deref())
            .bind(filters.max_duration())
            .bind(accesses.as_deref())
            .bind(filters.test_status)
            .bind(&subjects)
            .bind(&filters.teacher_ids)
            .bind(student_id)
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        let rows = sqlx::query_as::<_, TestRow>(&format!(
            "SELECT {} {} {} ORDER BY t.created_at DESC LIMIT $9 OFFSET $10",
            TEST_COLUMNS, FROM, WHERE
        ))
        .bind(filters.query_line.as_deref())
        .bind(filters.language.as_deref())
        .bind(filters.max_duration())
        .bind(accesses.as_deref())
        .bind(filters.test_status)
        .bind(&subjects)
        .bind(&filters.teacher_ids)
        .bind(student_id)
        .bind(pagination.take())
        .bind(pagination.skip())
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        debug!(total = total, returned = rows.len(), accesses = ?accesses, "Tests fetched");

        let test_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let subject_ids: Vec<Uuid> = rows.iter().filter_map(|row| row.subject_id).collect();
        let teacher_ids: Vec<Uuid> = rows.iter().filter_map(|row| row.teacher_id).collect();

        let items = sqlx::query_as::<_, TestItemRow>(&format!(
            "SELECT {} FROM test_items WHERE test_id = ANY($1) ORDER BY position ASC",
            ITEM_COLUMNS
        ))
        .bind(&test_ids)
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;
        let subjects = SubjectService::find_many(db, &subject_ids).await?;
        let teachers = TeacherService::find_many(db, &teacher_ids).await?;

        Ok(Paginated::new(rows, total, pagination).map(|row| {
            let subject = subjects
                .iter()
                .find(|s| Some(s.id) == row.subject_id)
                .cloned();
            let teacher = teachers
                .iter()
                .find(|t| Some(t.user.id) == row.teacher_id)
                .cloned();
            let item_list = items
                .iter()
                .filter(|item| item.test_id == row.id)
                .cloned()
                .map(|item| TestItemDto::assemble(item, &[], &[]))
                .collect();
            TestDto::assemble(row, subject, teacher, item_list)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::files::UploadedFile;
    use lms_core::Permission;
    use lms_models::tests::TestAccess;

    fn texts(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn upload(field: &str, name: &str) -> UploadedFile {
        UploadedFile {
            field: field.to_string(),
            file_name: name.to_string(),
            content_type: Some("image/png".to_string()),
            bytes: vec![0; 16],
        }
    }

    #[test]
    fn test_parse_form_reads_json_parts() {
        let dto = parse_form(&texts(&[
            ("title", r#""Colors""#),
            ("testDuration", "45"),
            ("access", r#""Open""#),
            ("textSelectable", "true"),
        ]))
        .unwrap();

        assert_eq!(dto.title.as_deref(), Some("Colors"));
        assert_eq!(dto.test_duration, Some(45));
        assert_eq!(dto.access, Some(TestAccess::Open));
        assert_eq!(dto.text_selectable, Some(true));
    }

    #[test]
    fn test_parse_form_rejects_bad_json() {
        let err = parse_form(&texts(&[("title", "Colors")])).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message().starts_with("errors.invalid-json: title - "));
    }

    #[test]
    fn test_parse_form_rejects_wrong_types() {
        let err = parse_form(&texts(&[("testDuration", r#""long""#)])).unwrap_err();
        assert!(err.message().starts_with("errors.invalid-form: "));
    }

    #[test]
    fn test_uploaded_names_by_field() {
        let form = MultipartForm {
            texts: HashMap::new(),
            files: vec![
                upload(TEST_FILE, "cover.png"),
                upload(TEST_ITEM_FILES, "car.png"),
                upload(TEST_ITEM_OPTION_FILES, "red.png"),
                upload(TEST_ITEM_OPTION_FILES, "blue.png"),
            ],
        };

        let names = uploaded_names(&form);
        assert_eq!(names.test_file.as_deref(), Some("cover.png"));
        assert_eq!(names.test_item_files, vec!["car.png"]);
        assert_eq!(names.test_item_option_files, vec!["red.png", "blue.png"]);
    }

    #[test]
    fn test_file_count_limit() {
        let form = MultipartForm {
            texts: HashMap::new(),
            files: vec![upload(TEST_FILE, "a.png"), upload(TEST_FILE, "b.png")],
        };
        let err = TestService::check_files(&form, &StorageConfig::default()).unwrap_err();
        assert_eq!(
            err.message(),
            "errors.invalid-form: testFile accepts at most 1 file(s), got 2"
        );
    }

    #[test]
    fn test_only_my_teachers_applies_to_students() {
        let student = Identity {
            id: Uuid::from_u128(3),
            username: "annasmith".to_string(),
            email: "anna@example.com".to_string(),
            role_id: Uuid::new_v4(),
            role_type: RoleType::Student,
            permissions: vec![Permission::ConnectToTeachers],
        };
        let filters = TestFilterParams {
            only_my_teachers: Some(true),
            ..Default::default()
        };

        assert_eq!(connected_student(Some(&student), &filters), Some(student.id));
        assert_eq!(connected_student(None, &filters), None);
        assert_eq!(
            connected_student(Some(&student), &TestFilterParams::default()),
            None
        );

        let teacher = Identity {
            role_type: RoleType::Teacher,
            ..student
        };
        assert_eq!(connected_student(Some(&teacher), &filters), None);
    }
}
