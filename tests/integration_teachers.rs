mod common;

use axum::http::StatusCode;
use common::{
    create_admin, create_student, create_subject, create_teacher, generate_unique_email, send,
    setup_test_app, sign_in,
};
use serde_json::{Value, json};
use sqlx::PgPool;

async fn create_default_teacher(app: &axum::Router, token: &str, name: &str, subjects: Value) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/teachers/default",
        Some(token),
        Some(json!({
            "name": name,
            "email": generate_unique_email(),
            "password": "teacher1",
            "post": "Head of Science",
            "subjects": subjects
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_default_teacher_with_subjects(pool: PgPool) {
    let admin = create_admin(&pool).await;
    create_subject(&pool, "math").await;
    create_subject(&pool, "physics").await;
    let app = setup_test_app(pool);
    let token = sign_in(&app, &admin).await;

    let body =
        create_default_teacher(&app, &token, "Albert Einstein", json!(["physics", "math"])).await;

    assert_eq!(body["username"], "alberteinstein");
    assert_eq!(body["roleTitle"], "default teacher");
    assert_eq!(body["post"], "Head of Science");
    assert_eq!(body["subjects"], json!(["math", "physics"]));
    assert_eq!(body["password"], "teacher1");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_teacher_with_unknown_subject(pool: PgPool) {
    let admin = create_admin(&pool).await;
    create_subject(&pool, "math").await;
    let app = setup_test_app(pool.clone());
    let token = sign_in(&app, &admin).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/teachers/default",
        Some(&token),
        Some(json!({
            "email": generate_unique_email(),
            "password": "teacher1",
            "subjects": ["math", "alchemy", "astrology"]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "errors.not-found: subjects alchemy, astrology"
    );

    let teachers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teachers")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(teachers, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_filter_teachers_by_subjects(pool: PgPool) {
    let admin = create_admin(&pool).await;
    create_subject(&pool, "math").await;
    create_subject(&pool, "physics").await;
    let app = setup_test_app(pool);
    let token = sign_in(&app, &admin).await;

    create_default_teacher(&app, &token, "Isaac Newton", json!(["math", "physics"])).await;
    create_default_teacher(&app, &token, "Ada Lovelace", json!(["math"])).await;

    let (status, body) = send(&app, "GET", "/api/teachers?subjects=math", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(
        &app,
        "GET",
        "/api/teachers?subjects=math,Physics",
        None,
        None,
    )
    .await;
    let teachers = body["data"].as_array().unwrap();
    assert_eq!(teachers.len(), 1);
    assert_eq!(teachers[0]["name"], "Isaac Newton");

    let (_, body) = send(&app, "GET", "/api/teachers?queryLine=ada", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_updates_own_subjects(pool: PgPool) {
    let teacher = create_teacher(&pool).await;
    create_subject(&pool, "chemistry").await;
    let app = setup_test_app(pool);
    let token = sign_in(&app, &teacher).await;

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/teachers/{}", teacher.id),
        Some(&token),
        Some(json!({ "institution": "Royal Institution", "subjects": ["chemistry"] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["institution"], "Royal Institution");
    assert_eq!(body["subjects"], json!(["chemistry"]));

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/teachers/{}", teacher.id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subjects"], json!(["chemistry"]));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_cannot_update_teacher_profile(pool: PgPool) {
    let teacher = create_teacher(&pool).await;
    let student = create_student(&pool).await;
    let app = setup_test_app(pool);
    let token = sign_in(&app, &student).await;

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/teachers/{}", teacher.id),
        Some(&token),
        Some(json!({ "post": "Headmaster" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "errors.not-required-role: Admin, Teacher");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_unknown_teacher(pool: PgPool) {
    let app = setup_test_app(pool);
    let id = uuid::Uuid::new_v4();

    let (status, body) = send(&app, "GET", &format!("/api/teachers/{}", id), None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        format!("errors.not-found: teacher with id - {}", id)
    );
}
