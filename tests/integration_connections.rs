mod common;

use axum::http::StatusCode;
use common::{
    create_admin, create_parent, create_student, create_teacher, send, setup_test_app, sign_in,
};
use serde_json::json;
use sqlx::PgPool;

const CONNECTIONS: &str = "/api/connections/teacher-to-student";

#[sqlx::test(migrations = "./migrations")]
async fn test_student_request_confirmed_by_teacher(pool: PgPool) {
    let teacher = create_teacher(&pool).await;
    let student = create_student(&pool).await;
    let app = setup_test_app(pool);
    let student_token = sign_in(&app, &student).await;
    let teacher_token = sign_in(&app, &teacher).await;

    let (status, body) = send(
        &app,
        "POST",
        CONNECTIONS,
        Some(&student_token),
        Some(json!({ "teacherId": teacher.id, "studentId": student.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["confirmationStatus"], "NeedsTeacherConfirmation");
    let id = body["id"].as_str().unwrap().to_string();
    let uri = format!("{}/{}", CONNECTIONS, id);

    // the requesting side cannot confirm its own request
    let (status, body) = send(&app, "PATCH", &uri, Some(&student_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        format!(
            "errors.not-found: teacher-to-student with id - {} that needs your confirmation",
            id
        )
    );

    let (status, body) = send(&app, "PATCH", &uri, Some(&teacher_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confirmationStatus"], "Confirmed");

    let (status, body) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confirmationStatus"], "Confirmed");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_connection(pool: PgPool) {
    let teacher = create_teacher(&pool).await;
    let student = create_student(&pool).await;
    let app = setup_test_app(pool);
    let token = sign_in(&app, &teacher).await;
    let dto = json!({ "teacherId": teacher.id, "studentId": student.id });

    let (status, body) = send(&app, "POST", CONNECTIONS, Some(&token), Some(dto.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["confirmationStatus"], "NeedsStudentConfirmation");
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "POST", CONNECTIONS, Some(&token), Some(dto)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        format!(
            "errors.connection-already-exists: {}, status - NeedsStudentConfirmation",
            id
        )
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_cannot_connect_on_behalf_of_another(pool: PgPool) {
    let teacher = create_teacher(&pool).await;
    let other_teacher = create_teacher(&pool).await;
    let student = create_student(&pool).await;
    let app = setup_test_app(pool);
    let token = sign_in(&app, &teacher).await;

    let (status, body) = send(
        &app,
        "POST",
        CONNECTIONS,
        Some(&token),
        Some(json!({ "teacherId": other_teacher.id, "studentId": student.id })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "errors.not-current-user");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_connection_to_non_student(pool: PgPool) {
    let teacher = create_teacher(&pool).await;
    let parent = create_parent(&pool).await;
    let app = setup_test_app(pool);
    let token = sign_in(&app, &teacher).await;

    let (status, body) = send(
        &app,
        "POST",
        CONNECTIONS,
        Some(&token),
        Some(json!({ "teacherId": teacher.id, "studentId": parent.id })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        format!("errors.not-found: user Student with id - {}", parent.id)
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parent_cannot_connect(pool: PgPool) {
    let teacher = create_teacher(&pool).await;
    let student = create_student(&pool).await;
    let parent = create_parent(&pool).await;
    let app = setup_test_app(pool);
    let token = sign_in(&app, &parent).await;

    let (status, body) = send(
        &app,
        "POST",
        CONNECTIONS,
        Some(&token),
        Some(json!({ "teacherId": teacher.id, "studentId": student.id })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "errors.not-required-role: Admin, Teacher, Student"
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_creates_for_teacher_and_lists(pool: PgPool) {
    let admin = create_admin(&pool).await;
    let teacher = create_teacher(&pool).await;
    let student = create_student(&pool).await;
    let app = setup_test_app(pool);
    let token = sign_in(&app, &admin).await;

    let (status, body) = send(
        &app,
        "POST",
        CONNECTIONS,
        Some(&token),
        Some(json!({ "teacherId": teacher.id, "studentId": student.id, "fromTeacher": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["confirmationStatus"], "NeedsStudentConfirmation");

    let (status, body) = send(
        &app,
        "GET",
        &format!(
            "{}?teacherId={}&confirmationStatus=NeedsStudentConfirmation",
            CONNECTIONS, teacher.id
        ),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = send(
        &app,
        "GET",
        &format!("{}?confirmationStatus=Confirmed", CONNECTIONS),
        None,
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_connection_only_on_own_side(pool: PgPool) {
    let teacher = create_teacher(&pool).await;
    let student = create_student(&pool).await;
    let other_student = create_student(&pool).await;
    let app = setup_test_app(pool);
    let teacher_token = sign_in(&app, &teacher).await;
    let other_token = sign_in(&app, &other_student).await;

    let (_, body) = send(
        &app,
        "POST",
        CONNECTIONS,
        Some(&teacher_token),
        Some(json!({ "teacherId": teacher.id, "studentId": student.id })),
    )
    .await;
    let uri = format!("{}/{}", CONNECTIONS, body["id"].as_str().unwrap());

    let (status, _) = send(&app, "DELETE", &uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "DELETE", &uri, Some(&teacher_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["studentId"], student.id.to_string());

    let (status, _) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
