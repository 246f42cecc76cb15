#![allow(dead_code)]

use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use lms::lms_config::{
    AppConfig, CorsConfig, DatabaseConfig, JwtConfig, RateLimitConfig, ServerConfig,
    StorageConfig,
};
use lms::lms_core::hash_password;
use lms::lms_models::roles::builtin;
use lms::router::init_router;
use lms::state::AppState;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "qwerty12";

pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
            validate_exp: true,
        },
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        rate_limit: RateLimitConfig::disabled(),
        storage: StorageConfig {
            temp_dir: temp_dir(),
            ..StorageConfig::default()
        },
    }
}

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("lms-test-{}", Uuid::new_v4()))
}

pub fn setup_test_app(pool: PgPool) -> Router {
    init_router(AppState::new(pool, test_config()))
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

/// Inserts a user holding `role_id` plus its row in `side_table`.
pub async fn create_test_user(pool: &PgPool, role_id: Uuid, side_table: &str) -> TestUser {
    let tag = Uuid::new_v4().simple().to_string();
    let name = "Test User".to_string();
    let username = format!("testuser{}", &tag[..12]);
    let email = generate_unique_email();
    let hashed = hash_password(PASSWORD).unwrap();

    let mut tx = pool.begin().await.unwrap();

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (name, username, email, password, role_id) VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&name)
    .bind(&username)
    .bind(&email)
    .bind(&hashed)
    .bind(role_id)
    .fetch_one(&mut *tx)
    .await
    .unwrap();

    sqlx::query(&format!("INSERT INTO {} (user_id) VALUES ($1)", side_table))
        .bind(id)
        .execute(&mut *tx)
        .await
        .unwrap();

    tx.commit().await.unwrap();

    TestUser {
        id,
        name,
        username,
        email,
        password: PASSWORD.to_string(),
    }
}

pub async fn create_admin(pool: &PgPool) -> TestUser {
    create_test_user(pool, builtin::ADMIN, "admins").await
}

pub async fn create_teacher(pool: &PgPool) -> TestUser {
    create_test_user(pool, builtin::DEFAULT_TEACHER, "teachers").await
}

pub async fn create_student(pool: &PgPool) -> TestUser {
    create_test_user(pool, builtin::DEFAULT_STUDENT, "students").await
}

pub async fn create_parent(pool: &PgPool) -> TestUser {
    create_test_user(pool, builtin::DEFAULT_PARENT, "parents").await
}

/// Inserts an active role and returns its id.
pub async fn create_role(pool: &PgPool, title: &str, role_type: &str, permissions: &[&str]) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO user_roles (title, type, permissions) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(title)
    .bind(role_type)
    .bind(permissions)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_subject(pool: &PgPool, title: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>("INSERT INTO subjects (title) VALUES ($1) RETURNING id")
        .bind(title)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Sends a request and returns the status with the JSON body (`Null` when empty).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    into_parts(app.clone().oneshot(request).await.unwrap()).await
}

pub async fn into_parts(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Signs in through the API and returns the access token.
pub async fn sign_in(app: &Router, user: &TestUser) -> String {
    let (status, body) = send(
        app,
        "PUT",
        "/api/auth/sign-in",
        None,
        Some(json!({ "email": user.email, "password": user.password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "sign-in failed: {}", body);
    body["accessToken"].as_str().unwrap().to_string()
}

/// A multipart body built by hand: text parts then file parts.
pub struct MultipartBody {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: format!("lmsboundary{}", Uuid::new_v4().simple()),
            bytes: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn json(self, name: &str, value: Value) -> Self {
        let text = value.to_string();
        self.text(name, &text)
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, method: &str, uri: &str, token: &str) -> Request<Body> {
        self.bytes
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", self.boundary),
            )
            .body(Body::from(self.bytes))
            .unwrap()
    }
}

pub async fn send_multipart(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    into_parts(app.clone().oneshot(request).await.unwrap()).await
}

/// PNG signature bytes; uploads are judged by their declared content type.
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
