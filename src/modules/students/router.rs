use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_default_student, create_special_student, get_student, get_students, update_student,
};

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_students))
        .route("/default-students", post(create_default_student))
        .route("/special-students", post(create_special_student))
        .route("/{id}", get(get_student).patch(update_student))
}
