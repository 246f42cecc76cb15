use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_default_teacher, create_special_teacher, get_teacher, get_teachers, update_teacher,
};

pub fn init_teachers_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_teachers))
        .route("/default", post(create_default_teacher))
        .route("/special", post(create_special_teacher))
        .route("/{id}", get(get_teacher).patch(update_teacher))
}
