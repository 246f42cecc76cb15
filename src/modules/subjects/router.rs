use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    activate_subject, archive_subject, create_subject, get_subject, get_subjects, update_subject,
};

pub fn init_subjects_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_subjects).post(create_subject))
        .route(
            "/{id}",
            get(get_subject)
                .patch(update_subject)
                .put(activate_subject)
                .delete(archive_subject),
        )
}
