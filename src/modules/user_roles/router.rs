use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    activate_role, archive_role, create_role, get_role, get_roles, update_role,
};

pub fn init_user_roles_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_roles).post(create_role))
        .route(
            "/{id}",
            get(get_role)
                .patch(update_role)
                .put(activate_role)
                .delete(archive_role),
        )
}
