use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::state::AppState;

use super::controller::{
    activate_user, archive_user, change_avatar, change_email, change_password, change_username,
    create_default_user, create_special_user, get_admins, get_users,
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users))
        .route("/default-users", post(create_default_user))
        .route("/special-users", post(create_special_user))
        .route("/admins", get(get_admins))
        .route("/username/{id}", patch(change_username))
        .route("/email/{id}", patch(change_email))
        .route("/password/{id}", patch(change_password))
        .route("/avatar/{id}", patch(change_avatar))
        .route("/{id}", put(activate_user).delete(archive_user))
}
