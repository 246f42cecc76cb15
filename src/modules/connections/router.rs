use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    confirm_connection, create_connection, delete_connection, get_connection, get_connections,
};

pub fn init_connections_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_connections).post(create_connection))
        .route(
            "/{id}",
            get(get_connection)
                .patch(confirm_connection)
                .delete(delete_connection),
        )
}
