use axum::{Router, routing::get};

use crate::modules::users::controller::{
    create_user, delete_user, get_user, list_users, update_user,
};
use crate::state::AppState;

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}
