use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Admin Router Module
///
/// User administration endpoints. Authentication happens via the `AuthUser`
/// extractor inside each handler, followed by an explicit `require_admin`
/// check before any repository call.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /users?skip=&limit=   paged listing, username ascending.
        // POST /users               create; 409 on username/email collision.
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        // GET /users/{id}           fetch one.
        // DELETE /users/{id}        remove; the reserved admin is protected.
        .route(
            "/users/{id}",
            get(handlers::get_user).delete(handlers::delete_user),
        )
}
