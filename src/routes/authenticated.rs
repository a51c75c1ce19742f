use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch},
};

/// Authenticated Router Module
///
/// Routes accessible to any user who has passed the authentication layer.
/// Every handler here receives a validated `AuthUser`, which carries the
/// identity used for the ownership and escalation checks on the update path.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The acting user's own record.
        .route("/me", get(handlers::get_me))
        // PATCH /users/{id}
        // Partial update. Owner-or-admin authorization and the
        // privilege-escalation guard are enforced in the handler.
        .route("/users/{id}", patch(handlers::patch_user))
}
