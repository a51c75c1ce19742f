use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that are unauthenticated and accessible to any client. Login is
/// the gateway into the authenticated surface; health exists for monitoring
/// and load-balancer checks.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Returns "ok" immediately to verify the service is running.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/login
        // Form-encoded credentials in, signed bearer token out.
        .route("/auth/login", post(handlers::login))
        // POST /users/create_admin
        // One-shot creation of the reserved admin account; 409 once it exists.
        .route("/users/create_admin", post(handlers::create_admin_user))
}
