use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// ApiError
///
/// The application-wide error taxonomy. Every variant maps to a distinct, stable
/// HTTP status at the request boundary; none of them crash the process.
///
/// Storage-layer failures are translated at the repository boundary (see
/// [`ApiError::from_sqlx`]) so raw sqlx errors never reach a handler, and token
/// verification failures are uniformly folded into `Unauthenticated` regardless
/// of the specific decode failure, to avoid leaking cryptographic detail.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing/malformed/expired token, or the token subject no longer exists.
    #[error("invalid or expired credentials")]
    Unauthenticated,
    /// Authenticated but insufficient privilege (role, ownership, or escalation).
    #[error("{0}")]
    Forbidden(&'static str),
    /// No entity at the given identifier.
    #[error("{0}")]
    NotFound(&'static str),
    /// Uniqueness violation; the message names the colliding field(s).
    #[error("{0} already exists")]
    Conflict(String),
    /// The operation would violate the permanent-admin rule.
    #[error("{0}")]
    InvariantViolation(&'static str),
    /// Unexpected storage failure. Logged, surfaced as an opaque 500.
    #[error("internal server error")]
    Database(#[from] sqlx::Error),
    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvariantViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Translates a storage error at the repository boundary.
    ///
    /// Unique-constraint violations become `Conflict`, with the colliding field
    /// derived from the constraint name (`users_username_key` / `users_email_key`).
    /// Everything else stays an opaque `Database` error.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("username") => "username",
                    Some(c) if c.contains("email") => "email",
                    _ => "username or email",
                };
                return ApiError::Conflict(field.to_string());
            }
        }
        ApiError::Database(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal failures are logged with full detail but surfaced opaquely.
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {:?}", self);
        }

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}
