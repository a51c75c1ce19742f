use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Username reserved for the bootstrap administrative account. The account
/// holding it can never be demoted, renamed, or deleted.
pub const RESERVED_ADMIN_USERNAME: &str = "admin";

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The canonical user row from the `users` table, including the password hash.
///
/// Deliberately **not** `Serialize`: the hash must never appear in a response
/// body. Convert to [`UserOut`] before returning a user to a client.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2 hash; plaintext is hashed before it ever reaches this struct.
    pub password: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this row is the reserved bootstrap admin account.
    pub fn is_reserved_admin(&self) -> bool {
        self.username == RESERVED_ADMIN_USERNAME
    }
}

/// UserOut
///
/// The outward representation of a user. Identical to [`User`] minus the
/// password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserOut {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserOut {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// CreateUserRequest
///
/// Input payload for user creation (POST /users). The password arrives in
/// plaintext over TLS and is hashed inside the repository before insertion.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// UpdateUserRequest
///
/// Partial update payload for PATCH /users/{id}. All fields are optional; only
/// fields explicitly present in the payload are applied — unset fields are
/// no-ops, never resets to a default.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

/// CreateAdminRequest
///
/// Input payload for POST /users/create_admin: the password to assign to the
/// reserved admin account. The remaining fields are fixed by the bootstrap
/// identity.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAdminRequest {
    pub password: String,
}

/// LoginRequest
///
/// Form-encoded credentials for POST /auth/login.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// TokenResponse
///
/// Successful login output: the signed bearer token, its type, and its
/// lifetime in minutes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Token lifetime in minutes.
    pub expires_in: i64,
}
