use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{CreateUserRequest, RESERVED_ADMIN_USERNAME, UpdateUserRequest, User};
use crate::security;

/// Columns selected/returned for every user query, in `User` field order.
const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password, is_admin, created_at";

/// UserRepository
///
/// Defines the abstract contract for all persistence operations on users. The
/// handlers interact with this trait only, never with a concrete backend, which
/// lets the test suite swap in [`MemoryUserRepository`] without touching the
/// HTTP surface.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn UserRepository>`) safely shareable across Axum's task boundaries.
///
/// Error contract: storage-level failures never escape raw. Uniqueness
/// violations surface as [`ApiError::Conflict`] naming the colliding field,
/// and operations that would break the permanent-admin rule surface as
/// [`ApiError::InvariantViolation`] before any mutation happens.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Hashes the password and inserts a new user row.
    async fn create_user(&self, req: CreateUserRequest) -> Result<User, ApiError>;

    // Lookups. Absence is an expected, non-error outcome at this layer.
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn get_user_by_username(&self, username: &str) -> Option<User>;
    async fn get_user_by_email(&self, email: &str) -> Option<User>;

    /// Returns one offset/limit window of users ordered by username ascending.
    async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<User>, ApiError>;
    /// Total row count, for pagination metadata.
    async fn count_users(&self) -> Result<i64, ApiError>;

    /// Applies only the fields present in `patch`; unset fields are no-ops.
    /// A present password is re-hashed before storage.
    async fn update_user(&self, id: Uuid, patch: UpdateUserRequest) -> Result<User, ApiError>;

    /// Removes a user. The reserved admin can never be deleted.
    async fn delete_user(&self, id: Uuid) -> Result<(), ApiError>;

    /// Inserts the reserved admin identity. Signals `Conflict` if it already
    /// exists; callers decide whether that is an error (HTTP endpoint) or
    /// expected (startup bootstrap racing another replica).
    async fn create_admin(&self, password: &str) -> Result<User, ApiError> {
        self.create_user(CreateUserRequest {
            username: RESERVED_ADMIN_USERNAME.to_string(),
            email: "admin@admin.com".to_string(),
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
            password: password.to_string(),
            is_admin: true,
        })
        .await
    }

    /// Resolves a user by username and verifies the password hash.
    ///
    /// Returns `None` on *any* mismatch, deliberately indistinguishable
    /// between "no such user" and "wrong password" to prevent username
    /// enumeration.
    async fn authenticate(&self, username: &str, password: &str) -> Option<User> {
        let user = self.get_user_by_username(username).await?;
        if security::verify_password(password, &user.password) {
            Some(user)
        } else {
            None
        }
    }
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn UserRepository>;

/// Rejects patches that would demote or rename the reserved admin account.
/// Checked before any mutation, on both backends.
fn guard_reserved_admin(target: &User, patch: &UpdateUserRequest) -> Result<(), ApiError> {
    if !target.is_reserved_admin() {
        return Ok(());
    }
    if patch.is_admin == Some(false) {
        return Err(ApiError::InvariantViolation(
            "cannot remove admin privileges from the default admin user",
        ));
    }
    if let Some(username) = &patch.username {
        if username != RESERVED_ADMIN_USERNAME {
            return Err(ApiError::InvariantViolation(
                "cannot rename the default admin user",
            ));
        }
    }
    Ok(())
}

// --- PostgreSQL Implementation ---

/// PostgresUserRepository
///
/// The production implementation, backed by a PostgreSQL connection pool.
/// Each call checks out one pooled connection for the duration of the query;
/// release is unconditional on drop, success or failure. Concurrent writes to
/// the same username/email rely on the table's unique constraints: exactly one
/// insert wins, the loser observes `Conflict`.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, req: CreateUserRequest) -> Result<User, ApiError> {
        let hash = security::hash_password(&req.password)?;

        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, email, first_name, last_name, password, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&req.username)
        .bind(&req.email)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&hash)
        .bind(req.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::from_sqlx)
    }

    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {:?}", e);
                None
            })
    }

    async fn get_user_by_username(&self, username: &str) -> Option<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user_by_username error: {:?}", e);
            None
        })
    }

    async fn get_user_by_email(&self, email: &str) -> Option<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user_by_email error: {:?}", e);
                None
            })
    }

    async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<User>, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username ASC OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::from)
    }

    async fn count_users(&self) -> Result<i64, ApiError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::from)
    }

    async fn update_user(&self, id: Uuid, patch: UpdateUserRequest) -> Result<User, ApiError> {
        let current = self
            .get_user(id)
            .await
            .ok_or(ApiError::NotFound("user not found"))?;

        // Invariants are checked before any mutation reaches the database.
        guard_reserved_admin(&current, &patch)?;

        let password_hash = match &patch.password {
            Some(plain) => Some(security::hash_password(plain)?),
            None => None,
        };

        // COALESCE applies only the fields present in the patch; NULL binds
        // leave the stored value untouched.
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users \
             SET username = COALESCE($2, username), \
                 email = COALESCE($3, email), \
                 first_name = COALESCE($4, first_name), \
                 last_name = COALESCE($5, last_name), \
                 password = COALESCE($6, password), \
                 is_admin = COALESCE($7, is_admin) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.username)
        .bind(patch.email)
        .bind(patch.first_name)
        .bind(patch.last_name)
        .bind(password_hash)
        .bind(patch.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::from_sqlx)
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), ApiError> {
        let current = self
            .get_user(id)
            .await
            .ok_or(ApiError::NotFound("user not found"))?;

        if current.is_reserved_admin() {
            return Err(ApiError::InvariantViolation(
                "cannot delete the default admin user",
            ));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            // Row vanished between the lookup and the delete.
            return Err(ApiError::NotFound("user not found"));
        }
        Ok(())
    }
}

// --- In-Memory Implementation (For Tests) ---

/// MemoryUserRepository
///
/// An in-memory implementation of [`UserRepository`] used by the test suite.
/// It enforces the same contract as the Postgres backend (uniqueness
/// conflicts, reserved-admin protection, password hashing) so handler and
/// guard behavior can be exercised without a database connection.
#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the colliding field name, if inserting/updating to this
    /// username/email would violate uniqueness. `exclude` skips the row being
    /// updated itself.
    fn find_collision(
        users: &HashMap<Uuid, User>,
        username: &str,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Option<&'static str> {
        for user in users.values() {
            if Some(user.id) == exclude {
                continue;
            }
            if user.username == username {
                return Some("username");
            }
            if user.email == email {
                return Some("email");
            }
        }
        None
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create_user(&self, req: CreateUserRequest) -> Result<User, ApiError> {
        let hash = security::hash_password(&req.password)?;

        let mut users = self.users.lock().expect("user map poisoned");
        if let Some(field) = Self::find_collision(&users, &req.username, &req.email, None) {
            return Err(ApiError::Conflict(field.to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: req.username,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            password: hash,
            is_admin: req.is_admin,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.lock().expect("user map poisoned").get(&id).cloned()
    }

    async fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .lock()
            .expect("user map poisoned")
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    async fn get_user_by_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .expect("user map poisoned")
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<User>, ApiError> {
        let mut all: Vec<User> = self
            .users
            .lock()
            .expect("user map poisoned")
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.username.cmp(&b.username));

        Ok(all
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_users(&self) -> Result<i64, ApiError> {
        Ok(self.users.lock().expect("user map poisoned").len() as i64)
    }

    async fn update_user(&self, id: Uuid, patch: UpdateUserRequest) -> Result<User, ApiError> {
        // Hash outside the lock; hashing is the slow part.
        let password_hash = match &patch.password {
            Some(plain) => Some(security::hash_password(plain)?),
            None => None,
        };

        let mut users = self.users.lock().expect("user map poisoned");
        let current = users
            .get(&id)
            .cloned()
            .ok_or(ApiError::NotFound("user not found"))?;

        guard_reserved_admin(&current, &patch)?;

        let username = patch.username.unwrap_or(current.username);
        let email = patch.email.unwrap_or(current.email);
        if let Some(field) = Self::find_collision(&users, &username, &email, Some(id)) {
            return Err(ApiError::Conflict(field.to_string()));
        }

        let updated = User {
            id: current.id,
            username,
            email,
            first_name: patch.first_name.unwrap_or(current.first_name),
            last_name: patch.last_name.unwrap_or(current.last_name),
            password: password_hash.unwrap_or(current.password),
            is_admin: patch.is_admin.unwrap_or(current.is_admin),
            created_at: current.created_at,
        };
        users.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), ApiError> {
        let mut users = self.users.lock().expect("user map poisoned");
        let current = users.get(&id).ok_or(ApiError::NotFound("user not found"))?;

        if current.is_reserved_admin() {
            return Err(ApiError::InvariantViolation(
                "cannot delete the default admin user",
            ));
        }
        users.remove(&id);
        Ok(())
    }
}
