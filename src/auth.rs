use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::UpdateUserRequest,
    repository::RepositoryState,
    security,
};

/// AuthUser
///
/// The resolved identity of an authenticated request, produced by the
/// extractor below. Handlers use it for all role and ownership checks.
///
/// Holds no state across calls: every request is a fresh verification.
/// There is no session store and no revocation list; a token is trusted
/// exactly as long as its signature, expiry, and subject lookup hold.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

impl AuthUser {
    /// Second-stage check for admin-only operations.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin privileges required"))
        }
    }

    /// Authorization for the update path.
    ///
    /// An update is permitted when the actor owns the target record or is an
    /// admin. Independently of ownership, a non-admin may never set
    /// `is_admin` in a patch, including on their own record.
    pub fn authorize_update(
        &self,
        target_id: Uuid,
        patch: &UpdateUserRequest,
    ) -> Result<(), ApiError> {
        if self.id != target_id && !self.is_admin {
            return Err(ApiError::Forbidden("cannot modify another user's record"));
        }
        if patch.is_admin.is_some() && !self.is_admin {
            return Err(ApiError::Forbidden("cannot change admin status"));
        }
        Ok(())
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any guarded handler. This cleanly separates
/// authentication (extractor) from business logic (the handler).
///
/// The process:
/// 1. Dependency resolution: Repository and AppConfig from the app state.
/// 2. Local bypass: development-time access via the 'x-user-id' header.
/// 3. Token validation: Bearer extraction and JWT decoding.
/// 4. DB lookup: the subject must still exist; a deleted user's
///    still-valid token must not authenticate.
///
/// Rejection: every failure mode folds into `Unauthenticated` (401); the
/// client never learns which step rejected it.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Local Development Bypass
        // In Env::Local only, a known user UUID in the 'x-user-id' header
        // authenticates directly. The UUID must still resolve to a real row
        // so role checks stay meaningful.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = Uuid::parse_str(id_str) {
                        if let Some(user) = repo.get_user(user_id).await {
                            return Ok(AuthUser {
                                id: user.id,
                                username: user.username,
                                is_admin: user.is_admin,
                            });
                        }
                    }
                }
            }
        }
        // Production, or bypass not taken: standard JWT validation flow.

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthenticated)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthenticated)?;

        // Decode and validate. Expired, malformed, and bad-signature tokens
        // are indistinguishable to the caller.
        let claims =
            security::decode_token(token, &config.jwt_secret).ok_or(ApiError::Unauthenticated)?;

        // Final verification: the subject must still exist.
        let user = repo
            .get_user(claims.sub)
            .await
            .ok_or(ApiError::Unauthenticated)?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(is_admin: bool) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            username: if is_admin { "root" } else { "alice" }.to_string(),
            is_admin,
        }
    }

    #[test]
    fn admin_check() {
        assert!(actor(true).require_admin().is_ok());
        assert!(matches!(
            actor(false).require_admin(),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn owner_may_update_self() {
        let user = actor(false);
        let patch = UpdateUserRequest {
            first_name: Some("Alicia".into()),
            ..Default::default()
        };
        assert!(user.authorize_update(user.id, &patch).is_ok());
    }

    #[test]
    fn non_admin_may_not_update_others() {
        let user = actor(false);
        let patch = UpdateUserRequest::default();
        assert!(matches!(
            user.authorize_update(Uuid::new_v4(), &patch),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn self_escalation_is_forbidden() {
        let user = actor(false);
        let patch = UpdateUserRequest {
            is_admin: Some(true),
            ..Default::default()
        };
        // Target is self, ownership passes, escalation guard still rejects.
        assert!(matches!(
            user.authorize_update(user.id, &patch),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn admin_may_update_anyone_and_set_roles() {
        let admin = actor(true);
        let patch = UpdateUserRequest {
            is_admin: Some(true),
            ..Default::default()
        };
        assert!(admin.authorize_update(Uuid::new_v4(), &patch).is_ok());
    }
}
