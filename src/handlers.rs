use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult},
    models::{
        CreateAdminRequest, CreateUserRequest, LoginRequest, RESERVED_ADMIN_USERNAME,
        TokenResponse, UpdateUserRequest, UserOut,
    },
    pagination::Paginated,
    security,
};

/// Hard cap on requested page size; requests above it are clamped, not rejected.
const MAX_PAGE_SIZE: i64 = 200;
const DEFAULT_PAGE_SIZE: i64 = 50;

/// ListFilter
///
/// Accepted query parameters for the user listing endpoint (GET /users).
/// `skip` is floored at 0 and `limit` clamped to 1..=200 rather than
/// rejected, keeping offset arithmetic total.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ListFilter {
    /// Number of rows to skip (offset pagination).
    pub skip: Option<i64>,
    /// Page size, clamped to 1..=200.
    pub limit: Option<i64>,
}

// --- Handlers ---

/// login
///
/// [Public Route] Authenticates form-encoded credentials and issues a signed,
/// time-limited bearer token.
///
/// *Security*: unknown username and wrong password produce the identical 401,
/// so the endpoint cannot be used for username enumeration.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body(content = LoginRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Form(credentials): Form<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = state
        .repo
        .authenticate(&credentials.username, &credentials.password)
        .await
        .ok_or(ApiError::Unauthenticated)?;

    let access_token = security::create_access_token(
        user.id,
        &state.config.jwt_secret,
        state.config.token_expiry_minutes,
    )?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.config.token_expiry_minutes,
    }))
}

/// get_me
///
/// [Authenticated Route] Returns the acting user's own record.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Own profile", body = UserOut))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<UserOut>> {
    let user = state
        .repo
        .get_user(id)
        .await
        .ok_or(ApiError::NotFound("user not found"))?;
    Ok(Json(user.into()))
}

/// list_users
///
/// [Admin Route] Lists users ordered by username ascending, wrapped in the
/// offset-pagination envelope.
#[utoipa::path(
    get,
    path = "/users",
    params(ListFilter),
    responses(
        (status = 200, description = "Paged user list", body = Paginated<UserOut>),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_users(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
) -> ApiResult<Json<Paginated<UserOut>>> {
    auth.require_admin()?;

    let skip = filter.skip.unwrap_or(0).max(0);
    let limit = filter
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let users = state.repo.list_users(skip, limit).await?;
    let total_count = state.repo.count_users().await?;

    let items: Vec<UserOut> = users.into_iter().map(UserOut::from).collect();
    Ok(Json(Paginated::new(items, total_count, skip, limit)))
}

/// create_user
///
/// [Admin Route] Creates a new user. Uniqueness collisions on username or
/// email surface as 409 naming the colliding field.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = UserOut),
        (status = 403, description = "Not an admin"),
        (status = 409, description = "Username or email already exists")
    )
)]
pub async fn create_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserOut>)> {
    auth.require_admin()?;
    let user = state.repo.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// create_admin_user
///
/// [Public Route] Creates the reserved admin account with the supplied
/// password. Normally the startup bootstrap has already done this, in which
/// case the endpoint answers 409; it exists for deployments that skip the
/// bootstrap (no ADMIN_PASSWORD at startup, seeded environments).
#[utoipa::path(
    post,
    path = "/users/create_admin",
    request_body = CreateAdminRequest,
    responses(
        (status = 201, description = "Created", body = UserOut),
        (status = 409, description = "Admin user already exists")
    )
)]
pub async fn create_admin_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateAdminRequest>,
) -> ApiResult<(StatusCode, Json<UserOut>)> {
    if state
        .repo
        .get_user_by_username(RESERVED_ADMIN_USERNAME)
        .await
        .is_some()
    {
        return Err(ApiError::Conflict("admin user".to_string()));
    }

    let user = state.repo.create_admin(&payload.password).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// get_user
///
/// [Admin Route] Retrieves a single user by ID.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = UserOut),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserOut>> {
    auth.require_admin()?;
    let user = state
        .repo
        .get_user(id)
        .await
        .ok_or(ApiError::NotFound("user not found"))?;
    Ok(Json(user.into()))
}

/// patch_user
///
/// [Authenticated Route] Partial update of a user record.
///
/// *Authorization*: permitted for the record owner or an admin; a non-admin
/// can never set `is_admin`, including on their own record. The reserved
/// admin account can never be demoted (422).
#[utoipa::path(
    patch,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserOut),
        (status = 403, description = "Not owner / escalation attempt"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Username or email already exists"),
        (status = 422, description = "Reserved admin protection")
    )
)]
pub async fn patch_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserOut>> {
    auth.authorize_update(id, &patch)?;
    let user = state.repo.update_user(id, patch).await?;
    Ok(Json(user.into()))
}

/// delete_user
///
/// [Admin Route] Removes a user. The reserved admin account is protected (422).
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Reserved admin protection")
    )
)]
pub async fn delete_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require_admin()?;
    state.repo.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
