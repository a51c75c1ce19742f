//! Contract tests for the repository layer, run against the in-memory
//! implementation. Both backends promise the same invariants; these pin the
//! observable behavior handlers depend on.

use user_portal::{
    ApiError, MemoryUserRepository,
    models::{CreateUserRequest, UpdateUserRequest},
    repository::UserRepository,
};
use uuid::Uuid;

fn new_user(username: &str, email: &str) -> CreateUserRequest {
    CreateUserRequest {
        username: username.to_string(),
        email: email.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        password: "pw-123456".to_string(),
        is_admin: false,
    }
}

#[tokio::test]
async fn password_is_stored_hashed() {
    let repo = MemoryUserRepository::new();
    let user = repo
        .create_user(new_user("alice", "alice@example.com"))
        .await
        .unwrap();
    assert_ne!(user.password, "pw-123456");
    assert!(user.password.starts_with("$argon2"));
}

#[tokio::test]
async fn conflict_names_field_and_leaves_first_intact() {
    let repo = MemoryUserRepository::new();
    let first = repo
        .create_user(new_user("alice", "alice@example.com"))
        .await
        .unwrap();

    let err = repo
        .create_user(new_user("alice", "alice2@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(ref f) if f == "username"));

    let err = repo
        .create_user(new_user("alice2", "alice@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(ref f) if f == "email"));

    let intact = repo.get_user(first.id).await.unwrap();
    assert_eq!(intact.email, "alice@example.com");
    assert_eq!(repo.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn authenticate_never_distinguishes_failure_modes() {
    let repo = MemoryUserRepository::new();
    repo.create_user(new_user("alice", "alice@example.com"))
        .await
        .unwrap();

    assert!(repo.authenticate("alice", "pw-123456").await.is_some());
    // Wrong password and unknown username are the same `None`.
    assert!(repo.authenticate("alice", "wrong").await.is_none());
    assert!(repo.authenticate("nobody", "pw-123456").await.is_none());
}

#[tokio::test]
async fn lookups_return_none_for_absent_rows() {
    let repo = MemoryUserRepository::new();
    assert!(repo.get_user(Uuid::new_v4()).await.is_none());
    assert!(repo.get_user_by_username("ghost").await.is_none());
    assert!(repo.get_user_by_email("ghost@example.com").await.is_none());
}

#[tokio::test]
async fn update_applies_only_present_fields() {
    let repo = MemoryUserRepository::new();
    let user = repo
        .create_user(new_user("alice", "alice@example.com"))
        .await
        .unwrap();

    let updated = repo
        .update_user(
            user.id,
            UpdateUserRequest {
                last_name: Some("Changed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.last_name, "Changed");
    // Everything not in the patch is untouched, not reset.
    assert_eq!(updated.username, "alice");
    assert_eq!(updated.email, "alice@example.com");
    assert_eq!(updated.first_name, "Test");
    assert_eq!(updated.password, user.password);
    assert_eq!(updated.created_at, user.created_at);
}

#[tokio::test]
async fn update_rehashes_a_supplied_password() {
    let repo = MemoryUserRepository::new();
    let user = repo
        .create_user(new_user("alice", "alice@example.com"))
        .await
        .unwrap();

    let updated = repo
        .update_user(
            user.id,
            UpdateUserRequest {
                password: Some("pw-changed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_ne!(updated.password, "pw-changed");
    assert_ne!(updated.password, user.password);
    assert!(repo.authenticate("alice", "pw-changed").await.is_some());
    assert!(repo.authenticate("alice", "pw-123456").await.is_none());
}

#[tokio::test]
async fn update_unknown_user_is_not_found() {
    let repo = MemoryUserRepository::new();
    let err = repo
        .update_user(Uuid::new_v4(), UpdateUserRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn reserved_admin_is_permanent() {
    let repo = MemoryUserRepository::new();
    let admin = repo.create_admin("root-pw-1").await.unwrap();
    assert!(admin.is_admin);

    // Demotion is rejected before any mutation.
    let err = repo
        .update_user(
            admin.id,
            UpdateUserRequest {
                is_admin: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvariantViolation(_)));

    // Renaming would detach the protection key; also rejected.
    let err = repo
        .update_user(
            admin.id,
            UpdateUserRequest {
                username: Some("root".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvariantViolation(_)));

    let err = repo.delete_user(admin.id).await.unwrap_err();
    assert!(matches!(err, ApiError::InvariantViolation(_)));

    // Other fields remain freely updatable, including re-asserting is_admin.
    let updated = repo
        .update_user(
            admin.id,
            UpdateUserRequest {
                is_admin: Some(true),
                first_name: Some("Root".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.first_name, "Root");
}

#[tokio::test]
async fn create_admin_twice_is_a_conflict() {
    let repo = MemoryUserRepository::new();
    repo.create_admin("root-pw-1").await.unwrap();

    let err = repo.create_admin("root-pw-2").await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test]
async fn listing_is_ordered_and_windowed() {
    let repo = MemoryUserRepository::new();
    for name in ["carol", "alice", "bob"] {
        repo.create_user(new_user(name, &format!("{name}@example.com")))
            .await
            .unwrap();
    }

    let all = repo.list_users(0, 10).await.unwrap();
    let names: Vec<&str> = all.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob", "carol"]);

    let window = repo.list_users(1, 1).await.unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].username, "bob");

    assert_eq!(repo.count_users().await.unwrap(), 3);
}

#[tokio::test]
async fn delete_removes_exactly_one_row() {
    let repo = MemoryUserRepository::new();
    let a = repo
        .create_user(new_user("alice", "alice@example.com"))
        .await
        .unwrap();
    repo.create_user(new_user("bob", "bob@example.com"))
        .await
        .unwrap();

    repo.delete_user(a.id).await.unwrap();
    assert!(repo.get_user(a.id).await.is_none());
    assert_eq!(repo.count_users().await.unwrap(), 1);

    let err = repo.delete_user(a.id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
