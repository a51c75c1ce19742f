use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    error::ApiError,
    models::RESERVED_ADMIN_USERNAME,
    repository::{PostgresUserRepository, RepositoryState, UserRepository},
};

/// ensure_admin
///
/// Startup bootstrap: creates the reserved 'admin' account if it does not
/// exist yet. A `Conflict` from the insert means another replica created it
/// between our lookup and the insert; that race is expected and tolerated.
async fn ensure_admin(repo: &RepositoryState, config: &AppConfig) {
    if repo
        .get_user_by_username(RESERVED_ADMIN_USERNAME)
        .await
        .is_some()
    {
        tracing::info!("reserved admin account already present");
        return;
    }

    match repo.create_admin(&config.admin_password).await {
        Ok(user) => tracing::info!(id = %user.id, "created reserved admin account"),
        Err(ApiError::Conflict(_)) => {
            tracing::info!("reserved admin account created concurrently")
        }
        Err(e) => panic!("FATAL: failed to bootstrap admin account: {e}"),
    }
}

/// The asynchronous entry point, responsible for initializing configuration,
/// logging, the database, the admin bootstrap, and the HTTP server.
#[tokio::main]
async fn main() {
    // Configuration & environment loading (fail-fast on missing prod secrets).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // Logging filter: RUST_LOG wins, with sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "user_portal=debug,tower_http=info,axum=trace".into());

    // Log format is selected by environment: pretty for humans locally,
    // JSON for log aggregators in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // Database initialization.
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("FATAL: failed to run database migrations");

    let repo = Arc::new(PostgresUserRepository::new(pool)) as RepositoryState;

    // The reserved admin account must exist before the first request.
    ensure_admin(&repo, &config).await;

    let app_state = AppState { repo, config };
    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("FATAL: failed to bind 0.0.0.0:3000");

    tracing::info!("Listening on 0.0.0.0:3000");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:3000/swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: server error");
}
