use blog_portal::{
    AppState,
    auth::SessionStore,
    config::{AppConfig, Env},
    create_router,
    credentials::{Argon2Hasher, HasherState},
    repository::{MemoryRepository, RepositoryState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point, responsible for initializing all core
/// components: configuration, logging, state, and the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & environment loading.
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging filter setup. RUST_LOG wins; otherwise sensible defaults
    // for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blog_portal=debug,tower_http=info,axum=trace".into());

    // 3. Initialize logging based on environment: pretty output locally,
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

    // 4. State assembly: the in-memory relational store, the session
    // store, and the Argon2 credential hasher.
    let repo = Arc::new(MemoryRepository::new()) as RepositoryState;
    let sessions = SessionStore::new();
    let hasher = Arc::new(Argon2Hasher::new()) as HasherState;

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo,
        sessions,
        hasher,
        config,
    };

    // 5. Router and server startup.
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind listener");

    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await.expect("server error");
}
