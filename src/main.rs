use gemimon_server::*;

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    dotenv::dotenv().ok();

    let config = config::Config::from_env();

    let catalog = match &config.catalog.path {
        Some(path) => match monsters::MonsterCatalog::load(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!("Failed to load catalog from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => monsters::MonsterCatalog::builtin(),
    };

    let commentator = combat::Commentator::from_config(&config.commentary);
    let state = app_state::AppState::new(config.clone(), catalog, commentator);

    let cors = CorsLayer::new()
        .allow_origin(cors_origins(&config.server.cors_origins))
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ws", get(handlers::ws_handler))
        .route("/starters", get(handlers::starters_handler))
        .route("/health", get(handlers::health_handler))
        .layer(cors)
        .with_state(state.clone());

    spawn_background_tasks(state.clone());

    let addr = config.server_addr();
    tracing::info!("Starting server on {}", addr);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server failed: {}", e);
    }
}

fn cors_origins(origins: &[String]) -> AllowOrigin {
    if origins.iter().any(|origin| origin == "*") {
        return AllowOrigin::any();
    }
    let parsed = origins
        .iter()
        .filter_map(|origin| match origin.parse::<axum::http::HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect::<Vec<_>>();
    AllowOrigin::list(parsed)
}

fn spawn_background_tasks(state: Arc<app_state::AppState>) {
    let sweep_interval = Duration::from_secs(state.config.sessions.sweep_interval_sec);
    let timeout = Duration::from_secs(state.config.sessions.inactive_timeout_sec);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            let removed = sessions::cleanup_inactive_sessions(&state.sessions, timeout).await;
            if removed > 0 {
                tracing::info!("Swept {} inactive sessions", removed);
            }
        }
    });
}
