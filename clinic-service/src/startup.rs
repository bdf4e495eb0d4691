//! Application startup and lifecycle management.

use axum::{
    http::Uri,
    middleware,
    response::Redirect,
    routing::{any, get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ClinicConfig;
use crate::handlers;
use crate::services::{ClinicStore, Database};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ClinicConfig,
    pub store: Arc<dyn ClinicStore>,
}

impl AppState {
    pub fn new(config: ClinicConfig, store: Arc<dyn ClinicStore>) -> Self {
        Self { config, store }
    }
}

/// Build the HTTP router: the public API plus health, readiness and metrics.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list_clinics))
        .route("/c/:clinica/", get(handlers::list_specialties))
        .route("/c/:clinica/:especialidade/", get(handlers::list_doctors))
        .route("/a/:clinica/registar/", post(handlers::book_appointment))
        .route("/a/:clinica/cancelar/", post(handlers::cancel_appointment))
        .route("/c/:clinica", any(append_trailing_slash))
        .route("/c/:clinica/:especialidade", any(append_trailing_slash))
        .route("/a/:clinica/registar", any(append_trailing_slash))
        .route("/a/:clinica/cancelar", any(append_trailing_slash))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");

            tracing::info_span!(
                "http_request",
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
            )
        }))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Permanent redirect to the same path with a trailing slash, query kept.
/// `308` so a redirected `POST` stays a `POST`.
async fn append_trailing_slash(uri: Uri) -> Redirect {
    let target = match uri.query() {
        Some(query) => format!("{}/?{}", uri.path(), query),
        None => format!("{}/", uri.path()),
    };
    Redirect::permanent(&target)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    db: Arc<Database>,
    state: AppState,
}

impl Application {
    /// Build the application, running migrations when the configuration asks for it.
    pub async fn build(config: ClinicConfig) -> Result<Self, AppError> {
        let run_migrations = config.database.run_migrations;
        Self::build_internal(config, run_migrations).await
    }

    /// Build the application without running migrations.
    /// Use this in tests when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: ClinicConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: ClinicConfig, run_migrations: bool) -> Result<Self, AppError> {
        let db = Database::new(&config.database).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let db = Arc::new(db);
        let state = AppState::new(config.clone(), db.clone());

        let http_addr = config.common.socket_addr();
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %http_addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!(http_port = http_port, "Clinic service listener bound");

        Ok(Self {
            http_port,
            http_listener,
            db,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        tracing::info!(
            service = "clinic-service",
            version = env!("CARGO_PKG_VERSION"),
            http_port = self.http_port,
            "Service ready to accept connections"
        );

        axum::serve(self.http_listener, router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
