//! Core library for the document upload service: upload validation,
//! document storage and the HTTP routes that expose them.

pub mod config;
pub mod error;
pub mod files;
pub mod handlers;
pub mod middleware;
pub mod models;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use files::{
    DocumentManager, DocumentManagerConfig, DocumentRepository, FileValidator, UploadCandidate,
    ValidationError,
};
pub use handlers::routes::create_routes;
pub use middleware::cors::cors_layer_from_config;

use axum::{extract::DefaultBodyLimit, Router};
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub documents: DocumentManager,
}

impl AppState {
    pub fn new(documents: DocumentManager) -> Self {
        Self {
            app_name: "Profile Document Service".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            documents,
        }
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let documents = DocumentManager::in_memory(config.document_manager());
        documents.initialize().await?;
        Ok(Self::new(documents))
    }
}

pub fn create_app(state: AppState) -> Router {
    create_app_with_config(state, &AppConfig::default())
}

pub fn create_app_with_config(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new().merge(create_routes());

    router = router.layer(DefaultBodyLimit::max(config.files.max_request_body_bytes()));

    router = router.layer(TimeoutLayer::new(Duration::from_secs(
        config.server.request_timeout_seconds,
    )));

    router = router.layer(middleware::cors::cors_layer_from_config(&config.cors));

    router = router.layer(middleware::logging::logging_layer());

    router.with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
