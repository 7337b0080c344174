//! Router assembly and server startup.

use super::handlers::{
    braille_handler, process_handler, process_text_handler, root_handler, status_handler,
};
use super::types::{AppState, ServerOptions};
use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::jobs::JobStore;
use crate::pipeline::caption::VlmCaptioner;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Build the CORS layer from a comma-separated origin list.
///
/// `None`, or a list with no valid origin, allows every origin.
pub fn cors_layer(origins: Option<&str>) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();

    if parsed.is_empty() {
        if origins.is_some_and(|o| !o.trim().is_empty()) {
            warn!("CORS origins set but none are valid; allowing all origins");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        info!("CORS configured with {} allowed origin(s)", parsed.len());
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Build the API router around `state`.
pub fn create_router(state: AppState, options: &ServerOptions) -> Router {
    let static_dir = ServeDir::new(&state.config.output_dir);

    Router::new()
        .route("/", get(root_handler))
        .route("/process", post(process_handler))
        .route("/process/text", post(process_text_handler))
        .route("/braille", post(braille_handler))
        .route("/status/:file_id", get(status_handler))
        .nest_service("/static", static_dir)
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(options.max_upload_bytes))
        .layer(cors_layer(options.cors_origins.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the job store, build the captioner and serve until Ctrl+C / SIGTERM.
pub async fn serve(options: ServerOptions, config: ConversionConfig) -> Result<(), ConvertError> {
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: config.output_dir.clone(),
            source: e,
        })?;

    let jobs = JobStore::connect(&options.database_url).await?;

    let captioner = Arc::new(VlmCaptioner::new(&config));
    if options.eager_model {
        captioner.warm_up().await?;
    }

    let state = AppState::new(config, captioner, jobs);
    let app = create_router(state, &options);

    let addr = format!("{}:{}", options.host, options.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ConvertError::Internal(format!("cannot bind {addr}: {e}")))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ConvertError::Internal(format!("server error: {e}")))?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }
}
