//! HTTP server for line recognition.

use crate::config::ServerConfig;
use crate::ocr::{
    BatchOcrRequest, BatchOcrResponse, OcrEngine, OcrRequest, OcrResponse, SharedOcrEngine,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use line_ocr::core::OCRError;
use line_ocr::pipeline::ImageSource;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Application state shared across handlers
struct AppState {
    engine: SharedOcrEngine,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Run the HTTP server
pub async fn run_server(
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Initializing recognizer...");
    let ocr_config = config.ocr.clone();
    let engine = tokio::task::spawn_blocking(move || OcrEngine::new(&ocr_config)).await??;
    let engine = Arc::new(engine);
    info!("Recognizer initialized successfully");

    let state = Arc::new(AppState { engine });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/ocr", post(ocr_handler))
        .route("/ocr/batch", post(batch_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    info!("Server listening on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /health     - Health check");
    info!("  POST /ocr        - Recognize one base64 image");
    info!("  POST /ocr/batch  - Recognize several base64 images");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Health check endpoint
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Status code for a failed single-image request
fn status_for(err: &OCRError) -> StatusCode {
    match err {
        OCRError::InvalidImageKind { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Single image endpoint
async fn ocr_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OcrRequest>,
) -> impl IntoResponse {
    let request_id = uuid::Uuid::new_v4().to_string();
    info!(
        request_id = %request_id,
        payload_bytes = request.image.len(),
        "Processing OCR request"
    );

    let start = Instant::now();
    let engine = Arc::clone(&state.engine);
    let source = ImageSource::base64(request_id.clone(), request.image);

    let outcome = match tokio::task::spawn_blocking(move || engine.process_one(&source)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Recognition task panicked");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(OcrResponse::error("Recognition task failed".to_string())),
            );
        }
    };
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let status = match &outcome.result {
        Ok(line) => {
            info!(
                request_id = %request_id,
                chars = line.text.chars().count(),
                total_ms = elapsed_ms,
                "OCR completed"
            );
            StatusCode::OK
        }
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "OCR request failed");
            status_for(e)
        }
    };

    (
        status,
        Json(OcrResponse::from_outcome(&outcome).with_time(elapsed_ms)),
    )
}

/// Batch endpoint; per-image failures are reported inline
async fn batch_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchOcrRequest>,
) -> impl IntoResponse {
    let request_id = uuid::Uuid::new_v4().to_string();
    info!(
        request_id = %request_id,
        images = request.images.len(),
        "Processing batch OCR request"
    );

    if request.images.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(BatchOcrResponse::error("No images provided".to_string())),
        );
    }

    let start = Instant::now();
    let engine = Arc::clone(&state.engine);
    let sources: Vec<ImageSource> = request
        .images
        .into_iter()
        .enumerate()
        .map(|(idx, data)| ImageSource::base64(idx.to_string(), data))
        .collect();

    let (outcomes, summary) =
        match tokio::task::spawn_blocking(move || engine.process(&sources)).await {
            Ok(result) => result,
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Batch task panicked");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(BatchOcrResponse::error("Recognition task failed".to_string())),
                );
            }
        };
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    info!(
        request_id = %request_id,
        succeeded = summary.succeeded,
        failed = summary.failed,
        total_ms = elapsed_ms,
        "Batch OCR completed"
    );

    (
        StatusCode::OK,
        Json(BatchOcrResponse::from_outcomes(&outcomes, summary, elapsed_ms)),
    )
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
