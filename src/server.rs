use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Query, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::{
    config::AppConfig,
    error::{SentryError, SentryResult},
    handler::{RequestHandler, ScanRequest},
    model::ScanResult,
};

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<RequestHandler>,
}

// Error response
//------------------------------------------------------------------------------

pub struct ApiError(pub SentryError);

impl From<SentryError> for ApiError {
    fn from(err: SentryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            SentryError::Validation(msg) | SentryError::DecodeFailure(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            other => {
                error!(error = %other, "Scan failed");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

// Routes
//------------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ScanQuery {
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InlineScan {
    qr_data: Option<String>,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// Accepts a multipart upload with an `image` file and optional `qr_data` text, or a JSON body
// carrying `qr_data` only
async fn scan_qr(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
    req: Request,
) -> Result<Json<ScanResult>, ApiError> {
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let mut scan = if is_multipart {
        let multipart = Multipart::from_request(req, &state)
            .await
            .map_err(|e| SentryError::Validation(e.body_text()))?;
        read_multipart(multipart).await?
    } else {
        let body = Bytes::from_request(req, &state)
            .await
            .map_err(|e| SentryError::Validation(e.body_text()))?;
        read_inline(&body)?
    };
    scan.lang = query.lang;

    let result = state.handler.handle(scan).await?;
    Ok(Json(result))
}

async fn read_multipart(mut multipart: Multipart) -> SentryResult<ScanRequest> {
    let mut scan = ScanRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| SentryError::Validation(e.body_text()))? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") | Some("file") => {
                scan.image = Some(field.bytes().await.map_err(|e| SentryError::Validation(e.body_text()))?);
            }
            Some("qr_data") => {
                scan.text = Some(field.text().await.map_err(|e| SentryError::Validation(e.body_text()))?);
            }
            _ => {}
        }
    }

    Ok(scan)
}

// An empty body carries no data, which the handler rejects
fn read_inline(body: &[u8]) -> SentryResult<ScanRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ScanRequest::default());
    }

    let inline: InlineScan = serde_json::from_slice(body)
        .map_err(|e| SentryError::Validation(format!("invalid JSON body: {e}")))?;
    Ok(ScanRequest { text: inline.qr_data, ..ScanRequest::default() })
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(allowed)
}

pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/scan_qr", post(scan_qr))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.cors_allowed_origins))
        .with_state(state)
}

/// Binds the configured address and serves until ctrl-c
pub async fn serve(config: AppConfig) -> SentryResult<()> {
    let handler = RequestHandler::from_config(&config)?;
    let app = build_router(AppState { handler: Arc::new(handler) }, &config);

    let addr: SocketAddr = config
        .bind_addr()
        .parse()
        .map_err(|e| SentryError::Config(format!("invalid bind address: {e}")))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SentryError::Internal(format!("failed to bind {addr}: {e}")))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SentryError::Internal(format!("server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
