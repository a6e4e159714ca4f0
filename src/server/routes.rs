use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures_util::StreamExt;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::server::api::{self, ApiError, ValidationErrorResponse};
use crate::server::stream::{search_event_stream, NDJSON_CONTENT_TYPE};

pub struct HttpResponse {
    pub status_code: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn json(body: String) -> Self {
        Self {
            status_code: 200,
            content_type: "application/json",
            body,
        }
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

pub fn error_response(status_code: u16, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "status": "error", "message": message });
    HttpResponse {
        status_code,
        content_type: "application/json",
        body: serde_json::to_string_pretty(&body).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"message\":\"internal error\"}".to_string()
        }),
    }
}

fn validation_error_response(response: &ValidationErrorResponse) -> HttpResponse {
    match serde_json::to_string_pretty(response) {
        Ok(body) => HttpResponse {
            status_code: 400,
            content_type: "application/json",
            body,
        },
        Err(err) => error_response(500, &err.to_string()),
    }
}

impl From<ApiError> for HttpResponse {
    fn from(err: ApiError) -> Self {
        match &err {
            ApiError::Validation(response) => validation_error_response(response),
            other => {
                if other.status_code() >= 500 {
                    tracing::error!(error = %other, "request failed");
                }
                error_response(other.status_code(), &other.to_string())
            }
        }
    }
}

fn payload_response<E>(payload: Result<String, E>) -> HttpResponse
where
    E: Into<ApiError>,
{
    match payload {
        Ok(body) => HttpResponse::json(body),
        Err(err) => {
            let err: ApiError = err.into();
            HttpResponse::from(err)
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/catalog", get(catalog))
        .route("/api/single-match", post(single_match))
        .route("/api/train", post(train))
        .route("/api/full-search", post(full_search))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> HttpResponse {
    payload_response(api::health_payload())
}

async fn catalog() -> HttpResponse {
    payload_response(api::catalog_payload())
}

async fn single_match(body: String) -> HttpResponse {
    payload_response(api::single_match_payload(&body))
}

async fn train(body: String) -> HttpResponse {
    let payload = tokio::task::spawn_blocking(move || api::train_payload(&body))
        .await
        .unwrap_or_else(|err| Err(ApiError::Join(err.to_string())));
    payload_response(payload)
}

async fn full_search(State(state): State<AppState>, body: String) -> Response {
    let config = match api::parse_search_request(&body, state.config.max_workers) {
        Ok(config) => config,
        Err(err) => return HttpResponse::from(err).into_response(),
    };
    let lines = search_event_stream(config).map(|event| event.encode_line());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(lines))
        .unwrap_or_else(|err| error_response(500, &err.to_string()).into_response())
}

async fn not_found() -> HttpResponse {
    error_response(404, "Not Found")
}
