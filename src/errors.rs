use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::fmt;

/// Methods accepted by the webhook endpoint, as advertised in `Allow`.
pub const ALLOWED_METHODS: &str = "GET, POST";

/// Application-specific error types.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// A required input field is missing or unusable.
    Validation(String),
    /// The HTTP verb is not supported by the endpoint.
    MethodNotAllowed,
    /// Kommo answered the lead fetch with a non-success status.
    UpstreamFetch {
        /// HTTP status returned by Kommo.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// The Conversions API rejected the event.
    UpstreamSubmit {
        /// HTTP status returned by the Graph API.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// Network failures, malformed responses and anything else.
    Unexpected(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            AppError::UpstreamFetch { status, body } => {
                write!(f, "Kommo lead fetch failed with status {}: {}", status, body)
            }
            AppError::UpstreamSubmit { status, body } => {
                write!(f, "Conversions API rejected event with status {}: {}", status, body)
            }
            AppError::Unexpected(msg) => write!(f, "Unexpected error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Upstream bodies are echoed as JSON when they parse, otherwise as text.
fn upstream_detail(body: &str) -> Value {
    serde_json::from_str::<Value>(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Client mistakes map to 4xx; every downstream failure maps to 500 with
    /// the upstream detail attached so the webhook sender can see what broke.
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(msg) => {
                tracing::warn!("Rejected webhook: {}", msg);
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            AppError::MethodNotAllowed => {
                tracing::warn!("Rejected webhook: method not allowed");
                let mut response = (
                    StatusCode::METHOD_NOT_ALLOWED,
                    Json(json!({ "error": "Method Not Allowed" })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
                return response;
            }
            AppError::UpstreamFetch { status, body } => {
                tracing::error!("Kommo API error {}: {}", status, body);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": upstream_detail(body),
                        "upstream": "kommo",
                        "status": status,
                    }),
                )
            }
            AppError::UpstreamSubmit { status, body } => {
                tracing::error!("Conversions API error {}: {}", status, body);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": upstream_detail(body),
                        "upstream": "facebook",
                        "status": status,
                    }),
                )
            }
            AppError::Unexpected(msg) => {
                tracing::error!("Unexpected error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
        };

        (status, Json(body)).into_response()
    }
}
