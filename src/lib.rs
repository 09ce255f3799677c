//! Kommo → Meta Conversions API lead relay.
//!
//! Receives Kommo lead webhooks, fetches the lead, hashes its phone number and
//! forwards a conversion event to the Meta Conversions API.
//!
//! # Modules
//!
//! - `capi_client`: Conversions API client.
//! - `capi_models`: Conversion event payloads.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and shared state.
//! - `kommo_client`: Kommo API client.
//! - `kommo_models`: Webhook notification and lead models.
//! - `pii`: Phone normalization and hashing.
//! - `relay`: Fetch → transform → submit pipeline.

pub mod capi_client;
pub mod capi_models;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod kommo_client;
pub mod kommo_models;
pub mod pii;
pub mod relay;

use axum::{
    routing::{get, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::handlers::AppState;

/// Maximum accepted webhook body (1 MiB).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builds the HTTP application.
///
/// The webhook is served at `/` and at `/api/kommo-webhook`; `/health` is a
/// JSON health check.
pub fn app(state: Arc<AppState>) -> Router {
    let webhook: MethodRouter<Arc<AppState>> = get(handlers::liveness)
        .post(handlers::kommo_webhook)
        .fallback(handlers::method_not_allowed);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", webhook.clone())
        .route("/api/kommo-webhook", webhook)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
