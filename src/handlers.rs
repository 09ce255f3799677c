use crate::capi_client::ConversionsClient;
use crate::config::Config;
use crate::errors::AppError;
use crate::kommo_client::KommoClient;
use crate::kommo_models::LeadNotification;
use crate::relay::{self, RequestMeta};
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Plain-text answer to `GET` on the webhook endpoint.
pub const LIVENESS_MESSAGE: &str = "Kommo to Meta CAPI relay is running";

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Client for the Kommo API.
    pub kommo: KommoClient,
    /// Client for the Meta Conversions API.
    pub capi: ConversionsClient,
}

impl AppState {
    /// Builds both upstream clients from the configuration.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let timeout = Duration::from_secs(config.http_timeout_secs);

        let kommo = KommoClient::new(
            config.kommo_base_url.clone(),
            config.kommo_access_token.clone(),
            timeout,
        )?;

        let capi = ConversionsClient::new(
            config.facebook_graph_url.clone(),
            config.facebook_api_version.clone(),
            config.facebook_pixel_id.clone(),
            config.facebook_access_token.clone(),
            timeout,
        )?;

        Ok(Self {
            config,
            kommo,
            capi,
        })
    }
}

/// Body of a successful relay.
#[derive(Debug, Serialize)]
pub struct RelayResponse {
    pub success: bool,
}

/// Health check endpoint.
///
/// Returns the service status and version. Makes no outbound calls.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "kommo-capi-relay",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET on the webhook endpoint
pub async fn liveness() -> (StatusCode, &'static str) {
    (StatusCode::OK, LIVENESS_MESSAGE)
}

/// Any verb other than GET/POST on the webhook endpoint.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Kommo lead webhook
///
/// Receives `{"object_id": ...}`, fetches the lead from Kommo and forwards a
/// hashed conversion event to the Meta Conversions API.
///
/// The body is read raw so that malformed or non-JSON payloads produce the
/// same 400 as a missing `object_id`. The remote address is optional: it is
/// only present when the server is started with connect info.
pub async fn kommo_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> Result<(StatusCode, Json<RelayResponse>), AppError> {
    tracing::info!("Received Kommo webhook");

    // 1. Parse
    let notification = LeadNotification::from_body(&body);
    let lead_id = notification.lead_id().ok_or_else(|| {
        AppError::Validation("Missing object_id in request body".to_string())
    })?;

    // 2. Request metadata for the match keys
    let meta = RequestMeta::from_request(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    // 3. Fetch → Transform → Submit
    let start = std::time::Instant::now();
    relay::relay_lead(&state, &lead_id, &meta).await?;

    tracing::info!(
        "✓ Lead {} relayed to Conversions API ({}ms)",
        lead_id,
        start.elapsed().as_millis()
    );

    Ok((StatusCode::OK, Json(RelayResponse { success: true })))
}
