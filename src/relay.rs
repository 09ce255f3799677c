//! Lead relay pipeline shared by the webhook handlers
//!
//! 1. Fetch the lead from Kommo
//! 2. Build the conversion event (hash phone, pass fbc through, attach request metadata)
//! 3. Submit the event to the Conversions API
//!
//! Each step returns `Result<_, AppError>`; the first failure ends the run and
//! later steps are never attempted.

use crate::capi_models::{ConversionEvent, EventsResponse, UserData, ACTION_SOURCE_WEBSITE};
use crate::config::Config;
use crate::errors::AppError;
use crate::handlers::AppState;
use crate::kommo_models::{Lead, LeadId};
use crate::pii::hash_phone;
use axum::http::{header, HeaderMap};
use std::net::SocketAddr;

/// Client details captured from the inbound webhook request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMeta {
    pub user_agent: Option<String>,
    pub client_ip: Option<String>,
}

impl RequestMeta {
    /// User agent from `User-Agent`; client IP from the first `X-Forwarded-For`
    /// entry, falling back to the socket's remote address.
    pub fn from_request(headers: &HeaderMap, remote: Option<SocketAddr>) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let forwarded_ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string);

        let client_ip = forwarded_ip.or_else(|| remote.map(|addr| addr.ip().to_string()));

        Self {
            user_agent,
            client_ip,
        }
    }
}

/// Step 1: fetch the lead detail record.
pub async fn fetch_lead(state: &AppState, lead_id: &LeadId) -> Result<Lead, AppError> {
    state.kommo.get_lead(lead_id).await
}

/// Step 2: derive the privacy-safe event.
///
/// Pure apart from `event_time`, which the caller supplies.
pub fn build_event(
    config: &Config,
    lead_id: &LeadId,
    lead: &Lead,
    meta: &RequestMeta,
    event_time: i64,
) -> ConversionEvent {
    let ph = hash_phone(&lead.phone(&config.phone_field_id));
    let fbc = lead.fbc(&config.fbc_field_id);

    tracing::debug!(
        "Lead {}: phone hashed={}, fbc present={}",
        lead_id,
        ph.is_some(),
        fbc.is_some()
    );

    ConversionEvent {
        event_name: config.event_name.clone(),
        event_time,
        action_source: ACTION_SOURCE_WEBSITE.to_string(),
        user_data: UserData {
            ph,
            fbc,
            client_user_agent: meta.user_agent.clone(),
            client_ip_address: meta.client_ip.clone(),
            external_id: lead_id.clone(),
        },
    }
}

/// Step 3: submit the event.
pub async fn submit_event(
    state: &AppState,
    event: ConversionEvent,
) -> Result<EventsResponse, AppError> {
    state.capi.send_event(event).await
}

/// Runs the whole pipeline for one lead.
pub async fn relay_lead(
    state: &AppState,
    lead_id: &LeadId,
    meta: &RequestMeta,
) -> Result<EventsResponse, AppError> {
    let lead = fetch_lead(state, lead_id).await?;
    let event = build_event(
        &state.config,
        lead_id,
        &lead,
        meta,
        chrono::Utc::now().timestamp(),
    );
    submit_event(state, event).await
}
