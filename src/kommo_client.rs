use crate::errors::AppError;
use crate::kommo_models::{Lead, LeadId};
use reqwest::{StatusCode, Url};
use std::time::Duration;

/// Client for the Kommo API v4.
#[derive(Clone)]
pub struct KommoClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl KommoClient {
    /// Creates a new `KommoClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Account URL, e.g. `https://acme.kommo.com`.
    /// * `token` - Long-lived access token.
    /// * `timeout` - Per-request timeout.
    pub fn new(base_url: String, token: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Unexpected(format!("Failed to create Kommo client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// `{base_url}/api/v4/leads/{lead_id}`, with the id percent-encoded as a
    /// single path segment.
    pub fn lead_url(&self, lead_id: &LeadId) -> Result<Url, AppError> {
        let id = lead_id.to_string();
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Unexpected(format!("Invalid Kommo base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Unexpected("Kommo base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["api", "v4", "leads", id.as_str()]);
        Ok(url)
    }

    /// Gets a lead from Kommo.
    ///
    /// Any non-success status, and `204 No Content` (Kommo's answer for an
    /// unknown lead), become [`AppError::UpstreamFetch`].
    pub async fn get_lead(&self, lead_id: &LeadId) -> Result<Lead, AppError> {
        let url = self.lead_url(lead_id)?;
        tracing::info!("Fetching lead {} from Kommo", lead_id);
        tracing::debug!("Kommo URL: {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::Unexpected(format!("Kommo request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::UpstreamFetch {
                status: status.as_u16(),
                body: error_text,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Err(AppError::UpstreamFetch {
                status: status.as_u16(),
                body: format!("Lead {} not found", lead_id),
            });
        }

        let lead: Lead = response.json().await.map_err(|e| {
            AppError::Unexpected(format!("Failed to parse Kommo lead response: {}", e))
        })?;

        tracing::debug!(
            "✓ Lead {} fetched ({} custom fields)",
            lead_id,
            lead.custom_fields().len()
        );
        Ok(lead)
    }
}
