use crate::capi_models::{ConversionEvent, EventsRequest, EventsResponse};
use crate::errors::AppError;
use reqwest::Url;
use std::time::Duration;

/// Client for the Meta Conversions API.
///
/// The access token travels in the JSON body (`access_token`), one of the two
/// request-parameter placements the Graph API accepts.
#[derive(Clone)]
pub struct ConversionsClient {
    client: reqwest::Client,
    graph_url: String,
    api_version: String,
    pixel_id: String,
    access_token: String,
}

impl ConversionsClient {
    /// Creates a new `ConversionsClient`.
    ///
    /// # Arguments
    ///
    /// * `graph_url` - Graph API host, normally `https://graph.facebook.com`.
    /// * `api_version` - Version segment, e.g. `v14.0`.
    /// * `pixel_id` - Dataset (pixel) receiving the events.
    /// * `access_token` - System user access token.
    /// * `timeout` - Per-request timeout.
    pub fn new(
        graph_url: String,
        api_version: String,
        pixel_id: String,
        access_token: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::Unexpected(format!("Failed to create Conversions API client: {}", e))
            })?;

        Ok(Self {
            client,
            graph_url,
            api_version,
            pixel_id,
            access_token,
        })
    }

    /// `{graph_url}/{api_version}/{pixel_id}/events`
    pub fn events_url(&self) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.graph_url)
            .map_err(|e| AppError::Unexpected(format!("Invalid Graph API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Unexpected("Graph API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend([
                self.api_version.as_str(),
                self.pixel_id.as_str(),
                "events",
            ]);
        Ok(url)
    }

    /// Submits a single event.
    ///
    /// # Returns
    ///
    /// * `Result<EventsResponse, AppError>` - Graph API acknowledgement, or
    ///   [`AppError::UpstreamSubmit`] carrying the status and body on rejection.
    pub async fn send_event(&self, event: ConversionEvent) -> Result<EventsResponse, AppError> {
        let url = self.events_url()?;
        tracing::info!(
            "Sending {} event for lead {} to pixel {}",
            event.event_name,
            event.user_data.external_id,
            self.pixel_id
        );

        let body = EventsRequest {
            data: vec![event],
            access_token: &self.access_token,
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Unexpected(format!("Conversions API request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if !status.is_success() {
            return Err(AppError::UpstreamSubmit {
                status: status.as_u16(),
                body: response_text,
            });
        }

        // The acknowledgement is informational only
        let ack: EventsResponse = serde_json::from_str(&response_text).unwrap_or_else(|e| {
            tracing::warn!("Unexpected Conversions API response format: {}", e);
            EventsResponse::default()
        });

        tracing::info!(
            "✓ Conversions API accepted event (events_received={:?}, fbtrace_id={:?})",
            ack.events_received,
            ack.fbtrace_id
        );
        Ok(ack)
    }
}
