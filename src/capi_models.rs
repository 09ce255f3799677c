use crate::kommo_models::LeadId;
use serde::{Deserialize, Serialize};

/// Every event is reported as originating from the website form.
pub const ACTION_SOURCE_WEBSITE: &str = "website";

/// Server event for the Meta Conversions API
/// Documentation: https://developers.facebook.com/docs/marketing-api/conversions-api/parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionEvent {
    pub event_name: String,

    /// Unix timestamp in seconds
    pub event_time: i64,

    pub action_source: String,

    pub user_data: UserData,
}

/// Customer information parameters.
///
/// Absent values serialize as explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    /// SHA-256 of the normalized phone digits
    pub ph: Option<String>,

    /// Click identifier, sent unhashed
    pub fbc: Option<String>,

    pub client_user_agent: Option<String>,

    pub client_ip_address: Option<String>,

    /// Kommo lead id
    pub external_id: LeadId,
}

/// Body of `POST /{version}/{pixel_id}/events`
#[derive(Debug, Serialize)]
pub struct EventsRequest<'a> {
    pub data: Vec<ConversionEvent>,
    pub access_token: &'a str,
}

/// Successful Graph API answer, e.g. `{"events_received": 1, "fbtrace_id": "..."}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub events_received: Option<u64>,

    #[serde(default)]
    pub fbtrace_id: Option<String>,
}
