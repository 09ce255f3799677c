const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";
const DEFAULT_GRAPH_API_VERSION: &str = "v14.0";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub kommo_access_token: String,
    /// Base URL of the Kommo account, e.g. `https://acme.kommo.com`.
    pub kommo_base_url: String,
    pub facebook_access_token: String,
    pub facebook_pixel_id: String,
    pub facebook_graph_url: String,
    pub facebook_api_version: String,
    pub event_name: String,
    /// Kommo custom field holding the lead's phone number.
    pub phone_field_id: String,
    /// Kommo custom field holding the Meta click identifier (fbc).
    pub fbc_field_id: String,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// `from_env` passes the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            lookup(key)
                .ok_or_else(|| anyhow::anyhow!("{} environment variable required", key))
                .and_then(|value| {
                    if value.trim().is_empty() {
                        anyhow::bail!("{} cannot be empty", key);
                    }
                    Ok(value.trim().to_string())
                })
        };
        let optional = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let kommo_subdomain = required("KOMMO_SUBDOMAIN")?;
        let kommo_base_url = match optional("KOMMO_BASE_URL") {
            Some(url) => validate_base_url("KOMMO_BASE_URL", &url)?,
            None => validate_base_url(
                "KOMMO_SUBDOMAIN",
                &format!("https://{}.kommo.com", kommo_subdomain),
            )?,
        };

        let config = Self {
            port: optional("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .trim()
                .parse()
                .ok()
                .filter(|port: &u16| *port > 0)
                .ok_or_else(|| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            kommo_access_token: required("KOMMO_ACCESS_TOKEN")?,
            kommo_base_url,
            facebook_access_token: required("FACEBOOK_ACCESS_TOKEN")?,
            facebook_pixel_id: required("FACEBOOK_PIXEL_ID")?,
            facebook_graph_url: validate_base_url(
                "FACEBOOK_GRAPH_URL",
                &optional("FACEBOOK_GRAPH_URL").unwrap_or_else(|| DEFAULT_GRAPH_URL.to_string()),
            )?,
            facebook_api_version: optional("FACEBOOK_API_VERSION")
                .map(|v| v.trim().trim_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GRAPH_API_VERSION.to_string()),
            event_name: required("EVENT_NAME")?,
            phone_field_id: required("PHONE_FIELD_ID")?,
            fbc_field_id: required("FBC_FIELD_ID")?,
            http_timeout_secs: optional("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .trim()
                .parse()
                .ok()
                .filter(|secs: &u64| *secs > 0)
                .ok_or_else(|| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a positive integer"))?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Kommo Base URL: {}", config.kommo_base_url);
        tracing::debug!(
            "Graph URL: {}/{}",
            config.facebook_graph_url,
            config.facebook_api_version
        );
        tracing::debug!(
            "Event: {}, phone field: {}, fbc field: {}",
            config.event_name,
            config.phone_field_id,
            config.fbc_field_id
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

/// Checks that `raw` is an absolute http(s) URL and strips any trailing slash.
fn validate_base_url(key: &str, raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL ({}): {}", key, trimmed, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", key);
    }
    if parsed.host_str().is_none() {
        anyhow::bail!("{} must include a host", key);
    }
    Ok(trimmed.to_string())
}
