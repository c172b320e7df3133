use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the ads REST backend, e.g. "https://ads.example.com".
    /// Never has a trailing slash.
    pub api_base_url: String,

    /// Blanket timeout applied to every backend request
    pub request_timeout: Duration,

    /// Minimum time a loading indicator stays visible once shown
    pub loading_min_duration: Duration,

    /// Page size used by the stats screens until the operator changes it
    pub default_page_size: u32,

    /// Operator credentials checked at login
    pub admin_username: String,
    pub admin_password: String,

    /// How many hours an operator session remains valid
    pub session_duration_hours: u64,
}

impl AppConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        let api_base_url = std::env::var("API_BASE_URL")
            .context("API_BASE_URL must be set in the environment or .env file")?
            .trim_end_matches('/')
            .to_owned();

        if api_base_url.is_empty() {
            anyhow::bail!("API_BASE_URL must not be empty");
        }

        let admin_password = std::env::var("ADMIN_PASSWORD")
            .context("ADMIN_PASSWORD must be set in the environment or .env file")?;

        if admin_password.trim().is_empty() {
            anyhow::bail!("ADMIN_PASSWORD must not be empty");
        }

        let request_timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse::<u64>()
            .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;

        let loading_min_ms = std::env::var("LOADING_MIN_DURATION_MS")
            .unwrap_or_else(|_| "300".into())
            .parse::<u64>()
            .unwrap_or(300);

        let default_page_size = std::env::var("DEFAULT_PAGE_SIZE")
            .unwrap_or_else(|_| "10".into())
            .parse::<u32>()
            .ok()
            .filter(|size| *size > 0)
            .unwrap_or(10);

        let session_duration_hours = std::env::var("SESSION_DURATION_HOURS")
            .unwrap_or_else(|_| "24".into())
            .parse::<u64>()
            .unwrap_or(24);

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
            loading_min_duration: Duration::from_millis(loading_min_ms),
            default_page_size,
            admin_username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "root".into()),
            admin_password,
            session_duration_hours,
        })
    }

    /// Configuration pointing at `api_base_url` with every other knob at its default.
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_owned(),
            request_timeout: Duration::from_secs(10),
            loading_min_duration: Duration::from_millis(300),
            default_page_size: 10,
            admin_username: "root".into(),
            admin_password: String::new(),
            session_duration_hours: 24,
        }
    }
}
