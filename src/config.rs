use std::env;
use std::time::Duration;

use log::warn;

use crate::error::{Error, Result};

const SERVICE_URL_VAR: &str = "PUNCHDESK_SERVICE_URL";
const HTTP_TIMEOUT_VAR: &str = "PUNCHDESK_HTTP_TIMEOUT_SECS";
const FRAME_INTERVAL_VAR: &str = "PUNCHDESK_FRAME_INTERVAL_MS";

#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint of the spreadsheet-backed data service.
    pub service_url: String,
    pub http_timeout: Duration,
    /// How often the live camera feed refreshes its latest frame.
    pub frame_interval: Duration,
}

impl Config {
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            http_timeout: Duration::from_secs(30),
            frame_interval: Duration::from_millis(200),
        }
    }

    /// Read configuration from the environment. The service URL is
    /// required; everything else falls back to defaults, with unparseable
    /// overrides ignored and logged.
    pub fn from_env() -> Result<Self> {
        let service_url = env::var(SERVICE_URL_VAR)
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Validation(format!("{SERVICE_URL_VAR} is not set")))?;

        let mut config = Self::new(service_url);
        if let Some(secs) = env_u64(HTTP_TIMEOUT_VAR) {
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = env_u64(FRAME_INTERVAL_VAR) {
            config.frame_interval = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring unparseable {name}={raw}");
            None
        }
    }
}
