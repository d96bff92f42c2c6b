//! Credentials and transport configuration
//!
//! Credentials can be loaded from (in order of priority):
//! 1. JSON file in the config directory (`credentials.json`)
//! 2. Runtime environment variables

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Credentials filename in the config directory
const CREDENTIALS_FILE: &str = "credentials.json";

const CLIENT_ID_VAR: &str = "NOTIFICATION_API_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "NOTIFICATION_API_CLIENT_SECRET";

/// Default notification API host
pub const DEFAULT_HOST: &str = "api.meldinger.fagforbundet.no";

/// Default OAuth2 token endpoint
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://api.id.fagforbundet.no/v1/oauth/token";

/// Default OAuth2 scope requested for sending
pub const DEFAULT_SCOPE: &str = "notifications.send notifications.emails.send_raw";

/// OAuth2 client credentials for the notification API
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Both halves present and non-blank
    pub fn is_complete(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }

    /// Load credentials from the config file, falling back to the environment
    pub fn load() -> Result<Self> {
        if config::config_exists(CREDENTIALS_FILE) {
            return config::load_json(CREDENTIALS_FILE);
        }

        Self::from_env()
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse credentials from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse credentials JSON")
    }

    /// Load credentials from environment variables
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var(CLIENT_ID_VAR)
            .with_context(|| format!("{} environment variable not set", CLIENT_ID_VAR))?;
        let client_secret = std::env::var(CLIENT_SECRET_VAR)
            .with_context(|| format!("{} environment variable not set", CLIENT_SECRET_VAR))?;

        Ok(Self {
            client_id,
            client_secret,
        })
    }

    /// Get the default credentials file path
    pub fn default_credentials_path() -> Option<PathBuf> {
        config::config_path(CREDENTIALS_FILE)
    }

    /// Check if credentials are available (file or env vars)
    pub fn is_available() -> bool {
        config::config_exists(CREDENTIALS_FILE)
            || (std::env::var(CLIENT_ID_VAR).is_ok() && std::env::var(CLIENT_SECRET_VAR).is_ok())
    }
}

/// Settings for a [`NotificationApiTransport`](crate::NotificationApiTransport)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Notification API host; None uses [`DEFAULT_HOST`]
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Verify TLS certificates and host names
    pub verify_host: bool,
    pub token_endpoint: String,
    pub scope: String,
    /// Per-request deadline enforced by the HTTP client
    pub timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            verify_host: true,
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            timeout: None,
        }
    }
}

impl TransportConfig {
    /// `host[:port]`, with the default host when none is configured
    pub fn endpoint(&self) -> String {
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        match self.port {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Full URL of the notification endpoint
    pub fn notifications_url(&self) -> String {
        format!("https://{}/v1/notifications", self.endpoint())
    }
}
