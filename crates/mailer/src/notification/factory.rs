//! DSN-driven construction of [`NotificationApiTransport`]
//!
//! Supported options:
//! - `verifyHost` - verify TLS certificates (default true)
//! - `tokenEndpoint` - OAuth2 token URL
//! - `scope` - OAuth2 scope
//! - `timeout` - per-request deadline in seconds, must be positive

use std::sync::Arc;
use std::time::Duration;

use log::debug;

use super::auth::AccessTokenFactory;
use super::client::NotificationApiTransport;
use crate::config::{Credentials, TransportConfig};
use crate::dsn::Dsn;
use crate::error::{MailerError, Result};
use crate::http::{HttpClient, UreqHttpClient};

/// Builds notification API transports from mailer DSNs
#[derive(Default)]
pub struct NotificationApiTransportFactory {
    http: Option<Arc<dyn HttpClient>>,
    token_factory: Option<Arc<dyn AccessTokenFactory>>,
    fallback_credentials: Option<Credentials>,
}

impl NotificationApiTransportFactory {
    pub const SUPPORTED_SCHEMES: [&'static str; 2] = ["notification-api", "notification-api+api"];

    pub fn new() -> Self {
        Self::default()
    }

    /// Use this HTTP client instead of building one from the DSN options
    ///
    /// `verifyHost` and `timeout` are then up to the injected client.
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Use this token factory instead of the client-credentials default
    pub fn with_token_factory(mut self, token_factory: Arc<dyn AccessTokenFactory>) -> Self {
        self.token_factory = Some(token_factory);
        self
    }

    /// Credentials used when the DSN carries no user and password
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.fallback_credentials = Some(credentials);
        self
    }

    pub fn supports(&self, dsn: &Dsn) -> bool {
        Self::SUPPORTED_SCHEMES
            .iter()
            .any(|scheme| *scheme == dsn.scheme())
    }

    /// Create a transport for a DSN
    ///
    /// Configuration problems are reported here, never at send time.
    pub fn create(&self, dsn: &Dsn) -> Result<NotificationApiTransport> {
        if !self.supports(dsn) {
            return Err(MailerError::UnsupportedScheme {
                scheme: dsn.scheme().to_string(),
                supported: Self::SUPPORTED_SCHEMES
                    .iter()
                    .map(|scheme| format!("\"{}\"", scheme))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let credentials = self.credentials(dsn)?;
        let config = transport_config(dsn)?;

        debug!("Creating notification-api transport for {}", dsn);

        let http: Arc<dyn HttpClient> = match &self.http {
            Some(http) => http.clone(),
            None => Arc::new(UreqHttpClient::new(config.verify_host, config.timeout)),
        };

        match &self.token_factory {
            Some(token_factory) => NotificationApiTransport::with_collaborators(
                credentials,
                config,
                http,
                token_factory.clone(),
            ),
            None => NotificationApiTransport::with_http_client(credentials, config, http),
        }
    }

    fn credentials(&self, dsn: &Dsn) -> Result<Credentials> {
        match (dsn.user(), dsn.password()) {
            (Some(user), Some(password)) => Ok(Credentials::new(user, password)),
            (None, None) => self
                .fallback_credentials
                .clone()
                .ok_or(MailerError::MissingCredentials),
            _ => Err(MailerError::MissingCredentials),
        }
    }
}

fn transport_config(dsn: &Dsn) -> Result<TransportConfig> {
    let defaults = TransportConfig::default();

    let timeout = match dsn.option("timeout") {
        Some(raw) => {
            let seconds: f64 = raw
                .trim()
                .parse()
                .map_err(|_| MailerError::invalid_option("timeout", raw))?;
            let timeout = Duration::try_from_secs_f64(seconds)
                .ok()
                .filter(|timeout| !timeout.is_zero())
                .ok_or_else(|| MailerError::invalid_option("timeout", raw))?;
            Some(timeout)
        }
        None => None,
    };

    Ok(TransportConfig {
        host: Some(dsn.host())
            .filter(|host| *host != "default")
            .map(str::to_string),
        port: dsn.port(),
        verify_host: dsn.bool_option("verifyHost", true)?,
        token_endpoint: dsn
            .option("tokenEndpoint")
            .map(str::to_string)
            .unwrap_or(defaults.token_endpoint),
        scope: dsn
            .option("scope")
            .map(str::to_string)
            .unwrap_or(defaults.scope),
        timeout,
    })
}
