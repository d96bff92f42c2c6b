//! Blocking HTTP client seam
//!
//! All upstream calls go through the [`HttpClient`] trait so the token
//! factory and the transport can share one client, and so tests can script
//! responses. Uses synchronous HTTP (ureq) to be executor-agnostic.

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use ureq::Agent;
use ureq::tls::TlsConfig;

/// Failure below the HTTP layer: the request never produced a status line
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("POST {url} failed")]
    Request {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("POST {url} failed: I/O error")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

impl HttpError {
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. } | Self::Io { url, .. } => url,
        }
    }
}

/// Body of an outgoing POST
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// `application/json`
    Json(serde_json::Value),
}

/// An outgoing POST request
///
/// Not `Debug`: form bodies and bearer tokens carry secrets.
#[derive(Clone)]
pub struct HttpRequest {
    pub url: String,
    pub bearer_token: Option<String>,
    pub body: RequestBody,
}

impl HttpRequest {
    /// Form-encoded POST
    pub fn form<K, V>(url: impl Into<String>, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            url: url.into(),
            bearer_token: None,
            body: RequestBody::Form(
                fields
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// JSON POST
    pub fn json(url: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            bearer_token: None,
            body: RequestBody::Json(value),
        }
    }

    /// Attach `Authorization: Bearer <token>`
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Look up a form field by name
    pub fn form_field(&self, name: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Form(fields) => fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            RequestBody::Json(_) => None,
        }
    }

    /// The JSON body, if this is a JSON request
    pub fn json_body(&self) -> Option<&serde_json::Value> {
        match &self.body {
            RequestBody::Json(value) => Some(value),
            RequestBody::Form(_) => None,
        }
    }
}

/// A received response, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// Minimal blocking HTTP client
///
/// Implementations return non-2xx statuses as `Ok` responses and reserve
/// `Err` for transport-level failures.
pub trait HttpClient: Send + Sync {
    fn post(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// [`HttpClient`] backed by a ureq agent
pub struct UreqHttpClient {
    agent: Agent,
}

impl UreqHttpClient {
    /// Create a client
    ///
    /// # Arguments
    /// * `verify_host` - Verify the server's TLS certificate and host name
    /// * `timeout` - Overall deadline per request (None = no deadline)
    pub fn new(verify_host: bool, timeout: Option<Duration>) -> Self {
        let tls = TlsConfig::builder()
            .disable_verification(!verify_host)
            .build();

        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .tls_config(tls)
            .build();

        Self {
            agent: Agent::new_with_config(config),
        }
    }
}

impl Default for UreqHttpClient {
    fn default() -> Self {
        Self::new(true, None)
    }
}

impl HttpClient for UreqHttpClient {
    fn post(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = self.agent.post(&request.url);

        if let Some(token) = &request.bearer_token {
            builder = builder.header("Authorization", &format!("Bearer {}", token));
        }

        let result = match &request.body {
            RequestBody::Form(fields) => {
                builder.send_form(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            }
            RequestBody::Json(value) => builder.send_json(value),
        };

        let mut response = result.map_err(|source| HttpError::Request {
            url: request.url.clone(),
            source,
        })?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|source| HttpError::Request {
                url: request.url.clone(),
                source,
            })?;

        Ok(HttpResponse { status, body })
    }
}
