//! Error taxonomy for token acquisition, sending and transport construction
//!
//! Every variant is terminal for the send attempt that produced it. Variants
//! that wrap a lower-level failure expose it through `source()`.

use thiserror::Error;

use crate::http::{HttpError, HttpResponse};

/// Result alias used throughout the crate
pub type Result<T, E = MailerError> = std::result::Result<T, E>;

/// Errors produced by the notification mailer
#[derive(Debug, Error)]
pub enum MailerError {
    /// The token endpoint could not be reached (DNS, TLS, timeout, reset)
    #[error("Unable to contact id provider")]
    AuthTransport {
        #[source]
        source: HttpError,
    },

    /// The token endpoint answered, but not with a usable token
    #[error("Unable to contact id provider: {reason}")]
    AuthProtocol {
        reason: String,
        response: Option<HttpResponse>,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The notification request failed below HTTP, or its 2xx body was not JSON
    #[error("Unable to send email")]
    SendTransport {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The notification endpoint answered with a non-2xx status
    #[error("Unable to send email: {message}")]
    SendHttp {
        message: String,
        response: HttpResponse,
    },

    /// A streamed message body could not be read
    #[error("Unable to read message body")]
    MessageBody {
        #[source]
        source: std::io::Error,
    },

    #[error("The \"{scheme}\" scheme is not supported; supported schemes are: {supported}")]
    UnsupportedScheme { scheme: String, supported: String },

    #[error("Invalid mailer DSN: {reason}")]
    InvalidDsn {
        reason: String,
        #[source]
        source: Option<url::ParseError>,
    },

    #[error("A client id and a client secret are required")]
    MissingCredentials,

    #[error("Invalid value \"{value}\" for option \"{option}\"")]
    InvalidOption { option: String, value: String },
}

impl MailerError {
    /// Upstream HTTP status, when the failure carried a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthProtocol {
                response: Some(response),
                ..
            } => Some(response.status),
            Self::SendHttp { response, .. } => Some(response.status),
            _ => None,
        }
    }

    /// Raw upstream response, when the failure carried one
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Self::AuthProtocol { response, .. } => response.as_ref(),
            Self::SendHttp { response, .. } => Some(response),
            _ => None,
        }
    }

    pub(crate) fn invalid_dsn(reason: impl Into<String>) -> Self {
        Self::InvalidDsn {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn invalid_option(option: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            value: value.into(),
        }
    }
}
