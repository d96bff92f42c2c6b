//! Notification API transport
//!
//! One send is two sequential requests: a token from the id provider, then
//! the notification itself.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use super::api::ErrorResponse;
use super::auth::{AccessToken, AccessTokenFactory, ClientCredentialsTokenFactory};
use super::payload::build_payload;
use crate::config::{Credentials, TransportConfig};
use crate::error::{MailerError, Result};
use crate::http::{HttpClient, HttpRequest, HttpResponse, UreqHttpClient};
use crate::models::Message;
use crate::transport::{MessageTransport, SentMessage};

/// Transport delivering messages through `POST /v1/notifications`
pub struct NotificationApiTransport {
    credentials: Credentials,
    config: TransportConfig,
    http: Arc<dyn HttpClient>,
    token_factory: Arc<dyn AccessTokenFactory>,
}

impl NotificationApiTransport {
    /// Create a transport with a ureq client built from the config
    pub fn new(credentials: Credentials, config: TransportConfig) -> Result<Self> {
        let http = Arc::new(UreqHttpClient::new(config.verify_host, config.timeout));
        Self::with_http_client(credentials, config, http)
    }

    /// Create a transport on a given HTTP client
    ///
    /// The client-credentials token factory shares the same client.
    pub fn with_http_client(
        credentials: Credentials,
        config: TransportConfig,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self> {
        let token_factory = Arc::new(
            ClientCredentialsTokenFactory::new(http.clone())
                .with_token_endpoint(config.token_endpoint.as_str())
                .with_scope(config.scope.as_str()),
        );
        Self::with_collaborators(credentials, config, http, token_factory)
    }

    /// Create a transport with every collaborator injected
    ///
    /// # Errors
    /// * `MissingCredentials` - client id or secret is blank
    /// * `InvalidOption` - the token endpoint is not an absolute URL
    pub fn with_collaborators(
        credentials: Credentials,
        config: TransportConfig,
        http: Arc<dyn HttpClient>,
        token_factory: Arc<dyn AccessTokenFactory>,
    ) -> Result<Self> {
        if !credentials.is_complete() {
            return Err(MailerError::MissingCredentials);
        }

        if url::Url::parse(&config.token_endpoint).is_err() {
            return Err(MailerError::invalid_option(
                "tokenEndpoint",
                config.token_endpoint.as_str(),
            ));
        }

        Ok(Self {
            credentials,
            config,
            http,
            token_factory,
        })
    }

    /// `host[:port]` the notifications are posted to
    pub fn endpoint(&self) -> String {
        self.config.endpoint()
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn access_token(&self) -> Result<AccessToken> {
        self.token_factory.create(&self.credentials)
    }
}

impl MessageTransport for NotificationApiTransport {
    fn send(&self, message: Message) -> Result<SentMessage> {
        let url = self.config.notifications_url();
        let token = self.access_token()?;

        let payload = build_payload(message)?;
        let body = serde_json::to_value(&payload).map_err(|source| MailerError::SendTransport {
            source: Box::new(source),
        })?;

        debug!("Posting notification to {}", url);

        let request = HttpRequest::json(url.as_str(), body).bearer_auth(token.as_str());
        let response = self
            .http
            .post(&request)
            .map_err(|source| MailerError::SendTransport {
                source: Box::new(source),
            })?;

        if !response.is_success() {
            return Err(MailerError::SendHttp {
                message: error_message(&response, &url),
                response,
            });
        }

        let content: serde_json::Value =
            response
                .json()
                .map_err(|source| MailerError::SendTransport {
                    source: Box::new(source),
                })?;

        info!("Mail sent to notification-api ({})", self);
        debug!("notification-api response: {}", content);

        Ok(SentMessage {
            body: content,
            response,
        })
    }
}

impl fmt::Display for NotificationApiTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "notification-api+api//{}", self.endpoint())
    }
}

impl fmt::Debug for NotificationApiTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationApiTransport")
            .field("credentials", &self.credentials)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Upstream `error` field, or a generic description of the failed request
fn error_message(response: &HttpResponse, url: &str) -> String {
    let fallback = || format!("HTTP {} returned for \"{}\"", response.status, url);

    match response.json::<ErrorResponse>() {
        Ok(ErrorResponse {
            error: Some(serde_json::Value::String(message)),
        }) => message,
        Ok(ErrorResponse {
            error: Some(other),
        }) => other.to_string(),
        Ok(ErrorResponse { error: None }) => fallback(),
        Err(e) => {
            warn!("Could not decode notification-api error body: {}", e);
            fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedHttpClient;
    use crate::models::EmailAddress;
    use std::error::Error;

    const TOKEN: &str = r#"{"access_token":"abc123"}"#;

    fn transport(http: Arc<ScriptedHttpClient>) -> NotificationApiTransport {
        NotificationApiTransport::with_http_client(
            Credentials::new("mailer", "s3cret"),
            TransportConfig::default(),
            http,
        )
        .unwrap()
    }

    fn message() -> Message {
        Message::builder()
            .subject("Meeting")
            .text("See you at 10")
            .from(EmailAddress::new("noreply@example.com"))
            .to(vec![EmailAddress::with_name("Kari", "kari@example.com")])
            .build()
    }

    #[test]
    fn test_send_uses_bearer_token() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .respond(200, TOKEN)
                .respond(201, r#"{"id":"n-1"}"#),
        );

        let sent = transport(http.clone()).send(message()).unwrap();
        assert_eq!(sent.status(), 201);
        assert_eq!(sent.body["id"], "n-1");

        let requests = http.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, crate::config::DEFAULT_TOKEN_ENDPOINT);

        let notification = &requests[1];
        assert_eq!(
            notification.url,
            "https://api.meldinger.fagforbundet.no/v1/notifications"
        );
        assert_eq!(notification.bearer_token.as_deref(), Some("abc123"));
        let body = notification.json_body().unwrap();
        assert_eq!(body["email"]["subject"], "Meeting");
        assert_eq!(body["email"]["content"]["text"], "See you at 10");
    }

    #[test]
    fn test_token_failure_skips_notification() {
        let http = Arc::new(ScriptedHttpClient::new().respond(500, "boom"));

        let err = transport(http.clone()).send(message()).unwrap_err();
        assert!(matches!(err, MailerError::AuthProtocol { .. }));
        assert_eq!(http.requests().len(), 1);
    }

    #[test]
    fn test_upstream_error_field_is_surfaced() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .respond(200, TOKEN)
                .respond(422, r#"{"error":"invalid_recipient"}"#),
        );

        let err = transport(http).send(message()).unwrap_err();
        assert!(err.to_string().contains("invalid_recipient"));
        assert_eq!(err.status(), Some(422));
        assert_eq!(
            err.response().map(|r| r.body.as_str()),
            Some(r#"{"error":"invalid_recipient"}"#)
        );
    }

    #[test]
    fn test_non_json_error_falls_back_to_generic_message() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .respond(200, TOKEN)
                .respond(502, "<html>Bad Gateway</html>"),
        );

        let err = transport(http).send(message()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to send email: HTTP 502 returned for \"https://api.meldinger.fagforbundet.no/v1/notifications\""
        );
    }

    #[test]
    fn test_structured_error_field_is_serialized() {
        let response = HttpResponse::new(400, r#"{"error":{"code":7}}"#);
        assert_eq!(error_message(&response, "u"), r#"{"code":7}"#);

        let response = HttpResponse::new(400, r#"{"message":"nope"}"#);
        assert_eq!(error_message(&response, "u"), "HTTP 400 returned for \"u\"");
    }

    #[test]
    fn test_network_failure_is_send_transport() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .respond(200, TOKEN)
                .fail(std::io::ErrorKind::ConnectionReset),
        );

        let err = transport(http).send(message()).unwrap_err();
        assert!(matches!(err, MailerError::SendTransport { .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_undecodable_success_body_is_send_transport() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .respond(200, TOKEN)
                .respond(200, "accepted"),
        );

        let err = transport(http).send(message()).unwrap_err();
        assert!(matches!(err, MailerError::SendTransport { .. }));
    }

    #[test]
    fn test_missing_credentials_fail_at_construction() {
        let err = NotificationApiTransport::with_http_client(
            Credentials::new("mailer", ""),
            TransportConfig::default(),
            Arc::new(ScriptedHttpClient::new()),
        )
        .unwrap_err();

        assert!(matches!(err, MailerError::MissingCredentials));
    }

    #[test]
    fn test_invalid_token_endpoint_fails_at_construction() {
        let config = TransportConfig {
            token_endpoint: "not a url".to_string(),
            ..Default::default()
        };
        let err = NotificationApiTransport::with_http_client(
            Credentials::new("mailer", "s3cret"),
            config,
            Arc::new(ScriptedHttpClient::new()),
        )
        .unwrap_err();

        assert!(matches!(err, MailerError::InvalidOption { ref option, .. } if option == "tokenEndpoint"));
    }

    #[test]
    fn test_display() {
        let http = Arc::new(ScriptedHttpClient::new());
        assert_eq!(
            transport(http.clone()).to_string(),
            "notification-api+api//api.meldinger.fagforbundet.no"
        );

        let config = TransportConfig {
            host: Some("localhost".to_string()),
            port: Some(8080),
            ..Default::default()
        };
        let transport = NotificationApiTransport::with_http_client(
            Credentials::new("mailer", "s3cret"),
            config,
            http,
        )
        .unwrap();
        assert_eq!(transport.to_string(), "notification-api+api//localhost:8080");
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let debug = format!("{:?}", transport(Arc::new(ScriptedHttpClient::new())));
        assert!(!debug.contains("s3cret"));
    }
}
