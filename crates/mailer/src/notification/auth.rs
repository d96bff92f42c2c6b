//! OAuth2 client-credentials token acquisition
//!
//! Every call mints a fresh token; nothing is cached or persisted.

use std::fmt;
use std::sync::Arc;

use log::debug;

use super::api::TokenResponse;
use crate::config::{Credentials, DEFAULT_SCOPE, DEFAULT_TOKEN_ENDPOINT};
use crate::error::{MailerError, Result};
use crate::http::{HttpClient, HttpRequest};

/// Bearer token valid for the request it was fetched for
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Source of access tokens for the transport
pub trait AccessTokenFactory: Send + Sync {
    /// Exchange credentials for a bearer token
    fn create(&self, credentials: &Credentials) -> Result<AccessToken>;
}

/// Token factory performing the client-credentials grant over HTTP
pub struct ClientCredentialsTokenFactory {
    http: Arc<dyn HttpClient>,
    token_endpoint: String,
    scope: String,
}

impl ClientCredentialsTokenFactory {
    /// Create a factory using the default endpoint and scope
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }

    pub fn with_token_endpoint(mut self, token_endpoint: impl Into<String>) -> Self {
        self.token_endpoint = token_endpoint.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl AccessTokenFactory for ClientCredentialsTokenFactory {
    fn create(&self, credentials: &Credentials) -> Result<AccessToken> {
        let request = HttpRequest::form(
            self.token_endpoint.as_str(),
            [
                ("grant_type", "client_credentials"),
                ("scope", self.scope.as_str()),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
            ],
        );

        debug!(
            "Requesting access token from {} for client {}",
            self.token_endpoint, credentials.client_id
        );

        let response = self
            .http
            .post(&request)
            .map_err(|source| MailerError::AuthTransport { source })?;

        if !response.is_success() {
            return Err(MailerError::AuthProtocol {
                reason: format!(
                    "HTTP {} returned for \"{}\"",
                    response.status, self.token_endpoint
                ),
                response: Some(response),
                source: None,
            });
        }

        let token = match response.json::<TokenResponse>() {
            Ok(token) => token,
            Err(source) => {
                return Err(MailerError::AuthProtocol {
                    reason: "invalid token response".to_string(),
                    response: Some(response),
                    source: Some(source),
                });
            }
        };

        if token.access_token.is_empty() {
            return Err(MailerError::AuthProtocol {
                reason: "empty access token".to_string(),
                response: Some(response),
                source: None,
            });
        }

        Ok(AccessToken::new(token.access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedHttpClient;
    use std::error::Error;

    fn creds() -> Credentials {
        Credentials::new("mailer", "s3cret")
    }

    #[test]
    fn test_token_request_form() {
        let http = Arc::new(ScriptedHttpClient::new().respond(200, r#"{"access_token":"abc123"}"#));
        let factory = ClientCredentialsTokenFactory::new(http.clone());

        let token = factory.create(&creds()).unwrap();
        assert_eq!(token.as_str(), "abc123");

        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.url, DEFAULT_TOKEN_ENDPOINT);
        assert_eq!(request.form_field("grant_type"), Some("client_credentials"));
        assert_eq!(request.form_field("scope"), Some(DEFAULT_SCOPE));
        assert_eq!(request.form_field("client_id"), Some("mailer"));
        assert_eq!(request.form_field("client_secret"), Some("s3cret"));
        assert!(request.bearer_token.is_none());
    }

    #[test]
    fn test_custom_endpoint_and_scope() {
        let http = Arc::new(ScriptedHttpClient::new().respond(200, r#"{"access_token":"t"}"#));
        let factory = ClientCredentialsTokenFactory::new(http.clone())
            .with_token_endpoint("https://id.example.com/token")
            .with_scope("notifications.send");

        factory.create(&creds()).unwrap();

        let request = &http.requests()[0];
        assert_eq!(request.url, "https://id.example.com/token");
        assert_eq!(request.form_field("scope"), Some("notifications.send"));
    }

    #[test]
    fn test_each_call_requests_a_new_token() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .respond(200, r#"{"access_token":"one"}"#)
                .respond(200, r#"{"access_token":"two"}"#),
        );
        let factory = ClientCredentialsTokenFactory::new(http.clone());

        assert_eq!(factory.create(&creds()).unwrap().as_str(), "one");
        assert_eq!(factory.create(&creds()).unwrap().as_str(), "two");
        assert_eq!(http.requests().len(), 2);
    }

    #[test]
    fn test_transport_failure() {
        let http = Arc::new(ScriptedHttpClient::new().fail(std::io::ErrorKind::TimedOut));
        let factory = ClientCredentialsTokenFactory::new(http);

        let err = factory.create(&creds()).unwrap_err();
        assert!(matches!(err, MailerError::AuthTransport { .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_non_success_status() {
        let http = Arc::new(ScriptedHttpClient::new().respond(401, r#"{"error":"invalid_client"}"#));
        let factory = ClientCredentialsTokenFactory::new(http);

        let err = factory.create(&creds()).unwrap_err();
        assert!(matches!(err, MailerError::AuthProtocol { .. }));
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_malformed_json() {
        let http = Arc::new(ScriptedHttpClient::new().respond(200, "<html>oops</html>"));
        let factory = ClientCredentialsTokenFactory::new(http);

        let err = factory.create(&creds()).unwrap_err();
        assert!(matches!(err, MailerError::AuthProtocol { source: Some(_), .. }));
    }

    #[test]
    fn test_missing_access_token() {
        let http = Arc::new(ScriptedHttpClient::new().respond(200, r#"{"token_type":"Bearer"}"#));
        let factory = ClientCredentialsTokenFactory::new(http);

        let err = factory.create(&creds()).unwrap_err();
        assert!(matches!(err, MailerError::AuthProtocol { .. }));
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        assert_eq!(format!("{:?}", AccessToken::new("abc123")), "AccessToken(<redacted>)");
    }
}
