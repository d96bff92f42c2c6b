//! Notification API integration
//!
//! This module provides:
//! - OAuth2 client-credentials token acquisition
//! - Payload construction from a [`Message`](crate::Message)
//! - The HTTP transport and its DSN-driven factory

mod auth;
mod client;
mod factory;
mod payload;

pub use auth::{AccessToken, AccessTokenFactory, ClientCredentialsTokenFactory};
pub use client::NotificationApiTransport;
pub use factory::NotificationApiTransportFactory;
pub use payload::build_payload;

/// Notification API wire types (contract v1: fields nested under `email`)
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Top-level request body for `POST /v1/notifications`
    #[derive(Debug, Serialize)]
    pub struct NotificationRequest {
        pub email: EmailPayload,
    }

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EmailPayload {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub content: Option<ContentPayload>,
        pub subject: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub from: Option<RecipientPayload>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub reply_to: Option<String>,
        pub recipients: RecipientsPayload,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub attachments: Vec<AttachmentPayload>,
    }

    /// Message bodies; at least one is set whenever this is emitted
    #[derive(Debug, Serialize)]
    pub struct ContentPayload {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub text: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub html: Option<String>,
    }

    #[derive(Debug, Serialize)]
    pub struct RecipientPayload {
        pub email: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
    }

    #[derive(Debug, Default, Serialize)]
    pub struct RecipientsPayload {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub to: Vec<RecipientPayload>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub cc: Vec<RecipientPayload>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub bcc: Vec<RecipientPayload>,
    }

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AttachmentPayload {
        pub file_name: String,
        pub content_type: String,
        /// Base64 (standard alphabet, padded)
        pub content: String,
    }

    /// Response from the token endpoint
    #[derive(Debug, Deserialize)]
    pub struct TokenResponse {
        pub access_token: String,
    }

    /// Error body returned by the notification API
    #[derive(Debug, Deserialize)]
    pub struct ErrorResponse {
        pub error: Option<serde_json::Value>,
    }
}
