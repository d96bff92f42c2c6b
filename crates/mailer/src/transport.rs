//! Transport abstraction handed to the host mailer

use crate::error::Result;
use crate::http::HttpResponse;
use crate::models::Message;

/// Something that can deliver a message
///
/// Implementations are stateless between sends and can be shared across
/// threads.
pub trait MessageTransport: Send + Sync {
    /// Deliver a single message
    fn send(&self, message: Message) -> Result<SentMessage>;
}

/// Outcome of a successful delivery
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Decoded response body
    pub body: serde_json::Value,
    /// Raw upstream response
    pub response: HttpResponse,
}

impl SentMessage {
    pub fn status(&self) -> u16 {
        self.response.status
    }
}
