//! Outgoing message model

use std::fmt;
use std::io::Read;

use super::Attachment;

/// An email address with optional display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress {
    /// Display name (e.g., "John Doe")
    pub name: Option<String>,
    /// Email address (e.g., "john@example.com")
    pub email: String,
}

impl EmailAddress {
    /// Create a new email address with just the email
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Create a new email address with a display name
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }

    /// Parse an email address from a string like "John Doe <john@example.com>"
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        if let Some(angle_start) = s.rfind('<')
            && let Some(angle_end) = s.rfind('>')
            && angle_start < angle_end
        {
            let name = s[..angle_start].trim().trim_matches('"').trim();
            let email = s[angle_start + 1..angle_end].trim();
            return Self {
                name: if name.is_empty() {
                    None
                } else {
                    Some(name.to_string())
                },
                email: email.to_string(),
            };
        }

        Self {
            name: None,
            email: s.to_string(),
        }
    }

    /// Display name, unless missing or blank
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_name() {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => f.write_str(&self.email),
        }
    }
}

/// Text or HTML body of a message
///
/// Stream bodies are read to the end when the payload is built.
pub enum Body {
    Inline(String),
    Stream(Box<dyn Read + Send>),
}

impl Body {
    /// Wrap a reader
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// Consume the body, draining a stream if necessary
    pub fn into_string(self) -> std::io::Result<String> {
        match self {
            Self::Inline(text) => Ok(text),
            Self::Stream(mut reader) => {
                let mut text = String::new();
                reader.read_to_string(&mut text)?;
                Ok(text)
            }
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(text) => f.debug_tuple("Inline").field(text).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::Inline(s)
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Self::Inline(s.to_string())
    }
}

/// A fully assembled message ready for delivery
///
/// Recipient lists are expected to be disjoint.
#[derive(Debug)]
pub struct Message {
    pub subject: String,
    pub text_body: Option<Body>,
    pub html_body: Option<Body>,
    /// Designated sender
    pub sender: Option<EmailAddress>,
    pub reply_to: Option<EmailAddress>,
    pub to: Vec<EmailAddress>,
    pub cc: Vec<EmailAddress>,
    pub bcc: Vec<EmailAddress>,
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Create a new message builder
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }
}

/// Builder for creating Message instances
#[derive(Debug, Default)]
pub struct MessageBuilder {
    subject: String,
    text_body: Option<Body>,
    html_body: Option<Body>,
    sender: Option<EmailAddress>,
    reply_to: Option<EmailAddress>,
    to: Vec<EmailAddress>,
    cc: Vec<EmailAddress>,
    bcc: Vec<EmailAddress>,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn text(mut self, body: impl Into<Body>) -> Self {
        self.text_body = Some(body.into());
        self
    }

    pub fn html(mut self, body: impl Into<Body>) -> Self {
        self.html_body = Some(body.into());
        self
    }

    pub fn from(mut self, sender: EmailAddress) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn reply_to(mut self, reply_to: EmailAddress) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    pub fn to(mut self, to: Vec<EmailAddress>) -> Self {
        self.to = to;
        self
    }

    pub fn cc(mut self, cc: Vec<EmailAddress>) -> Self {
        self.cc = cc;
        self
    }

    pub fn bcc(mut self, bcc: Vec<EmailAddress>) -> Self {
        self.bcc = bcc;
        self
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn build(self) -> Message {
        Message {
            subject: self.subject,
            text_body: self.text_body,
            html_body: self.html_body,
            sender: self.sender,
            reply_to: self.reply_to,
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            attachments: self.attachments,
        }
    }
}
