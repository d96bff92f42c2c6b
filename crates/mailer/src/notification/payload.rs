//! Message → notification request projection
//!
//! Pure apart from draining stream bodies: no network I/O happens here.

use std::collections::HashSet;

use base64::prelude::*;

use super::api::{
    AttachmentPayload, ContentPayload, EmailPayload, NotificationRequest, RecipientPayload,
    RecipientsPayload,
};
use crate::error::{MailerError, Result};
use crate::models::{Attachment, Body, EmailAddress, Message};

/// Build the JSON request body for a message
///
/// Consumes the message; stream bodies are read to the end.
pub fn build_payload(message: Message) -> Result<NotificationRequest> {
    let Message {
        subject,
        text_body,
        html_body,
        sender,
        reply_to,
        to,
        cc,
        bcc,
        attachments,
    } = message;

    let text = drain(text_body)?;
    let html = drain(html_body)?;
    let content = if text.is_some() || html.is_some() {
        Some(ContentPayload { text, html })
    } else {
        None
    };

    Ok(NotificationRequest {
        email: EmailPayload {
            content,
            subject,
            from: sender.map(recipient_payload),
            reply_to: reply_to.map(|address| address.email),
            recipients: recipients_payload(to, cc, bcc),
            attachments: attachments.iter().map(attachment_payload).collect(),
        },
    })
}

/// Read a body into a string; empty bodies count as absent
fn drain(body: Option<Body>) -> Result<Option<String>> {
    let Some(body) = body else {
        return Ok(None);
    };
    let text = body
        .into_string()
        .map_err(|source| MailerError::MessageBody { source })?;

    Ok(Some(text).filter(|text| !text.is_empty()))
}

/// Assign every address exactly one role
///
/// An address listed under several roles keeps the most private one
/// (bcc, then cc, then to). Emails compare case-insensitively.
fn recipients_payload(
    to: Vec<EmailAddress>,
    cc: Vec<EmailAddress>,
    bcc: Vec<EmailAddress>,
) -> RecipientsPayload {
    let mut seen = HashSet::new();

    let bcc = take_unseen(bcc, &mut seen);
    let cc = take_unseen(cc, &mut seen);
    let to = take_unseen(to, &mut seen);

    RecipientsPayload { to, cc, bcc }
}

fn take_unseen(addresses: Vec<EmailAddress>, seen: &mut HashSet<String>) -> Vec<RecipientPayload> {
    addresses
        .into_iter()
        .filter(|address| seen.insert(address.email.to_ascii_lowercase()))
        .map(recipient_payload)
        .collect()
}

fn recipient_payload(address: EmailAddress) -> RecipientPayload {
    RecipientPayload {
        name: address.display_name().map(str::to_string),
        email: address.email,
    }
}

fn attachment_payload(attachment: &Attachment) -> AttachmentPayload {
    AttachmentPayload {
        file_name: attachment.file_name(),
        content_type: attachment.content_type(),
        content: BASE64_STANDARD.encode(attachment.content()),
    }
}
