//! Domain models for outgoing mail

mod attachment;
mod message;

pub use attachment::{Attachment, filename_from_disposition};
pub use message::{Body, EmailAddress, Message, MessageBuilder};
