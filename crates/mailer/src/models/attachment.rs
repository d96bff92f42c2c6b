//! File attachments
//!
//! The file name is not stored on its own: like a MIME part, an attachment
//! carries a `Content-Disposition` value and the name is read from its
//! `filename` (or RFC 2231 `filename*`) parameter.

use std::fmt;

use mailparse::DispositionType;

/// A file attached to a message
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    content_disposition: Option<String>,
    media_type: String,
    media_subtype: String,
    content: Vec<u8>,
}

impl Attachment {
    /// Create an attachment with an `attachment; filename="..."` disposition
    ///
    /// Names with quotes, semicolons or non-ASCII characters are written as
    /// an RFC 2231 `filename*` parameter instead.
    ///
    /// # Arguments
    /// * `file_name` - Name presented to the recipient
    /// * `content_type` - MIME type such as "application/pdf"; parameters are ignored
    /// * `content` - Raw bytes
    pub fn new(file_name: &str, content_type: &str, content: Vec<u8>) -> Self {
        let disposition = if is_plain_file_name(file_name) {
            format!("attachment; filename=\"{}\"", file_name)
        } else {
            format!(
                "attachment; filename*=UTF-8''{}",
                urlencoding::encode(file_name)
            )
        };
        Self::from_parts(Some(disposition), content_type, content)
    }

    /// Create an attachment from a raw `Content-Disposition` value
    pub fn from_parts(
        content_disposition: Option<String>,
        content_type: &str,
        content: Vec<u8>,
    ) -> Self {
        let (media_type, media_subtype) = split_content_type(content_type);
        Self {
            content_disposition,
            media_type,
            media_subtype,
            content,
        }
    }

    pub fn content_disposition(&self) -> Option<&str> {
        self.content_disposition.as_deref()
    }

    /// File name from the disposition, empty if absent or malformed
    pub fn file_name(&self) -> String {
        self.content_disposition
            .as_deref()
            .and_then(filename_from_disposition)
            .unwrap_or_default()
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn media_subtype(&self) -> &str {
        &self.media_subtype
    }

    /// "<mediaType>/<mediaSubtype>"
    pub fn content_type(&self) -> String {
        format!("{}/{}", self.media_type, self.media_subtype)
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("content_disposition", &self.content_disposition)
            .field("content_type", &self.content_type())
            .field("size", &self.content.len())
            .finish()
    }
}

/// Split "type/subtype; params" into lowercase type and subtype
///
/// Anything unparseable is treated as application/octet-stream.
fn split_content_type(content_type: &str) -> (String, String) {
    if !content_type.trim().is_empty() {
        let parsed = mailparse::parse_content_type(content_type);
        if let Some((media_type, subtype)) = parsed.mimetype.split_once('/')
            && !media_type.trim().is_empty()
            && !subtype.trim().is_empty()
        {
            return (
                media_type.trim().to_ascii_lowercase(),
                subtype.trim().to_ascii_lowercase(),
            );
        }
    }

    ("application".to_string(), "octet-stream".to_string())
}

/// Extract the file name from a `Content-Disposition` value
///
/// RFC 2231 `filename*` parameters, continuations and charsets included.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let parsed = mailparse::parse_content_disposition(value);

    // Disposition type must be a bare token
    if let DispositionType::Extension(kind) = &parsed.disposition
        && (kind.is_empty() || kind.contains('='))
    {
        return None;
    }

    parsed
        .params
        .get("filename")
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Whether a name can go into a quoted `filename="..."` as is
fn is_plain_file_name(name: &str) -> bool {
    name.chars()
        .all(|c| (c.is_ascii_graphic() || c == ' ') && !matches!(c, '"' | '\\' | ';'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_round_trips_file_name() {
        let attachment = Attachment::new("report.pdf", "application/pdf", b"%PDF".to_vec());
        assert_eq!(attachment.file_name(), "report.pdf");
        assert_eq!(attachment.content_type(), "application/pdf");
        assert_eq!(attachment.content(), b"%PDF");
    }

    #[test]
    fn test_new_escapes_quotes() {
        let attachment = Attachment::new("say \"hi\".txt", "text/plain", Vec::new());
        assert_eq!(attachment.file_name(), "say \"hi\".txt");
    }

    #[test]
    fn test_content_type_parameters_are_dropped() {
        let attachment = Attachment::from_parts(None, "Text/Plain; charset=utf-8", Vec::new());
        assert_eq!(attachment.media_type(), "text");
        assert_eq!(attachment.media_subtype(), "plain");
    }

    #[test]
    fn test_malformed_content_type_falls_back() {
        let attachment = Attachment::from_parts(None, "garbage", Vec::new());
        assert_eq!(attachment.content_type(), "application/octet-stream");
    }

    #[test]
    fn test_missing_disposition_gives_empty_name() {
        let attachment = Attachment::from_parts(None, "image/png", Vec::new());
        assert_eq!(attachment.file_name(), "");
    }

    #[test]
    fn test_filename_unquoted_token() {
        assert_eq!(
            filename_from_disposition("inline; filename=logo.png"),
            Some("logo.png".to_string())
        );
    }

    #[test]
    fn test_new_encodes_non_ascii_names() {
        let attachment = Attachment::new("møtereferat; utkast.pdf", "application/pdf", Vec::new());
        assert!(attachment.content_disposition().unwrap().contains("filename*=UTF-8''"));
        assert_eq!(attachment.file_name(), "møtereferat; utkast.pdf");
    }

    #[test]
    fn test_extended_filename() {
        assert_eq!(
            filename_from_disposition("attachment; filename*=UTF-8''na%C3%AFve%20file.txt"),
            Some("naïve file.txt".to_string())
        );
    }

    #[test]
    fn test_extended_filename_in_latin1() {
        assert_eq!(
            filename_from_disposition("attachment; filename*=iso-8859-1''caf%E9.txt"),
            Some("café.txt".to_string())
        );
    }

    #[test]
    fn test_filename_continuations() {
        let attachment = Attachment::from_parts(
            Some("attachment; filename*0=\"quarterly-\"; filename*1=\"report.pdf\"".to_string()),
            "application/pdf",
            Vec::new(),
        );
        assert_eq!(attachment.file_name(), "quarterly-report.pdf");
    }

    #[test]
    fn test_malformed_dispositions() {
        assert_eq!(filename_from_disposition(""), None);
        assert_eq!(filename_from_disposition("filename=x.txt"), None);
        assert_eq!(filename_from_disposition("attachment"), None);
        assert_eq!(filename_from_disposition("attachment; filename=\"\""), None);
    }
}
