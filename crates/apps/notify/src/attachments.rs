//! Reading attachments from disk

use std::path::Path;

use anyhow::{Context, Result};
use notification_mailer::Attachment;

/// Load a file as an attachment named after its last path component
pub fn load(path: &Path) -> Result<Attachment> {
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read attachment: {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Attachment::new(&file_name, guess_content_type(path), content))
}

/// Content type from the file extension
fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "htm" | "html" => "text/html",
        "ics" => "text/calendar",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a/report.PDF")), "application/pdf");
        assert_eq!(guess_content_type(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(guess_content_type(Path::new("Makefile")), "application/octet-stream");
        assert_eq!(guess_content_type(Path::new("data.bin")), "application/octet-stream");
    }

    #[test]
    fn test_load_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let attachment = load(&path).unwrap();
        assert_eq!(attachment.file_name(), "notes.txt");
        assert_eq!(attachment.content_type(), "text/plain");
        assert_eq!(attachment.content(), b"hello");
    }

    #[test]
    fn test_missing_file() {
        let err = load(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(format!("{}", err).contains("here.pdf"));
    }
}
