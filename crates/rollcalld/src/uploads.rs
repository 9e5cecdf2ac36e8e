//! Saving registration photos to the image directory.

use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Reduce `raw` to characters safe in a single path component.
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `<name>_<filename>`, both sanitized.
pub fn stored_file_name(student_name: &str, file_name: &str) -> String {
    format!(
        "{}_{}",
        sanitize_component(student_name),
        sanitize_component(file_name)
    )
}

/// Reject uploads that are not a recognizable image format.
pub fn check_image(bytes: &[u8]) -> Result<(), AppError> {
    image::guess_format(bytes)
        .map(|format| tracing::debug!(?format, "upload format"))
        .map_err(|_| AppError::validation("Uploaded file is not a supported image"))
}

/// Write an upload into `dir`, replacing any file of the same name.
pub async fn save(
    dir: &Path,
    student_name: &str,
    file_name: &str,
    bytes: &[u8],
) -> Result<PathBuf, AppError> {
    let path = dir.join(stored_file_name(student_name, file_name));
    tokio::fs::write(&path, bytes).await?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "upload saved");
    Ok(path)
}

/// Best-effort removal of an upload that will not be registered.
pub async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove rejected upload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("Alice"), "Alice");
        assert_eq!(sanitize_component("class photo.jpg"), "class_photo.jpg");
        assert_eq!(sanitize_component("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_component("..hidden"), "hidden");
        assert_eq!(sanitize_component(""), "upload");
        assert_eq!(sanitize_component("Zoë"), "Zo_");
    }

    #[test]
    fn test_stored_file_name() {
        assert_eq!(stored_file_name("Alice", "a.jpg"), "Alice_a.jpg");
        assert_eq!(stored_file_name("Mary Ann", "me/face.png"), "Mary_Ann_me_face.png");
    }

    #[test]
    fn test_check_image() {
        assert!(check_image(PNG_MAGIC).is_ok());
        assert!(check_image(&[0xff, 0xd8, 0xff, 0xe0, 0, 0x10]).is_ok());
        assert!(check_image(b"just some text").is_err());
        assert!(check_image(&[]).is_err());
    }

    #[tokio::test]
    async fn test_save_and_discard() {
        let dir = tempfile::tempdir().unwrap();
        let path = save(dir.path(), "Alice", "a.png", PNG_MAGIC).await.unwrap();
        assert_eq!(path, dir.path().join("Alice_a.png"));
        assert_eq!(std::fs::read(&path).unwrap(), PNG_MAGIC);

        discard(&path).await;
        assert!(!path.exists());
    }
}
