// Image uploads - turns a local image file into a data URI image reference

use base64::Engine;
use std::path::Path;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 10 MB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub const ALLOWED_IMAGE_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Map a file extension to the MIME type a browser would report for it
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

pub fn validate_image_file(mime_type: &str, size: u64, max_bytes: u64) -> AppResult<()> {
    if !ALLOWED_IMAGE_TYPES.contains(&mime_type) {
        return Err(AppError::Validation(
            "Please select a valid image file (JPEG, PNG, GIF, or WebP)".to_string(),
        ));
    }

    if size > max_bytes {
        return Err(AppError::Validation(format!(
            "Image file size must be less than {}MB",
            max_bytes / (1024 * 1024)
        )));
    }

    Ok(())
}

pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Read an image from disk and return it as a `data:` URI.
/// Type and size are checked before the contents are read.
pub async fn read_image_as_data_uri(path: impl AsRef<Path>, max_bytes: u64) -> AppResult<String> {
    let path = path.as_ref();
    let mime_type = mime_type_for(path).unwrap_or("application/octet-stream");

    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        AppError::NotFound(format!("Cannot read image {}: {}", path.display(), e))
    })?;
    validate_image_file(mime_type, metadata.len(), max_bytes)?;

    let bytes = tokio::fs::read(path).await.map_err(|e| {
        AppError::StorageError(format!("Failed to read image {}: {}", path.display(), e))
    })?;

    debug!("Encoded {} ({} bytes) as {}", path.display(), bytes.len(), mime_type);
    Ok(encode_data_uri(mime_type, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validate_image_file() {
        assert!(validate_image_file("image/png", 1024, DEFAULT_MAX_UPLOAD_BYTES).is_ok());
        assert!(validate_image_file("image/svg+xml", 1024, DEFAULT_MAX_UPLOAD_BYTES).is_err());

        let err = validate_image_file("image/jpeg", DEFAULT_MAX_UPLOAD_BYTES + 1, DEFAULT_MAX_UPLOAD_BYTES)
            .unwrap_err();
        assert_eq!(err.message(), "Image file size must be less than 10MB");
    }

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for(Path::new("a/b/cat.JPG")), Some("image/jpeg"));
        assert_eq!(mime_type_for(Path::new("sketch.webp")), Some("image/webp"));
        assert_eq!(mime_type_for(Path::new("notes.txt")), None);
        assert_eq!(mime_type_for(Path::new("no_extension")), None);
    }

    #[tokio::test]
    async fn test_read_image_as_data_uri() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dot.png");
        tokio::fs::write(&path, [0x89, b'P', b'N', b'G']).await.unwrap();

        let uri = read_image_as_data_uri(&path, DEFAULT_MAX_UPLOAD_BYTES).await.unwrap();
        assert_eq!(uri, "data:image/png;base64,iVBORw==");
    }

    #[tokio::test]
    async fn test_oversized_and_wrong_type_rejected() {
        let dir = tempdir().unwrap();
        let big = dir.path().join("big.gif");
        tokio::fs::write(&big, vec![0u8; 64]).await.unwrap();
        let text = dir.path().join("readme.txt");
        tokio::fs::write(&text, b"hello").await.unwrap();

        assert!(matches!(
            read_image_as_data_uri(&big, 32).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            read_image_as_data_uri(&text, DEFAULT_MAX_UPLOAD_BYTES).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            read_image_as_data_uri(dir.path().join("missing.png"), DEFAULT_MAX_UPLOAD_BYTES).await,
            Err(AppError::NotFound(_))
        ));
    }
}
