//! Upload acceptance rules and id minting.

use crate::error::{Error, Result};
use uuid::Uuid;

/// Content types accepted for upload.
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Maximum accepted image size (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Mint a new image id.
pub fn new_image_id() -> String {
    format!("img_{}", Uuid::new_v4().simple())
}

/// Validate an upload's declared content type and byte size before any
/// store is touched.
pub fn validate_upload(mime_type: &str, size: usize) -> Result<()> {
    if !ALLOWED_MIME_TYPES.contains(&mime_type) {
        return Err(Error::UnsupportedMediaType(mime_type.to_string()));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(Error::ImageTooLarge {
            size,
            max: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}

/// File extension of the original filename, dot included, or empty.
pub fn file_extension(filename: &str) -> &str {
    filename
        .rfind('.')
        .map(|idx| &filename[idx..])
        .unwrap_or("")
}

/// Object-store key for an uploaded image.
pub fn object_key(image_id: &str, original_name: &str) -> String {
    format!("images/{image_id}{}", file_extension(original_name))
}
