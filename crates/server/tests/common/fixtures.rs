//! Test fixtures for requests and records.

use darkroom_core::{ImageRecord, ImageStatus, LabelValue};

/// Multipart boundary used by test requests.
pub const BOUNDARY: &str = "darkroom-test-boundary";

/// Build a multipart/form-data body with a `file` part and an optional
/// `description` part.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub fn multipart_upload_body(
    filename: &str,
    content_type: &str,
    data: &[u8],
    description: Option<&str>,
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");

    if let Some(description) = description {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"description\"\r\n\r\n");
        body.extend_from_slice(description.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// A completed (searchable) record with canonical labels.
#[allow(dead_code)]
pub fn completed_record(id: &str, labels: &[(&str, f64)]) -> ImageRecord {
    let mut record = ImageRecord::empty(id);
    record.name = format!("{id}.jpg");
    record.mime_type = "image/jpeg".to_string();
    record.uploaded_at = "2024-05-01T00:00:00Z".to_string();
    record.status = ImageStatus::Completed;
    record.labels = labels
        .iter()
        .map(|(name, confidence)| LabelValue::Canonical {
            name: name.to_string(),
            confidence: *confidence,
        })
        .collect();
    record
}
