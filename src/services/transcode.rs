//! Binary-to-text conversion between fetched blobs and base64 storage payloads.

use crate::error::TranscodeError;
use crate::services::fetch::Blob;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode a blob as `data:<mime>;base64,<payload>`
pub fn blob_to_data_url(blob: &Blob) -> String {
    format!("data:{};base64,{}", blob.mime_type, encode_base64(&blob.data))
}

/// Pure base64 payload of a data URL (the text after the first ',')
pub fn strip_data_url_prefix(data_url: &str) -> Result<&str, TranscodeError> {
    match data_url.split(',').nth(1) {
        Some(payload) if !payload.is_empty() => Ok(payload),
        _ => Err(TranscodeError::EmptyPayload),
    }
}

pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn decode_base64(text: &str) -> Result<Vec<u8>, TranscodeError> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| TranscodeError::InvalidBase64 {
            details: e.to_string(),
        })
}
