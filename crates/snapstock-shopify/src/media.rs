//! Inline image handling for staged uploads.

use base64::Engine as _;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

use crate::error::ShopifyError;

/// A decoded `data:` URL ready for staging.
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub mime_type: String,
    pub extension: String,
    pub bytes: Vec<u8>,
}

fn data_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^data:(image/\w+);base64,(.+)$").expect("data URL regex is valid")
    })
}

/// Parses an inline `data:image/...;base64,...` URL into bytes.
///
/// # Errors
///
/// Returns [`ShopifyError::InvalidImage`] when the URL does not match the
/// data-URL shape or the payload is not valid base64.
pub fn parse_data_url(url: &str) -> Result<InlineImage, ShopifyError> {
    let captures = data_url_regex()
        .captures(url)
        .ok_or_else(|| ShopifyError::InvalidImage {
            reason: "not a base64 image data URL".to_string(),
        })?;

    let mime_type = captures[1].to_string();
    let extension = mime_type
        .split('/')
        .nth(1)
        .unwrap_or("jpeg")
        .to_string();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(captures[2].as_bytes())
        .map_err(|e| ShopifyError::InvalidImage {
            reason: format!("base64 decode failed: {e}"),
        })?;

    Ok(InlineImage {
        mime_type,
        extension,
        bytes,
    })
}

/// Builds a stable staged-upload filename from the image content, so
/// re-publishing the same capture produces the same name.
#[must_use]
pub fn staged_filename(bytes: &[u8], extension: &str) -> String {
    let digest = Sha256::digest(bytes);
    let short: String = digest
        .iter()
        .take(6)
        .map(|b| format!("{b:02x}"))
        .collect();
    format!("capture-{short}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_data_url() {
        let image = parse_data_url("data:image/png;base64,QUJD").expect("parse");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.extension, "png");
        assert_eq!(image.bytes, b"ABC");
    }

    #[test]
    fn rejects_external_url() {
        let err = parse_data_url("https://cdn.example.com/a.png").unwrap_err();
        assert!(matches!(err, ShopifyError::InvalidImage { .. }));
    }

    #[test]
    fn rejects_bad_base64() {
        let err = parse_data_url("data:image/png;base64,@@@@").unwrap_err();
        assert!(matches!(err, ShopifyError::InvalidImage { .. }));
    }

    #[test]
    fn filename_is_stable_per_content() {
        let a = staged_filename(b"ABC", "png");
        let b = staged_filename(b"ABC", "png");
        let c = staged_filename(b"ABD", "png");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("capture-"));
        assert!(a.ends_with(".png"));
    }
}
