//! Damage photo screening
//!
//! Uploads are screened before they ever reach the scoring service: size cap,
//! then a magic-byte sniff so a mislabeled or hostile payload is rejected no
//! matter what content type the client declared.

use crate::error::ReportError;

/// Upload size cap (10 MiB), matching the public API contract
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Image formats accepted for damage photos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
        }
    }
}

/// Sniffs the image format from leading magic bytes
pub fn sniff_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.len() < 12 {
        return None;
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageFormat::Jpeg);
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(ImageFormat::Png);
    }
    // RIFF....WEBP
    if bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Some(ImageFormat::Webp);
    }
    None
}

/// Validates an uploaded damage photo
///
/// # Errors
///
/// `ReportError::ImageRejected` when the payload is empty, oversized, or not
/// a recognized image format.
pub fn validate_image(bytes: &[u8]) -> Result<ImageFormat, ReportError> {
    if bytes.is_empty() {
        return Err(ReportError::ImageRejected("empty upload".to_string()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ReportError::ImageRejected(format!(
            "image exceeds {} bytes",
            MAX_IMAGE_BYTES
        )));
    }
    sniff_image_format(bytes).ok_or_else(|| {
        ReportError::ImageRejected("unsupported image format, expected JPEG/PNG/WebP".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg_bytes() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend_from_slice(&[0u8; 32]);
        bytes
    }

    #[test]
    fn test_sniff_jpeg() {
        assert_eq!(sniff_image_format(&jpeg_bytes()), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_sniff_png() {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0u8; 16]);
        assert_eq!(sniff_image_format(&bytes), Some(ImageFormat::Png));
    }

    #[test]
    fn test_sniff_webp() {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0u8; 4]);
        bytes.extend_from_slice(b"WEBP");
        bytes.extend_from_slice(&[0u8; 8]);
        assert_eq!(sniff_image_format(&bytes), Some(ImageFormat::Webp));
    }

    #[test]
    fn test_validate_rejects_empty_and_unknown() {
        assert!(validate_image(&[]).is_err());
        assert!(validate_image(&[0u8; 64]).is_err());
    }

    #[test]
    fn test_validate_rejects_oversized() {
        let mut bytes = jpeg_bytes();
        bytes.resize(MAX_IMAGE_BYTES + 1, 0);
        assert!(validate_image(&bytes).is_err());
    }

    #[test]
    fn test_validate_accepts_jpeg() {
        assert_eq!(validate_image(&jpeg_bytes()).unwrap(), ImageFormat::Jpeg);
    }
}
