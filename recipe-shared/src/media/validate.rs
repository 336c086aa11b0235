//! Image payload validation
//!
//! The content type and filename sent by the client are not trusted. An upload
//! is accepted only when its bytes sniff as a supported format and fully
//! decode.

use image::ImageFormat;

use super::MediaError;

/// Checks that `bytes` hold a decodable JPEG, PNG, GIF or WebP image
///
/// Returns the detected format on success.
///
/// # Errors
///
/// `MediaError::InvalidImage` for empty, unrecognized or corrupt payloads.
pub fn validate_image(bytes: &[u8]) -> Result<ImageFormat, MediaError> {
    if bytes.is_empty() {
        return Err(MediaError::InvalidImage);
    }

    let format = image::guess_format(bytes).map_err(|_| MediaError::InvalidImage)?;

    image::load_from_memory_with_format(bytes, format).map_err(|e| {
        tracing::debug!(error = %e, ?format, "Rejected undecodable image");
        MediaError::InvalidImage
    })?;

    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn encode(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(10, 10, Rgb([200, 40, 40]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_accepts_png() {
        let bytes = encode(ImageFormat::Png);
        assert_eq!(validate_image(&bytes).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_accepts_jpeg() {
        let bytes = encode(ImageFormat::Jpeg);
        assert_eq!(validate_image(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_rejects_non_image() {
        assert!(matches!(
            validate_image(b"notimage"),
            Err(MediaError::InvalidImage)
        ));
        assert!(matches!(validate_image(&[]), Err(MediaError::InvalidImage)));
    }

    #[test]
    fn test_rejects_truncated_image() {
        let bytes = encode(ImageFormat::Png);
        assert!(validate_image(&bytes[..bytes.len() / 2]).is_err());
    }
}
