use anyhow::{anyhow, Result};
use image::imageops::FilterType;
use image::DynamicImage;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
pub const MAX_IMAGE_WIDTH: u32 = 1920;
pub const WEBP_QUALITY: f32 = 80.0;

/// Why an upload was refused before any bytes were processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("No file was provided")]
    Missing,
    #[error("Unsupported file type for {file_name}: {content_type} (allowed: {allowed})")]
    UnsupportedType {
        file_name: String,
        content_type: String,
        allowed: String,
    },
    #[error("File too large: {file_name} exceeds the {limit_mb} MB limit")]
    TooLarge { file_name: String, limit_mb: usize },
}

/// Checks type and size against an allow-list and byte limit.
pub fn check_upload(
    file_name: &str,
    content_type: Option<&str>,
    len: usize,
    allowed: &[&str],
    max_bytes: usize,
) -> Result<(), UploadRejection> {
    let content_type = content_type.unwrap_or("application/octet-stream");
    if !allowed.contains(&content_type) {
        return Err(UploadRejection::UnsupportedType {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            allowed: allowed.join(", "),
        });
    }
    if len > max_bytes {
        return Err(UploadRejection::TooLarge {
            file_name: file_name.to_string(),
            limit_mb: max_bytes / (1024 * 1024),
        });
    }
    Ok(())
}

pub fn check_image(file_name: &str, content_type: Option<&str>, len: usize) -> Result<(), UploadRejection> {
    check_upload(file_name, content_type, len, ALLOWED_IMAGE_TYPES, MAX_IMAGE_BYTES)
}

/// Decodes, narrows to at most [`MAX_IMAGE_WIDTH`] and re-encodes as lossy WebP.
/// CPU bound; run it on the blocking pool.
pub fn transcode_to_webp(data: &[u8]) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(data).map_err(|e| anyhow!("Failed to decode image: {}", e))?;

    let resized = if decoded.width() > MAX_IMAGE_WIDTH {
        let height = (u64::from(decoded.height()) * u64::from(MAX_IMAGE_WIDTH) / u64::from(decoded.width())).max(1);
        decoded.resize_exact(MAX_IMAGE_WIDTH, height as u32, FilterType::Lanczos3)
    } else {
        decoded
    };

    // The encoder only takes 8-bit RGB(A).
    let rgba = DynamicImage::ImageRgba8(resized.to_rgba8());
    let encoder = webp::Encoder::from_image(&rgba).map_err(|e| anyhow!("Failed to prepare WebP encoder: {}", e))?;
    Ok(encoder.encode(WEBP_QUALITY).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 120, 40]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn oversized_jpeg_is_rejected() {
        let err = check_image("shoot.jpg", Some("image/jpeg"), 15 * 1024 * 1024).unwrap_err();
        assert_eq!(
            err,
            UploadRejection::TooLarge { file_name: "shoot.jpg".to_string(), limit_mb: 10 }
        );
        assert!(err.to_string().starts_with("File too large"));
    }

    #[test]
    fn type_is_checked_against_allow_list() {
        assert!(check_image("a.png", Some("image/png"), 1024).is_ok());
        assert!(check_image("a.webp", Some("image/webp"), MAX_IMAGE_BYTES).is_ok());
        assert!(matches!(
            check_image("a.gif", Some("image/gif"), 1024),
            Err(UploadRejection::UnsupportedType { .. })
        ));
        assert!(matches!(
            check_image("a", None, 1024),
            Err(UploadRejection::UnsupportedType { .. })
        ));
    }

    #[test]
    fn wide_images_are_narrowed_to_max_width() {
        let webp = transcode_to_webp(&png(2400, 600)).unwrap();
        assert_eq!(&webp[0..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");

        let decoded = image::load_from_memory(&webp).unwrap();
        assert_eq!(decoded.width(), MAX_IMAGE_WIDTH);
        assert_eq!(decoded.height(), 480);
    }

    #[test]
    fn narrow_images_are_not_upscaled() {
        let decoded = image::load_from_memory(&transcode_to_webp(&png(320, 200)).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 200));
    }

    #[test]
    fn undecodable_bytes_fail() {
        assert!(transcode_to_webp(b"definitely not an image").is_err());
    }
}
