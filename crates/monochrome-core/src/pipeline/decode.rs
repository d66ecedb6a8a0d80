//! Image decoding with content-based format detection and size limits.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::sync::Arc;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Image decoder with configurable limits.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Format detected from the byte content
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Source buffer length in bytes
    pub file_size: u64,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode a shared buffer on the blocking pool.
    ///
    /// Empty and oversized buffers are rejected before any decoding work.
    pub async fn decode(
        &self,
        bytes: Arc<Vec<u8>>,
        key: &str,
    ) -> Result<DecodedImage, PipelineError> {
        self.check_size(bytes.len() as u64, key)?;

        let key_owned = key.to_string();
        let decoded = tokio::task::spawn_blocking(move || Self::decode_sync(&bytes, &key_owned))
            .await
            .map_err(|e| PipelineError::Decode {
                key: key.to_string(),
                message: format!("Task join error: {}", e),
            })??;

        if decoded.width > self.limits.max_image_dimension
            || decoded.height > self.limits.max_image_dimension
        {
            return Err(PipelineError::ImageTooLarge {
                key: key.to_string(),
                width: decoded.width,
                height: decoded.height,
                max_dim: self.limits.max_image_dimension,
            });
        }
        Ok(decoded)
    }

    fn check_size(&self, len: u64, key: &str) -> Result<(), PipelineError> {
        if len == 0 {
            return Err(PipelineError::Decode {
                key: key.to_string(),
                message: "object is empty".to_string(),
            });
        }
        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if len > max_bytes {
            return Err(PipelineError::FileTooLarge {
                key: key.to_string(),
                size_mb: len / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }
        Ok(())
    }

    /// Synchronous decode (runs in spawn_blocking).
    pub(crate) fn decode_sync(bytes: &[u8], key: &str) -> Result<DecodedImage, PipelineError> {
        let file_size = bytes.len() as u64;
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                key: key.to_string(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        let format = reader.format().ok_or_else(|| PipelineError::Decode {
            key: key.to_string(),
            message: "Unrecognized image format".to_string(),
        })?;
        let image = reader.decode().map_err(|e| PipelineError::Decode {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
            file_size,
        })
    }
}

/// Codec name as reported in the metadata document.
pub fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Png => "PNG",
        ImageFormat::WebP => "WEBP",
        ImageFormat::Gif => "GIF",
        ImageFormat::Tiff => "TIFF",
        ImageFormat::Bmp => "BMP",
        ImageFormat::Ico => "ICO",
        ImageFormat::Pnm => "PPM",
        ImageFormat::Avif => "AVIF",
        ImageFormat::Tga => "TGA",
        ImageFormat::Qoi => "QOI",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::encoded_rgb;

    #[test]
    fn test_format_name() {
        assert_eq!(format_name(ImageFormat::Jpeg), "JPEG");
        assert_eq!(format_name(ImageFormat::Png), "PNG");
        assert_eq!(format_name(ImageFormat::WebP), "WEBP");
    }

    #[test]
    fn test_format_detected_by_content() {
        // PNG bytes under a .jpg key are still detected as PNG
        let bytes = encoded_rgb(8, 4, ImageFormat::Png);
        let result = ImageDecoder::decode_sync(&bytes, "misnamed.jpg").unwrap();
        assert_eq!(result.format, ImageFormat::Png);
        assert_eq!((result.width, result.height), (8, 4));
    }

    #[tokio::test]
    async fn test_decode_reports_file_size() {
        let bytes = encoded_rgb(16, 16, ImageFormat::Jpeg);
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let decoded = decoder.decode(Arc::new(bytes.clone()), "a.jpg").await.unwrap();
        assert_eq!(decoded.file_size, bytes.len() as u64);
        assert_eq!(decoded.format, ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_empty_buffer_is_decode_error() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let err = decoder.decode(Arc::new(Vec::new()), "empty.jpg").await.err().unwrap();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_garbage_is_decode_error() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let err = decoder
            .decode(Arc::new(b"definitely not an image".to_vec()), "notes.txt")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_truncated_jpeg_is_decode_error() {
        let bytes = encoded_rgb(64, 64, ImageFormat::Jpeg);
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let err = decoder.decode(Arc::new(bytes[..20].to_vec()), "cut.jpg").await.err().unwrap();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_dimension_limit() {
        let bytes = encoded_rgb(40, 10, ImageFormat::Png);
        let decoder = ImageDecoder::new(LimitsConfig {
            max_image_dimension: 32,
            ..LimitsConfig::default()
        });
        let err = decoder.decode(Arc::new(bytes), "wide.png").await.err().unwrap();
        assert!(matches!(
            err,
            PipelineError::ImageTooLarge {
                width: 40,
                height: 10,
                max_dim: 32,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_huge_size_limit_does_not_overflow() {
        let bytes = encoded_rgb(4, 4, ImageFormat::Png);
        let decoder = ImageDecoder::new(LimitsConfig {
            max_file_size_mb: u64::MAX,
            ..LimitsConfig::default()
        });
        let decoded = decoder.decode(Arc::new(bytes), "tiny.png").await.unwrap();
        assert_eq!((decoded.width, decoded.height), (4, 4));
    }
}
