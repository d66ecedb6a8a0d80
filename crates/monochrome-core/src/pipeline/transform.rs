//! Grayscale conversion with PNG output.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::error::PipelineError;

/// Converts decoded images into single-channel PNGs.
pub struct GrayscaleTransform;

impl GrayscaleTransform {
    /// Reduce to 8-bit luminance and encode as PNG.
    ///
    /// Uses the image crate's luminance conversion: weighted RGB, alpha
    /// dropped, wider sample types scaled down to 8 bits. PNG encoding is
    /// deterministic, so equal inputs give byte-identical outputs.
    pub fn apply(image: &DynamicImage, key: &str) -> Result<Vec<u8>, PipelineError> {
        let gray = DynamicImage::ImageLuma8(image.to_luma8());

        let mut buffer = Cursor::new(Vec::new());
        gray.write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| PipelineError::Transform {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(buffer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};

    fn decode_png(bytes: &[u8]) -> DynamicImage {
        image::load_from_memory_with_format(bytes, ImageFormat::Png).unwrap()
    }

    #[test]
    fn test_output_is_single_channel_png_same_size() {
        let img = DynamicImage::new_rgb8(100, 50);
        let png = GrayscaleTransform::apply(&img, "a.jpg").unwrap();

        assert_eq!(&png[0..4], &[0x89, b'P', b'N', b'G']);
        let out = decode_png(&png);
        assert_eq!(out.dimensions(), (100, 50));
        assert_eq!(out.color(), ColorType::L8);
    }

    #[test]
    fn test_weighted_luminance_not_average() {
        // Pure green is far brighter than pure blue under perceptual weights
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([0, 255, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));
        let png = GrayscaleTransform::apply(&DynamicImage::ImageRgb8(img), "k").unwrap();

        let out = decode_png(&png).to_luma8();
        let green = out.get_pixel(0, 0)[0];
        let blue = out.get_pixel(1, 0)[0];
        assert!(green > 150, "green mapped to {green}");
        assert!(blue < 40, "blue mapped to {blue}");
    }

    #[test]
    fn test_gray_and_white_preserved() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 255, 255]));
        img.put_pixel(1, 0, Rgb([0, 0, 0]));
        let png = GrayscaleTransform::apply(&DynamicImage::ImageRgb8(img), "k").unwrap();

        let out = decode_png(&png).to_luma8();
        assert_eq!(out.get_pixel(0, 0)[0], 255);
        assert_eq!(out.get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn test_alpha_is_dropped() {
        let mut img = RgbaImage::new(1, 1);
        img.put_pixel(0, 0, Rgba([255, 255, 255, 0]));
        let png = GrayscaleTransform::apply(&DynamicImage::ImageRgba8(img), "k").unwrap();

        let out = decode_png(&png);
        assert_eq!(out.color(), ColorType::L8);
        assert_eq!(out.to_luma8().get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_sixteen_bit_input_reduced_to_eight() {
        let img = DynamicImage::new_rgb16(4, 4);
        let png = GrayscaleTransform::apply(&img, "k").unwrap();
        assert_eq!(decode_png(&png).color(), ColorType::L8);
    }

    #[test]
    fn test_deterministic_output() {
        let mut img = RgbImage::new(16, 16);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 16) as u8, (y * 16) as u8, 128]);
        }
        let img = DynamicImage::ImageRgb8(img);
        let first = GrayscaleTransform::apply(&img, "k").unwrap();
        let second = GrayscaleTransform::apply(&img, "k").unwrap();
        assert_eq!(first, second);
    }
}
