//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

pub const UPLOAD_BUCKET: &str = "uploads";

/// A colorful RGB image encoded in `format`.
pub fn encoded_rgb(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 5 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}

/// A JPEG carrying an APP1 EXIF segment with the given primary-IFD fields.
pub fn jpeg_with_exif(width: u32, height: u32, fields: &[(Tag, Value)]) -> Vec<u8> {
    let fields: Vec<Field> = fields
        .iter()
        .map(|(tag, value)| Field {
            tag: *tag,
            ifd_num: In::PRIMARY,
            value: value.clone(),
        })
        .collect();
    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let jpeg = encoded_rgb(width, height, ImageFormat::Jpeg);
    let mut out = Vec::new();
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// A JPEG whose APP1 segment carries `Make` and nothing else.
pub fn jpeg_with_make(width: u32, height: u32, make: &str) -> Vec<u8> {
    jpeg_with_exif(
        width,
        height,
        &[(Tag::Make, Value::Ascii(vec![make.as_bytes().to_vec()]))],
    )
}

/// An S3-style notification for one object.
pub fn event_for(bucket: &str, key: &str) -> String {
    serde_json::json!({
        "Records": [{
            "eventName": "ObjectCreated:Put",
            "s3": {
                "bucket": { "name": bucket },
                "object": { "key": key }
            }
        }]
    })
    .to_string()
}
