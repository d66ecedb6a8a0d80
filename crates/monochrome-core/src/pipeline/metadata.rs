//! Metadata extraction: general file info plus a fixed set of EXIF fields.

use exif::{In, Reader, Tag, Value};
use std::io::Cursor;

use super::decode::{format_name, DecodedImage};
use crate::types::ImageMetadata;

/// Value recorded for an EXIF field the source does not carry.
pub const MISSING_TAG: &str = "N/A";

/// The EXIF fields copied into every metadata document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExifField {
    ImageDescription,
    Make,
    Model,
    Orientation,
    XResolution,
    YResolution,
    ResolutionUnit,
    DateTime,
    ExposureTime,
    FNumber,
    IsoSpeedRatings,
    FocalLength,
    ColorSpace,
    ExifImageWidth,
    ExifImageLength,
}

impl ExifField {
    pub const ALL: [ExifField; 15] = [
        ExifField::ImageDescription,
        ExifField::Make,
        ExifField::Model,
        ExifField::Orientation,
        ExifField::XResolution,
        ExifField::YResolution,
        ExifField::ResolutionUnit,
        ExifField::DateTime,
        ExifField::ExposureTime,
        ExifField::FNumber,
        ExifField::IsoSpeedRatings,
        ExifField::FocalLength,
        ExifField::ColorSpace,
        ExifField::ExifImageWidth,
        ExifField::ExifImageLength,
    ];

    /// Key used in the metadata document.
    pub fn key(&self) -> &'static str {
        match self {
            ExifField::ImageDescription => "ImageDescription",
            ExifField::Make => "Make",
            ExifField::Model => "Model",
            ExifField::Orientation => "Orientation",
            ExifField::XResolution => "XResolution",
            ExifField::YResolution => "YResolution",
            ExifField::ResolutionUnit => "ResolutionUnit",
            ExifField::DateTime => "DateTime",
            ExifField::ExposureTime => "ExposureTime",
            ExifField::FNumber => "FNumber",
            ExifField::IsoSpeedRatings => "ISOSpeedRatings",
            ExifField::FocalLength => "FocalLength",
            ExifField::ColorSpace => "ColorSpace",
            ExifField::ExifImageWidth => "ExifImageWidth",
            ExifField::ExifImageLength => "ExifImageLength",
        }
    }

    /// The EXIF tag this field is read from.
    pub fn tag(&self) -> Tag {
        match self {
            ExifField::ImageDescription => Tag::ImageDescription,
            ExifField::Make => Tag::Make,
            ExifField::Model => Tag::Model,
            ExifField::Orientation => Tag::Orientation,
            ExifField::XResolution => Tag::XResolution,
            ExifField::YResolution => Tag::YResolution,
            ExifField::ResolutionUnit => Tag::ResolutionUnit,
            ExifField::DateTime => Tag::DateTime,
            ExifField::ExposureTime => Tag::ExposureTime,
            ExifField::FNumber => Tag::FNumber,
            ExifField::IsoSpeedRatings => Tag::PhotographicSensitivity,
            ExifField::FocalLength => Tag::FocalLength,
            ExifField::ColorSpace => Tag::ColorSpace,
            ExifField::ExifImageWidth => Tag::PixelXDimension,
            ExifField::ExifImageLength => Tag::PixelYDimension,
        }
    }
}

/// Keys of the general file info section.
pub const GENERAL_KEYS: [&str; 4] = ["ImageWidth", "ImageHeight", "FileSize", "Format"];

/// Coerce an optional tag value into its stored form.
pub fn or_missing(value: Option<String>) -> String {
    value.unwrap_or_else(|| MISSING_TAG.to_string())
}

/// Extracts the metadata mapping for one image.
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Build the full metadata mapping.
    ///
    /// Dimensions and format come from the decoded image; EXIF is parsed from
    /// the raw bytes independently of the pixel decode.
    pub fn extract(decoded: &DecodedImage, bytes: &[u8]) -> ImageMetadata {
        let exif = Self::exif_fields(bytes)
            .into_iter()
            .map(|(field, value)| (field.key().to_string(), or_missing(value)));
        ImageMetadata::merge(Self::general_info(decoded), exif)
    }

    /// Width, height, file size and format, as strings.
    pub fn general_info(decoded: &DecodedImage) -> Vec<(String, String)> {
        let values = [
            decoded.width.to_string(),
            decoded.height.to_string(),
            decoded.file_size.to_string(),
            format_name(decoded.format).to_string(),
        ];
        GENERAL_KEYS
            .iter()
            .map(|k| k.to_string())
            .zip(values)
            .collect()
    }

    /// Look up every known EXIF field; `None` where the tag is absent.
    ///
    /// A missing or unreadable EXIF block yields `None` for every field.
    pub fn exif_fields(bytes: &[u8]) -> Vec<(ExifField, Option<String>)> {
        let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
            Ok(exif) => Some(exif),
            Err(exif::Error::NotFound(_)) => {
                tracing::debug!("No EXIF block found");
                None
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable EXIF block: {}", e);
                None
            }
        };

        ExifField::ALL
            .iter()
            .map(|field| {
                let value = exif.as_ref().and_then(|exif| Self::get_string(exif, field.tag()));
                (*field, value)
            })
            .collect()
    }

    /// String form of a tag in the primary IFD.
    ///
    /// ASCII values are taken from their raw bytes; every other type uses the
    /// parser's display form (`1/100`, `2.8`, `sRGB`).
    fn get_string(exif: &exif::Exif, tag: Tag) -> Option<String> {
        exif.get_field(tag, In::PRIMARY).map(|f| match &f.value {
            Value::Ascii(strings) => ascii_string(strings),
            _ => f.display_value().to_string(),
        })
    }
}

/// Join the strings of an ASCII value, dropping NUL padding and empty strings.
fn ascii_string(strings: &[Vec<u8>]) -> String {
    strings
        .iter()
        .map(|bytes| {
            let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
            String::from_utf8_lossy(&bytes[..end]).into_owned()
        })
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
