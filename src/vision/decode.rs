//! Base64 upload decoding.

use crate::{Error, Result};
use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use image::{DynamicImage, ImageReader, Limits};
use std::io::Cursor;

/// Standard alphabet, accepting input with or without trailing `=` padding.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a base64 image payload, optionally wrapped as a `data:` URL.
///
/// Images wider or taller than `max_dimension` are rejected from their header,
/// before any pixel buffer is allocated.
pub fn decode_base64_image(encoded: &str, max_dimension: u32) -> Result<DynamicImage> {
    let bytes = decode_base64(encoded)?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(max_dimension);
    limits.max_image_height = Some(max_dimension);

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::invalid_image(e.to_string()))?;
    reader.limits(limits);
    reader
        .decode()
        .map_err(|e| Error::invalid_image(e.to_string()))
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    let payload = strip_data_url(encoded.trim());
    // Clients commonly wrap long base64 bodies across lines.
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(Error::invalid_image("empty image payload"));
    }

    LENIENT_STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::invalid_image(e.to_string()))
}

fn strip_data_url(encoded: &str) -> &str {
    if encoded.starts_with("data:") {
        if let Some((header, payload)) = encoded.split_once(',') {
            if header.ends_with(";base64") {
                return payload;
            }
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use image::{GrayImage, ImageFormat, RgbImage};

    const MAX_DIMENSION: u32 = 4096;

    fn encode_png(img: DynamicImage) -> String {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        STANDARD.encode(bytes)
    }

    fn png_base64(width: u32, height: u32) -> String {
        encode_png(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([34, 139, 34]),
        )))
    }

    #[test]
    fn test_decode_plain_base64() {
        let img = decode_base64_image(&png_base64(8, 6), MAX_DIMENSION).unwrap();
        assert_eq!((img.width(), img.height()), (8, 6));
    }

    #[test]
    fn test_decode_data_url() {
        let encoded = format!("data:image/png;base64,{}", png_base64(4, 4));
        let img = decode_base64_image(&encoded, MAX_DIMENSION).unwrap();
        assert_eq!(img.width(), 4);
    }

    #[test]
    fn test_decode_without_padding_and_with_newlines() {
        let encoded = png_base64(5, 3);
        let unpadded = encoded.trim_end_matches('=');
        let wrapped: String = unpadded
            .as_bytes()
            .chunks(60)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\n");

        let img = decode_base64_image(&wrapped, MAX_DIMENSION).unwrap();
        assert_eq!(img.height(), 3);
    }

    #[test]
    fn test_reject_non_base64() {
        let err = decode_base64_image("not*base64!", MAX_DIMENSION).unwrap_err();
        assert!(matches!(err, Error::InvalidImage(_)));
    }

    #[test]
    fn test_reject_base64_that_is_not_an_image() {
        let err =
            decode_base64_image(&STANDARD.encode(b"just some text"), MAX_DIMENSION).unwrap_err();
        assert!(matches!(err, Error::InvalidImage(_)));
    }

    #[test]
    fn test_reject_empty_payload() {
        assert!(decode_base64_image("   ", MAX_DIMENSION).is_err());
        assert!(decode_base64_image("data:image/png;base64,", MAX_DIMENSION).is_err());
    }

    #[test]
    fn test_reject_oversized_dimensions() {
        let wide = encode_png(DynamicImage::ImageLuma8(GrayImage::new(5000, 16)));
        let err = decode_base64_image(&wide, MAX_DIMENSION).unwrap_err();
        assert!(matches!(err, Error::InvalidImage(_)));

        let tall = encode_png(DynamicImage::ImageLuma8(GrayImage::new(16, 5000)));
        assert!(decode_base64_image(&tall, MAX_DIMENSION).is_err());
    }

    #[test]
    fn test_limit_applies_per_side() {
        let wide = png_base64(40, 8);
        assert!(decode_base64_image(&wide, 32).is_err());
        assert!(decode_base64_image(&wide, 40).is_ok());
    }
}
