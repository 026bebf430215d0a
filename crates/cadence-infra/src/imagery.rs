// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The image decoding collaborator.
//!
//! Given raw encoded bytes, returns RGBA8 pixel data plus dimensions.
//! Consumed only to populate resource contents; format details stay inside
//! the `image` crate.

use std::fmt;

/// Decoded pixel data: tightly packed RGBA8 rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Pixel bytes, `4 * width * height` long.
    pub pixels: Vec<u8>,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

impl DecodedImage {
    /// Bytes per row of the decoded data.
    pub fn bytes_per_row(&self) -> u32 {
        4 * self.width
    }
}

/// An error decoding encoded image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// Decoder-reported detail.
    pub details: String,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to decode image: {}", self.details)
    }
}

impl std::error::Error for DecodeError {}

/// Decodes encoded image bytes into RGBA8 pixels (kept in sRGB space).
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let img = image::load_from_memory(bytes).map_err(|err| DecodeError {
        details: err.to_string(),
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    log::debug!("Decoded {width}x{height} image ({} bytes in)", bytes.len());

    Ok(DecodedImage {
        pixels: rgba.into_raw(),
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("in-memory png encode");
        bytes
    }

    #[test]
    fn decodes_png_to_rgba8() {
        let decoded = decode(&png_bytes(3, 2)).unwrap();
        assert_eq!(decoded.width, 3);
        assert_eq!(decoded.height, 2);
        assert_eq!(decoded.pixels.len(), 4 * 3 * 2);
        assert_eq!(decoded.bytes_per_row(), 12);
        assert_eq!(&decoded.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_bytes_fail_with_detail() {
        let err = decode(&[0x00, 0x01, 0x02]).unwrap_err();
        assert!(!err.details.is_empty());
    }
}
