//! QR code bitmaps for report links.

use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb, RgbImage};
use qrcode::{Color, QrCode};

use crate::error::EncodeError;

const DARK: Rgb<u8> = Rgb([0, 0, 0]);
const LIGHT: Rgb<u8> = Rgb([255, 255, 255]);

/// Visual parameters of a generated code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QrOptions {
    /// Quiet zone around the matrix, in modules.
    pub margin: u32,
    /// Pixels per module.
    pub scale: u32,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            margin: 1,
            scale: 4,
        }
    }
}

/// Encodes `text` as a black-on-white RGB bitmap.
///
/// The image is `(modules + 2 * margin) * scale` pixels wide and tall.
pub fn encode(text: &str, options: &QrOptions) -> Result<DynamicImage, EncodeError> {
    if text.trim().is_empty() {
        return Err(EncodeError::EmptyInput);
    }
    if options.scale == 0 {
        return Err(EncodeError::InvalidScale);
    }

    let code = QrCode::new(text.as_bytes())?;
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * options.margin) * options.scale;

    let image: RgbImage = ImageBuffer::from_fn(side, side, |px, py| {
        let mx = (px / options.scale) as i64 - options.margin as i64;
        let my = (py / options.scale) as i64 - options.margin as i64;
        let inside = (0..modules as i64).contains(&mx) && (0..modules as i64).contains(&my);
        if inside && colors[(my as usize) * modules as usize + mx as usize] == Color::Dark {
            DARK
        } else {
            LIGHT
        }
    });

    Ok(DynamicImage::ImageRgb8(image))
}

/// Encodes `text` and returns the PNG-encoded bitmap.
pub fn encode_png(text: &str, options: &QrOptions) -> Result<Vec<u8>, EncodeError> {
    let image = encode(text, options)?;
    let mut bytes = Vec::new();
    image
        .write_to(&mut bytes, ImageOutputFormat::Png)
        .map_err(|err| EncodeError::Png(err.to_string()))?;
    Ok(bytes)
}
