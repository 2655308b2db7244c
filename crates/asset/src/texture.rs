//! Texture decoding into CPU-side RGBA8 data ready for GPU upload.
//! Supports any format the `image` decoders are built with (JPEG, PNG).

use std::path::Path;

use anyhow::Context;
use image::DynamicImage;

/// Texture data in CPU-friendly format before GPU upload.
///
/// Rows are stored bottom-up: the first row is the bottom of the source image, so a
/// texcoord `v = 0` addresses the bottom edge as OBJ files expect.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureData {
    /// Create a new texture with given dimensions and RGBA8 format.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> anyhow::Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            anyhow::bail!(
                "Texture data is {} bytes, expected {} for {}x{} RGBA8",
                data.len(),
                expected,
                width,
                height
            );
        }
        Ok(Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        })
    }

    /// Decode an image file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::info!("Loading texture from {:?}", path);

        let img = image::open(path).with_context(|| format!("Failed to open image {:?}", path))?;
        let texture = Self::from_image(img)?;

        log::info!(
            "Loaded texture {}x{} with {} bytes",
            texture.width,
            texture.height,
            texture.data.len()
        );
        Ok(texture)
    }

    /// Decode an encoded image held in memory, guessing the format from its header.
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let img = image::load_from_memory(bytes).context("Failed to decode image bytes")?;
        Self::from_image(img)
    }

    /// Convert a decoded image to bottom-up RGBA8.
    pub fn from_image(img: DynamicImage) -> anyhow::Result<Self> {
        let rgba = img.flipv().to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new_rgba8(width, height, rgba.into_raw())
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Bytes in one row of pixels.
    pub fn bytes_per_row(&self) -> u32 {
        self.width * self.bytes_per_pixel()
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size =
            self.width as usize * self.height as usize * self.bytes_per_pixel() as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn rows_are_flipped_bottom_up() {
        // 1x2: red on top, blue at the bottom.
        let mut img = RgbaImage::new(1, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));

        let tex = TextureData::from_image(DynamicImage::ImageRgba8(img)).expect("convert");
        assert_eq!((tex.width, tex.height), (1, 2));
        assert_eq!(&tex.data[0..4], &[0, 0, 255, 255]);
        assert_eq!(&tex.data[4..8], &[255, 0, 0, 255]);
    }

    #[test]
    fn rgb_input_gains_opaque_alpha() {
        let img = RgbImage::from_pixel(2, 2, Rgb([10, 20, 30]));
        let tex = TextureData::from_image(DynamicImage::ImageRgb8(img)).expect("convert");
        assert!(tex.is_valid());
        assert_eq!(tex.bytes_per_row(), 8);
        assert!(tex.data.chunks_exact(4).all(|px| px == [10, 20, 30, 255]));
    }

    #[test]
    fn decodes_jpeg_bytes() {
        let img = RgbImage::from_pixel(16, 8, Rgb([200, 120, 90]));
        let mut encoded = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Jpeg)
            .expect("encode jpeg");

        let tex = TextureData::from_bytes(&encoded).expect("decode jpeg");
        assert_eq!((tex.width, tex.height), (16, 8));
        assert_eq!(tex.format, TextureFormat::Rgba8);
        assert!(tex.is_valid());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(TextureData::from_bytes(b"not an image").is_err());
    }

    #[test]
    fn missing_texture_file_is_an_error() {
        assert!(TextureData::load("/definitely/not/here.jpg").is_err());
    }

    #[test]
    fn validity_check_handles_huge_dimensions() {
        let tex = TextureData {
            data: Vec::new(),
            width: 40_000,
            height: 40_000,
            format: TextureFormat::Rgba8,
        };
        assert!(!tex.is_valid());
    }

    #[test]
    fn zero_sized_texture_is_invalid() {
        let tex = TextureData::new_rgba8(0, 4, Vec::new()).expect("empty data matches 0x4");
        assert!(!tex.is_valid());
    }

    #[test]
    fn size_mismatch_is_rejected() {
        assert!(TextureData::new_rgba8(2, 2, vec![0; 15]).is_err());
    }
}
