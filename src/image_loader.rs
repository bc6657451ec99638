use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use image::codecs::gif::GifDecoder;
use image::imageops::FilterType;
use image::AnimationDecoder;
use image::{DynamicImage, ImageFormat};

/// Straight RGBA8 pixels ready to be uploaded as a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub rgba: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
}

impl DecodedImage {
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }
}

pub fn open_image(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image: {:?}", path))?;
    let format = image::guess_format(&bytes).ok();

    // Only the first frame of an animation is pinned to the board.
    if format == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(Cursor::new(bytes))
            .with_context(|| format!("Failed to decode GIF: {:?}", path))?;
        let mut frames = decoder.into_frames();
        if let Some(frame) = frames.next() {
            let frame = frame.context("Failed to decode GIF frame")?;
            return Ok(DynamicImage::ImageRgba8(frame.into_buffer()));
        }
        return Err(anyhow!("GIF has no frames: {:?}", path));
    }

    match format {
        Some(fmt) => image::load_from_memory_with_format(&bytes, fmt)
            .with_context(|| format!("Failed to decode image: {:?}", path)),
        None => image::load_from_memory(&bytes)
            .with_context(|| format!("Failed to decode image: {:?}", path)),
    }
}

/// Largest size with the same aspect ratio that fits in `max_w` x `max_h`.
/// Images that already fit are left alone.
pub fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 || (width <= max_w && height <= max_h) {
        return (width, height);
    }
    let scale = (f64::from(max_w) / f64::from(width)).min(f64::from(max_h) / f64::from(height));
    let fit = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
    (fit(width), fit(height))
}

/// Decodes `path` and downscales it to fit the given box.
pub fn decode_to_fit(path: &Path, max_w: u32, max_h: u32) -> Result<DecodedImage> {
    let img = open_image(path)?;
    let (width, height) = fit_within(img.width(), img.height(), max_w, max_h);
    let img = if (width, height) != (img.width(), img.height()) {
        img.resize_exact(width, height, FilterType::CatmullRom)
    } else {
        img
    };
    let rgba = img.into_rgba8();
    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: Arc::from(rgba.into_raw()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn fit_within_keeps_small_images() {
        assert_eq!(fit_within(200, 100, 480, 360), (200, 100));
        assert_eq!(fit_within(0, 100, 10, 10), (0, 100));
    }

    #[test]
    fn fit_within_preserves_aspect() {
        assert_eq!(fit_within(1000, 500, 500, 500), (500, 250));
        assert_eq!(fit_within(600, 1200, 480, 360), (180, 360));
    }

    #[test]
    fn decode_to_fit_downscales_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbaImage::from_pixel(400, 200, Rgba([200, 10, 10, 255]))
            .save(&path)
            .unwrap();

        let decoded = decode_to_fit(&path, 100, 100).unwrap();
        assert_eq!((decoded.width, decoded.height), (100, 50));
        assert_eq!(decoded.rgba.len(), decoded.stride() * 50);
        assert_eq!(&decoded.rgba[..4], &[200, 10, 10, 255]);
    }

    #[test]
    fn decode_to_fit_reports_missing_files() {
        let dir = tempdir().unwrap();
        let err = decode_to_fit(&dir.path().join("gone.webp"), 10, 10).unwrap_err();
        assert!(err.to_string().contains("Failed to read image"));
    }

    #[test]
    fn decode_to_fit_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("junk.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();
        assert!(decode_to_fit(&path, 10, 10).is_err());
    }
}
