use image::{DynamicImage, GrayImage, RgbImage, imageops::FilterType};
use tracing::debug;

use crate::{
    config::FeatureConfig,
    error::{FeatureError, Result},
    types::NormalizedImage,
};

/// Resizes photographs to the canonical frame and produces the normalized
/// gray and colour images consumed by the descriptors.
#[derive(Debug, Clone, Default)]
pub struct ImageNormalizer {
    pub config: FeatureConfig,
}

impl ImageNormalizer {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Decode an encoded image (PNG, JPEG, ...) and normalize it
    pub fn normalize_bytes(&self, bytes: &[u8]) -> Result<(NormalizedImage, NormalizedImage)> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| FeatureError::InvalidImage(e.to_string()))?;
        self.normalize(&image)
    }

    /// Normalize a decoded image into `(gray, color)`
    pub fn normalize(&self, image: &DynamicImage) -> Result<(NormalizedImage, NormalizedImage)> {
        if image.width() == 0 || image.height() == 0 {
            return Err(FeatureError::InvalidImage(format!(
                "image must be at least 1x1, got {}x{}",
                image.width(),
                image.height()
            )));
        }

        let rgb = image.to_rgb8();
        let resized = resize_rgb(&rgb, self.config.width, self.config.height);
        let gray = rgb_to_gray(&resized);

        debug!(
            "Normalized {}x{} image to {}x{}",
            rgb.width(),
            rgb.height(),
            resized.width(),
            resized.height()
        );

        Ok((NormalizedImage::from_gray(&gray), NormalizedImage::from_rgb(&resized)))
    }
}

/// Resize to `width x height`, averaging pixel areas when shrinking.
///
/// Enlarging falls back to bilinear interpolation.
pub fn resize_rgb(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.width() == width && image.height() == height {
        return image.clone();
    }
    if image.width() < width || image.height() < height {
        return image::imageops::resize(image, width, height, FilterType::Triangle);
    }

    let x_weights = area_weights(image.width() as usize, width as usize);
    let y_weights = area_weights(image.height() as usize, height as usize);
    let src_w = image.width() as usize;
    let src = image.as_raw();

    // Horizontal pass into a float buffer of src_height x width
    let mut horizontal = vec![0.0f32; image.height() as usize * width as usize * 3];
    for y in 0..image.height() as usize {
        for (dx, taps) in x_weights.iter().enumerate() {
            let mut acc = [0.0f32; 3];
            for &(sx, w) in taps {
                let idx = (y * src_w + sx) * 3;
                for c in 0..3 {
                    acc[c] += f32::from(src[idx + c]) * w;
                }
            }
            let out = (y * width as usize + dx) * 3;
            horizontal[out..out + 3].copy_from_slice(&acc);
        }
    }

    let mut out = RgbImage::new(width, height);
    for (dy, taps) in y_weights.iter().enumerate() {
        for dx in 0..width as usize {
            let mut acc = [0.0f32; 3];
            for &(sy, w) in taps {
                let idx = (sy * width as usize + dx) * 3;
                for c in 0..3 {
                    acc[c] += horizontal[idx + c] * w;
                }
            }
            let pixel = out.get_pixel_mut(dx as u32, dy as u32);
            for c in 0..3 {
                pixel[c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

/// Per destination index, the source indices it covers and their coverage
/// weights (summing to 1).
fn area_weights(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f32)>> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|d| {
            let start = d as f64 * scale;
            let end = ((d + 1) as f64 * scale).min(src_len as f64);
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src_len);
            (first..last)
                .filter_map(|s| {
                    let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                    (overlap > 1e-9).then(|| (s, (overlap / scale) as f32))
                })
                .collect()
        })
        .collect()
}

/// Luma conversion with 14-bit fixed point weights (0.299, 0.587, 0.114)
pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let v = (u32::from(r) * 4899 + u32::from(g) * 9617 + u32::from(b) * 1868 + 8192) >> 14;
        image::Luma([v.min(255) as u8])
    })
}
