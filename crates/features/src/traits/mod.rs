use image::{GrayImage, RgbImage};

use crate::{
    error::{FeatureError, Result},
    types::NormalizedImage,
};

/// Everything a descriptor may read: the normalized gray and colour images
/// plus their 8-bit counterparts, converted once per image.
pub struct DescriptorInput<'a> {
    pub gray: &'a NormalizedImage,
    pub color: &'a NormalizedImage,
    pub gray8: GrayImage,
    pub color8: RgbImage,
}

impl<'a> DescriptorInput<'a> {
    pub fn new(gray: &'a NormalizedImage, color: &'a NormalizedImage) -> Result<Self> {
        if gray.width() != color.width() || gray.height() != color.height() {
            return Err(FeatureError::DimensionMismatch {
                expected_width: gray.width(),
                expected_height: gray.height(),
                width: color.width(),
                height: color.height(),
            });
        }
        Ok(Self {
            gray,
            color,
            gray8: gray.to_gray8()?,
            color8: color.to_rgb8()?,
        })
    }

    pub fn width(&self) -> u32 {
        self.gray.width()
    }

    pub fn height(&self) -> u32 {
        self.gray.height()
    }
}

/// Trait for a single feature descriptor
pub trait Descriptor: Send + Sync {
    /// Stable name used in feature layouts
    fn name(&self) -> &'static str;

    /// Number of values produced for an image of the given size
    fn len(&self, width: u32, height: u32) -> usize;

    /// Compute the descriptor. Must return exactly `len(width, height)` values.
    fn extract(&self, input: &DescriptorInput<'_>) -> Vec<f64>;
}
