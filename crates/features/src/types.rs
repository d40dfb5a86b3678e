use image::{GrayImage, RgbImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};

/// An image with samples scaled to `[0.0, 1.0]`, stored row-major and
/// channel-interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<f32>,
}

impl NormalizedImage {
    /// Wrap raw samples. `data` must hold `width * height * channels` values.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FeatureError::InvalidImage(format!(
                "image must be at least 1x1, got {width}x{height}"
            )));
        }
        if channels != 1 && channels != 3 {
            return Err(FeatureError::InvalidImage(format!(
                "unsupported channel count {channels}"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(FeatureError::InvalidImage(format!(
                "expected {expected} samples, got {}",
                data.len()
            )));
        }
        Ok(Self { width, height, channels, data })
    }

    /// Scale an 8-bit grayscale image into `[0, 1]`
    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            channels: 1,
            data: image.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect(),
        }
    }

    /// Scale an 8-bit RGB image into `[0, 1]`
    pub fn from_rgb(image: &RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            channels: 3,
            data: image.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Sample at `(x, y)` in channel `c`
    pub fn get(&self, x: u32, y: u32, c: u8) -> f32 {
        let idx = (y as usize * self.width as usize + x as usize) * self.channels as usize
            + c as usize;
        self.data[idx]
    }

    /// Back to 8-bit grayscale, rounding to the nearest level
    pub fn to_gray8(&self) -> Result<GrayImage> {
        if self.channels != 1 {
            return Err(FeatureError::ChannelMismatch { expected: 1, actual: self.channels });
        }
        let raw = self.data.iter().map(|&v| to_u8(v)).collect();
        GrayImage::from_raw(self.width, self.height, raw)
            .ok_or_else(|| FeatureError::InvalidImage("gray buffer size mismatch".to_string()))
    }

    /// Back to 8-bit RGB, rounding to the nearest level
    pub fn to_rgb8(&self) -> Result<RgbImage> {
        if self.channels != 3 {
            return Err(FeatureError::ChannelMismatch { expected: 3, actual: self.channels });
        }
        let raw = self.data.iter().map(|&v| to_u8(v)).collect();
        RgbImage::from_raw(self.width, self.height, raw)
            .ok_or_else(|| FeatureError::InvalidImage("rgb buffer size mismatch".to_string()))
    }
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Concatenated descriptor output for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// Values belonging to the named descriptor
    pub fn segment<'a>(&'a self, layout: &FeatureLayout, name: &str) -> Option<&'a [f64]> {
        let segment = layout.segment(name)?;
        self.0.get(segment.offset..segment.offset + segment.len)
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Position of one descriptor inside a feature vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureSegment {
    pub name: String,
    pub offset: usize,
    pub len: usize,
}

/// Ordered descriptor segments making up a feature vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureLayout {
    pub segments: Vec<FeatureSegment>,
}

impl FeatureLayout {
    /// Total vector length
    pub fn len(&self) -> usize {
        self.segments.last().map_or(0, |s| s.offset + s.len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn segment(&self, name: &str) -> Option<&FeatureSegment> {
        self.segments.iter().find(|s| s.name == name)
    }
}
