//! # Weather Photo Feature Extraction
//!
//! Turns an arbitrary photograph into the fixed-length feature vector the
//! weather classifier is trained on. Images are resized to a canonical frame,
//! converted to gray, scaled to `[0, 1]` and passed through seven descriptors
//! whose outputs are concatenated in a fixed order.
//!
//! ## Descriptors
//!
//! | order | name | values at 128x128 |
//! |---|---|---|
//! | 1 | `hog` | 8100 |
//! | 2 | `color_histogram` | 244 |
//! | 3 | `lbp` | 26 |
//! | 4 | `gabor` | 48 |
//! | 5 | `sobel` | 32 |
//! | 6 | `glcm` | 72 |
//! | 7 | `color_moments` | 9 |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use features::{FeatureConfig, FeaturePipeline};
//!
//! let pipeline = FeaturePipeline::standard(FeatureConfig::default())?;
//! let image = image::open("sky.jpg").map_err(|e| features::FeatureError::InvalidImage(e.to_string()))?;
//! let vector = pipeline.extract_image(&image)?;
//! assert_eq!(vector.len(), 8531);
//! # Ok::<(), features::FeatureError>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust
//! use features::{FeatureConfig, FeaturePipeline, algorithms::*};
//!
//! let pipeline = FeaturePipeline::builder()
//!     .with_config(FeatureConfig::new(32, 32)?)
//!     .add_descriptor(HsvHistogramDescriptor::default())
//!     .add_descriptor(ColorMomentsDescriptor)
//!     .build()?;
//! assert_eq!(pipeline.len(), 253);
//! # Ok::<(), features::FeatureError>(())
//! ```

pub mod error;
pub mod config;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod pipeline;

pub use error::{FeatureError, Result};
pub use config::FeatureConfig;
pub use types::{FeatureLayout, FeatureSegment, FeatureVector, NormalizedImage};
pub use traits::{Descriptor, DescriptorInput};
pub use algorithms::ImageNormalizer;
pub use pipeline::{FeaturePipeline, builder::PipelineBuilder};

use image::DynamicImage;

/// Normalize a decoded image into the canonical `(gray, color)` pair
pub fn normalize_image(image: &DynamicImage) -> Result<(NormalizedImage, NormalizedImage)> {
    ImageNormalizer::default().normalize(image)
}

/// Extract the standard feature vector from a normalized image pair.
///
/// The frame size is taken from the images themselves.
pub fn extract_features(gray: &NormalizedImage, color: &NormalizedImage) -> Result<FeatureVector> {
    let config = FeatureConfig::new(gray.width(), gray.height())?;
    FeaturePipeline::standard(config)?.extract(gray, color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn small_config() -> FeatureConfig {
        FeatureConfig::new(32, 32).unwrap()
    }

    fn create_test_image() -> DynamicImage {
        // Blue sky over a gray horizon with a bright sun disc
        let img = RgbImage::from_fn(96, 64, |x, y| {
            let dx = x as i32 - 70;
            let dy = y as i32 - 15;
            if dx * dx + dy * dy < 64 {
                Rgb([255, 250, 220])
            } else if y < 40 {
                Rgb([90, 140, (200 + y) as u8])
            } else {
                Rgb([110, 110, 100 + (x % 7) as u8])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_standard_layout() {
        let pipeline = FeaturePipeline::standard(FeatureConfig::default()).unwrap();
        let layout = pipeline.layout();
        let names: Vec<_> = layout.segments.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["hog", "color_histogram", "lbp", "gabor", "sobel", "glcm", "color_moments"]
        );
        let lens: Vec<_> = layout.segments.iter().map(|s| s.len).collect();
        assert_eq!(lens, vec![8100, 244, 26, 48, 32, 72, 9]);
        assert_eq!(pipeline.len(), 8531);
        assert_eq!(layout.segment("lbp").unwrap().offset, 8344);
    }

    #[test]
    fn test_length_is_content_independent() {
        let pipeline = FeaturePipeline::standard(small_config()).unwrap();
        let black = DynamicImage::ImageRgb8(RgbImage::new(50, 50));
        let photo = create_test_image();

        let a = pipeline.extract_image(&black).unwrap();
        let b = pipeline.extract_image(&photo).unwrap();
        assert_eq!(a.len(), pipeline.len());
        assert_eq!(b.len(), pipeline.len());
        assert!(a.as_slice().iter().chain(b.as_slice()).all(|v| v.is_finite()));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let pipeline = FeaturePipeline::standard(small_config()).unwrap();
        let image = create_test_image();
        let first = pipeline.extract_image(&image).unwrap();
        let second = pipeline.extract_image(&image).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_histograms_sum_to_one_on_constant_image() {
        let pipeline = FeaturePipeline::standard(small_config()).unwrap();
        let flat = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb([120, 120, 120])));
        let vector = pipeline.extract_image(&flat).unwrap();
        let layout = pipeline.layout();

        for name in ["lbp", "sobel"] {
            let sum: f64 = vector.segment(&layout, name).unwrap().iter().sum();
            assert!((sum - 1.0).abs() < 1e-3, "{name} sums to {sum}");
        }

        let moments = vector.segment(&layout, "color_moments").unwrap();
        assert_eq!(moments[2], 0.0);
        assert_eq!(moments[5], 0.0);
        assert_eq!(moments[8], 0.0);
    }

    #[test]
    fn test_batch_preserves_order() {
        let pipeline = FeaturePipeline::standard(small_config()).unwrap();
        let images = vec![
            create_test_image(),
            DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([10, 200, 30]))),
            create_test_image().fliph(),
        ];
        let batch = pipeline.extract_batch(&images).unwrap();
        for (image, vector) in images.iter().zip(&batch) {
            assert_eq!(&pipeline.extract_image(image).unwrap(), vector);
        }
    }

    #[test]
    fn test_rejects_wrong_frame_size() {
        let pipeline = FeaturePipeline::standard(small_config()).unwrap();
        let (gray, color) = ImageNormalizer::new(FeatureConfig::new(48, 48).unwrap())
            .normalize(&create_test_image())
            .unwrap();
        assert!(matches!(
            pipeline.extract(&gray, &color),
            Err(FeatureError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_convenience_functions() {
        let (gray, color) = normalize_image(&create_test_image()).unwrap();
        assert_eq!((gray.width(), gray.height()), (128, 128));
        assert_eq!(color.channels(), 3);
        let small = ImageNormalizer::new(small_config()).normalize(&create_test_image()).unwrap();
        let vector = extract_features(&small.0, &small.1).unwrap();
        assert_eq!(vector.len(), FeaturePipeline::standard(small_config()).unwrap().len());
    }

    #[test]
    fn test_pipeline_info() {
        let pipeline = FeaturePipeline::standard(FeatureConfig::default()).unwrap();
        let info = pipeline.info();
        assert!(info.contains("7 descriptors"));
        assert!(info.contains("8531 features"));
    }

    #[test]
    fn test_empty_builder_is_rejected() {
        assert!(FeaturePipeline::builder().build().is_err());
    }
}
