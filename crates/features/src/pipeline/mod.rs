pub mod builder;

use image::DynamicImage;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{
    algorithms::ImageNormalizer,
    config::FeatureConfig,
    error::{FeatureError, Result},
    traits::{Descriptor, DescriptorInput},
    types::{FeatureLayout, FeatureSegment, FeatureVector, NormalizedImage},
};

/// Normalizer plus an ordered set of descriptors whose outputs are
/// concatenated into one feature vector
pub struct FeaturePipeline {
    config: FeatureConfig,
    normalizer: ImageNormalizer,
    descriptors: Vec<Box<dyn Descriptor>>,
}

impl FeaturePipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// The seven-descriptor pipeline at the given frame size
    pub fn standard(config: FeatureConfig) -> Result<Self> {
        builder::PipelineBuilder::new().with_config(config).build_standard()
    }

    pub fn new(config: FeatureConfig, descriptors: Vec<Box<dyn Descriptor>>) -> Result<Self> {
        config.validate()?;
        if descriptors.is_empty() {
            return Err(FeatureError::InvalidConfig(
                "pipeline needs at least one descriptor".to_string(),
            ));
        }
        Ok(Self {
            config,
            normalizer: ImageNormalizer::new(config),
            descriptors,
        })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &ImageNormalizer {
        &self.normalizer
    }

    /// Named descriptor segments at the configured frame size
    pub fn layout(&self) -> FeatureLayout {
        let mut offset = 0;
        let segments = self
            .descriptors
            .iter()
            .map(|d| {
                let len = d.len(self.config.width, self.config.height);
                let segment = FeatureSegment { name: d.name().to_string(), offset, len };
                offset += len;
                segment
            })
            .collect();
        FeatureLayout { segments }
    }

    /// Feature vector length at the configured frame size
    pub fn len(&self) -> usize {
        self.layout().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extract features from already-normalized images
    pub fn extract(&self, gray: &NormalizedImage, color: &NormalizedImage) -> Result<FeatureVector> {
        if gray.width() != self.config.width || gray.height() != self.config.height {
            return Err(FeatureError::DimensionMismatch {
                expected_width: self.config.width,
                expected_height: self.config.height,
                width: gray.width(),
                height: gray.height(),
            });
        }
        let input = DescriptorInput::new(gray, color)?;

        let mut values = Vec::with_capacity(self.len());
        for descriptor in &self.descriptors {
            let expected = descriptor.len(input.width(), input.height());
            let part = descriptor.extract(&input);
            if part.len() != expected {
                return Err(FeatureError::DescriptorLength {
                    name: descriptor.name(),
                    expected,
                    actual: part.len(),
                });
            }
            values.extend(part);
        }

        let mut replaced = 0usize;
        for v in values.iter_mut().filter(|v| v.is_nan()) {
            *v = 0.0;
            replaced += 1;
        }
        if replaced > 0 {
            debug!("Replaced {} NaN feature values with 0", replaced);
        }

        Ok(FeatureVector::new(values))
    }

    /// Normalize a decoded image and extract its features
    pub fn extract_image(&self, image: &DynamicImage) -> Result<FeatureVector> {
        let (gray, color) = self.normalizer.normalize(image)?;
        self.extract(&gray, &color)
    }

    /// Decode, normalize and extract
    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<FeatureVector> {
        let (gray, color) = self.normalizer.normalize_bytes(bytes)?;
        self.extract(&gray, &color)
    }

    /// Extract many images in parallel, results in input order
    pub fn extract_batch(&self, images: &[DynamicImage]) -> Result<Vec<FeatureVector>> {
        let results: Vec<Result<FeatureVector>> =
            images.par_iter().map(|image| self.extract_image(image)).collect();

        let mut out = Vec::with_capacity(results.len());
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(vector) => out.push(vector),
                Err(e) => {
                    warn!("Feature extraction failed for image {}: {}", index, e);
                    return Err(e);
                }
            }
        }
        Ok(out)
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let layout = self.layout();
        let parts: Vec<String> = layout
            .segments
            .iter()
            .map(|s| format!("{}={}", s.name, s.len))
            .collect();
        format!(
            "FeaturePipeline: {}x{} frame, {} descriptors ({}), {} features",
            self.config.width,
            self.config.height,
            self.descriptors.len(),
            parts.join(", "),
            layout.len()
        )
    }
}
