use crate::{
    algorithms::{
        ColorMomentsDescriptor, GaborBankDescriptor, GlcmDescriptor, HogDescriptor,
        HsvHistogramDescriptor, LbpDescriptor, SobelHistogramDescriptor,
    },
    config::FeatureConfig,
    error::Result,
    pipeline::FeaturePipeline,
    traits::Descriptor,
};

/// Builder for creating feature pipelines with a fluent API
pub struct PipelineBuilder {
    config: FeatureConfig,
    descriptors: Vec<Box<dyn Descriptor>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: FeatureConfig::default(),
            descriptors: Vec::new(),
        }
    }

    /// Set the canonical frame size
    pub fn with_config(mut self, config: FeatureConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a descriptor; output order follows insertion order
    pub fn add_descriptor<D>(mut self, descriptor: D) -> Self
    where
        D: Descriptor + 'static,
    {
        self.descriptors.push(Box::new(descriptor));
        self
    }

    /// Append the seven standard descriptors in their fixed order
    pub fn with_standard_descriptors(self) -> Self {
        self.add_descriptor(HogDescriptor::default())
            .add_descriptor(HsvHistogramDescriptor::default())
            .add_descriptor(LbpDescriptor::default())
            .add_descriptor(GaborBankDescriptor::default())
            .add_descriptor(SobelHistogramDescriptor::default())
            .add_descriptor(GlcmDescriptor::default())
            .add_descriptor(ColorMomentsDescriptor)
    }

    /// Build the pipeline
    pub fn build(self) -> Result<FeaturePipeline> {
        FeaturePipeline::new(self.config, self.descriptors)
    }

    /// Build the standard pipeline, discarding any descriptors added so far
    pub fn build_standard(mut self) -> Result<FeaturePipeline> {
        self.descriptors.clear();
        self.with_standard_descriptors().build()
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
