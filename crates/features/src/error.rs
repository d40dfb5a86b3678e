use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Expected a {expected_width}x{expected_height} image, got {width}x{height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },

    #[error("Expected {expected} channel(s), got {actual}")]
    ChannelMismatch { expected: u8, actual: u8 },

    #[error("Descriptor '{name}' produced {actual} values, expected {expected}")]
    DescriptorLength {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid feature configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FeatureError>;
