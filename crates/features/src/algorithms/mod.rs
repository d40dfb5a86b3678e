pub mod preprocessing;
pub mod hog;
pub mod color_histogram;
pub mod lbp;
pub mod gabor;
pub mod sobel;
pub mod glcm;
pub mod color_moments;

pub use preprocessing::*;
pub use hog::HogDescriptor;
pub use color_histogram::HsvHistogramDescriptor;
pub use lbp::LbpDescriptor;
pub use gabor::{GaborBankDescriptor, GaborKernel};
pub use sobel::SobelHistogramDescriptor;
pub use glcm::{GlcmDescriptor, GlcmProperty};
pub use color_moments::ColorMomentsDescriptor;
