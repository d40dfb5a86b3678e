use image::GrayImage;

use crate::{
    algorithms::{gabor::reflect101, lbp::HISTOGRAM_EPS},
    traits::{Descriptor, DescriptorInput},
};

/// L1-normalized histogram of Sobel gradient magnitudes over `[0, 256]`.
///
/// Magnitudes above the range are not counted.
#[derive(Debug, Clone)]
pub struct SobelHistogramDescriptor {
    pub bins: usize,
    pub range: f64,
}

impl Default for SobelHistogramDescriptor {
    fn default() -> Self {
        Self {
            bins: 32,
            range: 256.0,
        }
    }
}

impl SobelHistogramDescriptor {
    /// Per-pixel `hypot(gx, gy)` of the 3x3 Sobel responses, borders
    /// reflected without repeating the edge pixel
    pub fn magnitudes(image: &GrayImage) -> Vec<f64> {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let raw = image.as_raw();
        let at = |x: i64, y: i64| {
            f64::from(raw[reflect101(y, height) * width + reflect101(x, width)])
        };

        let mut out = Vec::with_capacity(width * height);
        for y in 0..height as i64 {
            for x in 0..width as i64 {
                let gx = (at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1))
                    - (at(x - 1, y - 1) + 2.0 * at(x - 1, y) + at(x - 1, y + 1));
                let gy = (at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1))
                    - (at(x - 1, y - 1) + 2.0 * at(x, y - 1) + at(x + 1, y - 1));
                out.push(gx.hypot(gy));
            }
        }
        out
    }

    pub fn histogram(&self, magnitudes: &[f64]) -> Vec<f64> {
        let mut hist = vec![0.0f64; self.bins];
        let width = self.range / self.bins as f64;
        for &m in magnitudes {
            if !(0.0..=self.range).contains(&m) {
                continue;
            }
            let bin = ((m / width) as usize).min(self.bins - 1);
            hist[bin] += 1.0;
        }
        let total: f64 = hist.iter().sum();
        hist.iter_mut().for_each(|v| *v /= total + HISTOGRAM_EPS);
        hist
    }
}

impl Descriptor for SobelHistogramDescriptor {
    fn name(&self) -> &'static str {
        "sobel"
    }

    fn len(&self, _width: u32, _height: u32) -> usize {
        self.bins
    }

    fn extract(&self, input: &DescriptorInput<'_>) -> Vec<f64> {
        self.histogram(&Self::magnitudes(&input.gray8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_flat_image_lands_in_first_bin() {
        let image = GrayImage::from_pixel(16, 16, Luma([77]));
        let descriptor = SobelHistogramDescriptor::default();
        let hist = descriptor.histogram(&SobelHistogramDescriptor::magnitudes(&image));
        assert!((hist[0] - 1.0).abs() < 1e-6);
        assert!(hist[1..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_range_edges() {
        let descriptor = SobelHistogramDescriptor::default();
        let hist = descriptor.histogram(&[0.0, 7.99, 8.0, 256.0, 300.0]);
        let total = 4.0 + HISTOGRAM_EPS;
        assert!((hist[0] - 2.0 / total).abs() < 1e-12);
        assert!((hist[1] - 1.0 / total).abs() < 1e-12);
        assert!((hist[31] - 1.0 / total).abs() < 1e-12);
    }

    #[test]
    fn test_step_edge_produces_strong_gradients() {
        let image = GrayImage::from_fn(16, 16, |x, _| Luma([if x < 8 { 0 } else { 40 }]));
        let magnitudes = SobelHistogramDescriptor::magnitudes(&image);
        let max = magnitudes.iter().cloned().fold(0.0, f64::max);
        assert_eq!(max, 160.0);
    }

    #[test]
    fn test_borders_mirror_neighbours() {
        // Horizontal ramp: interior gx = 8 * step, border columns see their
        // mirrored neighbour on both sides and cancel out
        let image = GrayImage::from_fn(8, 6, |x, _| Luma([(x * 10) as u8]));
        let magnitudes = SobelHistogramDescriptor::magnitudes(&image);
        for y in 0..6 {
            assert_eq!(magnitudes[y * 8], 0.0);
            assert_eq!(magnitudes[y * 8 + 7], 0.0);
            for x in 1..7 {
                assert_eq!(magnitudes[y * 8 + x], 80.0);
            }
        }
    }
}
