use std::f64::consts::PI;

use image::GrayImage;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::traits::{Descriptor, DescriptorInput};

const LEVELS: usize = 256;

/// Texture statistics read off a normalized co-occurrence matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum GlcmProperty {
    Contrast,
    Dissimilarity,
    Homogeneity,
    Energy,
    Correlation,
    #[strum(serialize = "ASM")]
    Asm,
}

impl GlcmProperty {
    /// Evaluate on a probability-normalized `LEVELS x LEVELS` matrix
    pub fn compute(self, p: &[f64]) -> f64 {
        let weighted = |f: fn(f64, f64) -> f64| -> f64 {
            let mut acc = 0.0;
            for i in 0..LEVELS {
                for j in 0..LEVELS {
                    let v = p[i * LEVELS + j];
                    if v != 0.0 {
                        acc += v * f(i as f64, j as f64);
                    }
                }
            }
            acc
        };

        match self {
            GlcmProperty::Contrast => weighted(|i, j| (i - j).powi(2)),
            GlcmProperty::Dissimilarity => weighted(|i, j| (i - j).abs()),
            GlcmProperty::Homogeneity => weighted(|i, j| 1.0 / (1.0 + (i - j).powi(2))),
            GlcmProperty::Asm => p.iter().map(|v| v * v).sum(),
            GlcmProperty::Energy => p.iter().map(|v| v * v).sum::<f64>().sqrt(),
            GlcmProperty::Correlation => {
                let mean_i = weighted(|i, _| i);
                let mean_j = weighted(|_, j| j);
                let mut var_i = 0.0;
                let mut var_j = 0.0;
                let mut cov = 0.0;
                for i in 0..LEVELS {
                    for j in 0..LEVELS {
                        let v = p[i * LEVELS + j];
                        if v == 0.0 {
                            continue;
                        }
                        let di = i as f64 - mean_i;
                        let dj = j as f64 - mean_j;
                        var_i += v * di * di;
                        var_j += v * dj * dj;
                        cov += v * di * dj;
                    }
                }
                let (std_i, std_j) = (var_i.sqrt(), var_j.sqrt());
                if std_i < 1e-15 || std_j < 1e-15 {
                    1.0
                } else {
                    cov / (std_i * std_j)
                }
            }
        }
    }
}

/// Gray-level co-occurrence statistics for every (distance, angle) pair,
/// flattened property-major, then distance, then angle
#[derive(Debug, Clone)]
pub struct GlcmDescriptor {
    pub distances: Vec<u32>,
    pub angles: Vec<f64>,
}

impl Default for GlcmDescriptor {
    fn default() -> Self {
        Self {
            distances: vec![1, 3, 5],
            angles: vec![0.0, PI / 4.0, PI / 2.0, 3.0 * PI / 4.0],
        }
    }
}

impl GlcmDescriptor {
    /// Symmetric, normalized co-occurrence matrix for one offset
    pub fn matrix(image: &GrayImage, distance: u32, angle: f64) -> Vec<f64> {
        let d = f64::from(distance);
        let dr = (angle.sin() * d).round() as i64;
        let dc = (angle.cos() * d).round() as i64;
        let (width, height) = (image.width() as i64, image.height() as i64);

        let mut counts = vec![0u64; LEVELS * LEVELS];
        for r in 0..height {
            for c in 0..width {
                let (r2, c2) = (r + dr, c + dc);
                if r2 < 0 || r2 >= height || c2 < 0 || c2 >= width {
                    continue;
                }
                let i = image.get_pixel(c as u32, r as u32).0[0] as usize;
                let j = image.get_pixel(c2 as u32, r2 as u32).0[0] as usize;
                counts[i * LEVELS + j] += 1;
                counts[j * LEVELS + i] += 1;
            }
        }

        let total = counts.iter().sum::<u64>();
        let total = if total == 0 { 1.0 } else { total as f64 };
        counts.into_iter().map(|c| c as f64 / total).collect()
    }
}

impl Descriptor for GlcmDescriptor {
    fn name(&self) -> &'static str {
        "glcm"
    }

    fn len(&self, _width: u32, _height: u32) -> usize {
        GlcmProperty::iter().count() * self.distances.len() * self.angles.len()
    }

    fn extract(&self, input: &DescriptorInput<'_>) -> Vec<f64> {
        let matrices: Vec<Vec<f64>> = self
            .distances
            .iter()
            .flat_map(|&d| self.angles.iter().map(move |&a| (d, a)))
            .map(|(d, a)| Self::matrix(&input.gray8, d, a))
            .collect();

        GlcmProperty::iter()
            .flat_map(|prop| matrices.iter().map(move |m| prop.compute(m)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Luma;

    #[test]
    fn test_canonical_length() {
        assert_eq!(GlcmDescriptor::default().len(128, 128), 72);
    }

    #[test]
    fn test_constant_image_properties() {
        let image = GrayImage::from_pixel(8, 8, Luma([50]));
        let p = GlcmDescriptor::matrix(&image, 1, 0.0);
        assert_relative_eq!(p[50 * LEVELS + 50], 1.0);
        assert_relative_eq!(GlcmProperty::Contrast.compute(&p), 0.0);
        assert_relative_eq!(GlcmProperty::Homogeneity.compute(&p), 1.0);
        assert_relative_eq!(GlcmProperty::Energy.compute(&p), 1.0);
        assert_relative_eq!(GlcmProperty::Asm.compute(&p), 1.0);
        assert_relative_eq!(GlcmProperty::Correlation.compute(&p), 1.0);
    }

    #[test]
    fn test_alternating_columns() {
        // 0, 10, 0, 10 ... along each row
        let image = GrayImage::from_fn(4, 2, |x, _| Luma([if x % 2 == 0 { 0 } else { 10 }]));
        let p = GlcmDescriptor::matrix(&image, 1, 0.0);
        assert_relative_eq!(p[10], 0.5);
        assert_relative_eq!(p[10 * LEVELS], 0.5);
        assert_relative_eq!(GlcmProperty::Contrast.compute(&p), 100.0);
        assert_relative_eq!(GlcmProperty::Dissimilarity.compute(&p), 10.0);
        assert_relative_eq!(GlcmProperty::Correlation.compute(&p), -1.0);
    }

    #[test]
    fn test_offsets_follow_row_down_convention() {
        // 90 degrees pairs each pixel with the one below it
        let image = GrayImage::from_fn(2, 2, |_, y| Luma([if y == 0 { 1 } else { 2 }]));
        let p = GlcmDescriptor::matrix(&image, 1, PI / 2.0);
        assert_relative_eq!(p[LEVELS + 2], 0.5);
        assert_relative_eq!(p[2 * LEVELS + 1], 0.5);
    }

    #[test]
    fn test_offset_larger_than_image_yields_zero_matrix() {
        let image = GrayImage::from_pixel(4, 4, Luma([9]));
        let p = GlcmDescriptor::matrix(&image, 5, 0.0);
        assert!(p.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_property_names() {
        let names: Vec<String> = GlcmProperty::iter().map(|p| p.to_string()).collect();
        assert_eq!(
            names,
            vec!["contrast", "dissimilarity", "homogeneity", "energy", "correlation", "ASM"]
        );
    }
}
