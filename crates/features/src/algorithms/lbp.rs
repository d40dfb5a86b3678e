use image::GrayImage;

use crate::traits::{Descriptor, DescriptorInput};

/// Rotation-invariant uniform local binary pattern histogram.
///
/// Codes `0..=points` count the set bits of uniform patterns, `points + 1`
/// collects every non-uniform pattern.
#[derive(Debug, Clone)]
pub struct LbpDescriptor {
    pub points: usize,
    pub radius: f64,
}

impl Default for LbpDescriptor {
    fn default() -> Self {
        Self {
            points: 24,
            radius: 8.0,
        }
    }
}

pub(crate) const HISTOGRAM_EPS: f64 = 1e-6;

fn round5(v: f64) -> f64 {
    (v * 1e5).round() / 1e5
}

// Exact on flat regions, so constant neighbourhoods compare equal
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

impl LbpDescriptor {
    /// Sample offsets `(row, col)` around the centre pixel
    fn offsets(&self) -> Vec<(f64, f64)> {
        (0..self.points)
            .map(|p| {
                let angle = 2.0 * std::f64::consts::PI * p as f64 / self.points as f64;
                (round5(-self.radius * angle.sin()), round5(self.radius * angle.cos()))
            })
            .collect()
    }

    /// LBP code for every pixel, row-major
    pub fn codes(&self, image: &GrayImage) -> Vec<usize> {
        let (width, height) = (image.width() as i64, image.height() as i64);
        let pixel = |r: i64, c: i64| -> f64 {
            if r < 0 || c < 0 || r >= height || c >= width {
                0.0
            } else {
                f64::from(image.get_pixel(c as u32, r as u32).0[0])
            }
        };
        let offsets = self.offsets();
        let mut bits = vec![false; self.points];
        let mut codes = Vec::with_capacity((width * height) as usize);

        for r in 0..height {
            for c in 0..width {
                let center = pixel(r, c);
                for (bit, &(dr, dc)) in bits.iter_mut().zip(&offsets) {
                    let (sr, sc) = (r as f64 + dr, c as f64 + dc);
                    let (r0, c0) = (sr.floor(), sc.floor());
                    let (r1, c1) = (sr.ceil(), sc.ceil());
                    let (fr, fc) = (sr - r0, sc - c0);
                    let (r0, c0, r1, c1) = (r0 as i64, c0 as i64, r1 as i64, c1 as i64);

                    let top = lerp(pixel(r0, c0), pixel(r0, c1), fc);
                    let bottom = lerp(pixel(r1, c0), pixel(r1, c1), fc);
                    let texture = lerp(top, bottom, fr);
                    *bit = texture - center >= 0.0;
                }

                let changes = bits.windows(2).filter(|w| w[0] != w[1]).count();
                let code = if changes <= 2 {
                    bits.iter().filter(|&&b| b).count()
                } else {
                    self.points + 1
                };
                codes.push(code);
            }
        }
        codes
    }
}

impl Descriptor for LbpDescriptor {
    fn name(&self) -> &'static str {
        "lbp"
    }

    fn len(&self, _width: u32, _height: u32) -> usize {
        self.points + 2
    }

    fn extract(&self, input: &DescriptorInput<'_>) -> Vec<f64> {
        let mut hist = vec![0.0f64; self.points + 2];
        for code in self.codes(&input.gray8) {
            hist[code] += 1.0;
        }
        let total: f64 = hist.iter().sum();
        hist.iter_mut().for_each(|v| *v /= total + HISTOGRAM_EPS);
        hist
    }
}
