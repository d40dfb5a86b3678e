use std::f64::consts::PI;

use image::GrayImage;
use rayon::prelude::*;

use crate::traits::{Descriptor, DescriptorInput};

/// A square real Gabor kernel, row-major
#[derive(Debug, Clone)]
pub struct GaborKernel {
    pub size: usize,
    pub theta: f64,
    pub lambda: f64,
    pub sigma: f64,
    pub weights: Vec<f32>,
}

impl GaborKernel {
    /// Real Gabor kernel with zero phase offset and aspect ratio `gamma`
    pub fn new(size: usize, sigma: f64, theta: f64, lambda: f64, gamma: f64) -> Self {
        let half = (size / 2) as i64;
        let sigma_x = sigma;
        let sigma_y = sigma / gamma;
        let ex = -0.5 / (sigma_x * sigma_x);
        let ey = -0.5 / (sigma_y * sigma_y);
        let (s, c) = theta.sin_cos();
        let wave = 2.0 * PI / lambda;

        let mut weights = vec![0.0f32; size * size];
        for y in -half..=half {
            for x in -half..=half {
                let (xf, yf) = (x as f64, y as f64);
                let xr = xf * c + yf * s;
                let yr = -xf * s + yf * c;
                let v = (ex * xr * xr + ey * yr * yr).exp() * (wave * xr).cos();
                let row = (half - y) as usize;
                let col = (half - x) as usize;
                weights[row * size + col] = v as f32;
            }
        }

        Self { size, theta, lambda, sigma, weights }
    }

    /// Correlate with an 8-bit image, reflecting borders without repeating
    /// the edge pixel, and saturate the response back to 8 bits
    pub fn apply(&self, padded: &PaddedImage) -> Vec<u8> {
        let half = self.size / 2;
        debug_assert_eq!(half, padded.pad);
        let taps: Vec<(usize, usize, f32)> = self
            .weights
            .iter()
            .enumerate()
            .filter(|(_, w)| **w != 0.0)
            .map(|(i, &w)| (i / self.size, i % self.size, w))
            .collect();

        let mut out = Vec::with_capacity(padded.width * padded.height);
        for y in 0..padded.height {
            for x in 0..padded.width {
                let mut acc = 0.0f32;
                for &(ky, kx, w) in &taps {
                    acc += padded.at(x + kx, y + ky) * w;
                }
                out.push(acc.round_ties_even().clamp(0.0, 255.0) as u8);
            }
        }
        out
    }
}

/// An 8-bit image padded on every side with reflect-101 borders
#[derive(Debug, Clone)]
pub struct PaddedImage {
    pub width: usize,
    pub height: usize,
    pub pad: usize,
    stride: usize,
    data: Vec<f32>,
}

impl PaddedImage {
    pub fn new(image: &GrayImage, pad: usize) -> Self {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let stride = width + 2 * pad;
        let mut data = Vec::with_capacity(stride * (height + 2 * pad));
        for py in 0..height + 2 * pad {
            let sy = reflect101(py as i64 - pad as i64, height);
            for px in 0..stride {
                let sx = reflect101(px as i64 - pad as i64, width);
                data.push(f32::from(image.get_pixel(sx as u32, sy as u32).0[0]));
            }
        }
        Self { width, height, pad, stride, data }
    }

    #[inline]
    fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.stride + x]
    }
}

pub(crate) fn reflect101(mut i: i64, len: usize) -> usize {
    let n = len as i64;
    if n == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Mean and standard deviation of the responses of a fixed Gabor bank
#[derive(Debug, Clone)]
pub struct GaborBankDescriptor {
    pub kernels: Vec<GaborKernel>,
}

impl Default for GaborBankDescriptor {
    /// 4 orientations x 3 wavelengths x 2 scales, 31x31 support
    fn default() -> Self {
        let mut kernels = Vec::with_capacity(24);
        for t in 0..4 {
            let theta = t as f64 * PI / 4.0;
            for l in 1..4 {
                let lambda = l as f64 * PI / 4.0;
                for sigma in [1.0, 3.0] {
                    kernels.push(GaborKernel::new(31, sigma, theta, lambda, 0.5));
                }
            }
        }
        Self { kernels }
    }
}

fn mean_std(values: &[u8]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    let var = values
        .iter()
        .map(|&v| (f64::from(v) - mean).powi(2))
        .sum::<f64>()
        / n;
    (mean, var.sqrt())
}

impl Descriptor for GaborBankDescriptor {
    fn name(&self) -> &'static str {
        "gabor"
    }

    fn len(&self, _width: u32, _height: u32) -> usize {
        self.kernels.len() * 2
    }

    fn extract(&self, input: &DescriptorInput<'_>) -> Vec<f64> {
        let pad = self.kernels.first().map_or(0, |k| k.size / 2);
        let padded = PaddedImage::new(&input.gray8, pad);

        self.kernels
            .par_iter()
            .map(|kernel| mean_std(&kernel.apply(&padded)))
            .collect::<Vec<_>>()
            .into_iter()
            .flat_map(|(mean, std)| [mean, std])
            .collect()
    }
}
