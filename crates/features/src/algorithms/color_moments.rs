use image::RgbImage;
use palette::{FromColor, Lab, Srgb};

use crate::traits::{Descriptor, DescriptorInput};

/// Below this standard deviation a channel is treated as constant
const FLAT_STD: f64 = 1e-12;

/// Mean, standard deviation and skewness of each CIE Lab channel.
///
/// Lab values are quantized to the 8-bit convention (L scaled to 0..255,
/// a and b offset by 128) before the moments are taken.
#[derive(Debug, Clone, Default)]
pub struct ColorMomentsDescriptor;

/// Per-pixel 8-bit Lab triples
pub fn rgb_to_lab8(image: &RgbImage) -> Vec<[u8; 3]> {
    image
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            let srgb = Srgb::new(r, g, b).into_format::<f32>();
            let lab: Lab = Lab::from_color(srgb.into_linear());
            [
                quantize(lab.l * 255.0 / 100.0),
                quantize(lab.a + 128.0),
                quantize(lab.b + 128.0),
            ]
        })
        .collect()
}

fn quantize(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// `(mean, std, skewness)` with population statistics; skewness is 0 for a
/// flat channel
pub fn moments(values: impl Iterator<Item = f64> + Clone) -> (f64, f64, f64) {
    let (n, sum) = values.clone().fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    if n == 0 {
        return (0.0, 0.0, 0.0);
    }
    let n = n as f64;
    let mean = sum / n;
    let (m2, m3) = values.fold((0.0, 0.0), |(m2, m3), v| {
        let d = v - mean;
        (m2 + d * d, m3 + d * d * d)
    });
    let (m2, m3) = (m2 / n, m3 / n);
    let std = m2.sqrt();
    let skew = if std < FLAT_STD { 0.0 } else { m3 / m2.powf(1.5) };
    (mean, std, skew)
}

impl Descriptor for ColorMomentsDescriptor {
    fn name(&self) -> &'static str {
        "color_moments"
    }

    fn len(&self, _width: u32, _height: u32) -> usize {
        9
    }

    fn extract(&self, input: &DescriptorInput<'_>) -> Vec<f64> {
        let lab = rgb_to_lab8(&input.color8);
        (0..3)
            .flat_map(|c| {
                let (mean, std, skew) = moments(lab.iter().map(move |px| f64::from(px[c])));
                [mean, std, skew]
            })
            .collect()
    }
}
