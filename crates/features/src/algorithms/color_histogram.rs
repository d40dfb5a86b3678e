use image::{Rgb, RgbImage};
use imageproc::stats::histogram;

use crate::traits::{Descriptor, DescriptorInput};

const HSV_SHIFT: u32 = 12;
const HUE_RANGE: i32 = 180;

/// Per-channel hue/saturation/value histograms, each L2-normalized and
/// concatenated H, S, V.
#[derive(Debug, Clone)]
pub struct HsvHistogramDescriptor {
    pub hue_bins: usize,
    pub saturation_bins: usize,
    pub value_bins: usize,
}

impl Default for HsvHistogramDescriptor {
    fn default() -> Self {
        Self {
            hue_bins: 180,
            saturation_bins: 32,
            value_bins: 32,
        }
    }
}

/// Convert RGB to 8-bit HSV with hue in `[0, 180)`
pub fn rgb_to_hsv(image: &RgbImage) -> RgbImage {
    let sdiv: Vec<i32> = (0..256)
        .map(|i| if i == 0 { 0 } else { ((255 << HSV_SHIFT) as f64 / i as f64).round_ties_even() as i32 })
        .collect();
    let hdiv: Vec<i32> = (0..256)
        .map(|i| {
            if i == 0 {
                0
            } else {
                ((HUE_RANGE << HSV_SHIFT) as f64 / (6.0 * i as f64)).round_ties_even() as i32
            }
        })
        .collect();
    let half = 1 << (HSV_SHIFT - 1);

    let mut out = RgbImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        let [r, g, b] = src.0.map(i32::from);
        let v = r.max(g).max(b);
        let diff = v - r.min(g).min(b);

        let s = (diff * sdiv[v as usize] + half) >> HSV_SHIFT;
        let h = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        let mut h = (h * hdiv[diff as usize] + half) >> HSV_SHIFT;
        if h < 0 {
            h += HUE_RANGE;
        }
        *dst = Rgb([h as u8, s as u8, v as u8]);
    }
    out
}

fn bin_channel(counts: &[u32; 256], bins: usize, upper: usize) -> Vec<f64> {
    let mut hist = vec![0.0f64; bins];
    for (level, &count) in counts.iter().enumerate().take(upper) {
        hist[level * bins / upper] += f64::from(count);
    }
    let norm = hist.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        hist.iter_mut().for_each(|v| *v /= norm);
    }
    hist
}

impl Descriptor for HsvHistogramDescriptor {
    fn name(&self) -> &'static str {
        "color_histogram"
    }

    fn len(&self, _width: u32, _height: u32) -> usize {
        self.hue_bins + self.saturation_bins + self.value_bins
    }

    fn extract(&self, input: &DescriptorInput<'_>) -> Vec<f64> {
        let hsv = rgb_to_hsv(&input.color8);
        let channels = histogram(&hsv).channels;

        let mut out = bin_channel(&channels[0], self.hue_bins, HUE_RANGE as usize);
        out.extend(bin_channel(&channels[1], self.saturation_bins, 256));
        out.extend(bin_channel(&channels[2], self.value_bins, 256));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hsv_of(r: u8, g: u8, b: u8) -> [u8; 3] {
        rgb_to_hsv(&RgbImage::from_pixel(1, 1, Rgb([r, g, b]))).get_pixel(0, 0).0
    }

    #[test]
    fn test_primary_hues() {
        assert_eq!(hsv_of(255, 0, 0), [0, 255, 255]);
        assert_eq!(hsv_of(0, 255, 0), [60, 255, 255]);
        assert_eq!(hsv_of(0, 0, 255), [120, 255, 255]);
    }

    #[test]
    fn test_gray_has_no_saturation() {
        assert_eq!(hsv_of(90, 90, 90), [0, 0, 90]);
        assert_eq!(hsv_of(0, 0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_negative_hue_wraps() {
        // Magenta-ish red: v == r and g < b
        let [h, _, _] = hsv_of(255, 0, 128);
        assert!(h > 150 && h < 180);
    }

    #[test]
    fn test_channel_histograms_are_unit_length() {
        let counts = {
            let mut c = [0u32; 256];
            c[10] = 3;
            c[200] = 4;
            c
        };
        let hist = bin_channel(&counts, 32, 256);
        assert_eq!(hist.len(), 32);
        assert!((hist[1] - 0.6).abs() < 1e-12);
        assert!((hist[25] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_hue_ignores_out_of_range_levels() {
        let mut counts = [0u32; 256];
        counts[200] = 5;
        let hist = bin_channel(&counts, 180, 180);
        assert!(hist.iter().all(|&v| v == 0.0));
    }
}
