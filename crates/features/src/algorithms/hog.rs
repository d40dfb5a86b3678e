use crate::traits::{Descriptor, DescriptorInput};

/// Histogram of oriented gradients over the normalized gray image.
///
/// Square-root intensity compression, central-difference gradients, hard
/// orientation binning over `[0, 180)` and L2-Hys block normalization.
#[derive(Debug, Clone)]
pub struct HogDescriptor {
    pub orientations: usize,
    pub cell_size: usize,
    pub block_size: usize,
}

impl Default for HogDescriptor {
    fn default() -> Self {
        Self {
            orientations: 9,
            cell_size: 8,
            block_size: 2,
        }
    }
}

const L2_HYS_EPS: f64 = 1e-5;
const L2_HYS_CLIP: f64 = 0.2;

impl HogDescriptor {
    fn blocks(&self, width: u32, height: u32) -> (usize, usize) {
        let cells_x = width as usize / self.cell_size;
        let cells_y = height as usize / self.cell_size;
        (
            (cells_y + 1).saturating_sub(self.block_size),
            (cells_x + 1).saturating_sub(self.block_size),
        )
    }

    /// Compute the descriptor for a row-major image of `width x height`
    pub fn compute(&self, pixels: &[f32], width: usize, height: usize) -> Vec<f64> {
        let image: Vec<f64> = pixels.iter().map(|&v| f64::from(v).max(0.0).sqrt()).collect();
        let at = |x: usize, y: usize| image[y * width + x];

        let cells_x = width / self.cell_size;
        let cells_y = height / self.cell_size;
        let bin_width = 180.0 / self.orientations as f64;

        // Per-cell orientation histograms, averaged over the cell area
        let mut cells = vec![0.0f64; cells_y * cells_x * self.orientations];
        for y in 0..cells_y * self.cell_size {
            for x in 0..cells_x * self.cell_size {
                let g_row = if y == 0 || y + 1 == height { 0.0 } else { at(x, y + 1) - at(x, y - 1) };
                let g_col = if x == 0 || x + 1 == width { 0.0 } else { at(x + 1, y) - at(x - 1, y) };
                let magnitude = g_row.hypot(g_col);
                if magnitude == 0.0 {
                    continue;
                }
                let orientation = g_row.atan2(g_col).to_degrees().rem_euclid(180.0);
                let bin = ((orientation / bin_width) as usize).min(self.orientations - 1);
                let cell = (y / self.cell_size) * cells_x + x / self.cell_size;
                cells[cell * self.orientations + bin] += magnitude;
            }
        }
        let area = (self.cell_size * self.cell_size) as f64;
        cells.iter_mut().for_each(|v| *v /= area);

        let (blocks_y, blocks_x) = self.blocks(width as u32, height as u32);
        let block_len = self.block_size * self.block_size * self.orientations;
        let mut out = Vec::with_capacity(blocks_y * blocks_x * block_len);
        let mut block = Vec::with_capacity(block_len);

        for by in 0..blocks_y {
            for bx in 0..blocks_x {
                block.clear();
                for cy in by..by + self.block_size {
                    for cx in bx..bx + self.block_size {
                        let start = (cy * cells_x + cx) * self.orientations;
                        block.extend_from_slice(&cells[start..start + self.orientations]);
                    }
                }
                l2_hys(&mut block);
                out.extend_from_slice(&block);
            }
        }
        out
    }
}

fn l2_hys(block: &mut [f64]) {
    let norm = block.iter().map(|v| v * v).sum::<f64>().sqrt();
    block.iter_mut().for_each(|v| *v = (*v / (norm + L2_HYS_EPS)).min(L2_HYS_CLIP));
    let norm = block.iter().map(|v| v * v).sum::<f64>().sqrt();
    block.iter_mut().for_each(|v| *v /= norm + L2_HYS_EPS);
}

impl Descriptor for HogDescriptor {
    fn name(&self) -> &'static str {
        "hog"
    }

    fn len(&self, width: u32, height: u32) -> usize {
        let (blocks_y, blocks_x) = self.blocks(width, height);
        blocks_y * blocks_x * self.block_size * self.block_size * self.orientations
    }

    fn extract(&self, input: &DescriptorInput<'_>) -> Vec<f64> {
        self.compute(
            input.gray.data(),
            input.width() as usize,
            input.height() as usize,
        )
    }
}
