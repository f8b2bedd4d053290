//! Per-cell wall evidence consumed by the layout search.
use crate::error::{LayoutError, Result};
use crate::image::ImageF32;

/// Per-axis wall scores over the rectified grid plus the fixed price of each
/// wall and each occluding edge. Higher scores mean stronger evidence for a
/// wall of that axis passing through the cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CostField {
    pub wall_scores: [ImageF32; 2],
    pub wall_penalty: f32,
    pub occlusion_penalty: f32,
}

impl CostField {
    /// Zero scores on a `(W, H)` grid.
    pub fn new(grid_size: (usize, usize), wall_penalty: f32, occlusion_penalty: f32) -> Self {
        let (w, h) = grid_size;
        Self {
            wall_scores: [ImageF32::new(w, h), ImageF32::new(w, h)],
            wall_penalty,
            occlusion_penalty,
        }
    }

    pub fn from_scores(
        scores: [ImageF32; 2],
        wall_penalty: f32,
        occlusion_penalty: f32,
    ) -> Result<Self> {
        if scores[0].size() != scores[1].size() {
            return Err(LayoutError::ShapeMismatch {
                what: "axis 1 wall scores",
                expected: scores[0].size(),
                found: scores[1].size(),
            });
        }
        Ok(Self {
            wall_scores: scores,
            wall_penalty,
            occlusion_penalty,
        })
    }

    /// `(W, H)` of the score grids.
    pub fn size(&self) -> (usize, usize) {
        self.wall_scores[0].size()
    }

    #[inline]
    pub fn score(&self, axis: usize, row: usize, col: usize) -> f32 {
        self.wall_scores[axis].get(col, row)
    }

    #[inline]
    pub fn set_score(&mut self, axis: usize, row: usize, col: usize, value: f32) {
        self.wall_scores[axis].set(col, row, value);
    }

    /// Accumulate `weight * field` into the scores of one axis.
    pub fn add_weighted(&mut self, axis: usize, field: &ImageF32, weight: f32) -> Result<()> {
        let target = &mut self.wall_scores[axis];
        if field.size() != target.size() {
            return Err(LayoutError::ShapeMismatch {
                what: "weighted score field",
                expected: target.size(),
                found: field.size(),
            });
        }
        for (dst, &src) in target.data.iter_mut().zip(&field.data) {
            *dst += weight * src;
        }
        Ok(())
    }

    /// Accumulate an axis-independent field into both axes.
    pub fn add_weighted_shared(&mut self, field: &ImageF32, weight: f32) -> Result<()> {
        self.add_weighted(0, field, weight)?;
        self.add_weighted(1, field, weight)
    }

    /// Fail unless both score grids match `grid_size`.
    pub fn check_grid(&self, grid_size: (usize, usize)) -> Result<()> {
        for scores in &self.wall_scores {
            if scores.size() != grid_size {
                return Err(LayoutError::ShapeMismatch {
                    what: "cost field",
                    expected: grid_size,
                    found: scores.size(),
                });
            }
        }
        Ok(())
    }
}
