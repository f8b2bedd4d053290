//! Layout produced by one solve and the quantities derived from it.
use crate::cost::CostField;
use crate::dp::DpState;
use crate::error::{LayoutError, Result};
use crate::geometry::{RectifiedGeometry, ScaledGeometry};
use crate::homography::unproject;
use crate::image::{ImageF32, LabelMap};
use crate::render::DepthRenderer;
use log::debug;
use nalgebra::{Vector2, Vector3};
use serde::Serialize;

/// Foot (or head) line of one wall in image coordinates.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallSegment {
    pub start: Vector2<f64>,
    pub end: Vector2<f64>,
    /// Wall orientation label, `1 - axis` of the wall line.
    pub orientation: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DpSolution {
    pub score: f64,
    pub num_walls: usize,
    pub num_occlusions: usize,
    /// Walls from left to right across the image.
    pub wall_segments: Vec<WallSegment>,
    /// Wall row of every grid column.
    pub path_rows: Vec<usize>,
    /// Wall axis of every grid column.
    pub path_axes: Vec<usize>,
    /// Orientation label of every image pixel.
    #[serde(skip)]
    pub pixel_orients: LabelMap,
    /// Every state visited from the terminal back to column zero.
    pub full_backtrack: Vec<DpState>,
    /// Only the states that open or close a wall.
    pub abbrev_backtrack: Vec<DpState>,
}

impl DpSolution {
    /// `Σ cost(axis[x], row[x], x)` over the path, optionally minus the
    /// penalties of every wall and occlusion.
    pub fn total_payoff(&self, costs: &CostField, subtract_penalties: bool) -> Result<f64> {
        let (w, h) = costs.size();
        self.check_path(w, h)?;
        let mut score: f64 = self
            .path_rows
            .iter()
            .zip(&self.path_axes)
            .enumerate()
            .map(|(x, (&row, &axis))| costs.score(axis, row, x) as f64)
            .sum();
        if subtract_penalties {
            score -= self.num_walls as f64 * costs.wall_penalty as f64;
            score -= self.num_occlusions as f64 * costs.occlusion_penalty as f64;
        }
        Ok(score)
    }

    /// `Σ field(row[x], x)` over the path, ignoring axes.
    pub fn path_sum(&self, field: &ImageF32) -> Result<f64> {
        self.check_path(field.w, field.h)?;
        Ok(self
            .path_rows
            .iter()
            .enumerate()
            .map(|(x, &row)| field.get(x, row) as f64)
            .sum())
    }

    fn check_path(&self, w: usize, h: usize) -> Result<()> {
        if self.path_rows.len() != w || self.path_axes.len() != w {
            return Err(LayoutError::ShapeMismatch {
                what: "solution path",
                expected: (w, 1),
                found: (self.path_rows.len(), 1),
            });
        }
        match self.path_rows.iter().position(|&row| row >= h) {
            Some(x) => Err(LayoutError::OutOfGrid {
                x: x as f64,
                y: self.path_rows[x] as f64,
            }),
            None => Ok(()),
        }
    }

    /// Per-cell labels on the grid.
    pub fn grid_orients(&self, geometry: &RectifiedGeometry) -> Result<LabelMap> {
        geometry.path_to_orients(&self.path_rows, &self.path_axes)
    }

    /// Per-pixel labels at image resolution, looked up from the nearest grid
    /// cell of each pixel.
    pub fn exact_orients(&self, geometry: &RectifiedGeometry) -> Result<LabelMap> {
        let grid = self.grid_orients(geometry)?;
        let (gw, gh) = geometry.grid_size();
        let cells = ImageF32::new(gw, gh);
        let (nx, ny) = geometry.camera().image_size();
        let mut orients = LabelMap::new(nx, ny, 0);
        for y in 0..ny {
            for x in 0..nx {
                let (gx, gy) = geometry.grid_cell(&Vector3::new(x as f64, y as f64, 1.0), &cells)?;
                orients.set(x, y, grid.get(gx, gy));
            }
        }
        Ok(orients)
    }

    /// Render the layout's depth through `renderer`: floor and ceiling
    /// planes plus two triangles per wall, then patch the non-finite pixels
    /// left around the horizon and the image border.
    pub fn depth_map<'r, R: DepthRenderer>(
        &self,
        geometry: &ScaledGeometry,
        renderer: &'r mut R,
    ) -> &'r ImageF32 {
        let (zfloor, zceil) = (geometry.zfloor(), geometry.zceil());
        renderer.configure(geometry.camera());
        renderer.render_infinite_plane(zfloor);
        renderer.render_infinite_plane(zceil);
        for wall in &self.wall_segments {
            let ends = (
                geometry.back_project(&unproject(&wall.start)),
                geometry.back_project(&unproject(&wall.end)),
            );
            let (Some(l), Some(r)) = ends else {
                debug!(
                    "DpSolution::depth_map wall ({:.1}, {:.1})-({:.1}, {:.1}) does not back-project",
                    wall.start.x, wall.start.y, wall.end.x, wall.end.y
                );
                continue;
            };
            let tl = Vector3::new(l.x, l.y, zceil);
            let tr = Vector3::new(r.x, r.y, zceil);
            let bl = Vector3::new(l.x, l.y, zfloor);
            let br = Vector3::new(r.x, r.y, zfloor);
            renderer.render_triangle(&tl, &br, &tr);
            renderer.render_triangle(&tl, &br, &bl);
        }
        renderer.smooth_infinite_depths();
        renderer.depth_buffer()
    }
}
