//! Rectified grid geometry shared by the solver and the solution model.
//!
//! Grid space is the image warped by [`vertical_rectifier`]: world verticals
//! become grid columns and the horizon becomes the grid row
//! [`RectifiedGeometry::horizon_row`]. Floor and ceiling stay on opposite
//! sides of that row, and the floor↔ceiling homology maps each wall foot to
//! the top of the same wall.
//!
//! Overview
//! - `configure` builds the image↔grid homographies, composes the homology
//!   into grid coordinates, locates the vanishing columns of both horizontal
//!   axes and the horizon row, and rejects geometry the solver cannot handle.
//! - `transfer`/`wall_extent` give the vertical span of a wall column.
//! - `transform_data_to_grid` splats image-space evidence into grid cells.
//! - `path_to_orients` expands a per-column path into grid labels.
mod scaled;

pub use scaled::ScaledGeometry;

use crate::camera::PosedCamera;
use crate::error::{LayoutError, Result};
use crate::homography::{half_sign, invert, project, unproject, vertical_rectifier};
use crate::image::labels::HORIZONTAL_SURFACE;
use crate::image::{ImageF32, LabelMap};
use log::debug;
use nalgebra::{Matrix3, Vector2, Vector3};

/// Homogeneous scale below which a vanishing point is treated as infinite.
const VPT_AT_INFINITY: f64 = 1e-8;
/// Column substituted for vanishing points at infinity.
const FAR_COLUMN: f64 = 1e8;
/// Tolerance on the x component of the normalised grid horizon.
const HORIZON_SLOPE_TOL: f64 = 1e-8;

#[derive(Clone, Debug)]
pub struct RectifiedGeometry {
    camera: PosedCamera,
    grid_size: (usize, usize),
    image_to_grid: Matrix3<f64>,
    grid_to_image: Matrix3<f64>,
    floor_to_ceil: Matrix3<f64>,
    ceil_to_floor: Matrix3<f64>,
    horizon_row: i32,
    vpt_cols: [f64; 3],
}

impl RectifiedGeometry {
    /// Build the grid geometry for `camera` and the image-space floor→ceiling
    /// homology on a `grid_size = (W, H)` grid.
    pub fn configure(
        camera: PosedCamera,
        floor_to_ceil: &Matrix3<f64>,
        grid_size: (usize, usize),
    ) -> Result<Self> {
        if grid_size.0 == 0 || grid_size.1 == 0 {
            return Err(LayoutError::configuration(format!(
                "grid size {}x{} is empty",
                grid_size.0, grid_size.1
            )));
        }
        let image_to_grid = vertical_rectifier(&camera, grid_size)?;
        let grid_to_image = invert(&image_to_grid, "image to grid homography")?;
        let grid_floor_to_ceil = image_to_grid * floor_to_ceil * grid_to_image;
        let grid_ceil_to_floor = invert(&grid_floor_to_ceil, "floor to ceiling homology")?;

        let mut vpt_cols = [0.0; 3];
        for (axis, col) in vpt_cols.iter_mut().enumerate() {
            let v = image_to_grid * camera.image_vpt(axis);
            *col = if v.z.abs() < VPT_AT_INFINITY {
                half_sign(v.x * v.z) * FAR_COLUMN
            } else {
                v.x / v.z
            };
        }

        let v0 = image_to_grid * camera.image_vpt(0);
        let v1 = image_to_grid * camera.image_vpt(1);
        let horizon = v0.cross(&v1);
        let norm = horizon.norm();
        if !norm.is_finite() || norm <= f64::EPSILON {
            return Err(LayoutError::configuration(
                "horizontal vanishing points do not define a horizon",
            ));
        }
        let horizon = horizon / norm;
        if horizon.x.abs() > HORIZON_SLOPE_TOL {
            return Err(LayoutError::configuration(format!(
                "rectified horizon is not horizontal (l = [{:.3e}, {:.3e}, {:.3e}])",
                horizon.x, horizon.y, horizon.z
            )));
        }
        let left = project(&horizon.cross(&Vector3::new(1.0, 0.0, 0.0)));
        let right = project(&horizon.cross(&Vector3::new(1.0, 0.0, -(grid_size.0 as f64))));
        if !left.y.is_finite() {
            return Err(LayoutError::configuration(
                "horizon does not intersect the left grid border",
            ));
        }
        if !right.y.is_finite() {
            return Err(LayoutError::configuration(
                "horizon does not intersect the right grid border",
            ));
        }
        let horizon_y = (0.5 * left.y + 0.5 * right.y).round();
        if horizon_y.abs() > i32::MAX as f64 / 2.0 {
            return Err(LayoutError::configuration(format!(
                "horizon row {horizon_y} is out of range"
            )));
        }
        let horizon_row = horizon_y as i32;

        let geometry = Self {
            camera,
            grid_size,
            image_to_grid,
            grid_to_image,
            floor_to_ceil: grid_floor_to_ceil,
            ceil_to_floor: grid_ceil_to_floor,
            horizon_row,
            vpt_cols,
        };

        // The floor lies on the positive side of the camera's image horizon.
        let floor_pt = geometry.grid_to_image(&Vector2::new(0.0, (horizon_row + 1) as f64));
        if floor_pt.dot(&geometry.camera.image_horizon()) <= 0.0 {
            return Err(LayoutError::configuration(
                "rectification flips floor and ceiling",
            ));
        }

        debug!(
            "RectifiedGeometry::configure grid={}x{} horizon_row={} vpt_cols=[{:.2}, {:.2}]",
            grid_size.0, grid_size.1, horizon_row, vpt_cols[0], vpt_cols[1]
        );
        Ok(geometry)
    }

    pub fn camera(&self) -> &PosedCamera {
        &self.camera
    }

    /// `(W, H)` in grid cells.
    pub fn grid_size(&self) -> (usize, usize) {
        self.grid_size
    }

    pub fn horizon_row(&self) -> i32 {
        self.horizon_row
    }

    /// Vanishing column of `axis`, truncated to an integer column.
    pub fn vpt_col(&self, axis: usize) -> i64 {
        self.vpt_cols[axis] as i64
    }

    pub fn vpt_col_exact(&self, axis: usize) -> f64 {
        self.vpt_cols[axis]
    }

    pub fn image_to_grid(&self, image_pt: &Vector3<f64>) -> Vector2<f64> {
        project(&(self.image_to_grid * image_pt))
    }

    /// Homogeneous image point of a grid location.
    pub fn grid_to_image(&self, grid_pt: &Vector2<f64>) -> Vector3<f64> {
        self.grid_to_image * unproject(grid_pt)
    }

    /// Map a grid point to the opposing horizontal surface: ceiling points
    /// go to the floor below them, floor points to the ceiling above.
    pub fn transfer(&self, grid_pt: &Vector2<f64>) -> Vector2<f64> {
        project(&self.transfer_homogeneous(&unproject(grid_pt)))
    }

    pub fn transfer_homogeneous(&self, grid_pt: &Vector3<f64>) -> Vector3<f64> {
        let m = if grid_pt.y < self.horizon_row as f64 {
            &self.ceil_to_floor
        } else {
            &self.floor_to_ceil
        };
        m * grid_pt
    }

    /// Splat an image-sized field into grid cells, accumulating every pixel
    /// into the cell its centre rounds to.
    pub fn transform_data_to_grid(&self, field: &ImageF32) -> Result<ImageF32> {
        let (nx, ny) = self.camera.image_size();
        if field.size() != (nx, ny) {
            return Err(LayoutError::ShapeMismatch {
                what: "image field",
                expected: (nx, ny),
                found: field.size(),
            });
        }
        let mut out = ImageF32::new(self.grid_size.0, self.grid_size.1);
        if nx == 0 || ny == 0 {
            return Ok(out);
        }
        let (max_x, max_y) = ((nx - 1) as f64, (ny - 1) as f64);
        for corner in [(0.0, 0.0), (0.0, max_y), (max_x, 0.0), (max_x, max_y)] {
            self.grid_cell(&Vector3::new(corner.0, corner.1, 1.0), &out)?;
        }
        for y in 0..ny {
            for x in 0..nx {
                let (gx, gy) = self.grid_cell(&Vector3::new(x as f64, y as f64, 1.0), &out)?;
                out.add(gx, gy, field.get(x, y));
            }
        }
        Ok(out)
    }

    /// Number of image pixels landing in each grid cell.
    pub fn grid_importances(&self) -> Result<ImageF32> {
        let (nx, ny) = self.camera.image_size();
        self.transform_data_to_grid(&ImageF32::filled(nx, ny, 1.0))
    }

    /// Nearest grid cell of an image point, or `OutOfGrid`.
    pub(crate) fn grid_cell(
        &self,
        image_pt: &Vector3<f64>,
        grid: &ImageF32,
    ) -> Result<(usize, usize)> {
        let g = self.image_to_grid(image_pt);
        let (gx, gy) = (g.x.round(), g.y.round());
        if gx.is_finite() && gy.is_finite() && grid.contains(gx as i64, gy as i64) {
            Ok((gx as usize, gy as usize))
        } else {
            Err(LayoutError::OutOfGrid {
                x: image_pt.x / image_pt.z,
                y: image_pt.y / image_pt.z,
            })
        }
    }

    /// Rows `(y0, y1)` spanned by the wall through `grid_pt`, clamped to the
    /// grid.
    pub fn wall_extent(&self, grid_pt: &Vector2<f64>) -> (usize, usize) {
        let max_row = self.grid_size.1 as i64 - 1;
        let opp = self.transfer(grid_pt);
        let opp_y = (opp.y as i64).clamp(0, max_row);
        let y = (grid_pt.y.round() as i64).clamp(0, max_row);
        (y.min(opp_y) as usize, y.max(opp_y) as usize)
    }

    pub fn wall_extent_unclamped(&self, grid_pt: &Vector2<f64>) -> (f64, f64) {
        let opp_y = self.transfer(grid_pt).y;
        (grid_pt.y.min(opp_y), grid_pt.y.max(opp_y))
    }

    /// Expand a per-column path into a grid-sized label map. Cells inside a
    /// column's wall extent get the wall orientation `1 - axis`, all others
    /// the horizontal-surface label.
    pub fn path_to_orients(&self, path_rows: &[usize], path_axes: &[usize]) -> Result<LabelMap> {
        let (w, h) = self.grid_size;
        for (what, len) in [("path rows", path_rows.len()), ("path axes", path_axes.len())] {
            if len != w {
                return Err(LayoutError::ShapeMismatch {
                    what,
                    expected: (w, 1),
                    found: (len, 1),
                });
            }
        }
        let mut orients = LabelMap::new(w, h, HORIZONTAL_SURFACE);
        for (x, (&row, &axis)) in path_rows.iter().zip(path_axes).enumerate() {
            let (y0, y1) = self.wall_extent(&Vector2::new(x as f64, row as f64));
            let orient = (1 - axis.min(1)) as u8;
            for y in y0..=y1 {
                orients.set(x, y, orient);
            }
        }
        Ok(orients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homography::manhattan_homology;

    fn level_camera(size: (usize, usize), f: f64, c: (f64, f64)) -> PosedCamera {
        let r = Matrix3::new(1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0);
        PosedCamera::from_focal((f, f), c, r, Vector3::zeros(), size).unwrap()
    }

    fn level_geometry() -> RectifiedGeometry {
        let cam = level_camera((40, 30), 20.0, (19.5, 14.0));
        let hom = manhattan_homology(&cam, -1.0, 1.0).unwrap();
        RectifiedGeometry::configure(cam, &hom, (40, 30)).unwrap()
    }

    #[test]
    fn level_camera_has_central_horizon() {
        let geom = level_geometry();
        assert_eq!(geom.horizon_row(), 14);
        assert_eq!(geom.vpt_col(0), 100_000_000);
        assert!((geom.vpt_col_exact(1) - 19.5).abs() < 1e-9);
    }

    #[test]
    fn transfer_is_an_involution() {
        let geom = level_geometry();
        let floor = Vector2::new(12.0, 22.0);
        let ceil = geom.transfer(&floor);
        assert!(ceil.y < geom.horizon_row() as f64);
        let back = geom.transfer(&ceil);
        assert!((back - floor).norm() < 1e-9);
    }

    #[test]
    fn importances_cover_every_pixel() {
        let geom = level_geometry();
        let imp = geom.grid_importances().unwrap();
        let total: f32 = imp.data.iter().sum();
        assert_eq!(total, 40.0 * 30.0);
    }

    #[test]
    fn transform_rejects_wrong_field_size() {
        let geom = level_geometry();
        let err = geom
            .transform_data_to_grid(&ImageF32::new(10, 10))
            .unwrap_err();
        assert!(matches!(err, LayoutError::ShapeMismatch { .. }));
    }

    #[test]
    fn path_to_orients_labels_wall_extent() {
        let geom = level_geometry();
        let rows = vec![20usize; 40];
        let mut axes = vec![0usize; 40];
        axes[5] = 1;
        let orients = geom.path_to_orients(&rows, &axes).unwrap();
        let (y0, y1) = geom.wall_extent(&Vector2::new(0.0, 20.0));
        assert_eq!(y1, 20);
        assert!(y0 < 15);
        assert_eq!(orients.get(0, 20), 1);
        assert_eq!(orients.get(5, 20), 0);
        assert_eq!(orients.get(0, 25), HORIZONTAL_SURFACE);
        assert!(geom.path_to_orients(&rows[..3], &axes).is_err());
    }

    #[test]
    fn points_beyond_the_image_are_off_the_grid() {
        let geom = level_geometry();
        let grid = ImageF32::new(40, 30);
        assert_eq!(
            geom.grid_cell(&Vector3::new(39.0, 29.0, 1.0), &grid),
            Ok((39, 29))
        );
        let err = geom
            .grid_cell(&Vector3::new(-20.0, 50.0, 1.0), &grid)
            .unwrap_err();
        assert_eq!(err, LayoutError::OutOfGrid { x: -20.0, y: 50.0 });
    }

    #[test]
    fn parallel_horizontal_axes_have_no_horizon() {
        let r = Matrix3::new(1.0, 1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0);
        let cam = PosedCamera::from_focal((20.0, 20.0), (19.5, 14.0), r, Vector3::zeros(), (40, 30))
            .unwrap();
        let err = RectifiedGeometry::configure(cam, &Matrix3::identity(), (40, 30)).unwrap_err();
        assert!(matches!(err, LayoutError::Configuration { .. }));
    }

    #[test]
    fn tilted_horizon_is_rejected() {
        // Axis 0 leans out of the plane orthogonal to up.
        let r = Matrix3::new(1.0, 0.0, 0.0, 0.2, 0.0, -1.0, 0.0, 1.0, 0.0);
        let cam = PosedCamera::from_focal((20.0, 20.0), (19.5, 14.0), r, Vector3::zeros(), (40, 30))
            .unwrap();
        let hom = manhattan_homology(&cam, -1.0, 1.0).unwrap();
        match RectifiedGeometry::configure(cam, &hom, (40, 30)) {
            Err(LayoutError::Configuration { reason }) => {
                assert!(reason.contains("not horizontal"), "{reason}")
            }
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn empty_grid_is_rejected() {
        let cam = level_camera((40, 30), 20.0, (19.5, 14.0));
        let hom = manhattan_homology(&cam, -1.0, 1.0).unwrap();
        let err = RectifiedGeometry::configure(cam, &hom, (0, 30)).unwrap_err();
        assert!(matches!(err, LayoutError::Configuration { .. }));
    }

    #[test]
    fn upside_down_camera_is_rectified_upright() {
        // Rolled half a turn: the rectifier rotates it back upright.
        let r = Matrix3::new(-1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0);
        let cam = PosedCamera::from_focal((20.0, 20.0), (19.5, 14.0), r, Vector3::zeros(), (40, 30))
            .unwrap();
        let hom = manhattan_homology(&cam, -1.0, 1.0).unwrap();
        let geom = RectifiedGeometry::configure(cam, &hom, (40, 30)).unwrap();
        let floor_pt = geom.grid_to_image(&Vector2::new(0.0, geom.horizon_row() as f64 + 1.0));
        assert!(floor_pt.dot(&geom.camera().image_horizon()) > 0.0);
    }
}
