use super::RectifiedGeometry;
use crate::camera::{horizontal_plane, PosedCamera};
use crate::error::{LayoutError, Result};
use crate::homography::manhattan_homology;
use nalgebra::{Vector2, Vector3};
use std::ops::Deref;

/// Grid geometry with known floor and ceiling heights, so that image points
/// on either surface can be lifted back into the world.
#[derive(Clone, Debug)]
pub struct ScaledGeometry {
    geometry: RectifiedGeometry,
    zfloor: f64,
    zceil: f64,
}

impl ScaledGeometry {
    pub fn new(camera: PosedCamera, zfloor: f64, zceil: f64, grid_size: (usize, usize)) -> Result<Self> {
        if !(zfloor.is_finite() && zceil.is_finite()) || zfloor == zceil {
            return Err(LayoutError::configuration(format!(
                "floor and ceiling heights must be finite and distinct (zfloor={zfloor}, zceil={zceil})"
            )));
        }
        let homology = manhattan_homology(&camera, zfloor, zceil)?;
        let geometry = RectifiedGeometry::configure(camera, &homology, grid_size)?;
        Ok(Self {
            geometry,
            zfloor,
            zceil,
        })
    }

    /// Rebuild an existing geometry's camera and grid with new heights.
    pub fn from_geometry(geometry: &RectifiedGeometry, zfloor: f64, zceil: f64) -> Result<Self> {
        Self::new(geometry.camera().clone(), zfloor, zceil, geometry.grid_size())
    }

    pub fn geometry(&self) -> &RectifiedGeometry {
        &self.geometry
    }

    pub fn zfloor(&self) -> f64 {
        self.zfloor
    }

    pub fn zceil(&self) -> f64 {
        self.zceil
    }

    /// World point seen at `image_pt`, assuming it lies on the ceiling when
    /// it is above the horizon row and on the floor otherwise.
    pub fn back_project(&self, image_pt: &Vector3<f64>) -> Option<Vector3<f64>> {
        let row = self.geometry.image_to_grid(image_pt).y;
        let z = if row < self.geometry.horizon_row() as f64 {
            self.zceil
        } else {
            self.zfloor
        };
        self.geometry
            .camera()
            .intersect_plane(image_pt, &horizontal_plane(z))
    }

    pub fn back_project_from_grid(&self, grid_pt: &Vector2<f64>) -> Option<Vector3<f64>> {
        self.back_project(&self.geometry.grid_to_image(grid_pt))
    }
}

impl Deref for ScaledGeometry {
    type Target = RectifiedGeometry;

    fn deref(&self) -> &RectifiedGeometry {
        &self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    #[test]
    fn back_projection_lands_on_floor_and_ceiling() {
        let r = Matrix3::new(1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0);
        let cam = PosedCamera::from_focal((30.0, 30.0), (24.5, 20.0), r, Vector3::zeros(), (50, 40))
            .unwrap();
        let geom = ScaledGeometry::new(cam, -1.5, 1.0, (50, 40)).unwrap();
        let floor = geom.back_project_from_grid(&Vector2::new(10.0, 30.0)).unwrap();
        assert!((floor.z + 1.5).abs() < 1e-9);
        let ceil = geom.back_project_from_grid(&Vector2::new(10.0, 5.0)).unwrap();
        assert!((ceil.z - 1.0).abs() < 1e-9);
        assert!(floor.y > 0.0 && ceil.y > 0.0);
    }

    #[test]
    fn equal_heights_are_rejected() {
        let cam = PosedCamera::from_focal(
            (30.0, 30.0),
            (24.5, 20.0),
            Matrix3::identity(),
            Vector3::zeros(),
            (50, 40),
        )
        .unwrap();
        assert!(ScaledGeometry::new(cam, 1.0, 1.0, (50, 40)).is_err());
    }
}
