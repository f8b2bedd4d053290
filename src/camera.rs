//! Calibrated pinhole camera posed in a Manhattan-aligned world frame.
//!
//! World axes 0 and 1 are the two horizontal Manhattan directions and axis
//! [`VERTICAL_AXIS`] points up, so floor and ceiling are the planes
//! `z = zfloor` and `z = zceil`. The pose maps world points into the camera
//! frame as `R·X + t`, and the image y axis grows downwards.
use crate::error::{LayoutError, Result};
use nalgebra::{Matrix3, Vector2, Vector3, Vector4};

/// Index of the world axis perpendicular to floor and ceiling.
pub const VERTICAL_AXIS: usize = 2;

const EPS: f64 = 1e-12;

#[derive(Clone, Debug, PartialEq)]
pub struct PosedCamera {
    kmtx: Matrix3<f64>,
    kinv: Matrix3<f64>,
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
    image_size: (usize, usize),
}

impl PosedCamera {
    /// Create a camera from intrinsics, world→camera pose and image size
    /// `(width, height)`. Fails if the intrinsic matrix is singular.
    pub fn new(
        kmtx: Matrix3<f64>,
        rotation: Matrix3<f64>,
        translation: Vector3<f64>,
        image_size: (usize, usize),
    ) -> Result<Self> {
        let kinv = kmtx
            .try_inverse()
            .ok_or_else(|| LayoutError::configuration("camera intrinsics are singular"))?;
        Ok(Self {
            kmtx,
            kinv,
            rotation,
            translation,
            image_size,
        })
    }

    /// Convenience constructor for zero-skew intrinsics.
    pub fn from_focal(
        focal: (f64, f64),
        principal: (f64, f64),
        rotation: Matrix3<f64>,
        translation: Vector3<f64>,
        image_size: (usize, usize),
    ) -> Result<Self> {
        let kmtx = Matrix3::new(
            focal.0,
            0.0,
            principal.0,
            0.0,
            focal.1,
            principal.1,
            0.0,
            0.0,
            1.0,
        );
        Self::new(kmtx, rotation, translation, image_size)
    }

    pub fn kmtx(&self) -> &Matrix3<f64> {
        &self.kmtx
    }

    pub fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    pub fn image_size(&self) -> (usize, usize) {
        self.image_size
    }

    /// Camera centre in world coordinates.
    pub fn center(&self) -> Vector3<f64> {
        -(self.rotation.transpose() * self.translation)
    }

    /// Homogeneous image vanishing point of world axis `axis`.
    pub fn image_vpt(&self, axis: usize) -> Vector3<f64> {
        self.kmtx * self.rotation.column(axis)
    }

    /// World up direction expressed in the camera frame.
    pub fn up_direction(&self) -> Vector3<f64> {
        self.rotation.column(VERTICAL_AXIS).into_owned()
    }

    /// Image horizon line, signed so that `l·(u, v, 1) > 0` for pixels whose
    /// viewing ray points below the horizon (the floor side).
    pub fn image_horizon(&self) -> Vector3<f64> {
        -(self.kinv.transpose() * self.up_direction())
    }

    /// Depth of a world point along the optical axis.
    pub fn depth_of(&self, world: &Vector3<f64>) -> f64 {
        (self.rotation * world + self.translation).z
    }

    /// Project a world point into the image. Returns `None` for points on or
    /// behind the camera plane.
    pub fn project(&self, world: &Vector3<f64>) -> Option<Vector2<f64>> {
        let pc = self.rotation * world + self.translation;
        if pc.z <= EPS {
            return None;
        }
        let p = self.kmtx * pc;
        Some(Vector2::new(p.x / p.z, p.y / p.z))
    }

    /// World-frame direction of the viewing ray through a homogeneous image
    /// point, scaled so that its camera-frame depth component is one.
    pub fn pixel_ray(&self, image_pt: &Vector3<f64>) -> Option<Vector3<f64>> {
        let r = self.kinv * image_pt;
        if r.z.abs() <= EPS {
            return None;
        }
        Some(self.rotation.transpose() * (r / r.z))
    }

    /// Intersect the viewing ray through `image_pt` with the plane
    /// `n·X + d = 0`, given as `(n, d)`.
    pub fn intersect_plane(
        &self,
        image_pt: &Vector3<f64>,
        plane: &Vector4<f64>,
    ) -> Option<Vector3<f64>> {
        let dir = self.pixel_ray(image_pt)?;
        let normal = plane.xyz();
        let denom = normal.dot(&dir);
        if denom.abs() <= EPS {
            return None;
        }
        let origin = self.center();
        let s = -(normal.dot(&origin) + plane.w) / denom;
        Some(origin + dir * s)
    }
}

/// Horizontal plane `z = height` in the form accepted by
/// [`PosedCamera::intersect_plane`].
pub fn horizontal_plane(height: f64) -> Vector4<f64> {
    Vector4::new(0.0, 0.0, 1.0, -height)
}
