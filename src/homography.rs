//! Projective helpers: homogeneous conversions, the vertical rectifier that
//! defines grid space, and the floor→ceiling Manhattan homology.
use crate::camera::PosedCamera;
use crate::error::{LayoutError, Result};
use nalgebra::{Matrix3, Rotation3, Vector2, Vector3};

const EPS: f64 = 1e-9;

/// Dehomogenise a point. Points at infinity produce non-finite coordinates.
#[inline]
pub fn project(v: &Vector3<f64>) -> Vector2<f64> {
    Vector2::new(v.x / v.z, v.y / v.z)
}

#[inline]
pub fn unproject(p: &Vector2<f64>) -> Vector3<f64> {
    Vector3::new(p.x, p.y, 1.0)
}

/// `+1` for non-negative values, `-1` otherwise.
#[inline]
pub fn half_sign(x: f64) -> f64 {
    if x >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Apply a homography to a set of points. Returns `None` if any point maps
/// to (or near) infinity.
pub fn apply_homography_points(h: &Matrix3<f64>, pts: &[Vector2<f64>]) -> Option<Vec<Vector2<f64>>> {
    let mut out = Vec::with_capacity(pts.len());
    for p in pts {
        let v = h * unproject(p);
        let w = v[2];
        if !w.is_finite() || w.abs() <= EPS || !v[0].is_finite() || !v[1].is_finite() {
            return None;
        }
        out.push(Vector2::new(v[0] / w, v[1] / w));
    }
    Some(out)
}

pub(crate) fn invert(h: &Matrix3<f64>, what: &str) -> Result<Matrix3<f64>> {
    h.try_inverse()
        .ok_or_else(|| LayoutError::configuration(format!("{what} is not invertible")))
}

/// Homography from image pixels to a `grid_size = (W, H)` grid in which
/// world verticals are grid columns and the horizon is a grid row.
///
/// The camera is virtually rotated about its centre so that world-up maps to
/// image-up (`K·R_v·K⁻¹`), then an axis-aligned affine map with positive
/// scales fits the image corners onto `[0, W-1] × [0, H-1]`.
pub fn vertical_rectifier(camera: &PosedCamera, grid_size: (usize, usize)) -> Result<Matrix3<f64>> {
    let up = camera.up_direction();
    let image_up = Vector3::new(0.0, -1.0, 0.0);
    let r_virtual = Rotation3::rotation_between(&up, &image_up).unwrap_or_else(|| {
        // Upside-down camera: roll half a turn about the optical axis.
        Rotation3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::PI)
    });
    let kmtx = camera.kmtx();
    let kinv = invert(kmtx, "camera intrinsics")?;
    let rotate = kmtx * r_virtual.matrix() * kinv;

    let (nx, ny) = camera.image_size();
    let max_x = nx.saturating_sub(1) as f64;
    let max_y = ny.saturating_sub(1) as f64;
    let corners = [
        Vector2::new(0.0, 0.0),
        Vector2::new(max_x, 0.0),
        Vector2::new(0.0, max_y),
        Vector2::new(max_x, max_y),
    ];
    for c in &corners {
        if (rotate * unproject(c)).z <= EPS {
            return Err(LayoutError::configuration(
                "vertical rectification sends an image corner behind the virtual camera",
            ));
        }
    }
    let mapped = apply_homography_points(&rotate, &corners).ok_or_else(|| {
        LayoutError::configuration("vertical rectification sends an image corner to infinity")
    })?;

    let (min_x, max_x) = extent(mapped.iter().map(|p| p.x));
    let (min_y, max_y) = extent(mapped.iter().map(|p| p.y));
    let (sx, tx) = fit_axis(min_x, max_x, grid_size.0);
    let (sy, ty) = fit_axis(min_y, max_y, grid_size.1);
    let fit = Matrix3::new(sx, 0.0, tx, 0.0, sy, ty, 0.0, 0.0, 1.0);
    Ok(fit * rotate)
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Scale and offset mapping `[lo, hi]` onto the cell centres of `cells`
/// grid cells. A single cell maps to a narrow band around its centre so that
/// rounding never leaves the grid.
fn fit_axis(lo: f64, hi: f64, cells: usize) -> (f64, f64) {
    let centre = cells.saturating_sub(1) as f64 * 0.5;
    let span = if cells > 1 { (cells - 1) as f64 } else { 0.5 };
    let width = hi - lo;
    if width <= EPS {
        return (1.0, centre - lo);
    }
    let scale = span / width;
    (scale, centre - 0.5 * span - lo * scale)
}

/// Image-space homology sending the image of a floor point (`z = zfloor`)
/// to the image of the ceiling point (`z = zceil`) directly above it.
pub fn manhattan_homology(camera: &PosedCamera, zfloor: f64, zceil: f64) -> Result<Matrix3<f64>> {
    let plane_to_image = |z: f64| {
        let r = camera.rotation();
        let t = camera.translation();
        let third = r.column(2) * z + t;
        camera.kmtx() * Matrix3::from_columns(&[r.column(0).into_owned(), r.column(1).into_owned(), third])
    };
    let floor = invert(&plane_to_image(zfloor), "floor plane homography")?;
    Ok(plane_to_image(zceil) * floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitched_camera() -> PosedCamera {
        let level = Matrix3::new(1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0);
        let pitch = Rotation3::from_axis_angle(&Vector3::x_axis(), 0.2);
        let yaw = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.4);
        let r = pitch.matrix() * level * yaw.matrix();
        let center = Vector3::new(0.3, -0.2, 0.1);
        let t = -(r * center);
        PosedCamera::from_focal((300.0, 300.0), (160.0, 120.0), r, t, (320, 240)).unwrap()
    }

    #[test]
    fn apply_rejects_points_at_infinity() {
        let h = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0);
        assert!(apply_homography_points(&h, &[Vector2::new(0.0, 5.0)]).is_none());
        let ok = apply_homography_points(&h, &[Vector2::new(2.0, 4.0)]).unwrap();
        assert!((ok[0] - Vector2::new(1.0, 2.0)).norm() < 1e-12);
    }

    #[test]
    fn rectifier_fits_corners_into_grid() {
        let cam = pitched_camera();
        let h = vertical_rectifier(&cam, (64, 48)).unwrap();
        let corners = [
            Vector2::new(0.0, 0.0),
            Vector2::new(319.0, 0.0),
            Vector2::new(0.0, 239.0),
            Vector2::new(319.0, 239.0),
        ];
        let mapped = apply_homography_points(&h, &corners).unwrap();
        for p in &mapped {
            assert!(p.x > -1e-6 && p.x < 63.0 + 1e-6, "x={}", p.x);
            assert!(p.y > -1e-6 && p.y < 47.0 + 1e-6, "y={}", p.y);
        }
    }

    #[test]
    fn rectified_verticals_are_columns() {
        let cam = pitched_camera();
        let h = vertical_rectifier(&cam, (64, 48)).unwrap();
        let vertical = h * cam.image_vpt(2);
        assert!(vertical.z.abs() < 1e-9 * vertical.norm());
        assert!(vertical.x.abs() < 1e-9 * vertical.norm());
    }

    #[test]
    fn homology_maps_floor_to_ceiling() {
        let cam = pitched_camera();
        let hom = manhattan_homology(&cam, -1.2, 1.4).unwrap();
        let floor_pt = Vector3::new(0.5, 2.5, -1.2);
        let ceil_pt = Vector3::new(0.5, 2.5, 1.4);
        let a = cam.project(&floor_pt).unwrap();
        let b = cam.project(&ceil_pt).unwrap();
        let mapped = project(&(hom * unproject(&a)));
        assert!((mapped - b).norm() < 1e-6);
    }

    #[test]
    fn half_sign_treats_zero_as_positive() {
        assert_eq!(half_sign(0.0), 1.0);
        assert_eq!(half_sign(-3.0), -1.0);
    }
}
