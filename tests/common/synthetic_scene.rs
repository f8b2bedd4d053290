//! Small synthetic cameras and cost fields for the solver tests.
use manhattan_layout::image::ImageF32;
use manhattan_layout::{CostField, PosedCamera, ScaledGeometry};
use nalgebra::{Matrix3, Rotation3, Vector3};

/// World→camera rotation of a level camera looking along world axis 1,
/// with world z up.
pub fn level_rotation() -> Matrix3<f64> {
    Matrix3::new(1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0)
}

pub fn level_camera(size: (usize, usize), focal: f64, principal: (f64, f64)) -> PosedCamera {
    PosedCamera::from_focal(
        (focal, focal),
        principal,
        level_rotation(),
        Vector3::zeros(),
        size,
    )
    .expect("level camera")
}

/// Camera pitched down and yawed away from the room axes, standing off the
/// world origin.
pub fn pitched_camera() -> PosedCamera {
    let pitch = Rotation3::from_axis_angle(&Vector3::x_axis(), 0.2);
    let yaw = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.4);
    let r = pitch.matrix() * level_rotation() * yaw.matrix();
    let center = Vector3::new(0.3, -0.2, 0.1);
    let t = -(r * center);
    PosedCamera::from_focal((300.0, 300.0), (160.0, 120.0), r, t, (320, 240))
        .expect("pitched camera")
}

/// 4x4 image on a 4x4 grid. Rectification is the identity, the horizon is
/// row 2, axis 0 vanishes at infinity and axis 1 at column 1.
pub fn tiny_geometry() -> ScaledGeometry {
    let camera = level_camera((4, 4), 2.0, (1.5, 2.0));
    ScaledGeometry::new(camera, -1.0, 1.0, (4, 4)).expect("tiny geometry")
}

/// Single strong axis-0 cell at row 1, column 2.
pub fn tiny_costs() -> CostField {
    let mut costs = CostField::new((4, 4), 1.0, 0.5);
    costs.set_score(0, 1, 2, 10.0);
    costs
}

/// 40x30 image on an equally sized grid with the horizon at row 14.
pub fn room_geometry() -> ScaledGeometry {
    let camera = level_camera((40, 30), 20.0, (19.5, 14.0));
    ScaledGeometry::new(camera, -1.0, 1.2, (40, 30)).expect("room geometry")
}

/// Deterministic pseudo-random field in `[0, 1)`.
pub fn lcg_field(w: usize, h: usize, seed: u64) -> ImageF32 {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let data = (0..w * h)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 40) as f32 / (1u64 << 24) as f32
        })
        .collect();
    ImageF32::from_vec(w, h, data).expect("field size")
}

pub fn random_costs(w: usize, h: usize, seed: u64) -> CostField {
    CostField::from_scores(
        [lcg_field(w, h, seed), lcg_field(w, h, seed + 1)],
        0.5,
        0.3,
    )
    .expect("matching score grids")
}
