//! Polygon rasterisation into label maps.
use crate::homography::project;
use crate::image::LabelMap;
use nalgebra::{Vector2, Vector3};

/// Even-odd ray-casting test against a closed polygon.
pub fn point_in_polygon(p: &Vector2<f64>, vertices: &[Vector2<f64>]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (vi, vj) = (&vertices[i], &vertices[j]);
        if (vi.y > p.y) != (vj.y > p.y) {
            let cross_x = (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x;
            if p.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Paint `label` into every pixel whose centre lies inside the polygon with
/// homogeneous `vertices`. Polygons with a vertex at infinity are skipped.
/// Returns the number of pixels written.
pub fn fill_polygon(vertices: &[Vector3<f64>], labels: &mut LabelMap, label: u8) -> usize {
    let pts: Vec<Vector2<f64>> = vertices.iter().map(project).collect();
    if pts.len() < 3 || pts.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return 0;
    }
    if labels.w == 0 || labels.h == 0 {
        return 0;
    }
    let (lo, hi) = pts.iter().fold(
        (Vector2::repeat(f64::INFINITY), Vector2::repeat(f64::NEG_INFINITY)),
        |(lo, hi), p| (lo.inf(p), hi.sup(p)),
    );
    let x0 = lo.x.floor().max(0.0) as usize;
    let y0 = lo.y.floor().max(0.0) as usize;
    let x1 = (hi.x.ceil().max(0.0) as usize).min(labels.w - 1);
    let y1 = (hi.y.ceil().max(0.0) as usize).min(labels.h - 1);
    let mut written = 0;
    for y in y0..=y1 {
        for x in x0..=x1 {
            if point_in_polygon(&Vector2::new(x as f64, y as f64), &pts) {
                labels.set(x, y, label);
                written += 1;
            }
        }
    }
    written
}
