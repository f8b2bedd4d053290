//! Depth rendering of layouts.
use crate::camera::{horizontal_plane, PosedCamera};
use crate::image::ImageF32;
use crate::raster::point_in_polygon;
use nalgebra::{Vector2, Vector3, Vector4};

/// Z-buffer rasteriser for the surfaces of a layout.
pub trait DepthRenderer {
    /// Start a new frame for `camera`, clearing the depth buffer.
    fn configure(&mut self, camera: &PosedCamera);
    /// Render the horizontal plane `z = height`.
    fn render_infinite_plane(&mut self, height: f64);
    /// Render the world-space triangle `(a, b, c)`.
    fn render_triangle(&mut self, a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>);
    /// Fill pixels that no surface reached from their neighbours.
    fn smooth_infinite_depths(&mut self);
    /// Camera-frame depth per pixel; `inf` where nothing was rendered.
    fn depth_buffer(&self) -> &ImageF32;
}

/// Software renderer casting one ray per pixel.
#[derive(Clone, Debug, Default)]
pub struct SimpleDepthRenderer {
    camera: Option<PosedCamera>,
    depth: ImageF32,
}

impl SimpleDepthRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn splat_plane_hit(&mut self, x: usize, y: usize, plane: &Vector4<f64>) {
        let Some(camera) = &self.camera else {
            return;
        };
        let pixel = Vector3::new(x as f64, y as f64, 1.0);
        let Some(world) = camera.intersect_plane(&pixel, plane) else {
            return;
        };
        let depth = camera.depth_of(&world) as f32;
        if depth > 0.0 && depth < self.depth.get(x, y) {
            self.depth.set(x, y, depth);
        }
    }
}

impl DepthRenderer for SimpleDepthRenderer {
    fn configure(&mut self, camera: &PosedCamera) {
        let (nx, ny) = camera.image_size();
        self.camera = Some(camera.clone());
        self.depth = ImageF32::filled(nx, ny, f32::INFINITY);
    }

    fn render_infinite_plane(&mut self, height: f64) {
        let plane = horizontal_plane(height);
        for y in 0..self.depth.h {
            for x in 0..self.depth.w {
                self.splat_plane_hit(x, y, &plane);
            }
        }
    }

    fn render_triangle(&mut self, a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) {
        let Some(camera) = &self.camera else {
            return;
        };
        // Triangles crossing the camera plane are dropped, not clipped.
        let (Some(pa), Some(pb), Some(pc)) = (camera.project(a), camera.project(b), camera.project(c))
        else {
            return;
        };
        let normal = (b - a).cross(&(c - a));
        if normal.norm() <= f64::EPSILON {
            return;
        }
        let plane = Vector4::new(normal.x, normal.y, normal.z, -normal.dot(a));
        let tri = [pa, pb, pc];
        let lo = pa.inf(&pb).inf(&pc);
        let hi = pa.sup(&pb).sup(&pc);
        if self.depth.w == 0 || self.depth.h == 0 || hi.x < 0.0 || hi.y < 0.0 {
            return;
        }
        let x0 = lo.x.floor().max(0.0) as usize;
        let y0 = lo.y.floor().max(0.0) as usize;
        let x1 = (hi.x.ceil() as usize).min(self.depth.w - 1);
        let y1 = (hi.y.ceil() as usize).min(self.depth.h - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                if point_in_polygon(&Vector2::new(x as f64, y as f64), &tri) {
                    self.splat_plane_hit(x, y, &plane);
                }
            }
        }
    }

    fn smooth_infinite_depths(&mut self) {
        let (w, h) = (self.depth.w, self.depth.h);
        if !self.depth.data.iter().any(|d| d.is_finite()) {
            return;
        }
        loop {
            let mut next = self.depth.clone();
            let mut changed = false;
            for y in 0..h {
                for x in 0..w {
                    if self.depth.get(x, y).is_finite() {
                        continue;
                    }
                    let neighbours = [
                        (x.wrapping_sub(1), y),
                        (x + 1, y),
                        (x, y.wrapping_sub(1)),
                        (x, y + 1),
                    ];
                    let (sum, n) = neighbours
                        .iter()
                        .filter(|&&(nx, ny)| nx < w && ny < h)
                        .map(|&(nx, ny)| self.depth.get(nx, ny))
                        .filter(|d| d.is_finite())
                        .fold((0.0f32, 0u32), |(s, n), d| (s + d, n + 1));
                    if n > 0 {
                        next.set(x, y, sum / n as f32);
                        changed = true;
                    }
                }
            }
            self.depth = next;
            if !changed {
                break;
            }
        }
    }

    fn depth_buffer(&self) -> &ImageF32 {
        &self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    fn level_camera() -> PosedCamera {
        let r = Matrix3::new(1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0);
        PosedCamera::from_focal((20.0, 20.0), (15.5, 12.0), r, Vector3::zeros(), (32, 24)).unwrap()
    }

    #[test]
    fn floor_depth_follows_row_distance_from_horizon() {
        let mut renderer = SimpleDepthRenderer::new();
        renderer.configure(&level_camera());
        renderer.render_infinite_plane(-1.0);
        let depth = renderer.depth_buffer();
        // Ray slope (v - cy) / f = 10 / 20 hits z = -1 at depth 2.
        assert!((depth.get(5, 22) - 2.0).abs() < 1e-5);
        assert!(depth.get(5, 5).is_infinite());
    }

    #[test]
    fn nearer_triangle_wins_the_depth_test() {
        let mut renderer = SimpleDepthRenderer::new();
        renderer.configure(&level_camera());
        renderer.render_infinite_plane(-1.0);
        // Wall at y = 3 whose base projects to row 18.67.
        let a = Vector3::new(-5.0, 3.0, -1.0);
        let b = Vector3::new(5.0, 3.0, -1.0);
        let c = Vector3::new(0.0, 3.0, 5.0);
        renderer.render_triangle(&a, &b, &c);
        let depth = renderer.depth_buffer();
        assert!((depth.get(15, 16) - 3.0).abs() < 1e-5);
        assert!((depth.get(15, 22) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn smoothing_leaves_no_infinite_pixels() {
        let mut renderer = SimpleDepthRenderer::new();
        renderer.configure(&level_camera());
        renderer.render_infinite_plane(-1.0);
        renderer.smooth_infinite_depths();
        assert!(renderer.depth_buffer().data.iter().all(|d| d.is_finite()));
    }
}
