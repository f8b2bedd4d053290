use crate::camera::PosedCamera;
use crate::params::LayoutParams;
use nalgebra::{Matrix3, Vector3};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct LayoutDemoConfig {
    pub camera: CameraConfig,
    pub zfloor: f64,
    pub zceil: f64,
    pub costs: CostConfig,
    #[serde(default)]
    pub params: LayoutParams,
    pub output: LayoutDemoOutputConfig,
}

/// Pinhole camera with a world→camera pose. `rotation` is given row by row.
#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    pub focal: [f64; 2],
    pub principal: [f64; 2],
    pub rotation: [[f64; 3]; 3],
    #[serde(default)]
    pub translation: [f64; 3],
    pub image_size: [usize; 2],
}

impl CameraConfig {
    pub fn build(&self) -> Result<PosedCamera, String> {
        let r = &self.rotation;
        let rotation = Matrix3::new(
            r[0][0], r[0][1], r[0][2], r[1][0], r[1][1], r[1][2], r[2][0], r[2][1], r[2][2],
        );
        let [tx, ty, tz] = self.translation;
        PosedCamera::from_focal(
            (self.focal[0], self.focal[1]),
            (self.principal[0], self.principal[1]),
            rotation,
            Vector3::new(tx, ty, tz),
            (self.image_size[0], self.image_size[1]),
        )
        .map_err(|e| format!("Invalid camera: {e}"))
    }
}

/// Wall evidence images, one per axis, plus the penalties.
#[derive(Debug, Deserialize)]
pub struct CostConfig {
    pub axis0: PathBuf,
    pub axis1: PathBuf,
    /// Optional evidence shared by both axes.
    #[serde(default)]
    pub shared: Option<PathBuf>,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default = "default_weight")]
    pub shared_weight: f32,
    /// Images are in camera pixels and get splatted into the grid; otherwise
    /// they must already have the grid size.
    #[serde(default = "default_image_space")]
    pub image_space: bool,
    pub wall_penalty: f32,
    pub occlusion_penalty: f32,
}

fn default_weight() -> f32 {
    1.0
}

fn default_image_space() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct LayoutDemoOutputConfig {
    pub report_json: PathBuf,
    #[serde(default)]
    pub orients_png: Option<PathBuf>,
    #[serde(default)]
    pub depth_png: Option<PathBuf>,
    #[serde(default)]
    pub grid_orients_png: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<LayoutDemoConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    parse_config(&data).map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

pub fn parse_config(json: &str) -> Result<LayoutDemoConfig, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let json = r#"{
            "camera": {
                "focal": [300, 300],
                "principal": [160, 120],
                "rotation": [[1, 0, 0], [0, 0, -1], [0, 1, 0]],
                "image_size": [320, 240]
            },
            "zfloor": -1.2,
            "zceil": 1.3,
            "costs": {
                "axis0": "a0.png",
                "axis1": "a1.png",
                "wall_penalty": 1.0,
                "occlusion_penalty": 0.5
            },
            "params": { "solver": { "jump_threshold": 0.2 } },
            "output": { "report_json": "out/report.json" }
        }"#;
        let cfg = parse_config(json).unwrap();
        assert!(cfg.costs.image_space);
        assert_eq!(cfg.costs.weight, 1.0);
        assert_eq!(cfg.params.solver.jump_threshold, 0.2);
        assert_eq!(cfg.params.geometry.grid_size, [320, 240]);
        let cam = cfg.camera.build().unwrap();
        assert_eq!(cam.image_size(), (320, 240));
        assert!(cfg.output.depth_png.is_none());
    }
}
