//! Parameter types for grid construction and the layout search.
//!
//! Defaults match the resolutions the solver is usually run at; all fields
//! can be overridden from JSON (see [`crate::config`]).
use crate::dp::SolverParams;
use serde::Deserialize;

/// Rectified grid resolution.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GeometryParams {
    /// Grid size as `[columns, rows]`.
    pub grid_size: [usize; 2],
}

impl GeometryParams {
    pub fn grid_size(&self) -> (usize, usize) {
        (self.grid_size[0], self.grid_size[1])
    }
}

impl Default for GeometryParams {
    fn default() -> Self {
        Self {
            grid_size: [320, 240],
        }
    }
}

/// Everything needed to turn a frame into a layout.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    pub geometry: GeometryParams,
    pub solver: SolverParams,
}
