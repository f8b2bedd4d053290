#![doc = include_str!("../README.md")]

// Core: geometry, search, solution.
pub mod camera;
pub mod cost;
pub mod dp;
pub mod error;
pub mod geometry;
pub mod homography;
pub mod solution;

// Collaborators and ambient pieces.
pub mod config;
pub mod diagnostics;
pub mod evaluation;
pub mod image;
pub mod params;
pub mod raster;
pub mod reconstructor;
pub mod render;

// --- High-level re-exports -------------------------------------------------

pub use crate::camera::{PosedCamera, VERTICAL_AXIS};
pub use crate::cost::CostField;
pub use crate::dp::{Direction, DpState, ManhattanDp, SolverParams, SubSolution};
pub use crate::error::{LayoutError, Result};
pub use crate::geometry::{RectifiedGeometry, ScaledGeometry};
pub use crate::params::{GeometryParams, LayoutParams};
pub use crate::reconstructor::{solve_batch, GroundTruth, LayoutFrame, ManhattanReconstructor};
pub use crate::solution::{DpSolution, WallSegment};

pub use crate::diagnostics::{SolveReport, SolveStats};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
pub mod prelude {
    pub use crate::render::{DepthRenderer, SimpleDepthRenderer};
    pub use crate::{
        CostField, DpSolution, LayoutError, LayoutParams, ManhattanDp, ManhattanReconstructor,
        PosedCamera, RectifiedGeometry, ScaledGeometry, SolverParams,
    };
}
