use super::TimingBreakdown;
use crate::dp::DpState;
use crate::solution::{DpSolution, WallSegment};
use serde::Serialize;

/// Counters collected during one search.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveStats {
    pub memo_lookups: u64,
    pub memo_hits: u64,
    /// Deepest chain of states under evaluation at once.
    pub max_depth: usize,
    pub visited_states: usize,
    pub elapsed_ms: f64,
}

impl SolveStats {
    pub fn hit_rate(&self) -> f64 {
        if self.memo_lookups == 0 {
            0.0
        } else {
            self.memo_hits as f64 / self.memo_lookups as f64
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDescriptor {
    pub width: usize,
    pub height: usize,
    pub horizon_row: i32,
    pub vpt_cols: [f64; 2],
}

/// Serializable summary of one solved frame.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveReport {
    pub grid: GridDescriptor,
    pub score: f64,
    pub num_walls: usize,
    pub num_occlusions: usize,
    pub walls: Vec<WallSegment>,
    pub path_rows: Vec<usize>,
    pub path_axes: Vec<usize>,
    pub corners: Vec<DpState>,
    pub stats: SolveStats,
    pub timings: TimingBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labelling_error: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_error: Option<f64>,
}

impl SolveReport {
    pub fn new(
        grid: GridDescriptor,
        solution: &DpSolution,
        stats: SolveStats,
        timings: TimingBreakdown,
    ) -> Self {
        Self {
            grid,
            score: solution.score,
            num_walls: solution.num_walls,
            num_occlusions: solution.num_occlusions,
            walls: solution.wall_segments.clone(),
            path_rows: solution.path_rows.clone(),
            path_axes: solution.path_axes.clone(),
            corners: solution.abbrev_backtrack.clone(),
            stats,
            timings,
            labelling_error: None,
            depth_error: None,
        }
    }
}
