//! Frame-level driver: geometry construction, solving, and evaluation
//! against ground truth.
use crate::camera::PosedCamera;
use crate::cost::CostField;
use crate::diagnostics::{GridDescriptor, SolveReport, TimingBreakdown};
use crate::dp::ManhattanDp;
use crate::error::{LayoutError, Result};
use crate::evaluation::{depth_errors, labelling_error, mean_error};
use crate::geometry::ScaledGeometry;
use crate::image::{ImageF32, LabelMap};
use crate::params::LayoutParams;
use crate::render::{DepthRenderer, SimpleDepthRenderer};
use crate::solution::DpSolution;
use log::debug;

/// One frame to solve: camera, floor/ceiling heights and grid-space costs.
#[derive(Clone, Debug)]
pub struct LayoutFrame {
    pub camera: PosedCamera,
    pub zfloor: f64,
    pub zceil: f64,
    pub costs: CostField,
}

/// Reference layout of a frame.
#[derive(Clone, Debug)]
pub struct GroundTruth {
    /// Orientation label per image pixel.
    pub orientations: LabelMap,
    /// Camera-frame depth per image pixel.
    pub depth: ImageF32,
    pub zfloor: f64,
    pub zceil: f64,
}

#[derive(Debug)]
pub struct ManhattanReconstructor {
    params: LayoutParams,
    dp: ManhattanDp,
    geometry: Option<ScaledGeometry>,
    timings: TimingBreakdown,
}

impl ManhattanReconstructor {
    pub fn new(params: LayoutParams) -> Self {
        let dp = ManhattanDp::new(params.solver.clone());
        Self {
            params,
            dp,
            geometry: None,
            timings: TimingBreakdown::default(),
        }
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn dp(&self) -> &ManhattanDp {
        &self.dp
    }

    /// Build the frame geometry, then solve it.
    pub fn solve_frame(&mut self, frame: &LayoutFrame) -> Result<&DpSolution> {
        let mut timings = TimingBreakdown::default();
        let grid_size = self.params.geometry.grid_size();
        let geometry = timings.time("geometry", || {
            ScaledGeometry::new(frame.camera.clone(), frame.zfloor, frame.zceil, grid_size)
        })?;
        self.solve_timed(geometry, &frame.costs, timings)
    }

    /// Solve `costs` on an already built geometry.
    pub fn compute(&mut self, geometry: ScaledGeometry, costs: &CostField) -> Result<&DpSolution> {
        self.solve_timed(geometry, costs, TimingBreakdown::default())
    }

    fn solve_timed(
        &mut self,
        geometry: ScaledGeometry,
        costs: &CostField,
        mut timings: TimingBreakdown,
    ) -> Result<&DpSolution> {
        self.geometry = None;
        let dp = &mut self.dp;
        timings.time("solve", || dp.compute(costs, &geometry).map(|_| ()))?;
        debug!(
            "ManhattanReconstructor::compute finished in {:.2} ms",
            timings.total_ms
        );
        self.timings = timings;
        self.geometry = Some(geometry);
        self.solution()
    }

    pub fn solution(&self) -> Result<&DpSolution> {
        self.dp.solution().ok_or(LayoutError::NotSolved)
    }

    pub fn geometry(&self) -> Result<&ScaledGeometry> {
        self.geometry.as_ref().ok_or(LayoutError::NotSolved)
    }

    pub fn timings(&self) -> &TimingBreakdown {
        &self.timings
    }

    pub fn grid_orients(&self) -> Result<LabelMap> {
        self.solution()?.grid_orients(self.geometry()?)
    }

    pub fn exact_orients(&self) -> Result<LabelMap> {
        self.solution()?.exact_orients(self.geometry()?)
    }

    pub fn labelling_error(&self, ground_truth: &LabelMap) -> Result<f64> {
        labelling_error(&self.solution()?.pixel_orients, ground_truth)
    }

    /// Depth of the solved layout at the solve-time floor/ceiling heights.
    pub fn depth_map(&self) -> Result<ImageF32> {
        let mut renderer = SimpleDepthRenderer::new();
        Ok(self
            .solution()?
            .depth_map(self.geometry()?, &mut renderer)
            .clone())
    }

    /// Relative depth error per pixel, rendering the layout at the
    /// ground-truth floor and ceiling heights.
    pub fn depth_errors<R: DepthRenderer>(
        &self,
        ground_truth: &GroundTruth,
        renderer: &mut R,
    ) -> Result<ImageF32> {
        let geometry = ScaledGeometry::from_geometry(
            self.geometry()?,
            ground_truth.zfloor,
            ground_truth.zceil,
        )?;
        let depth = self.solution()?.depth_map(&geometry, renderer);
        depth_errors(&ground_truth.depth, depth)
    }

    pub fn depth_error(&self, ground_truth: &GroundTruth) -> Result<f64> {
        let errors = self.depth_errors(ground_truth, &mut SimpleDepthRenderer::new())?;
        Ok(mean_error(&errors))
    }

    /// Labelling and depth error, logged and returned as `(labelling, depth)`.
    pub fn report_errors(&self, ground_truth: &GroundTruth) -> Result<(f64, f64)> {
        let labels = self.labelling_error(&ground_truth.orientations)?;
        let depth = self.depth_error(ground_truth)?;
        debug!(
            "ManhattanReconstructor labelling error {:.1}% mean depth error {:.1}%",
            labels * 100.0,
            depth * 100.0
        );
        Ok((labels, depth))
    }

    pub fn report_backtrack(&self) {
        self.dp.report_backtrack();
    }

    pub fn report(&self) -> Result<SolveReport> {
        let solution = self.solution()?;
        let geometry = self.geometry()?;
        let (width, height) = geometry.grid_size();
        let grid = GridDescriptor {
            width,
            height,
            horizon_row: geometry.horizon_row(),
            vpt_cols: [geometry.vpt_col_exact(0), geometry.vpt_col_exact(1)],
        };
        Ok(SolveReport::new(
            grid,
            solution,
            self.dp.stats().clone(),
            self.timings.clone(),
        ))
    }

    /// [`Self::report`] with both errors against `ground_truth` filled in.
    pub fn evaluated_report(&self, ground_truth: &GroundTruth) -> Result<SolveReport> {
        let (labelling, depth) = self.report_errors(ground_truth)?;
        let mut report = self.report()?;
        report.labelling_error = Some(labelling);
        report.depth_error = Some(depth);
        Ok(report)
    }
}

fn solve_one(frame: &LayoutFrame, params: &LayoutParams) -> Result<SolveReport> {
    let mut reconstructor = ManhattanReconstructor::new(params.clone());
    reconstructor.solve_frame(frame)?;
    reconstructor.report()
}

/// Solve independent frames, each with its own solver. Frames run on the
/// rayon pool when the `parallel` feature is enabled.
pub fn solve_batch(frames: &[LayoutFrame], params: &LayoutParams) -> Vec<Result<SolveReport>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        frames.par_iter().map(|f| solve_one(f, params)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        frames.iter().map(|f| solve_one(f, params)).collect()
    }
}
