use super::backtrack;
use super::line::WallLine;
use super::memo::MemoTable;
use super::params::SolverParams;
use super::state::{DpState, Direction, SubSolution};
use crate::cost::CostField;
use crate::diagnostics::SolveStats;
use crate::error::{LayoutError, Result};
use crate::geometry::RectifiedGeometry;
use crate::solution::DpSolution;
use log::{debug, warn};
use std::time::Instant;

/// Globally optimal Manhattan layout over a rectified grid.
///
/// Layouts are traced from the right edge of the grid to the left. A wall
/// leaves a cell (`Out`) along the line through its axis's vanishing column,
/// ends at a corner (`In`), and the next wall starts there either directly or
/// after sliding up or down an occluding edge. Every wall costs
/// `wall_penalty`, every occlusion additionally `occlusion_penalty`, and each
/// grid cell a wall passes through contributes its score.
///
/// The memo table and the last solution are kept between calls; the table is
/// reused without reallocation while the grid size is unchanged.
#[derive(Debug, Default)]
pub struct ManhattanDp {
    params: SolverParams,
    memo: MemoTable,
    solution: Option<DpSolution>,
    stats: SolveStats,
}

impl ManhattanDp {
    pub fn new(params: SolverParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// Solve one frame. Nothing from a failed solve is published: the
    /// previous solution is cleared before the search starts.
    pub fn compute(&mut self, costs: &CostField, geometry: &RectifiedGeometry) -> Result<&DpSolution> {
        let t0 = Instant::now();
        self.solution = None;
        costs.check_grid(geometry.grid_size())?;
        if costs.wall_penalty < 0.0 {
            warn!(
                "ManhattanDp::compute wall_penalty is negative ({})",
                costs.wall_penalty
            );
        }
        // A negative occlusion penalty alone is allowed.
        if costs.wall_penalty + costs.occlusion_penalty < 0.0 {
            warn!(
                "ManhattanDp::compute wall_penalty + occlusion_penalty is negative ({})",
                costs.wall_penalty + costs.occlusion_penalty
            );
        }

        self.memo.reset(geometry.grid_size());
        self.stats = SolveStats::default();
        let (w, h) = geometry.grid_size();
        let wall_penalty = costs.wall_penalty as f64;

        let mut best = SubSolution::INFEASIBLE;
        {
            let mut search = Search {
                costs,
                geometry,
                jump_threshold: self.params.jump_threshold,
                memo: &mut self.memo,
                stats: &mut self.stats,
            };
            // The first wall is paid for here; every later one on its corner.
            for axis in 0..2 {
                for row in 0..h {
                    let terminal = DpState::new(row as i32, w as i32, axis, Direction::Out);
                    let sub = search.solve(terminal);
                    best.replace_if_superior(&sub, terminal, -wall_penalty);
                }
            }
        }
        if !best.is_feasible() {
            warn!("ManhattanDp::compute no terminal state has a finite score");
            return Err(LayoutError::InfeasibleSolution);
        }

        let solution = backtrack::populate(&best, &self.memo, geometry)?;
        self.stats.visited_states = self.memo.visited();
        self.stats.elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "ManhattanDp::compute score={:.3} walls={} occlusions={} lookups={} hits={} max_depth={} ms={:.2}",
            solution.score,
            solution.num_walls,
            solution.num_occlusions,
            self.stats.memo_lookups,
            self.stats.memo_hits,
            self.stats.max_depth,
            self.stats.elapsed_ms
        );
        Ok(&*self.solution.insert(solution))
    }

    /// Solution of the last successful solve.
    pub fn solution(&self) -> Option<&DpSolution> {
        self.solution.as_ref()
    }

    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }

    /// Best memoised score of every grid cell, row-major. Cells the search
    /// never reached are `-inf`.
    pub fn best_scores(&self) -> Vec<f64> {
        self.memo.best_scores()
    }

    /// Memoised solution of a single state from the last solve.
    pub fn memoised(&self, state: &DpState) -> Option<&SubSolution> {
        self.memo.get(state)
    }

    /// Log every state of the last backtrack with its memoised score.
    pub fn report_backtrack(&self) {
        let Some(solution) = &self.solution else {
            debug!("ManhattanDp::report_backtrack no solution");
            return;
        };
        for state in &solution.full_backtrack {
            let score = self.memo.get(state).map_or(f64::NAN, |s| s.score);
            debug!("{state} ({score:.3})");
        }
    }
}

/// Frame of the explicit evaluation stack: a state, its successors with the
/// score change of moving to each, and the next successor to visit.
struct Frame {
    state: DpState,
    options: Vec<(DpState, f64)>,
    next: usize,
}

struct Search<'a> {
    costs: &'a CostField,
    geometry: &'a RectifiedGeometry,
    jump_threshold: f64,
    memo: &'a mut MemoTable,
    stats: &'a mut SolveStats,
}

impl Search<'_> {
    /// Memoised score of `root`.
    ///
    /// Successor lists depend only on the geometry and the costs, never on
    /// scores, so the recursion unrolls into a post-order walk: a state is
    /// evaluated once all of its successors are in the memo.
    fn solve(&mut self, root: DpState) -> SubSolution {
        self.stats.memo_lookups += 1;
        if let Some(done) = self.memo.get(&root) {
            self.stats.memo_hits += 1;
            return *done;
        }

        let mut stack = vec![self.frame(root)];
        self.stats.max_depth = self.stats.max_depth.max(stack.len());
        while let Some(top) = stack.last_mut() {
            let pending = top.options.get(top.next).map(|&(child, _)| child);
            match pending {
                Some(child) => {
                    top.next += 1;
                    self.stats.memo_lookups += 1;
                    if self.memo.contains(&child) {
                        self.stats.memo_hits += 1;
                        continue;
                    }
                    let frame = self.frame(child);
                    stack.push(frame);
                    self.stats.max_depth = self.stats.max_depth.max(stack.len());
                }
                None => {
                    if let Some(done) = stack.pop() {
                        let solution = self.evaluate(&done);
                        self.memo.insert(&done.state, solution);
                    }
                }
            }
        }
        self.memo
            .get(&root)
            .copied()
            .unwrap_or(SubSolution::INFEASIBLE)
    }

    fn frame(&self, state: DpState) -> Frame {
        Frame {
            state,
            options: self.successors(&state),
            next: 0,
        }
    }

    fn evaluate(&self, frame: &Frame) -> SubSolution {
        let mut best = if frame.state.col == 0 {
            SubSolution::new(0.0)
        } else {
            SubSolution::INFEASIBLE
        };
        for &(next, delta) in &frame.options {
            if let Some(sub) = self.memo.get(&next) {
                best.replace_if_superior(sub, next, delta);
            }
        }
        best
    }

    fn successors(&self, state: &DpState) -> Vec<(DpState, f64)> {
        let mut out = Vec::new();
        if state.col == 0 {
            return out;
        }
        match state.dir {
            Direction::In => {
                let wall = self.costs.wall_penalty as f64;
                let occluding_wall = wall + self.costs.occlusion_penalty as f64;
                for axis in 0..2 {
                    let next = state.with_axis(axis);
                    out.push((next.with_dir(Direction::Out), -wall));
                    for dir in [Direction::Up, Direction::Down] {
                        let vert = next.with_dir(dir);
                        if self.can_move_vert(state, &vert) {
                            out.push((vert, -occluding_wall));
                        }
                    }
                }
            }
            Direction::Up | Direction::Down => {
                // The axis is already committed: leave along it, or keep
                // sliding without touching the horizon or the grid border.
                out.push((state.with_dir(Direction::Out), 0.0));
                let step = if state.dir == Direction::Up { -1 } else { 1 };
                let row = state.row + step;
                let rows = self.geometry.grid_size().1 as i32;
                if row != self.geometry.horizon_row() && (0..rows).contains(&row) {
                    out.push((DpState { row, ..*state }, 0.0));
                }
            }
            Direction::Out => self.wall_successors(state, &mut out),
        }
        out
    }

    /// Walk left along the wall line of an `Out` state, offering a corner in
    /// every column and stopping at the first column where the line may
    /// continue from the rounded cell with a small kink.
    fn wall_successors(&self, state: &DpState, out: &mut Vec<(DpState, f64)>) {
        let horizon = self.geometry.horizon_row();
        let vpt_col = self.geometry.vpt_col(state.axis);
        let Some(line) = WallLine::through(state.row, state.col, horizon, vpt_col) else {
            return;
        };
        let rows = self.geometry.grid_size().1 as f64;
        let mut delta = 0.0;
        for col in (0..state.col).rev() {
            if col as i64 == vpt_col {
                break;
            }
            let y = line.row_at(col);
            let rounded = y.round();
            if !(rounded >= 0.0 && rounded < rows) || rounded as i32 == horizon {
                break;
            }
            let row = rounded as i32;
            delta += self.costs.score(state.axis, row as usize, col as usize) as f64;
            let corner = DpState::new(row, col, state.axis, Direction::In);
            out.push((corner, delta));

            let dist = (row - state.row).abs() + (state.col - col);
            let rel_error = (rounded - y).abs() / dist as f64;
            if rel_error < self.jump_threshold {
                out.push((corner.with_dir(Direction::Out), delta));
                break;
            }
        }
    }

    /// Whether the corner `cur` may continue into the vertical move `next`.
    fn can_move_vert(&self, cur: &DpState, next: &DpState) -> bool {
        let on_ceiling = cur.row < self.geometry.horizon_row();
        let going_up = next.dir == Direction::Up;
        let occl_side = if on_ceiling == going_up { -1 } else { 1 };
        let vpt_cols = [self.geometry.vpt_col(0), self.geometry.vpt_col(1)];
        occlusion_valid(cur.col as i64, vpt_cols, next.axis, cur.axis, occl_side)
    }
}

/// Geometric consistency of an occluding edge at column `col` between a
/// left wall on `left_axis` and a right wall on `right_axis`, with the
/// occluding wall on side `occl_side` (`-1` left, `+1` right).
///
/// The edge is valid iff "the occluding wall's vanishing point lies behind
/// it" is equivalent to "the other vanishing point lies between the edge and
/// the occluding vanishing point".
pub(crate) fn occlusion_valid(
    col: i64,
    vpt_cols: [i64; 2],
    left_axis: usize,
    right_axis: usize,
    occl_side: i32,
) -> bool {
    let occl_axis = if occl_side < 0 { left_axis } else { right_axis };
    let occl_vpt = vpt_cols[occl_axis];
    let occl_vpt_side = if occl_vpt < col { -1 } else { 1 };
    // The other axis even when both walls share one.
    let opp_vpt = vpt_cols[1 - occl_axis];
    let opp_vpt_side = if opp_vpt < col { -1 } else { 1 };

    let occl_vpt_behind = occl_side == occl_vpt_side;
    let opp_vpt_between =
        opp_vpt_side == occl_vpt_side && (col - opp_vpt).abs() < (col - occl_vpt).abs();
    occl_vpt_behind == opp_vpt_between
}
