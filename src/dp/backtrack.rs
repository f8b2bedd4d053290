//! Turning the memoised search into an explicit layout.
use super::line::WallLine;
use super::memo::MemoTable;
use super::state::{DpState, Direction, SubSolution};
use crate::error::{LayoutError, Result};
use crate::geometry::RectifiedGeometry;
use crate::homography::project;
use crate::image::labels::HORIZONTAL_SURFACE;
use crate::image::LabelMap;
use crate::raster::fill_polygon;
use crate::solution::{DpSolution, WallSegment};
use nalgebra::Vector2;

/// Follow memo links from the winning terminal down to column zero,
/// collecting walls, occlusions, per-pixel labels and the per-column path.
pub(crate) fn populate(
    best: &SubSolution,
    memo: &MemoTable,
    geometry: &RectifiedGeometry,
) -> Result<DpSolution> {
    let (nx, ny) = geometry.camera().image_size();
    let mut solution = DpSolution {
        score: best.score,
        num_walls: 0,
        num_occlusions: 0,
        wall_segments: Vec::new(),
        path_rows: Vec::new(),
        path_axes: Vec::new(),
        pixel_orients: LabelMap::new(nx, ny, HORIZONTAL_SURFACE),
        full_backtrack: Vec::new(),
        abbrev_backtrack: Vec::new(),
    };

    let mut cur = best
        .src
        .ok_or_else(|| LayoutError::backtrack("winning solution has no terminal state"))?;
    let mut open: Option<DpState> = None;
    loop {
        let next = memo
            .get(&cur)
            .ok_or_else(|| LayoutError::backtrack(format!("state {cur} has no memoised solution")))?
            .src;
        solution.full_backtrack.push(cur);
        match cur.dir {
            Direction::In => {
                if let Some(out) = open.take() {
                    solution.abbrev_backtrack.push(cur);
                    let occluded = next.is_some_and(|n| n.dir.is_vertical());
                    close_wall(&mut solution, geometry, &out, &cur, occluded);
                }
            }
            Direction::Out if open.is_none() => {
                solution.abbrev_backtrack.push(cur);
                open = Some(cur);
            }
            _ => {}
        }
        match next {
            Some(n) => cur = n,
            None => break,
        }
    }
    // A kink that lands in column zero leaves its wall open.
    if let Some(out) = open.take() {
        solution.abbrev_backtrack.push(cur);
        close_wall(&mut solution, geometry, &out, &cur, false);
    }

    trace_path(&mut solution, geometry)?;
    Ok(solution)
}

/// Record the wall running from `end_state` (right) back to `start_state`
/// (left) and paint its image-space quadrilateral.
fn close_wall(
    solution: &mut DpSolution,
    geometry: &RectifiedGeometry,
    end_state: &DpState,
    start_state: &DpState,
    occluded: bool,
) {
    solution.num_walls += 1;
    if occluded {
        solution.num_occlusions += 1;
    }
    let orientation = (1 - start_state.axis) as u8;
    let grid_start = Vector2::new(start_state.col as f64, start_state.row as f64);
    let grid_end = Vector2::new(end_state.col as f64, end_state.row as f64);
    let start = geometry.grid_to_image(&grid_start);
    let end = geometry.grid_to_image(&grid_end);
    let quad = [
        start,
        end,
        geometry.grid_to_image(&geometry.transfer(&grid_end)),
        geometry.grid_to_image(&geometry.transfer(&grid_start)),
    ];
    fill_polygon(&quad, &mut solution.pixel_orients, orientation);
    solution.wall_segments.push(WallSegment {
        start: project(&start),
        end: project(&end),
        orientation,
    });
}

/// Replay every `Out` run of the trace across the columns it covers.
fn trace_path(solution: &mut DpSolution, geometry: &RectifiedGeometry) -> Result<()> {
    let (w, h) = geometry.grid_size();
    let horizon = geometry.horizon_row();
    let mut cells: Vec<Option<(usize, usize)>> = vec![None; w];
    for pair in solution.full_backtrack.windows(2) {
        let (state, next) = (&pair[0], &pair[1]);
        if state.dir != Direction::Out {
            continue;
        }
        let line = WallLine::through(state.row, state.col, horizon, geometry.vpt_col(state.axis))
            .ok_or_else(|| {
                LayoutError::backtrack(format!("wall {state} starts on its vanishing column"))
            })?;
        for col in next.col.max(0)..state.col {
            let row = line.row_at(col).round();
            if !(row >= 0.0 && row < h as f64) || col as usize >= w {
                return Err(LayoutError::backtrack(format!(
                    "wall {state} leaves the grid at column {col}"
                )));
            }
            cells[col as usize] = Some((row as usize, state.axis));
        }
    }

    solution.path_rows.clear();
    solution.path_axes.clear();
    for (col, cell) in cells.into_iter().enumerate() {
        let (row, axis) =
            cell.ok_or_else(|| LayoutError::backtrack(format!("no wall covers column {col}")))?;
        solution.path_rows.push(row);
        solution.path_axes.push(axis);
    }
    Ok(())
}
