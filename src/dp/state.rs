use serde::Serialize;
use std::fmt;

/// How the layout path moves through a grid cell.
///
/// Paths are traced right to left: `Out` leaves a cell along a wall line,
/// `In` arrives at a corner, and `Up`/`Down` slide vertically along an
/// occluding edge before the next wall starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    In,
    Out,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::In, Direction::Out, Direction::Up, Direction::Down];

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Direction::In => 0,
            Direction::Out => 1,
            Direction::Up => 2,
            Direction::Down => 3,
        }
    }

    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

/// One node of the layout search. `col` may equal the grid width only for
/// terminal `Out` states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DpState {
    pub row: i32,
    pub col: i32,
    pub axis: usize,
    pub dir: Direction,
}

impl DpState {
    pub fn new(row: i32, col: i32, axis: usize, dir: Direction) -> Self {
        Self {
            row,
            col,
            axis,
            dir,
        }
    }

    #[inline]
    pub fn with_dir(self, dir: Direction) -> Self {
        Self { dir, ..self }
    }

    #[inline]
    pub fn with_axis(self, axis: usize) -> Self {
        Self { axis, ..self }
    }
}

impl fmt::Display for DpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.dir {
            Direction::In => "IN",
            Direction::Out => "OUT",
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        };
        write!(f, "{dir} r={} c={} axis={}", self.row, self.col, self.axis)
    }
}

/// Best score found for a state and the successor it was reached through.
/// `src == None` marks the end of a path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubSolution {
    pub score: f64,
    pub src: Option<DpState>,
}

impl SubSolution {
    pub const INFEASIBLE: SubSolution = SubSolution {
        score: f64::NEG_INFINITY,
        src: None,
    };

    pub fn new(score: f64) -> Self {
        Self { score, src: None }
    }

    pub fn is_feasible(&self) -> bool {
        self.score.is_finite()
    }

    /// Adopt `other.score + delta` through `state` if it strictly improves on
    /// the current score. Ties keep the earlier candidate.
    #[inline]
    pub fn replace_if_superior(&mut self, other: &SubSolution, state: DpState, delta: f64) -> bool {
        let candidate = other.score + delta;
        if candidate > self.score {
            self.score = candidate;
            self.src = Some(state);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_keep_the_first_candidate() {
        let a = DpState::new(1, 2, 0, Direction::Out);
        let b = DpState::new(3, 2, 1, Direction::In);
        let mut best = SubSolution::INFEASIBLE;
        assert!(best.replace_if_superior(&SubSolution::new(1.0), a, 0.5));
        assert!(!best.replace_if_superior(&SubSolution::new(0.5), b, 1.0));
        assert_eq!(best.src, Some(a));
        assert!(best.replace_if_superior(&SubSolution::new(2.0), b, 0.0));
        assert_eq!(best.src, Some(b));
    }

    #[test]
    fn infeasible_candidates_never_win() {
        let mut best = SubSolution::INFEASIBLE;
        let s = DpState::new(0, 1, 0, Direction::Up);
        assert!(!best.replace_if_superior(&SubSolution::INFEASIBLE, s, 10.0));
        assert!(!best.is_feasible());
    }
}
