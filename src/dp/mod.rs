//! Dynamic-programming search for the best Manhattan layout.
//!
//! - [`state`]: search states and memoised sub-solutions.
//! - [`memo`]: dense memo table over all states of a grid.
//! - [`solver`]: [`ManhattanDp`], the memoised search and its entry point.
//! - `backtrack`: conversion of the winning trace into a [`DpSolution`].
//!
//! [`DpSolution`]: crate::solution::DpSolution
mod backtrack;
mod line;
pub mod memo;
pub mod params;
pub mod solver;
pub mod state;

pub use memo::MemoTable;
pub use params::SolverParams;
pub use solver::ManhattanDp;
pub use state::{Direction, DpState, SubSolution};
