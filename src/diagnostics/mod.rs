//! Serializable diagnostics for solved frames.
//!
//! `SolveReport` is the per-frame record written by the demo tool and
//! returned from batch solving; `SolveStats` holds the search counters and
//! `TimingBreakdown` the per-stage wall-clock times.

pub mod solve;
pub mod timing;

pub use solve::{GridDescriptor, SolveReport, SolveStats};
pub use timing::{StageTiming, TimingBreakdown};
