//! Error type shared by the geometry and solver stages.
//!
//! Every variant is fatal to the current frame: a failed configuration or
//! solve never publishes a partial result.

/// Reasons why configuring the rectified geometry or solving a frame may fail.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutError {
    /// The camera/grid combination cannot be rectified (horizon not
    /// horizontal, horizon missing a grid border, flipped image, singular
    /// matrices).
    Configuration { reason: String },
    /// No terminal state achieved a finite score.
    InfeasibleSolution,
    /// The backtrack trace is inconsistent with the memo table.
    BacktrackInvariant { reason: String },
    /// Two buffers that must agree in size do not.
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// An image location projects outside the rectified grid.
    OutOfGrid { x: f64, y: f64 },
    /// A derived quantity was requested before any frame was solved.
    NotSolved,
}

impl LayoutError {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        LayoutError::Configuration {
            reason: reason.into(),
        }
    }

    pub(crate) fn backtrack(reason: impl Into<String>) -> Self {
        LayoutError::BacktrackInvariant {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::Configuration { reason } => {
                write!(f, "invalid geometry configuration: {reason}")
            }
            LayoutError::InfeasibleSolution => write!(f, "no feasible solution found"),
            LayoutError::BacktrackInvariant { reason } => {
                write!(f, "backtrack invariant violated: {reason}")
            }
            LayoutError::ShapeMismatch {
                what,
                expected,
                found,
            } => write!(
                f,
                "{what} has size {}x{}, expected {}x{}",
                found.0, found.1, expected.0, expected.1
            ),
            LayoutError::OutOfGrid { x, y } => {
                write!(f, "point ({x:.2}, {y:.2}) falls outside the grid")
            }
            LayoutError::NotSolved => write!(f, "no frame has been solved"),
        }
    }
}

impl std::error::Error for LayoutError {}

pub type Result<T> = std::result::Result<T, LayoutError>;
