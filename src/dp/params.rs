use serde::Deserialize;

/// Knobs of the layout search.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// Relative rounding error below which a wall line may continue from the
    /// rounded cell with a slight kink instead of being traced column by
    /// column. `0` disables the shortcut.
    pub jump_threshold: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            jump_threshold: 0.1,
        }
    }
}
