/// Grid line through a cell and the vanishing column of its wall axis.
/// Shared by the search and the path replay so both round identically.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WallLine {
    slope: f64,
    intercept: f64,
}

impl WallLine {
    /// `None` when the cell sits exactly on the vanishing column.
    pub(crate) fn through(row: i32, col: i32, horizon_row: i32, vpt_col: i64) -> Option<Self> {
        let run = col as i64 - vpt_col;
        if run == 0 {
            return None;
        }
        let slope = (row - horizon_row) as f64 / run as f64;
        Some(Self {
            slope,
            intercept: horizon_row as f64 - slope * vpt_col as f64,
        })
    }

    #[inline]
    pub(crate) fn row_at(&self, col: i32) -> f64 {
        self.slope * col as f64 + self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_cell_and_horizon() {
        let line = WallLine::through(10, 20, 4, -10).unwrap();
        assert!((line.row_at(20) - 10.0).abs() < 1e-12);
        assert!((line.row_at(-10) - 4.0).abs() < 1e-12);
        assert!(WallLine::through(3, 7, 4, 7).is_none());
    }
}
