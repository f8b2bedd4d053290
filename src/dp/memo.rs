use super::state::{DpState, Direction, SubSolution};

/// Dense memo over every search state of a `W × H` grid, with one extra
/// column for terminal states.
///
/// Slots are laid out column-major so that states visited together during a
/// leftward sweep sit close in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoTable {
    cols: usize,
    rows: usize,
    slots: Vec<Option<SubSolution>>,
}

impl MemoTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the table for a `grid_size = (W, H)` grid and mark every slot
    /// unvisited. Storage is reused when the size is unchanged.
    pub fn reset(&mut self, grid_size: (usize, usize)) {
        let cols = grid_size.0 + 1;
        let rows = grid_size.1;
        let len = cols * rows * 2 * Direction::ALL.len();
        self.cols = cols;
        self.rows = rows;
        self.slots.clear();
        self.slots.resize(len, None);
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    #[inline]
    fn index(&self, state: &DpState) -> Option<usize> {
        if state.row < 0 || state.col < 0 || state.axis > 1 {
            return None;
        }
        let (row, col) = (state.row as usize, state.col as usize);
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(((col * self.rows + row) * 2 + state.axis) * Direction::ALL.len() + state.dir.index())
    }

    #[inline]
    pub fn get(&self, state: &DpState) -> Option<&SubSolution> {
        self.index(state).and_then(|i| self.slots[i].as_ref())
    }

    #[inline]
    pub fn contains(&self, state: &DpState) -> bool {
        self.get(state).is_some()
    }

    /// Store the solution of `state`. States outside the table are ignored.
    #[inline]
    pub fn insert(&mut self, state: &DpState, solution: SubSolution) {
        if let Some(i) = self.index(state) {
            self.slots[i] = Some(solution);
        }
    }

    /// Number of visited slots.
    pub fn visited(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Best memoised score of each grid cell over both axes and all
    /// directions, row-major over `(W, H)`. Unvisited cells are `-inf`.
    pub fn best_scores(&self) -> Vec<f64> {
        let w = self.cols.saturating_sub(1);
        let mut best = vec![f64::NEG_INFINITY; w * self.rows];
        for col in 0..w {
            for row in 0..self.rows {
                let base = (col * self.rows + row) * 2 * Direction::ALL.len();
                let cell = &mut best[row * w + col];
                for slot in self.slots[base..base + 2 * Direction::ALL.len()].iter().flatten() {
                    if slot.score > *cell {
                        *cell = slot.score;
                    }
                }
            }
        }
        best
    }
}
