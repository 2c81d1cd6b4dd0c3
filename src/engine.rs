use rand::Rng;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A direction to move/merge tiles.
///
/// The discriminants double as the 2-bit move encoding used by the solver's
/// packed cache entries, so the order is load-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Left = 0,
    Down = 1,
    Right = 2,
    Up = 3,
}

impl Move {
    /// All directions, in encoding order.
    pub const ALL: [Move; 4] = [Move::Left, Move::Down, Move::Right, Move::Up];

    /// Decode the low two bits of a packed value.
    #[inline]
    pub(crate) fn from_index(index: u64) -> Move {
        match index & 3 {
            0 => Move::Left,
            1 => Move::Down,
            2 => Move::Right,
            _ => Move::Up,
        }
    }
}

/// Where one originally-occupied cell's tile ended up after a recorded move.
///
/// `dest` is a cell index in the rotated (left-normalized) frame of the move
/// that produced it; mapping it back to screen coordinates for the requested
/// direction is the presentation layer's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileTrace {
    /// Tile value before the move (merges double it afterwards).
    pub value: u64,
    /// Final cell index, rotated frame.
    pub dest: usize,
}

/// An N×N 2048 grid: cells in row-major order plus the accumulated score.
///
/// Cells hold actual tile values (0 = empty, otherwise a power of two ≥ 2).
/// Equality and hashing cover `(size, cells)` only; score and the provenance
/// trace are not part of board identity, which is what the solver's
/// transposition cache relies on.
///
/// Moves never spawn a tile. Callers sequence a turn themselves:
/// `is_valid_move` → `slide`/`slide_recorded` → `add_random_tile` → `is_over`.
#[derive(Clone)]
pub struct Board {
    size: usize,
    cells: Vec<u64>,
    score: u64,
    trace: Vec<Option<TileTrace>>,
}

impl Board {
    /// Create a board with two random tiles pre-placed (one if `size == 1`).
    ///
    /// Panics if `size` is zero.
    ///
    /// ```
    /// use merge_2048::engine::Board;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let board = Board::new(4, &mut rng);
    /// assert_eq!(board.count_tiles(), 2);
    /// ```
    pub fn new<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let mut board = Self::empty(size);
        board.add_random_tile(rng);
        if size * size >= 2 {
            board.add_random_tile(rng);
        }
        board
    }

    /// Create an all-empty board (no random tiles).
    ///
    /// Panics if `size` is zero.
    pub fn empty(size: usize) -> Self {
        assert!(size >= 1, "board size must be at least 1");
        Board {
            size,
            cells: vec![0; size * size],
            score: 0,
            trace: Vec::new(),
        }
    }

    /// Create a board from explicit row-major cell values, score zero.
    ///
    /// Panics if the slice length is not `size * size` or any value is
    /// neither 0 nor a power of two ≥ 2.
    pub fn from_cells(size: usize, cells: &[u64]) -> Self {
        assert!(size >= 1, "board size must be at least 1");
        assert_eq!(cells.len(), size * size, "cell count must be size * size");
        for &value in cells {
            assert!(
                value == 0 || (value >= 2 && value.is_power_of_two()),
                "tile value must be 0 or a power of two >= 2, got {value}"
            );
        }
        Board {
            size,
            cells: cells.to_vec(),
            score: 0,
            trace: Vec::new(),
        }
    }

    /// Side length N.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Accumulated score: the sum of every merged tile's new value.
    #[inline]
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Tile value at `(x, y)` where `x` is the row and `y` the column.
    ///
    /// Panics on out-of-range coordinates.
    #[inline]
    pub fn get_tile(&self, x: usize, y: usize) -> u64 {
        assert!(x < self.size && y < self.size, "tile ({x}, {y}) out of range");
        self.cells[x * self.size + y]
    }

    /// Overwrite the tile at `(x, y)`.
    ///
    /// Panics on out-of-range coordinates or a value that is neither 0 nor a
    /// power of two ≥ 2.
    #[inline]
    pub fn set_tile(&mut self, x: usize, y: usize, value: u64) {
        assert!(x < self.size && y < self.size, "tile ({x}, {y}) out of range");
        assert!(
            value == 0 || (value >= 2 && value.is_power_of_two()),
            "tile value must be 0 or a power of two >= 2, got {value}"
        );
        self.cells[x * self.size + y] = value;
    }

    /// Spawn one tile into a uniformly random empty cell: 2 with probability
    /// 9/10, else 4. The solver's expectation model assumes exactly this split.
    ///
    /// Panics if the board has no empty cell.
    pub fn add_random_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let empty = self.count_empty();
        assert!(empty > 0, "no empty cell to spawn into");
        let mut index = rng.gen_range(0..empty);
        let value = if rng.gen_range(0..10) < 9 { 2 } else { 4 };
        for cell in self.cells.iter_mut() {
            if *cell == 0 {
                if index == 0 {
                    *cell = value;
                    return;
                }
                index -= 1;
            }
        }
        unreachable!("empty-cell count out of sync with cells");
    }

    /// Slide and merge all tiles in `dir`, accumulating merge gains into the
    /// score. Does not spawn a tile. A no-op direction leaves cells unchanged.
    ///
    /// Any direction is normalized to "slide left" by rotating the grid,
    /// moving every row independently, and rotating back.
    pub fn slide(&mut self, dir: Move) {
        self.rotate_to_left(dir);
        let n = self.size;
        for r in 0..n {
            let row = &mut self.cells[r * n..(r + 1) * n];
            slide_row(row);
            self.score += merge_row(row);
            slide_row(row);
        }
        self.rotate_from_left(dir);
    }

    /// Like [`Board::slide`], but also records where every originally-occupied
    /// cell's tile ends up, for animation. See [`Board::move_trace`].
    pub fn slide_recorded(&mut self, dir: Move) {
        let n = self.size;
        self.trace.clear();
        self.trace.resize(n * n, None);

        self.rotate_to_left(dir);
        for r in 0..n {
            self.init_row_trace(r);
            self.slide_row_traced(r);
            self.merge_row_traced(r);
            self.slide_row_traced(r);
        }
        self.rotate_from_left(dir);
    }

    /// Provenance trace of the last [`Board::slide_recorded`] call, indexed by
    /// original cell position in the rotated (left-normalized) frame.
    ///
    /// Empty cells and boards that have not had a recorded move yet yield
    /// `None` / an empty slice respectively.
    #[inline]
    pub fn move_trace(&self) -> &[Option<TileTrace>] {
        &self.trace
    }

    /// True if sliding in `dir` would change at least one cell.
    ///
    /// Simulated on a private copy; the real board (score included) is never
    /// touched.
    pub fn is_valid_move(&self, dir: Move) -> bool {
        let mut probe = self.clone();
        probe.slide(dir);
        probe.cells != self.cells
    }

    /// True iff no direction is a valid move.
    pub fn is_over(&self) -> bool {
        Move::ALL.iter().all(|&dir| !self.is_valid_move(dir))
    }

    /// Number of occupied cells.
    #[inline]
    pub fn count_tiles(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell != 0).count()
    }

    /// Number of empty cells.
    #[inline]
    pub fn count_empty(&self) -> usize {
        self.size * self.size - self.count_tiles()
    }

    /// Number of distinct tile values present.
    ///
    /// Values are powers of two, so OR-ing all cells and counting set bits
    /// counts distinct magnitudes.
    #[inline]
    pub fn count_distinct(&self) -> u32 {
        self.cells
            .iter()
            .fold(0u64, |acc, &cell| acc | cell)
            .count_ones()
    }

    /// Largest tile value on the board (0 when empty).
    #[inline]
    pub fn highest_tile(&self) -> u64 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Deterministic 64-bit hash: polynomial accumulation over cell values in
    /// row-major order. Collisions are possible; the solver's cache tolerates
    /// them by comparing full boards on lookup.
    pub fn hash_value(&self) -> u64 {
        self.cells.iter().fold(0xcbf2_9ce4_8422_2325u64, |acc, &cell| {
            acc.wrapping_mul(0x0000_0100_0000_01b3).wrapping_add(cell)
        })
    }

    fn init_row_trace(&mut self, row: usize) {
        let n = self.size;
        let base = row * n;
        for it in 0..n {
            let value = self.cells[base + it];
            if value != 0 {
                self.trace[base + it] = Some(TileTrace { value, dest: base + it });
            }
        }
    }

    /// Slide one row left while chaining trace destinations through each
    /// relocation: every record pointing at the vacated slot is redirected to
    /// the slot the tile landed in.
    fn slide_row_traced(&mut self, row: usize) {
        let n = self.size;
        let base = row * n;
        let mut index = 0;
        for it in 0..n {
            if self.cells[base + it] != 0 {
                if index == it {
                    index += 1;
                } else {
                    // A record's dest never exceeds its origin, so scanning
                    // from `it` rightwards covers every candidate.
                    for j in it..n {
                        if let Some(trace) = self.trace[base + j].as_mut() {
                            if trace.dest == base + it {
                                trace.dest = base + index;
                            }
                        }
                    }
                    self.cells[base + index] = self.cells[base + it];
                    self.cells[base + it] = 0;
                    index += 1;
                }
            }
        }
    }

    /// Merge one (already slid) row left while redirecting records aimed at
    /// the absorbed slot onto the surviving tile.
    fn merge_row_traced(&mut self, row: usize) {
        let n = self.size;
        let base = row * n;
        for it in 0..n - 1 {
            if self.cells[base + it] != 0 && self.cells[base + it] == self.cells[base + it + 1] {
                for j in (it + 1)..n {
                    if let Some(trace) = self.trace[base + j].as_mut() {
                        if trace.dest == base + it + 1 {
                            trace.dest -= 1;
                        }
                    }
                }
                self.cells[base + it] *= 2;
                self.cells[base + it + 1] = 0;
                self.score += self.cells[base + it];
            }
        }
    }

    /// Rotate the grid so that `dir` becomes "left".
    fn rotate_to_left(&mut self, dir: Move) {
        match dir {
            Move::Left => {}
            Move::Down => self.rotate_right(),
            Move::Right => self.rotate_180(),
            Move::Up => self.rotate_left(),
        }
    }

    /// Undo [`Board::rotate_to_left`].
    fn rotate_from_left(&mut self, dir: Move) {
        match dir {
            Move::Left => {}
            Move::Down => self.rotate_left(),
            Move::Right => self.rotate_180(),
            Move::Up => self.rotate_right(),
        }
    }

    fn rotate_right(&mut self) {
        let n = self.size;
        let mut next = vec![0u64; n * n];
        for i in 0..n {
            for j in 0..n {
                next[j * n + (n - 1 - i)] = self.cells[i * n + j];
            }
        }
        self.cells = next;
    }

    fn rotate_left(&mut self) {
        let n = self.size;
        let mut next = vec![0u64; n * n];
        for i in 0..n {
            for j in 0..n {
                next[(n - 1 - j) * n + i] = self.cells[i * n + j];
            }
        }
        self.cells = next;
    }

    fn rotate_180(&mut self) {
        let n = self.size;
        let mut next = vec![0u64; n * n];
        for i in 0..n {
            for j in 0..n {
                next[(n - 1 - i) * n + (n - 1 - j)] = self.cells[i * n + j];
            }
        }
        self.cells = next;
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.cells == other.cells
    }
}

impl Eq for Board {}

impl Hash for Board {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_value());
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Board(size={}, cells={:?}, score={})",
            self.size, self.cells, self.score
        )
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.size;
        writeln!(f)?;
        for row in 0..n {
            if row > 0 {
                writeln!(f, "{}", "-".repeat(8 * n - 1))?;
            }
            let line: Vec<String> = (0..n).map(|col| format_val(self.cells[row * n + col])).collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}

fn format_val(val: u64) -> String {
    if val == 0 {
        " ".repeat(7)
    } else {
        format!("{val:^7}")
    }
}

/// Compact non-zero values leftward, preserving order.
fn slide_row(row: &mut [u64]) {
    let mut index = 0;
    for it in 0..row.len() {
        if row[it] != 0 {
            if index == it {
                index += 1;
            } else {
                row[index] = row[it];
                row[it] = 0;
                index += 1;
            }
        }
    }
}

/// Merge adjacent equal values left-to-right, returning the score gained.
/// Each cell participates in at most one merge: the absorbed cell is zeroed
/// and a zero never matches on the next step.
fn merge_row(row: &mut [u64]) -> u64 {
    let mut gained = 0;
    for it in 0..row.len() - 1 {
        if row[it] != 0 && row[it] == row[it + 1] {
            row[it] *= 2;
            row[it + 1] = 0;
            gained += row[it];
        }
    }
    gained
}
