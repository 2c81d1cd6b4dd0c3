use crate::engine::Board;

/// Heuristic desirability of a board: the best of four corner-anchored
/// "snake" sums.
///
/// For each corner, rows are walked away from the corner with a starting
/// weight of 20 that halves per row (integer division, eventually 0), and
/// within a row the weight halves per step, floored at 1. Each row is one
/// cell shorter than the previous, so the weighted region is the triangle
/// hanging off the corner. Taking the maximum over all four corners keeps
/// the measure orientation-agnostic: a board is scored by its best-case
/// corner arrangement.
pub(crate) fn evaluate(board: &Board) -> u64 {
    let n = board.size() as isize;
    let corner_value = |start_x: isize, start_y: isize, dx: isize, dy: isize| -> u64 {
        let mut value = 0u64;
        let mut init_weight = 20u64;
        for i in 0..n {
            let mut weight = init_weight;
            for j in 0..(n - i) {
                let x = (start_x + i * dx) as usize;
                let y = (start_y + j * dy) as usize;
                value += weight * board.get_tile(x, y);
                weight = (weight / 2).max(1);
            }
            init_weight /= 2;
        }
        value
    };

    let lower_left = corner_value(0, n - 1, 1, -1);
    let upper_left = corner_value(n - 1, n - 1, -1, -1);
    let lower_right = corner_value(0, 0, 1, 1);
    let upper_right = corner_value(n - 1, 0, -1, 1);

    lower_left.max(upper_left).max(lower_right).max(upper_right)
}
