use merge_2048::engine::Board;
use merge_2048::solver::Solver;

fn main() {
    let mut rng = rand::thread_rng();
    let mut board = Board::new(4, &mut rng);
    // Automatic depth from board complexity.
    let mut solver = Solver::new(0);
    println!("{}", board);
    let mut move_count = 0u32;
    while !board.is_over() {
        let direction = solver.best_move(&board);
        if !board.is_valid_move(direction) {
            break;
        }
        board.slide_recorded(direction);
        board.add_random_tile(&mut rng);
        move_count += 1;
        println!("{}", board);
    }
    println!(
        "Moves made: {}, final score: {}, highest tile: {}",
        move_count,
        board.score(),
        board.highest_tile()
    );
}
