//! The game engine: pure rules for the 3 × 3 grid game.
//!
//! Free functions over [`GameState`]. The engine holds no storage and
//! knows nothing about rooms or connections. The room actor is the only
//! caller.

use parlor_protocol::{GameState, Mark, Outcome, BOARD_CELLS};

/// The 8 winning lines, checked in this order: rows, columns, diagonals.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

/// A rejected move. Never surfaced to clients: the room actor logs the
/// reason and drops the move as a benign no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMove {
    /// The game already has a winner or ended in a draw.
    #[error("game already decided")]
    AlreadyDecided,

    /// The cell index is outside 0..9.
    #[error("cell index {0} out of range")]
    OutOfRange(usize),

    /// The target cell is already occupied.
    #[error("cell {0} already occupied")]
    Occupied(usize),

    /// The mark does not match the current turn.
    #[error("not {0}'s turn")]
    NotYourTurn(Mark),
}

/// Returns a fresh state: empty board, X to move, no winner.
pub fn reset() -> GameState {
    GameState::default()
}

/// Scans the board for a terminal condition.
///
/// A mark wins when three equal non-empty cells lie on one of the 8
/// lines; a full board without one is a draw. Under valid play at most
/// one winning line exists, but the scan order is fixed anyway so the
/// result is deterministic for any input.
pub fn evaluate(board: &[Option<Mark>; BOARD_CELLS]) -> Option<Outcome> {
    for [a, b, c] in LINES {
        if let Some(mark) = board[a] {
            if board[b] == Some(mark) && board[c] == Some(mark) {
                return Some(mark.into());
            }
        }
    }
    if board.iter().all(Option::is_some) {
        Some(Outcome::Draw)
    } else {
        None
    }
}

/// Places `mark` at `index` and advances the game.
///
/// On success the cell is set, then either the winner is recorded (turn
/// left untouched) or the turn flips to the other mark. On any
/// [`IllegalMove`] the state is left exactly as it was.
pub fn apply_move(
    state: &mut GameState,
    index: usize,
    mark: Mark,
) -> Result<(), IllegalMove> {
    if state.is_decided() {
        return Err(IllegalMove::AlreadyDecided);
    }
    if index >= BOARD_CELLS {
        return Err(IllegalMove::OutOfRange(index));
    }
    if state.board[index].is_some() {
        return Err(IllegalMove::Occupied(index));
    }
    if mark != state.turn {
        return Err(IllegalMove::NotYourTurn(mark));
    }

    state.board[index] = Some(mark);
    match evaluate(&state.board) {
        Some(outcome) => state.winner = Some(outcome),
        None => state.turn = mark.other(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Plays out a sequence of (index, mark) moves, panicking on any
    /// rejection. Test scaffolding for mid-game positions.
    fn play(moves: &[(usize, Mark)]) -> GameState {
        let mut state = reset();
        for &(index, mark) in moves {
            apply_move(&mut state, index, mark)
                .unwrap_or_else(|e| panic!("move {index} by {mark}: {e}"));
        }
        state
    }

    // =====================================================================
    // reset()
    // =====================================================================

    #[test]
    fn test_reset_returns_fresh_state() {
        let state = reset();
        assert!(state.board.iter().all(Option::is_none));
        assert_eq!(state.turn, Mark::X);
        assert_eq!(state.winner, None);
    }

    // =====================================================================
    // evaluate()
    // =====================================================================

    #[test]
    fn test_evaluate_empty_board_is_undecided() {
        assert_eq!(evaluate(&[None; 9]), None);
    }

    #[test]
    fn test_evaluate_detects_every_line() {
        let lines: [[usize; 3]; 8] = [
            [0, 1, 2],
            [3, 4, 5],
            [6, 7, 8],
            [0, 3, 6],
            [1, 4, 7],
            [2, 5, 8],
            [0, 4, 8],
            [2, 4, 6],
        ];
        for line in lines {
            let mut board = [None; 9];
            for cell in line {
                board[cell] = Some(Mark::O);
            }
            assert_eq!(
                evaluate(&board),
                Some(Outcome::O),
                "line {line:?} should win"
            );
        }
    }

    #[test]
    fn test_evaluate_mixed_line_does_not_win() {
        let mut board = [None; 9];
        board[0] = Some(Mark::X);
        board[1] = Some(Mark::O);
        board[2] = Some(Mark::X);
        assert_eq!(evaluate(&board), None);
    }

    #[test]
    fn test_evaluate_full_board_without_line_is_draw() {
        //  X | O | X
        //  X | O | O
        //  O | X | X
        use Mark::{O, X};
        let board = [
            Some(X),
            Some(O),
            Some(X),
            Some(X),
            Some(O),
            Some(O),
            Some(O),
            Some(X),
            Some(X),
        ];
        assert_eq!(evaluate(&board), Some(Outcome::Draw));
    }

    // =====================================================================
    // apply_move()
    // =====================================================================

    #[test]
    fn test_apply_move_places_mark_and_flips_turn() {
        let mut state = reset();

        apply_move(&mut state, 0, Mark::X).unwrap();

        assert_eq!(state.board[0], Some(Mark::X));
        assert_eq!(state.turn, Mark::O);
        assert_eq!(state.winner, None);
    }

    #[test]
    fn test_apply_move_rejects_out_of_range() {
        let mut state = reset();
        let result = apply_move(&mut state, 9, Mark::X);
        assert_eq!(result, Err(IllegalMove::OutOfRange(9)));
        assert_eq!(state, reset());
    }

    #[test]
    fn test_apply_move_rejects_occupied_cell() {
        // Re-applying the same index must fail and leave the board
        // unchanged.
        let mut state = play(&[(4, Mark::X)]);
        let before = state.clone();

        let result = apply_move(&mut state, 4, Mark::O);

        assert_eq!(result, Err(IllegalMove::Occupied(4)));
        assert_eq!(state, before);
    }

    #[test]
    fn test_apply_move_rejects_wrong_turn() {
        let mut state = reset();
        let result = apply_move(&mut state, 0, Mark::O);
        assert_eq!(result, Err(IllegalMove::NotYourTurn(Mark::O)));
        assert_eq!(state.board[0], None);
    }

    #[test]
    fn test_apply_move_rejects_after_decision() {
        // X takes the top row.
        let mut state = play(&[
            (0, Mark::X),
            (3, Mark::O),
            (1, Mark::X),
            (4, Mark::O),
            (2, Mark::X),
        ]);
        assert_eq!(state.winner, Some(Outcome::X));

        let result = apply_move(&mut state, 5, Mark::O);
        assert_eq!(result, Err(IllegalMove::AlreadyDecided));
    }

    #[test]
    fn test_winning_move_keeps_turn() {
        // Terminal move: winner set, turn not flipped.
        let state = play(&[
            (0, Mark::X),
            (3, Mark::O),
            (1, Mark::X),
            (4, Mark::O),
            (2, Mark::X),
        ]);
        assert_eq!(state.winner, Some(Outcome::X));
        assert_eq!(state.turn, Mark::X);
    }

    #[test]
    fn test_turn_alternates_through_a_game() {
        let mut state = reset();
        let expected = [Mark::O, Mark::X, Mark::O, Mark::X];
        for (i, want) in [0usize, 4, 8, 5].iter().zip(expected) {
            let turn = state.turn;
            apply_move(&mut state, *i, turn).unwrap();
            assert_eq!(state.turn, want);
        }
    }

    #[test]
    fn test_draw_game() {
        //  X | O | X
        //  X | O | O
        //  O | X | X   — played to a full board, nobody wins.
        use Mark::{O, X};
        let state = play(&[
            (0, X),
            (1, O),
            (2, X),
            (4, O),
            (3, X),
            (5, O),
            (7, X),
            (6, O),
            (8, X),
        ]);
        assert_eq!(state.winner, Some(Outcome::Draw));
    }

    #[test]
    fn test_o_can_win() {
        let state = play(&[
            (0, Mark::X),
            (3, Mark::O),
            (1, Mark::X),
            (4, Mark::O),
            (8, Mark::X),
            (5, Mark::O),
        ]);
        assert_eq!(state.winner, Some(Outcome::O));
    }
}
