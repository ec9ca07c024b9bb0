//! Game-state payloads for the grid game.
//!
//! Pure data: the rules that mutate a [`GameState`] live in the room
//! layer's engine, not here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of cells on the board (3 × 3).
pub const BOARD_CELLS: usize = 9;

/// One of the two symbols a player places on the grid.
///
/// Wire form is `"X"` / `"O"`. The first player to ever join a room plays
/// X, the second plays O.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum Mark {
    #[default]
    X,
    O,
}

impl Mark {
    /// The opposing mark.
    pub fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => f.write_str("X"),
            Mark::O => f.write_str("O"),
        }
    }
}

/// How a finished game ended.
///
/// Wire form is `"X"`, `"O"`, or `"draw"`; an undecided game carries
/// `null` (`Option<Outcome>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    X,
    O,
    #[serde(rename = "draw")]
    Draw,
}

impl Outcome {
    /// The winning mark, if the game was not drawn.
    pub fn winning_mark(self) -> Option<Mark> {
        match self {
            Outcome::X => Some(Mark::X),
            Outcome::O => Some(Mark::O),
            Outcome::Draw => None,
        }
    }
}

impl From<Mark> for Outcome {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Outcome::X,
            Mark::O => Outcome::O,
        }
    }
}

/// The authoritative state of one game.
///
/// `board` is indexed row-major, 0 through 8. `turn` is whose mark moves
/// next; once `winner` is set, `turn` is no longer meaningful and further
/// moves are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameState {
    pub board: [Option<Mark>; BOARD_CELLS],
    pub turn: Mark,
    pub winner: Option<Outcome>,
}

impl GameState {
    /// True once a winner or a draw has been recorded.
    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }
}
