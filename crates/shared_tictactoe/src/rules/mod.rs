//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](super::Board), kept apart from the
//! engine so they can be tested on arbitrary boards.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{LINES, check_piece_win, winning_piece};
