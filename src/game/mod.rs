//! Core tic-tac-toe logic: players, moves, the board with its win check, the
//! position encoding fed to networks, and recorded games.

mod board;
mod game_played;
mod player;
mod position;

pub use board::{Board, GameStatus, Move, SIZE};
pub use game_played::{GamePlayed, ROTATE_90};
pub use player::PlayerId;
pub use position::{cell_index, make_position, CELLS, POSITION_ENCODING, POSITION_ROWS};
