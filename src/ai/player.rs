use std::path::Path;

use crate::error::{NetworkError, TrainingError};
use crate::game::{Board, GamePlayed, Move, PlayerId};

/// Universal interface for everything that can sit at the board.
///
/// Only `id`, `name` and `select_move` are required; players that do not
/// learn keep the default no-op `train` and `persist`.
pub trait Player {
    /// Side this player plays.
    fn id(&self) -> PlayerId;

    /// Return the player's display name.
    fn name(&self) -> &str;

    /// Pick a move for the current board.
    fn select_move(&mut self, board: &Board) -> Result<Move, TrainingError>;

    /// Learn from a batch of finished games.
    fn train(&mut self, _games: &[GamePlayed]) -> Result<(), TrainingError> {
        Ok(())
    }

    /// Write learned state to `path`.
    fn persist(&self, _path: &Path) -> Result<(), NetworkError> {
        Ok(())
    }

    /// Whether `train` and `persist` do anything.
    fn learns(&self) -> bool {
        false
    }

    /// Render the board for a human looking over this player's shoulder.
    fn display(&self, board: &Board) -> String {
        board.to_string()
    }
}
