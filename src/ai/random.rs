use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::error::{MoveError, TrainingError};
use crate::game::{Board, Move, PlayerId};

use super::player::Player;

/// A player that selects uniformly at random from legal moves.
pub struct RandomPlayer {
    id: PlayerId,
    rng: StdRng,
}

impl RandomPlayer {
    pub fn new(id: PlayerId) -> Self {
        RandomPlayer {
            id,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(id: PlayerId, seed: u64) -> Self {
        RandomPlayer {
            id,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Player for RandomPlayer {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        "Random"
    }

    fn select_move(&mut self, board: &Board) -> Result<Move, TrainingError> {
        let moves = board.legal_moves(self.id)?;
        let mv = moves.choose(&mut self.rng).ok_or(MoveError::NoLegalMoves)?;
        Ok(*mv)
    }
}
