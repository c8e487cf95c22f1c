use crate::error::TensorError;
use crate::nn::Sample;
use crate::tensor::Tensor;

use super::position::{CELLS, POSITION_ROWS};
use super::{GameStatus, PlayerId};

/// 90° clockwise rotation: rotated cell `n` takes the value of cell `ROTATE_90[n]`.
pub const ROTATE_90: [usize; CELLS] = [2, 5, 8, 1, 4, 7, 0, 3, 6];

/// Positions of a game in ply order, plus its outcome once judged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GamePlayed {
    positions: Vec<Tensor>,
    outcome: GameStatus,
}

impl GamePlayed {
    pub fn new() -> Self {
        GamePlayed::default()
    }

    pub fn push(&mut self, position: Tensor) {
        self.positions.push(position);
    }

    pub fn positions(&self) -> &[Tensor] {
        &self.positions
    }

    pub fn outcome(&self) -> GameStatus {
        self.outcome
    }

    pub fn set_outcome(&mut self, outcome: GameStatus) {
        self.outcome = outcome;
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_over()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The same game seen after `quarter_turns` clockwise quarter turns.
    pub fn rotate(&self, quarter_turns: usize) -> GamePlayed {
        let turns = quarter_turns % 4;
        let positions = self
            .positions
            .iter()
            .map(|p| (0..turns).fold(p.clone(), |acc, _| rotate_position(&acc)))
            .collect();
        GamePlayed {
            positions,
            outcome: self.outcome,
        }
    }

    /// The plies made by `player`: even plies for player one, odd for two.
    pub fn player_positions(&self, player: PlayerId) -> GamePlayed {
        GamePlayed {
            positions: self
                .positions
                .iter()
                .skip(player.first_ply())
                .step_by(2)
                .cloned()
                .collect(),
            outcome: self.outcome,
        }
    }

    /// Positions as the columns of X, `rewards` as the single row of Y.
    pub fn to_sample(&self, rewards: &[f64]) -> Result<Sample, TensorError> {
        let y = Tensor::from_vec(1, rewards.len(), rewards.to_vec())?;
        let x = self
            .positions
            .iter()
            .try_fold(Tensor::zeros(POSITION_ROWS, 0), |acc, p| acc.append_columns(p))?;
        Sample::new(x, y)
    }
}

fn rotate_position(position: &Tensor) -> Tensor {
    let src = position.as_slice();
    let mut out = src.to_vec();
    for half in 0..src.len() / CELLS {
        let base = half * CELLS;
        for (n, &from) in ROTATE_90.iter().enumerate() {
            out[base + n] = src[base + from];
        }
    }
    Tensor::column_vector(&out)
}
