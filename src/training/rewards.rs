//! Turning finished games into labeled training batches.

use serde::{Deserialize, Serialize};

use crate::error::TensorError;
use crate::game::{GamePlayed, GameStatus, PlayerId, POSITION_ROWS};
use crate::nn::Sample;

/// Terminal reward for each outcome, seen from the learning player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub win: f64,
    pub loss: f64,
    pub draw: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            win: 1.5,
            loss: -1.0,
            draw: 1.4,
        }
    }
}

/// Reward for `player` given a game's outcome; `None` while the game is in progress.
pub fn terminal_reward(outcome: GameStatus, player: PlayerId, rewards: &RewardConfig) -> Option<f64> {
    match outcome {
        GameStatus::InProgress => None,
        GameStatus::Won(winner) if winner == player => Some(rewards.win),
        GameStatus::Won(_) => Some(rewards.loss),
        GameStatus::Draw => Some(rewards.draw),
    }
}

/// Labels for an `plies`-long trajectory: the last ply gets `terminal`, each
/// earlier ply one more factor of `gamma`.
pub fn discounted_rewards(terminal: f64, plies: usize, gamma: f64) -> Vec<f64> {
    let mut out = vec![0.0; plies];
    let mut reward = terminal;
    for slot in out.iter_mut().rev() {
        *slot = reward;
        reward *= gamma;
    }
    out
}

/// Build one batch from every finished game in `games`, as seen by `player`.
///
/// Each trajectory is added at all four rotations. Unfinished games and games
/// in which `player` never moved contribute nothing.
pub fn make_samples(
    games: &[GamePlayed],
    player: PlayerId,
    gamma: f64,
    rewards: &RewardConfig,
) -> Result<Sample, TensorError> {
    let mut sample = Sample::empty(POSITION_ROWS, 1);
    for game in games {
        let Some(terminal) = terminal_reward(game.outcome(), player, rewards) else {
            continue;
        };
        let trajectory = game.player_positions(player);
        if trajectory.is_empty() {
            continue;
        }
        let ys = discounted_rewards(terminal, trajectory.len(), gamma);
        for quarter_turns in 0..4 {
            sample = sample.append(&trajectory.rotate(quarter_turns).to_sample(&ys)?)?;
        }
    }
    Ok(sample)
}
