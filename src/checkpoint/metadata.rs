use serde::{Deserialize, Serialize};

use crate::game::PlayerId;
use crate::nn::NetworkConfig;
use crate::training::{RewardConfig, TrainingMetrics};

/// Metrics snapshot at checkpoint time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    pub player_one_win_rate: f64,
    pub player_two_win_rate: f64,
    pub draw_rate: f64,
    pub average_game_length: f64,
    pub total_episodes: usize,
    pub aborted_episodes: usize,
}

impl CheckpointMetrics {
    /// Rates over the last `window` episodes plus lifetime counts.
    pub fn from_metrics(metrics: &TrainingMetrics, window: usize) -> Self {
        CheckpointMetrics {
            player_one_win_rate: metrics.win_rate(PlayerId::One, window),
            player_two_win_rate: metrics.win_rate(PlayerId::Two, window),
            draw_rate: metrics.draw_rate(window),
            average_game_length: metrics.average_game_length(window),
            total_episodes: metrics.total_episodes(),
            aborted_episodes: metrics.aborted(),
        }
    }
}

/// Learning hyperparameters recorded in checkpoint metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointHyperparameters {
    pub gamma: f64,
    pub epsilon: f64,
    pub rewards: RewardConfig,
    pub train_iterations: usize,
    pub batch_games: usize,
}

/// Top-level checkpoint metadata written to metadata.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub episode: usize,
    pub timestamp: u64,
    pub position_encoding: String,
    /// Player codes whose networks were saved alongside this file.
    pub players: Vec<u8>,
    pub network: NetworkConfig,
    pub hyperparameters: CheckpointHyperparameters,
    pub metrics: CheckpointMetrics,
}
