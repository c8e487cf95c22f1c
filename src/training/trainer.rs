use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::ai::{LearnerConfig, Player};
use crate::checkpoint::{CheckpointHyperparameters, CheckpointManager, CheckpointMetrics};
use crate::error::TrainingError;
use crate::game::{GamePlayed, PlayerId};
use crate::nn::NetworkConfig;
use crate::training::episode::play_episode;
use crate::training::metrics::{EpisodeResult, TrainingMetrics};

/// Trainer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub episodes: usize,
    /// Finished games collected before both players train.
    pub batch_games: usize,
    pub log_interval: usize,
    /// Checkpoint every this many batches; 0 keeps only the final checkpoint.
    pub checkpoint_interval: usize,
    /// Base seed for player generators. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            episodes: 10_000,
            batch_games: 72,
            log_interval: 1000,
            checkpoint_interval: 0,
            seed: None,
        }
    }
}

/// Summary of a finished training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub episodes: usize,
    pub player_one_wins: usize,
    pub player_two_wins: usize,
    pub draws: usize,
    pub aborted: usize,
    pub batches: usize,
    pub last_checkpoint: Option<PathBuf>,
    pub elapsed: Duration,
}

struct CheckpointSink {
    manager: CheckpointManager,
    network: NetworkConfig,
    learner: LearnerConfig,
}

/// Self-play trainer: plays games between two players and trains both on
/// complete batches of finished games.
pub struct Trainer {
    config: TrainerConfig,
    checkpoints: Option<CheckpointSink>,
}

impl Trainer {
    /// Zero `log_interval` or `batch_games` is raised to 1.
    pub fn new(mut config: TrainerConfig) -> Self {
        config.log_interval = config.log_interval.max(1);
        config.batch_games = config.batch_games.max(1);
        Trainer {
            config,
            checkpoints: None,
        }
    }

    /// Enable checkpointing every `checkpoint_interval` batches and at the end
    /// of the run.
    pub fn with_checkpoints(
        mut self,
        manager: CheckpointManager,
        network: NetworkConfig,
        learner: LearnerConfig,
    ) -> Self {
        self.checkpoints = Some(CheckpointSink {
            manager,
            network,
            learner,
        });
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Run the full training loop, `p1` opening every game.
    ///
    /// Episodes that fail are logged and counted as aborted. Training errors
    /// end the run.
    pub fn run(
        &self,
        p1: &mut dyn Player,
        p2: &mut dyn Player,
    ) -> Result<TrainingReport, TrainingError> {
        let start = Instant::now();
        let mut metrics = TrainingMetrics::with_capacity(self.config.log_interval);
        let mut batch: Vec<GamePlayed> = Vec::with_capacity(self.config.batch_games);
        let mut batches = 0;
        let mut last_checkpoint = None;
        let mut checkpointed_at = None;

        log::info!(
            "Training {} vs {} for {} episodes (batch of {} games)",
            p1.name(),
            p2.name(),
            self.config.episodes,
            self.config.batch_games
        );

        for episode in 1..=self.config.episodes {
            match play_episode(p1, p2) {
                Ok(game) => {
                    metrics.record_episode(EpisodeResult::from_game(&game));
                    batch.push(game);
                }
                Err(e) => {
                    log::warn!("Episode {} aborted: {}", episode, e);
                    metrics.record_aborted();
                }
            }

            if batch.len() >= self.config.batch_games {
                train_both(p1, p2, &batch)?;
                batch.clear();
                batches += 1;

                if self.config.checkpoint_interval > 0
                    && batches % self.config.checkpoint_interval == 0
                {
                    if let Some(path) = self.checkpoint(p1, p2, episode, &metrics) {
                        last_checkpoint = Some(path);
                        checkpointed_at = Some(episode);
                    }
                }
            }

            if episode % self.config.log_interval == 0 {
                let window = self.config.log_interval;
                log::info!(
                    "Episode {}/{} | p1 win: {:.1}% | p2 win: {:.1}% | draw: {:.1}% | avg_len: {:.2} | aborted: {}",
                    episode,
                    self.config.episodes,
                    metrics.win_rate(PlayerId::One, window) * 100.0,
                    metrics.win_rate(PlayerId::Two, window) * 100.0,
                    metrics.draw_rate(window) * 100.0,
                    metrics.average_game_length(window),
                    metrics.aborted(),
                );
            }
        }

        if !batch.is_empty() {
            train_both(p1, p2, &batch)?;
            batches += 1;
        }
        if checkpointed_at != Some(self.config.episodes) {
            if let Some(path) = self.checkpoint(p1, p2, self.config.episodes, &metrics) {
                last_checkpoint = Some(path);
            }
        }

        let report = TrainingReport {
            episodes: metrics.total_episodes(),
            player_one_wins: metrics.total_wins(PlayerId::One),
            player_two_wins: metrics.total_wins(PlayerId::Two),
            draws: metrics.total_draws(),
            aborted: metrics.aborted(),
            batches,
            last_checkpoint,
            elapsed: start.elapsed(),
        };
        log::info!(
            "Training complete: {} episodes, {} batches in {:.1}s",
            report.episodes,
            report.batches,
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }

    fn checkpoint(
        &self,
        p1: &dyn Player,
        p2: &dyn Player,
        episode: usize,
        metrics: &TrainingMetrics,
    ) -> Option<PathBuf> {
        let sink = self.checkpoints.as_ref()?;
        let hyperparameters = CheckpointHyperparameters {
            gamma: sink.learner.gamma,
            epsilon: sink.learner.epsilon,
            rewards: sink.learner.rewards,
            train_iterations: sink.learner.train_iterations,
            batch_games: self.config.batch_games,
        };
        let snapshot = CheckpointMetrics::from_metrics(metrics, self.config.log_interval);
        match sink.manager.save_checkpoint(
            &[p1, p2],
            episode,
            &sink.network,
            &hyperparameters,
            &snapshot,
        ) {
            Ok(path) => {
                log::info!("Checkpoint saved: {}", path.display());
                Some(path)
            }
            Err(e) => {
                log::warn!("Checkpoint at episode {} failed: {}", episode, e);
                None
            }
        }
    }
}

fn train_both(
    p1: &mut dyn Player,
    p2: &mut dyn Player,
    games: &[GamePlayed],
) -> Result<(), TrainingError> {
    p1.train(games)?;
    p2.train(games)?;
    Ok(())
}

/// Play `games` games without training and return their metrics.
pub fn evaluate(
    p1: &mut dyn Player,
    p2: &mut dyn Player,
    games: usize,
) -> TrainingMetrics {
    let mut metrics = TrainingMetrics::with_capacity(games);
    for game in 0..games {
        match play_episode(p1, p2) {
            Ok(played) => metrics.record_episode(EpisodeResult::from_game(&played)),
            Err(e) => {
                log::warn!("Evaluation game {} aborted: {}", game, e);
                metrics.record_aborted();
            }
        }
    }
    metrics
}
