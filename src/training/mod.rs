//! Self-play: episode runner, reward shaping, batch trainer and metrics.

mod episode;
mod metrics;
mod rewards;
mod trainer;

pub use episode::{derive_seed, play_episode};
pub use metrics::{EpisodeResult, TrainingMetrics};
pub use rewards::{discounted_rewards, make_samples, terminal_reward, RewardConfig};
pub use trainer::{evaluate, Trainer, TrainerConfig, TrainingReport};
