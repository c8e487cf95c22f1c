use std::collections::VecDeque;

use crate::game::{GamePlayed, GameStatus, PlayerId};

/// Result of a single finished episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeResult {
    pub status: GameStatus,
    pub game_length: usize,
}

impl EpisodeResult {
    pub fn from_game(game: &GamePlayed) -> Self {
        EpisodeResult {
            status: game.outcome(),
            game_length: game.len(),
        }
    }
}

/// Training metrics tracker with rolling window computations.
#[derive(Debug, Clone)]
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    capacity: usize,
    // lifetime counts, never capped
    total_episodes: usize,
    player_one_wins: usize,
    player_two_wins: usize,
    draws: usize,
    aborted: usize,
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
            player_one_wins: 0,
            player_two_wins: 0,
            draws: 0,
            aborted: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        match result.status {
            GameStatus::Won(PlayerId::One) => self.player_one_wins += 1,
            GameStatus::Won(PlayerId::Two) => self.player_two_wins += 1,
            GameStatus::Draw => self.draws += 1,
            GameStatus::InProgress => {}
        }
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    /// Count an episode that ended in an error and was discarded.
    pub fn record_aborted(&mut self) {
        self.aborted += 1;
    }

    fn rate(&self, last_n: usize, pred: impl Fn(&EpisodeResult) -> bool) -> f64 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let hits = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .filter(|r| pred(r))
            .count();
        hits as f64 / n as f64
    }

    /// Win rate of `player` in the last N episodes.
    pub fn win_rate(&self, player: PlayerId, last_n: usize) -> f64 {
        self.rate(last_n, |r| r.status == GameStatus::Won(player))
    }

    /// Draw rate in the last N episodes.
    pub fn draw_rate(&self, last_n: usize) -> f64 {
        self.rate(last_n, |r| r.status == GameStatus::Draw)
    }

    /// Average game length over the last N episodes.
    pub fn average_game_length(&self, last_n: usize) -> f64 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .map(|r| r.game_length)
            .sum();
        total as f64 / n as f64
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn total_wins(&self, player: PlayerId) -> usize {
        match player {
            PlayerId::One => self.player_one_wins,
            PlayerId::Two => self.player_two_wins,
        }
    }

    pub fn total_draws(&self) -> usize {
        self.draws
    }

    pub fn aborted(&self) -> usize {
        self.aborted
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}
