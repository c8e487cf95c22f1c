use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{MoveError, NetworkError, TrainingError};
use crate::game::{make_position, Board, GamePlayed, Move, PlayerId, SIZE};
use crate::nn::{Network, NetworkConfig};
use crate::training::{make_samples, RewardConfig};

use super::player::Player;

/// Learning hyperparameters of a network-backed player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    /// Probability of a uniformly random move instead of the best-scored one.
    pub epsilon: f64,
    /// Discount applied per ply going back from the end of a game.
    pub gamma: f64,
    pub rewards: RewardConfig,
    /// Passes over each training batch.
    pub train_iterations: usize,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        LearnerConfig {
            epsilon: 0.1,
            gamma: 0.9,
            rewards: RewardConfig::default(),
            train_iterations: 10,
        }
    }
}

/// Player that scores every legal move with a network and plays
/// epsilon-greedily.
pub struct MlannPlayer {
    id: PlayerId,
    name: String,
    network: Network,
    config: LearnerConfig,
    rng: StdRng,
}

impl MlannPlayer {
    pub fn new(id: PlayerId, network: Network, config: LearnerConfig, rng: StdRng) -> Self {
        MlannPlayer {
            id,
            name: format!("Mlann({})", network.topology()),
            network,
            config,
            rng,
        }
    }

    /// Load the network at `path`, or build a fresh one if the file does not exist.
    pub fn from_path(
        id: PlayerId,
        path: &Path,
        network_config: &NetworkConfig,
        config: LearnerConfig,
        mut rng: StdRng,
    ) -> Result<Self, NetworkError> {
        let network = if path.exists() {
            log::info!("Loading network for player {} from {}", id.code(), path.display());
            Network::load(path, network_config)?
        } else {
            log::info!(
                "No network at {}, starting player {} from scratch",
                path.display(),
                id.code()
            );
            network_config.build(&mut rng)?
        };
        Ok(Self::new(id, network, config, rng))
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f64 {
        self.config.epsilon
    }

    /// Network output for playing `mv` on `board`.
    pub fn score(&self, board: &Board, mv: &Move) -> Result<f64, TrainingError> {
        let position = make_position(board, mv)?;
        let out = self.network.feed_forward(&position)?;
        Ok(out.get(0, 0).map_err(NetworkError::from)?)
    }
}

impl Player for MlannPlayer {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn select_move(&mut self, board: &Board) -> Result<Move, TrainingError> {
        let moves = board.legal_moves(self.id)?;
        if self.rng.random::<f64>() < self.config.epsilon {
            let mv = moves.choose(&mut self.rng).ok_or(MoveError::NoLegalMoves)?;
            return Ok(*mv);
        }

        let mut best = moves[0];
        let mut best_score = self.score(board, &best)?;
        for mv in &moves[1..] {
            let score = self.score(board, mv)?;
            // strict comparison keeps the first of equal scores
            if score > best_score {
                best = *mv;
                best_score = score;
            }
        }
        Ok(best)
    }

    fn train(&mut self, games: &[GamePlayed]) -> Result<(), TrainingError> {
        let sample = make_samples(games, self.id, self.config.gamma, &self.config.rewards)
            .map_err(NetworkError::from)?;
        if sample.is_empty() {
            return Ok(());
        }
        self.network.train(&sample, self.config.train_iterations)?;
        if log::log_enabled!(log::Level::Debug) {
            let error = self.network.squared_error(&sample)?;
            log::debug!(
                "player {} trained on {} columns, mean distance {:.5}",
                self.id.code(),
                sample.len(),
                error / sample.len() as f64
            );
        }
        Ok(())
    }

    fn persist(&self, path: &Path) -> Result<(), NetworkError> {
        self.network.save(path)
    }

    fn learns(&self) -> bool {
        true
    }

    fn display(&self, board: &Board) -> String {
        let mut out = String::new();
        out.push_str("    |     0     |     1     |     2     \n");
        out.push_str("----+-----------+-----------+-----------\n");
        for row in 0..SIZE {
            out.push_str(&format!("  {row} "));
            for col in 0..SIZE {
                let cell = match PlayerId::from_code(board.cells()[row][col]) {
                    Ok(p) => format!("{:^9}", p.symbol()),
                    Err(_) => match self.score(board, &Move::new(self.id, row, col)) {
                        Ok(v) => format!("{v:^9.5}"),
                        Err(_) => format!("{:^9}", "?"),
                    },
                };
                out.push_str(&format!("| {cell} "));
            }
            out.push('\n');
            if row < SIZE - 1 {
                out.push_str("----+-----------+-----------+-----------\n");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{Activation, Layer, UpdateRule};
    use crate::tensor::Tensor;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn config(epsilon: f64) -> LearnerConfig {
        LearnerConfig {
            epsilon,
            ..LearnerConfig::default()
        }
    }

    /// Linear scorer that values a move by the weight of its one-hot row.
    fn scripted_network(move_weights: [f64; 9]) -> Network {
        let mut weights = vec![0.0; 9];
        weights.extend_from_slice(&move_weights);
        let mut net = Network::new(0.01, 0.0, UpdateRule::Sgd);
        net.add_layer(
            Layer::from_parts(
                Tensor::from_vec(1, 18, weights).unwrap(),
                Tensor::zeros(1, 1),
                Activation::Linear,
            )
            .unwrap(),
        )
        .unwrap();
        net
    }

    #[test]
    fn test_greedy_picks_highest_score() {
        // cell (1, 2) is index 1 + 3 * 2 = 7
        let mut weights = [0.0; 9];
        weights[7] = 5.0;
        let mut player = MlannPlayer::new(
            PlayerId::One,
            scripted_network(weights),
            config(0.0),
            StdRng::seed_from_u64(0),
        );
        let mv = player.select_move(&Board::new()).unwrap();
        assert_eq!(mv, Move::new(PlayerId::One, 1, 2));
    }

    #[test]
    fn test_greedy_keeps_first_of_ties() {
        let mut player = MlannPlayer::new(
            PlayerId::Two,
            scripted_network([1.0; 9]),
            config(0.0),
            StdRng::seed_from_u64(0),
        );
        let mut board = Board::new();
        board.apply(Move::new(PlayerId::One, 0, 0)).unwrap();
        let mv = player.select_move(&board).unwrap();
        assert_eq!(mv, Move::new(PlayerId::Two, 0, 1));
    }

    #[test]
    fn test_full_exploration_still_legal() {
        let mut player = MlannPlayer::new(
            PlayerId::One,
            scripted_network([0.0; 9]),
            config(1.0),
            StdRng::seed_from_u64(3),
        );
        let mut board = Board::new();
        board.apply(Move::new(PlayerId::Two, 2, 2)).unwrap();
        for _ in 0..50 {
            let mv = player.select_move(&board).unwrap();
            assert!(board.is_empty_cell(mv.row, mv.col));
        }
    }

    #[test]
    fn test_train_moves_scores_toward_reward() {
        let net = NetworkConfig {
            hidden: vec![8],
            ..NetworkConfig::default()
        }
        .build(&mut StdRng::seed_from_u64(1))
        .unwrap();
        let mut player = MlannPlayer::new(
            PlayerId::One,
            net,
            LearnerConfig {
                epsilon: 0.0,
                gamma: 1.0,
                train_iterations: 50,
                ..LearnerConfig::default()
            },
            StdRng::seed_from_u64(2),
        );

        let mut board = Board::new();
        for (i, (row, col)) in [(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)].into_iter().enumerate() {
            let id = if i % 2 == 0 { PlayerId::One } else { PlayerId::Two };
            board.apply(Move::new(id, row, col)).unwrap();
        }
        assert!(board.game_over().is_over());
        let game = board.into_record();
        let sample = make_samples(
            std::slice::from_ref(&game),
            PlayerId::One,
            1.0,
            &RewardConfig::default(),
        )
        .unwrap();

        let before = player.network().squared_error(&sample).unwrap();
        player.train(&[game]).unwrap();
        let after = player.network().squared_error(&sample).unwrap();
        assert!(after < before, "{after} >= {before}");
    }

    #[test]
    fn test_train_on_nothing_is_noop() {
        let mut player = MlannPlayer::new(
            PlayerId::Two,
            scripted_network([0.5; 9]),
            config(0.0),
            StdRng::seed_from_u64(0),
        );
        let before = player.network().layers().to_vec();
        player.train(&[]).unwrap();
        assert_eq!(player.network().layers(), &before[..]);
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("player1.net");
        let net_config = NetworkConfig::default();

        let player = MlannPlayer::from_path(
            PlayerId::One,
            &path,
            &net_config,
            config(0.0),
            StdRng::seed_from_u64(4),
        )
        .unwrap();
        assert!(player.learns());
        player.persist(&path).unwrap();

        let reloaded = MlannPlayer::from_path(
            PlayerId::One,
            &path,
            &net_config,
            config(0.0),
            StdRng::seed_from_u64(99),
        )
        .unwrap();
        let board = Board::new();
        let mv = Move::new(PlayerId::One, 1, 1);
        assert_eq!(
            player.score(&board, &mv).unwrap().to_bits(),
            reloaded.score(&board, &mv).unwrap().to_bits()
        );
    }

    #[test]
    fn test_display_shows_scores_in_empty_cells() {
        let mut weights = [0.0; 9];
        weights[4] = 0.25;
        let player = MlannPlayer::new(
            PlayerId::Two,
            scripted_network(weights),
            config(0.0),
            StdRng::seed_from_u64(0),
        );
        let mut board = Board::new();
        board.apply(Move::new(PlayerId::One, 0, 0)).unwrap();
        let text = player.display(&board);
        assert!(text.contains("X"));
        assert!(text.contains("0.25000"));
        assert!(text.contains("0.00000"));
    }
}
