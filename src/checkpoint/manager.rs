use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ai::Player;
use crate::checkpoint::metadata::{CheckpointHyperparameters, CheckpointMetadata, CheckpointMetrics};
use crate::error::CheckpointError;
use crate::game::{PlayerId, POSITION_ENCODING};
use crate::nn::{Network, NetworkConfig};

/// Configuration for the checkpoint manager.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CheckpointManagerConfig {
    pub dir: PathBuf,
    pub keep_last_n: usize,
    pub keep_best_n: usize,
}

impl Default for CheckpointManagerConfig {
    fn default() -> Self {
        CheckpointManagerConfig {
            dir: PathBuf::from("checkpoints"),
            keep_last_n: 5,
            keep_best_n: 3,
        }
    }
}

/// A checkpoint directory and its parsed metadata.
#[derive(Debug, Clone)]
pub struct CheckpointData {
    pub path: PathBuf,
    pub metadata: CheckpointMetadata,
}

impl CheckpointData {
    pub fn network_path(&self, player: PlayerId) -> PathBuf {
        network_file(&self.path, player)
    }

    /// Load the saved network of `player` with the recorded network config.
    pub fn load_network(&self, player: PlayerId) -> Result<Network, CheckpointError> {
        Ok(Network::load(
            &self.network_path(player),
            &self.metadata.network,
        )?)
    }
}

fn network_file(dir: &Path, player: PlayerId) -> PathBuf {
    dir.join(format!("player{}.net", player.code()))
}

/// Manages saving, loading, listing, and pruning checkpoints.
pub struct CheckpointManager {
    config: CheckpointManagerConfig,
}

impl CheckpointManager {
    pub fn new(config: CheckpointManagerConfig) -> Result<Self, CheckpointError> {
        fs::create_dir_all(&config.dir)?;
        Ok(CheckpointManager { config })
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Save the networks of every learning player plus metadata.json.
    ///
    /// Everything is written to `<name>.tmp` first and renamed into place.
    pub fn save_checkpoint(
        &self,
        players: &[&dyn Player],
        episode: usize,
        network: &NetworkConfig,
        hyperparameters: &CheckpointHyperparameters,
        metrics: &CheckpointMetrics,
    ) -> Result<PathBuf, CheckpointError> {
        let dir_name = format!("checkpoint_{:07}", episode);
        let tmp_dir = self.config.dir.join(format!("{}.tmp", dir_name));
        let final_dir = self.config.dir.join(&dir_name);

        fs::create_dir_all(&tmp_dir)?;

        let mut saved = Vec::new();
        for player in players.iter().filter(|p| p.learns()) {
            player.persist(&network_file(&tmp_dir, player.id()))?;
            saved.push(player.id().code());
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let metadata = CheckpointMetadata {
            episode,
            timestamp,
            position_encoding: POSITION_ENCODING.to_string(),
            players: saved,
            network: network.clone(),
            hyperparameters: hyperparameters.clone(),
            metrics: metrics.clone(),
        };
        let meta_json = serde_json::to_string_pretty(&metadata)?;
        fs::write(tmp_dir.join("metadata.json"), meta_json)?;

        if final_dir.exists() {
            fs::remove_dir_all(&final_dir)?;
        }
        fs::rename(&tmp_dir, &final_dir)?;

        self.update_latest_symlink(&dir_name)?;
        self.prune_old_checkpoints()?;

        Ok(final_dir)
    }

    fn read_metadata(&self, dir: &Path) -> Result<CheckpointMetadata, CheckpointError> {
        let meta_path = dir.join("metadata.json");
        let meta_json =
            fs::read_to_string(&meta_path).map_err(|e| CheckpointError::MetadataRead {
                path: meta_path.clone(),
                source: e,
            })?;
        serde_json::from_str(&meta_json).map_err(|e| CheckpointError::MetadataParse {
            path: meta_path,
            source: e,
        })
    }

    /// Load a checkpoint, rejecting one written with a different position encoding.
    pub fn load_checkpoint(&self, dir: &Path) -> Result<CheckpointData, CheckpointError> {
        if !dir.is_dir() {
            return Err(CheckpointError::DirNotFound(dir.to_path_buf()));
        }
        let metadata = self.read_metadata(dir)?;
        if metadata.position_encoding != POSITION_ENCODING {
            return Err(CheckpointError::EncodingMismatch {
                expected: POSITION_ENCODING.to_string(),
                found: metadata.position_encoding,
            });
        }
        Ok(CheckpointData {
            path: dir.to_path_buf(),
            metadata,
        })
    }

    /// Load the checkpoint the `latest` symlink points at.
    pub fn load_latest(&self) -> Result<CheckpointData, CheckpointError> {
        let latest_link = self.config.dir.join("latest");
        if !latest_link.exists() {
            return Err(CheckpointError::NoLatestSymlink(self.config.dir.clone()));
        }
        let resolved = fs::read_link(&latest_link)?;
        let target = if resolved.is_relative() {
            self.config.dir.join(resolved)
        } else {
            resolved
        };
        self.load_checkpoint(&target)
    }

    /// List all checkpoints sorted by episode (ascending).
    pub fn list_checkpoints(&self) -> Result<Vec<(PathBuf, CheckpointMetadata)>, CheckpointError> {
        let mut results = Vec::new();
        for entry in fs::read_dir(&self.config.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() || path.is_symlink() {
                continue;
            }
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if !name_str.starts_with("checkpoint_") || name_str.ends_with(".tmp") {
                continue;
            }
            if path.join("metadata.json").exists() {
                let metadata = self.read_metadata(&path)?;
                results.push((path, metadata));
            }
        }
        results.sort_by_key(|(_, m)| m.episode);
        Ok(results)
    }

    /// Prune old checkpoints, keeping the union of the last N and the best N
    /// by player-one win rate.
    fn prune_old_checkpoints(&self) -> Result<(), CheckpointError> {
        let checkpoints = self.list_checkpoints()?;
        if checkpoints.len() <= self.config.keep_last_n {
            return Ok(());
        }

        let total = checkpoints.len();
        let mut keep: HashSet<usize> = (total.saturating_sub(self.config.keep_last_n)..total).collect();

        let mut by_win_rate: Vec<(usize, f64)> = checkpoints
            .iter()
            .enumerate()
            .map(|(i, (_, m))| (i, m.metrics.player_one_win_rate))
            .collect();
        by_win_rate.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        keep.extend(by_win_rate.iter().take(self.config.keep_best_n).map(|(i, _)| *i));

        for (i, (path, _)) in checkpoints.iter().enumerate() {
            if !keep.contains(&i) {
                log::debug!("Pruning checkpoint {}", path.display());
                fs::remove_dir_all(path)?;
            }
        }

        Ok(())
    }

    /// Point the `latest` symlink at the given checkpoint directory name.
    fn update_latest_symlink(&self, dir_name: &str) -> Result<(), CheckpointError> {
        let link_path = self.config.dir.join("latest");
        if link_path.symlink_metadata().is_ok() {
            fs::remove_file(&link_path)?;
        }
        std::os::unix::fs::symlink(dir_name, &link_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{LearnerConfig, MlannPlayer, RandomPlayer};
    use crate::training::RewardConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_network() -> NetworkConfig {
        NetworkConfig {
            hidden: vec![4],
            ..NetworkConfig::default()
        }
    }

    fn learner(id: PlayerId, seed: u64) -> MlannPlayer {
        let net = small_network().build(&mut StdRng::seed_from_u64(seed)).unwrap();
        MlannPlayer::new(id, net, LearnerConfig::default(), StdRng::seed_from_u64(seed))
    }

    fn hyperparameters() -> CheckpointHyperparameters {
        CheckpointHyperparameters {
            gamma: 0.9,
            epsilon: 0.1,
            rewards: RewardConfig::default(),
            train_iterations: 10,
            batch_games: 72,
        }
    }

    fn test_metrics(win_rate: f64) -> CheckpointMetrics {
        CheckpointMetrics {
            player_one_win_rate: win_rate,
            player_two_win_rate: 0.2,
            draw_rate: 0.1,
            average_game_length: 7.0,
            total_episodes: 1000,
            aborted_episodes: 0,
        }
    }

    fn manager(dir: &Path, keep_last_n: usize, keep_best_n: usize) -> CheckpointManager {
        CheckpointManager::new(CheckpointManagerConfig {
            dir: dir.to_path_buf(),
            keep_last_n,
            keep_best_n,
        })
        .unwrap()
    }

    fn save(manager: &CheckpointManager, players: &[&dyn Player], episode: usize, win_rate: f64) -> PathBuf {
        manager
            .save_checkpoint(
                players,
                episode,
                &small_network(),
                &hyperparameters(),
                &test_metrics(win_rate),
            )
            .unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);
        let p1 = learner(PlayerId::One, 1);
        let p2 = RandomPlayer::seeded(PlayerId::Two, 2);

        let path = save(&manager, &[&p1, &p2], 1000, 0.5);
        assert!(path.exists());
        assert!(path.join("metadata.json").exists());
        assert!(path.join("player1.net").exists());
        assert!(!path.join("player2.net").exists());
        assert!(!dir.path().join("checkpoint_0001000.tmp").exists());

        let data = manager.load_checkpoint(&path).unwrap();
        assert_eq!(data.metadata.episode, 1000);
        assert_eq!(data.metadata.players, vec![1]);
        assert_eq!(data.metadata.position_encoding, POSITION_ENCODING);

        let restored = data.load_network(PlayerId::One).unwrap();
        assert_eq!(restored.layers(), p1.network().layers());
    }

    #[test]
    fn test_latest_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);
        let p1 = learner(PlayerId::One, 1);

        save(&manager, &[&p1], 1000, 0.5);
        save(&manager, &[&p1], 2000, 0.5);

        let latest = manager.load_latest().unwrap();
        assert_eq!(latest.metadata.episode, 2000);
    }

    #[test]
    fn test_list_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 10, 10);
        let p2 = learner(PlayerId::Two, 3);

        for ep in [3000, 1000, 2000] {
            save(&manager, &[&p2], ep, 0.5);
        }

        let list = manager.list_checkpoints().unwrap();
        let episodes: Vec<usize> = list.iter().map(|(_, m)| m.episode).collect();
        assert_eq!(episodes, vec![1000, 2000, 3000]);
    }

    #[test]
    fn test_pruning() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 2, 1);
        let p1 = learner(PlayerId::One, 1);

        let win_rates = [0.5, 0.9, 0.3, 0.6, 0.7];
        for (i, &wr) in win_rates.iter().enumerate() {
            save(&manager, &[&p1], (i + 1) * 1000, wr);
        }

        let episodes: Vec<usize> = manager
            .list_checkpoints()
            .unwrap()
            .iter()
            .map(|(_, m)| m.episode)
            .collect();
        // last 2 plus the best by player-one win rate
        assert_eq!(episodes, vec![2000, 4000, 5000]);
    }

    #[test]
    fn test_load_latest_no_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);

        let err = manager.load_latest().unwrap_err();
        assert!(
            matches!(err, CheckpointError::NoLatestSymlink(_)),
            "expected NoLatestSymlink, got: {err}"
        );
    }

    #[test]
    fn test_load_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);
        let err = manager
            .load_checkpoint(&dir.path().join("checkpoint_0000001"))
            .unwrap_err();
        assert!(matches!(err, CheckpointError::DirNotFound(_)));
    }

    #[test]
    fn test_encoding_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);
        let p1 = learner(PlayerId::One, 1);
        let path = save(&manager, &[&p1], 100, 0.5);

        let meta_path = path.join("metadata.json");
        let mut meta: CheckpointMetadata =
            serde_json::from_str(&fs::read_to_string(&meta_path).unwrap()).unwrap();
        meta.position_encoding = "signed-cells".to_string();
        fs::write(&meta_path, serde_json::to_string(&meta).unwrap()).unwrap();

        let err = manager.load_checkpoint(&path).unwrap_err();
        assert!(matches!(
            err,
            CheckpointError::EncodingMismatch { ref found, .. } if found == "signed-cells"
        ));
    }

    #[test]
    fn test_corrupt_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);
        let ckpt = dir.path().join("checkpoint_0000007");
        fs::create_dir_all(&ckpt).unwrap();
        fs::write(ckpt.join("metadata.json"), "{ not json").unwrap();
        assert!(matches!(
            manager.load_checkpoint(&ckpt),
            Err(CheckpointError::MetadataParse { .. })
        ));
    }
}
