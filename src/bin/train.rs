use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use ml_tictactoe::ai::{LearnerConfig, MlannPlayer, Player, RandomPlayer};
use ml_tictactoe::checkpoint::CheckpointManager;
use ml_tictactoe::config::AppConfig;
use ml_tictactoe::game::PlayerId;
use ml_tictactoe::nn::NetworkConfig;
use ml_tictactoe::training::{derive_seed, evaluate, Trainer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Kind {
    Random,
    Mlann,
}

/// Train tic-tac-toe players via self-play.
#[derive(Parser)]
#[command(name = "train", about = "Train tic-tac-toe players via self-play")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Player one (opens every game)
    #[arg(long, value_enum, default_value = "mlann")]
    player1: Kind,

    /// Player two
    #[arg(long, value_enum, default_value = "mlann")]
    player2: Kind,

    /// Network file for player one; created if missing
    #[arg(long, default_value = "player1.net")]
    net1: PathBuf,

    /// Network file for player two; created if missing
    #[arg(long, default_value = "player2.net")]
    net2: PathBuf,

    /// Override number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Override the discount factor
    #[arg(long)]
    gamma: Option<f64>,

    /// Override the exploration rate
    #[arg(long)]
    epsilon: Option<f64>,

    /// Seed for every random generator
    #[arg(long)]
    seed: Option<u64>,

    /// After training, play this many games without learning and report rates
    #[arg(long, default_value_t = 0)]
    eval: usize,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn rng_for(seed: Option<u64>, stream: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(derive_seed(seed, stream)),
        None => StdRng::from_os_rng(),
    }
}

fn make_player(
    kind: Kind,
    id: PlayerId,
    net: &Path,
    network: &NetworkConfig,
    learner: &LearnerConfig,
    seed: Option<u64>,
) -> Result<Box<dyn Player>> {
    let stream = id.code() as usize;
    let player: Box<dyn Player> = match (kind, seed) {
        (Kind::Random, Some(seed)) => Box::new(RandomPlayer::seeded(id, derive_seed(seed, stream))),
        (Kind::Random, None) => Box::new(RandomPlayer::new(id)),
        (Kind::Mlann, _) => Box::new(
            MlannPlayer::from_path(id, net, network, learner.clone(), rng_for(seed, stream))
                .with_context(|| format!("loading network {}", net.display()))?,
        ),
    };
    Ok(player)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", AppConfig::default_toml().context("serializing default config")?);
        return Ok(());
    }

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(episodes) = cli.episodes {
        config.training.episodes = episodes;
    }
    if let Some(gamma) = cli.gamma {
        config.player.gamma = gamma;
    }
    if let Some(epsilon) = cli.epsilon {
        config.player.epsilon = epsilon;
    }
    if cli.seed.is_some() {
        config.training.seed = cli.seed;
    }
    config.validate().context("invalid configuration")?;

    let seed = config.training.seed;
    let mut p1 = make_player(
        cli.player1,
        PlayerId::One,
        &cli.net1,
        &config.network,
        &config.player,
        seed,
    )?;
    let mut p2 = make_player(
        cli.player2,
        PlayerId::Two,
        &cli.net2,
        &config.network,
        &config.player,
        seed,
    )?;

    let manager = CheckpointManager::new(config.checkpoint.clone())
        .with_context(|| format!("creating {}", config.checkpoint.dir.display()))?;
    let trainer = Trainer::new(config.training.clone()).with_checkpoints(
        manager,
        config.network.clone(),
        config.player.clone(),
    );

    let report = trainer.run(p1.as_mut(), p2.as_mut())?;
    let played = report.episodes.max(1) as f64;
    log::info!(
        "player one won {:.1}%, player two won {:.1}%, draws {:.1}%, aborted {}",
        report.player_one_wins as f64 / played * 100.0,
        report.player_two_wins as f64 / played * 100.0,
        report.draws as f64 / played * 100.0,
        report.aborted
    );

    for (player, path) in [(&p1, &cli.net1), (&p2, &cli.net2)] {
        if player.learns() {
            player
                .persist(path)
                .with_context(|| format!("saving {}", path.display()))?;
            log::info!("Saved {} to {}", player.name(), path.display());
        }
    }

    if cli.eval > 0 {
        let metrics = evaluate(p1.as_mut(), p2.as_mut(), cli.eval);
        log::info!(
            "Evaluation over {} games: player one {:.1}%, player two {:.1}%, draws {:.1}%",
            cli.eval,
            metrics.win_rate(PlayerId::One, cli.eval) * 100.0,
            metrics.win_rate(PlayerId::Two, cli.eval) * 100.0,
            metrics.draw_rate(cli.eval) * 100.0
        );
    }

    Ok(())
}
