use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ml_tictactoe::ai::{HumanPlayer, LearnerConfig, MlannPlayer, Player, RandomPlayer};
use ml_tictactoe::checkpoint::CheckpointManager;
use ml_tictactoe::config::AppConfig;
use ml_tictactoe::game::{Board, GameStatus, PlayerId};
use ml_tictactoe::nn::Network;

/// Play tic-tac-toe against a trained network.
#[derive(Parser)]
#[command(name = "ml_tictactoe", about = "Play tic-tac-toe against a trained network")]
struct Cli {
    /// Network file of the computer player; a random player is used if missing
    #[arg(long, conflicts_with_all = ["checkpoint", "latest"])]
    net: Option<PathBuf>,

    /// Checkpoint directory to load the computer player's network from
    #[arg(long, conflicts_with = "latest")]
    checkpoint: Option<PathBuf>,

    /// Load the newest checkpoint under the configured checkpoint directory
    #[arg(long)]
    latest: bool,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Let the computer open the game
    #[arg(long)]
    second: bool,
}

fn checkpoint_network(cli: &Cli, config: &AppConfig, id: PlayerId) -> Result<Option<Network>> {
    if cli.checkpoint.is_none() && !cli.latest {
        return Ok(None);
    }
    let manager = CheckpointManager::new(config.checkpoint.clone())
        .with_context(|| format!("opening {}", config.checkpoint.dir.display()))?;
    let data = match &cli.checkpoint {
        Some(dir) => manager.load_checkpoint(dir),
        None => manager.load_latest(),
    }
    .context("loading checkpoint")?;
    log::info!(
        "Loaded checkpoint {} (episode {})",
        data.path.display(),
        data.metadata.episode
    );
    let network = data
        .load_network(id)
        .with_context(|| format!("loading player {} from {}", id.code(), data.path.display()))?;
    Ok(Some(network))
}

fn opponent(cli: &Cli, config: &AppConfig, id: PlayerId) -> Result<Box<dyn Player>> {
    let learner = LearnerConfig {
        epsilon: 0.0,
        ..config.player.clone()
    };
    if let Some(network) = checkpoint_network(cli, config, id)? {
        return Ok(Box::new(MlannPlayer::new(
            id,
            network,
            learner,
            StdRng::from_os_rng(),
        )));
    }

    let path = cli
        .net
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("player{}.net", id.code())));
    if !path.exists() {
        log::warn!("{} not found, playing against random moves", path.display());
        return Ok(Box::new(RandomPlayer::new(id)));
    }
    let network = Network::load(&path, &config.network)
        .with_context(|| format!("loading network {}", path.display()))?;
    Ok(Box::new(MlannPlayer::new(
        id,
        network,
        learner,
        StdRng::from_os_rng(),
    )))
}

fn play<R: BufRead, W: Write>(
    human: &mut HumanPlayer<R, W>,
    computer: &mut dyn Player,
    human_first: bool,
) -> Result<GameStatus> {
    let mut board = Board::new();
    let mut human_turn = human_first;
    loop {
        let mv = if human_turn {
            println!("\n{}", computer.display(&board));
            human.select_move(&board)?
        } else {
            computer.select_move(&board)?
        };
        board.apply(mv)?;
        let status = board.game_over();
        if status.is_over() {
            println!("\n{board}");
            return Ok(status);
        }
        human_turn = !human_turn;
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    let (human_id, computer_id) = if cli.second {
        (PlayerId::Two, PlayerId::One)
    } else {
        (PlayerId::One, PlayerId::Two)
    };
    let mut computer = opponent(&cli, &config, computer_id)?;
    let stdin = io::stdin();
    let mut human = HumanPlayer::new(human_id, stdin.lock(), io::stdout());

    println!(
        "You are {} against {}. Enter moves as `row col`.",
        human_id.symbol(),
        computer.name()
    );
    let status = play(&mut human, computer.as_mut(), !cli.second)?;
    match status.winner() {
        Some(winner) if winner == human_id => println!("You win!"),
        Some(_) => println!("{} wins.", computer.name()),
        None => println!("Draw."),
    }
    Ok(())
}
