//! Players: the `Player` trait and its random, network-backed and console
//! implementations.

mod human;
mod mlann;
mod player;
mod random;

pub use human::HumanPlayer;
pub use mlann::{LearnerConfig, MlannPlayer};
pub use player::Player;
pub use random::RandomPlayer;
