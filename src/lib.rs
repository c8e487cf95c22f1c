//! # ML Tic-Tac-Toe
//!
//! Tic-tac-toe players that learn through self-play, on top of a small
//! from-scratch dense neural network engine.
//!
//! ## Modules
//!
//! - [`tensor`]: dense 2-D `f64` matrices and their text format
//! - [`nn`]: activations, layers, optimizers and the trainable network
//! - [`game`]: board, moves, position encoding and game records
//! - [`ai`]: the `Player` trait with random, network and human players
//! - [`training`]: episode runner, reward shaping, batch trainer, metrics
//! - [`checkpoint`]: network and metadata persistence with pruning
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: structured error types

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod game;
pub mod nn;
pub mod tensor;
pub mod training;
