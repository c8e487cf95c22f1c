use std::path::PathBuf;

/// Errors raised by [`Tensor`](crate::tensor::Tensor) operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TensorError {
    #[error("shape mismatch in {op}: left is {left:?}, right is {right:?}")]
    ShapeMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("index ({row}, {col}) out of range for {rows}x{cols} tensor")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("malformed tensor line: {0}")]
    MalformedTensor(String),
}

/// Errors raised while building, running, training or (de)serializing a network.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error(transparent)]
    Tensor(#[from] TensorError),

    #[error("incompatible layer: previous layer outputs {previous}, new layer expects {inputs}")]
    IncompatibleLayer { previous: usize, inputs: usize },

    #[error("unknown activation '{0}'")]
    UnknownActivation(String),

    #[error("activation '{activation}' cannot be paired with derivative '{derivative}'")]
    MismatchedDerivative {
        activation: String,
        derivative: String,
    },

    #[error("malformed network data: {0}")]
    Malformed(String),

    #[error("network has no layers")]
    EmptyNetwork,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Game-rule violations reported by the board or by a player choosing a move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("position ({row}, {col}) out of bounds, must be in [0,2]")]
    OutOfBounds { row: usize, col: usize },

    #[error("invalid player {0}, must be 1 or 2")]
    InvalidPlayer(u8),

    #[error("position ({row}, {col}) occupied by player {owner}")]
    PositionOccupied { row: usize, col: usize, owner: u8 },

    #[error("no more moves to make, game over")]
    NoLegalMoves,

    #[error("failed to read move: {0}")]
    Input(String),
}

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint directory not found: {0}")]
    DirNotFound(PathBuf),

    #[error("no 'latest' symlink found in {0}")]
    NoLatestSymlink(PathBuf),

    #[error("failed to read metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata from {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("checkpoint uses position encoding '{found}', expected '{expected}'")]
    EncodingMismatch { expected: String, found: String },

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("move error: {0}")]
    Move(#[from] MoveError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
