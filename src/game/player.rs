use serde::{Deserialize, Serialize};

use crate::error::MoveError;

/// One of the two sides. Player one moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    /// Get the other player
    pub fn other(self) -> PlayerId {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }

    /// Value stored in a board cell for this player
    pub fn code(self) -> u8 {
        match self {
            PlayerId::One => 1,
            PlayerId::Two => 2,
        }
    }

    pub fn from_code(code: u8) -> Result<PlayerId, MoveError> {
        match code {
            1 => Ok(PlayerId::One),
            2 => Ok(PlayerId::Two),
            other => Err(MoveError::InvalidPlayer(other)),
        }
    }

    /// Board symbol
    pub fn symbol(self) -> char {
        match self {
            PlayerId::One => 'X',
            PlayerId::Two => 'O',
        }
    }

    /// Offset of this player's first ply in a game
    pub fn first_ply(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_player() {
        assert_eq!(PlayerId::One.other(), PlayerId::Two);
        assert_eq!(PlayerId::Two.other(), PlayerId::One);
    }

    #[test]
    fn test_codes() {
        assert_eq!(PlayerId::from_code(1).unwrap(), PlayerId::One);
        assert_eq!(PlayerId::from_code(PlayerId::Two.code()).unwrap(), PlayerId::Two);
        assert_eq!(PlayerId::from_code(0), Err(MoveError::InvalidPlayer(0)));
        assert_eq!(PlayerId::from_code(3), Err(MoveError::InvalidPlayer(3)));
    }

    #[test]
    fn test_symbols() {
        assert_eq!(PlayerId::One.symbol(), 'X');
        assert_eq!(PlayerId::Two.symbol(), 'O');
    }
}
