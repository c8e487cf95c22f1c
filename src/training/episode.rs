use crate::ai::Player;
use crate::error::TrainingError;
use crate::game::{Board, GamePlayed};

/// Play one game, `first` opening. Returns the finished record.
///
/// Any error from a player or the board ends the game and is returned; the
/// partial record is dropped.
pub fn play_episode(
    first: &mut dyn Player,
    second: &mut dyn Player,
) -> Result<GamePlayed, TrainingError> {
    let mut board = Board::new();
    let players: [&mut dyn Player; 2] = [first, second];
    let mut turn = 0;

    loop {
        let mv = players[turn % 2].select_move(&board)?;
        board.apply(mv)?;
        if board.game_over().is_over() {
            return Ok(board.into_record());
        }
        turn += 1;
    }
}

/// Derive a deterministic seed for a given stream index.
pub fn derive_seed(base_seed: u64, index: usize) -> u64 {
    // FNV-1a-inspired mixing
    let mut hash = base_seed ^ 0x517cc1b727220a95;
    let index = index as u64;
    hash = hash.wrapping_mul(0x100000001b3);
    hash ^= index;
    hash = hash.wrapping_mul(0x100000001b3);
    hash ^= index >> 32;
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::RandomPlayer;
    use crate::error::MoveError;
    use crate::game::{GameStatus, Move, PlayerId};

    struct Stubborn(PlayerId);

    impl Player for Stubborn {
        fn id(&self) -> PlayerId {
            self.0
        }

        fn name(&self) -> &str {
            "Stubborn"
        }

        fn select_move(&mut self, _board: &Board) -> Result<Move, TrainingError> {
            Ok(Move::new(self.0, 1, 1))
        }
    }

    #[test]
    fn test_play_episode_terminates() {
        let mut a = RandomPlayer::seeded(PlayerId::One, 1);
        let mut b = RandomPlayer::seeded(PlayerId::Two, 2);
        let game = play_episode(&mut a, &mut b).unwrap();
        assert!(game.is_finished());
        assert!((5..=9).contains(&game.len()));
    }

    #[test]
    fn test_play_episode_returns_move_errors() {
        let mut a = Stubborn(PlayerId::One);
        let mut b = Stubborn(PlayerId::Two);
        let err = play_episode(&mut a, &mut b).unwrap_err();
        assert!(matches!(
            err,
            TrainingError::Move(MoveError::PositionOccupied { row: 1, col: 1, owner: 1 })
        ));
    }

    #[test]
    fn test_random_vs_random_rates() {
        let mut a = RandomPlayer::seeded(PlayerId::One, 2024);
        let mut b = RandomPlayer::seeded(PlayerId::Two, 2025);
        let games = 4000;
        let (mut one, mut draw) = (0, 0);
        for _ in 0..games {
            match play_episode(&mut a, &mut b).unwrap().outcome() {
                GameStatus::Won(PlayerId::One) => one += 1,
                GameStatus::Draw => draw += 1,
                _ => {}
            }
        }
        let one = one as f64 / games as f64;
        let draw = draw as f64 / games as f64;
        // expected about 0.585 and 0.127
        assert!((0.54..0.63).contains(&one), "player one won {one}");
        assert!((0.09..0.17).contains(&draw), "draw rate {draw}");
    }

    #[test]
    fn test_derive_seed() {
        assert_eq!(derive_seed(42, 100), derive_seed(42, 100));
        assert_ne!(derive_seed(42, 0), derive_seed(42, 1));
        assert_ne!(derive_seed(1, 0), derive_seed(2, 0));
    }
}
