use std::fmt;

use crate::error::MoveError;

use super::{make_position, GamePlayed, PlayerId};

pub const SIZE: usize = 3;

/// A request by `player` to mark cell (`row`, `col`).
///
/// `player` is the raw cell code so that a bad id reaches the board and is
/// reported there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub player: u8,
    pub row: usize,
    pub col: usize,
}

impl Move {
    pub fn new(player: PlayerId, row: usize, col: usize) -> Self {
        Move {
            player: player.code(),
            row,
            col,
        }
    }
}

/// State of a game as judged by [`Board::game_over`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameStatus {
    #[default]
    InProgress,
    Won(PlayerId),
    Draw,
}

impl GameStatus {
    /// Numeric outcome code: 0 in progress, 1 or 2 for the winner, -1 for a draw.
    pub fn code(self) -> i8 {
        match self {
            GameStatus::InProgress => 0,
            GameStatus::Won(p) => p.code() as i8,
            GameStatus::Draw => -1,
        }
    }

    pub fn is_over(self) -> bool {
        self != GameStatus::InProgress
    }

    pub fn winner(self) -> Option<PlayerId> {
        match self {
            GameStatus::Won(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::InProgress => write!(f, "in progress"),
            GameStatus::Won(p) => write!(f, "{} wins", p.symbol()),
            GameStatus::Draw => write!(f, "draw"),
        }
    }
}

/// 3x3 grid of cell codes (0 empty, 1 or 2 for a player) that records every
/// accepted move as a position in its [`GamePlayed`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Board {
    cells: [[u8; SIZE]; SIZE],
    record: GamePlayed,
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Board::default()
    }

    /// Build a board from raw cell codes, with an empty record.
    pub fn from_cells(cells: [[u8; SIZE]; SIZE]) -> Result<Self, MoveError> {
        if let Some(&bad) = cells.iter().flatten().find(|&&c| c > 2) {
            return Err(MoveError::InvalidPlayer(bad));
        }
        Ok(Board {
            cells,
            record: GamePlayed::new(),
        })
    }

    /// Get the code at a position
    pub fn get(&self, row: usize, col: usize) -> Result<u8, MoveError> {
        if row >= SIZE || col >= SIZE {
            return Err(MoveError::OutOfBounds { row, col });
        }
        Ok(self.cells[row][col])
    }

    pub fn cells(&self) -> &[[u8; SIZE]; SIZE] {
        &self.cells
    }

    pub fn is_empty_cell(&self, row: usize, col: usize) -> bool {
        self.get(row, col) == Ok(0)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|&c| c != 0)
    }

    /// Number of marks on the board
    pub fn move_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&c| c != 0).count()
    }

    /// Trajectory recorded so far.
    pub fn record(&self) -> &GamePlayed {
        &self.record
    }

    pub fn into_record(self) -> GamePlayed {
        self.record
    }

    /// Validate and play `mv`, recording the pre-move position.
    pub fn apply(&mut self, mv: Move) -> Result<(), MoveError> {
        if mv.row >= SIZE || mv.col >= SIZE {
            return Err(MoveError::OutOfBounds {
                row: mv.row,
                col: mv.col,
            });
        }
        PlayerId::from_code(mv.player)?;
        let owner = self.cells[mv.row][mv.col];
        if owner != 0 {
            return Err(MoveError::PositionOccupied {
                row: mv.row,
                col: mv.col,
                owner,
            });
        }
        let position = make_position(self, &mv)?;
        self.record.push(position);
        self.cells[mv.row][mv.col] = mv.player;
        Ok(())
    }

    /// Judge the board without touching the record.
    pub fn status(&self) -> GameStatus {
        let c = &self.cells;
        let mut lines = Vec::with_capacity(8);
        lines.extend((0..SIZE).map(|i| [c[i][0], c[i][1], c[i][2]]));
        lines.extend((0..SIZE).map(|j| [c[0][j], c[1][j], c[2][j]]));
        lines.push([c[0][0], c[1][1], c[2][2]]);
        lines.push([c[0][2], c[1][1], c[2][0]]);

        for [a, b, d] in lines {
            if a != 0 && a == b && a == d {
                if let Ok(p) = PlayerId::from_code(a) {
                    return GameStatus::Won(p);
                }
            }
        }
        if self.is_full() {
            GameStatus::Draw
        } else {
            GameStatus::InProgress
        }
    }

    /// Judge the board and store the result as the record's outcome.
    pub fn game_over(&mut self) -> GameStatus {
        let status = self.status();
        self.record.set_outcome(status);
        status
    }

    /// Every empty cell as a move for `player`, in row-major order.
    pub fn legal_moves(&self, player: PlayerId) -> Result<Vec<Move>, MoveError> {
        let moves: Vec<Move> = (0..SIZE)
            .flat_map(|row| (0..SIZE).map(move |col| (row, col)))
            .filter(|&(row, col)| self.cells[row][col] == 0)
            .map(|(row, col)| Move::new(player, row, col))
            .collect();
        if moves.is_empty() {
            return Err(MoveError::NoLegalMoves);
        }
        Ok(moves)
    }
}

fn symbol(code: u8) -> char {
    PlayerId::from_code(code).map_or(' ', PlayerId::symbol)
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   | 0 | 1 | 2 ")?;
        writeln!(f, "---+---+---+---")?;
        for (i, row) in self.cells.iter().enumerate() {
            writeln!(
                f,
                " {} | {} | {} | {}",
                i,
                symbol(row[0]),
                symbol(row[1]),
                symbol(row[2])
            )?;
            if i < SIZE - 1 {
                writeln!(f, "---+---+---+---")?;
            }
        }
        Ok(())
    }
}
