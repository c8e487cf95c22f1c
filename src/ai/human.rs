use std::io::{BufRead, Write};

use crate::error::{MoveError, TrainingError};
use crate::game::{Board, Move, PlayerId, SIZE};

use super::player::Player;

/// Console player reading `row col` lines from `input`.
pub struct HumanPlayer<R, W> {
    id: PlayerId,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> HumanPlayer<R, W> {
    pub fn new(id: PlayerId, input: R, output: W) -> Self {
        HumanPlayer { id, input, output }
    }

    fn prompt(&mut self, text: &str) -> Result<(), MoveError> {
        write!(self.output, "{text}")
            .and_then(|_| self.output.flush())
            .map_err(|e| MoveError::Input(e.to_string()))
    }

    fn read_move(&mut self, board: &Board) -> Result<Move, MoveError> {
        loop {
            self.prompt("row col: ")?;
            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(|e| MoveError::Input(e.to_string()))?;
            if read == 0 {
                return Err(MoveError::Input("end of input".to_string()));
            }

            match parse_move(&line) {
                Some((row, col)) if board.is_empty_cell(row, col) => {
                    return Ok(Move::new(self.id, row, col));
                }
                Some((row, col)) => {
                    self.prompt(&format!("cell ({row}, {col}) is taken\n"))?;
                }
                None => {
                    self.prompt("remember: row col, both numbers in {0,1,2}\n")?;
                }
            }
        }
    }
}

fn parse_move(line: &str) -> Option<(usize, usize)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [row, col] = fields.as_slice() else {
        return None;
    };
    let row: usize = row.parse().ok()?;
    let col: usize = col.parse().ok()?;
    (row < SIZE && col < SIZE).then_some((row, col))
}

impl<R: BufRead, W: Write> Player for HumanPlayer<R, W> {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        "Human"
    }

    fn select_move(&mut self, board: &Board) -> Result<Move, TrainingError> {
        Ok(self.read_move(board)?)
    }
}
