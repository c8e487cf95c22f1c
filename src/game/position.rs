use crate::error::MoveError;
use crate::tensor::Tensor;

use super::board::SIZE;
use super::{Board, Move};

pub const CELLS: usize = SIZE * SIZE;

/// Rows of an encoded position: board cells followed by the one-hot move.
pub const POSITION_ROWS: usize = 2 * CELLS;

/// Identifier of the encoding below, stored with every checkpoint.
pub const POSITION_ENCODING: &str = "cells-012-colmajor+move-onehot";

/// Offset of cell (`row`, `col`) within either half of a position.
pub fn cell_index(row: usize, col: usize) -> usize {
    row + SIZE * col
}

/// Encode `board` plus the candidate `mv` as an 18x1 column.
///
/// Rows 0..9 carry the cell codes, rows 9..18 carry a 1 at the move's cell.
pub fn make_position(board: &Board, mv: &Move) -> Result<Tensor, MoveError> {
    if mv.row >= SIZE || mv.col >= SIZE {
        return Err(MoveError::OutOfBounds {
            row: mv.row,
            col: mv.col,
        });
    }
    let mut data = vec![0.0; POSITION_ROWS];
    for (row, cells) in board.cells().iter().enumerate() {
        for (col, &code) in cells.iter().enumerate() {
            data[cell_index(row, col)] = f64::from(code);
        }
    }
    data[CELLS + cell_index(mv.row, mv.col)] = 1.0;
    Ok(Tensor::column_vector(&data))
}
