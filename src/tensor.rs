//! Dense row-major 2-D `f64` tensor used by the network engine and by the
//! game encoders.
//!
//! Every binary operation checks shapes and returns a fresh tensor; nothing
//! aliases an operand's storage. The few `*_in_place` helpers exist for the
//! optimizer, which owns the parameter tensors it mutates.

use std::fmt;
use std::str::FromStr;

use crate::error::TensorError;
use crate::nn::Activation;

/// Tolerance used by [`PartialEq`] for tensors.
pub const TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct Tensor {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Tensor {
    /// Create a `rows x cols` tensor filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Create a `rows x cols` tensor with every element set to `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Tensor {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Wrap row-major `data` as a `rows x cols` tensor.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, TensorError> {
        if data.len() != rows * cols {
            return Err(TensorError::ShapeMismatch {
                op: "from_vec",
                left: (rows, cols),
                right: (data.len(), 1),
            });
        }
        Ok(Tensor { rows, cols, data })
    }

    pub(crate) fn from_vec_unchecked(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Tensor { rows, cols, data }
    }

    /// Build an `n x 1` column vector.
    pub fn column_vector(values: &[f64]) -> Self {
        Tensor {
            rows: values.len(),
            cols: 1,
            data: values.to_vec(),
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut out = Self::zeros(n, n);
        for i in 0..n {
            out.data[i * n + i] = 1.0;
        }
        out
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    fn index_of(&self, row: usize, col: usize) -> Result<usize, TensorError> {
        if row >= self.rows || col >= self.cols {
            return Err(TensorError::IndexOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64, TensorError> {
        let idx = self.index_of(row, col)?;
        Ok(self.data[idx])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), TensorError> {
        let idx = self.index_of(row, col)?;
        self.data[idx] = value;
        Ok(())
    }

    fn check_same_shape(&self, other: &Tensor, op: &'static str) -> Result<(), TensorError> {
        if self.shape() != other.shape() {
            return Err(TensorError::ShapeMismatch {
                op,
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }

    fn zip_with(
        &self,
        other: &Tensor,
        op: &'static str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Tensor, TensorError> {
        self.check_same_shape(other, op)?;
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Tensor {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    pub fn add(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    pub fn sub(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    /// Element-wise product.
    pub fn hadamard(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        self.zip_with(other, "hadamard", |a, b| a * b)
    }

    /// Matrix product `self · other`.
    pub fn mul(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        if self.cols != other.rows {
            return Err(TensorError::ShapeMismatch {
                op: "mul",
                left: self.shape(),
                right: other.shape(),
            });
        }
        let mut out = Tensor::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            let out_row = i * other.cols;
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                let rhs_row = k * other.cols;
                for j in 0..other.cols {
                    out.data[out_row + j] += a * other.data[rhs_row + j];
                }
            }
        }
        Ok(out)
    }

    pub fn transpose(&self) -> Tensor {
        let mut out = Tensor::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        out
    }

    pub fn scale(&self, factor: f64) -> Tensor {
        self.map(|v| v * factor)
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Tensor {
        Tensor {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Map every element through `activation`.
    pub fn apply(&self, activation: Activation) -> Tensor {
        self.map(|v| activation.value(v))
    }

    /// Map every element through the derivative of `activation`.
    pub fn apply_derivative(&self, activation: Activation) -> Tensor {
        self.map(|v| activation.derivative(v))
    }

    /// Add the `rows x 1` tensor `column` to every column of `self`.
    pub fn add_column_broadcast(&self, column: &Tensor) -> Result<Tensor, TensorError> {
        if column.cols != 1 || column.rows != self.rows {
            return Err(TensorError::ShapeMismatch {
                op: "add_column_broadcast",
                left: self.shape(),
                right: column.shape(),
            });
        }
        let mut out = self.clone();
        for i in 0..self.rows {
            let b = column.data[i];
            for v in &mut out.data[i * self.cols..(i + 1) * self.cols] {
                *v += b;
            }
        }
        Ok(out)
    }

    /// Sum across columns, producing a `rows x 1` tensor.
    pub fn sum_columns(&self) -> Tensor {
        let data = (0..self.rows)
            .map(|i| self.data[i * self.cols..(i + 1) * self.cols].iter().sum())
            .collect();
        Tensor {
            rows: self.rows,
            cols: 1,
            data,
        }
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Copy out columns `start..end`.
    pub fn columns(&self, start: usize, end: usize) -> Result<Tensor, TensorError> {
        if start > end || end > self.cols {
            return Err(TensorError::IndexOutOfRange {
                row: 0,
                col: end,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let width = end - start;
        let mut data = Vec::with_capacity(self.rows * width);
        for i in 0..self.rows {
            data.extend_from_slice(&self.data[i * self.cols + start..i * self.cols + end]);
        }
        Ok(Tensor {
            rows: self.rows,
            cols: width,
            data,
        })
    }

    pub fn column(&self, col: usize) -> Result<Tensor, TensorError> {
        if col >= self.cols {
            return Err(TensorError::IndexOutOfRange {
                row: 0,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        self.columns(col, col + 1)
    }

    /// Stack the rows of `other` below the rows of `self`.
    pub fn append_rows(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        if self.cols != other.cols {
            return Err(TensorError::ShapeMismatch {
                op: "append_rows",
                left: self.shape(),
                right: other.shape(),
            });
        }
        let mut data = Vec::with_capacity(self.data.len() + other.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        Ok(Tensor {
            rows: self.rows + other.rows,
            cols: self.cols,
            data,
        })
    }

    /// Place the columns of `other` to the right of the columns of `self`.
    pub fn append_columns(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        if self.rows != other.rows {
            return Err(TensorError::ShapeMismatch {
                op: "append_columns",
                left: self.shape(),
                right: other.shape(),
            });
        }
        let cols = self.cols + other.cols;
        let mut data = Vec::with_capacity(self.rows * cols);
        for i in 0..self.rows {
            data.extend_from_slice(&self.data[i * self.cols..(i + 1) * self.cols]);
            data.extend_from_slice(&other.data[i * other.cols..(i + 1) * other.cols]);
        }
        Ok(Tensor {
            rows: self.rows,
            cols,
            data,
        })
    }

    pub fn approx_eq(&self, other: &Tensor, eps: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).abs() <= eps)
    }

    pub fn scale_in_place(&mut self, factor: f64) {
        for v in &mut self.data {
            *v *= factor;
        }
    }

    /// `self -= factor * other`
    pub fn sub_scaled_in_place(&mut self, other: &Tensor, factor: f64) -> Result<(), TensorError> {
        self.check_same_shape(other, "sub_scaled_in_place")?;
        for (p, g) in self.data.iter_mut().zip(&other.data) {
            *p -= factor * g;
        }
        Ok(())
    }

    pub fn add_in_place(&mut self, other: &Tensor) -> Result<(), TensorError> {
        self.check_same_shape(other, "add_in_place")?;
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
        Ok(())
    }

    /// Serialize as `rows,cols,v0,v1,...` on a single line.
    pub fn to_line(&self) -> String {
        let mut out = format!("{},{}", self.rows, self.cols);
        for v in &self.data {
            out.push(',');
            out.push_str(&format!("{v:?}"));
        }
        out
    }

    /// Parse a line produced by [`Tensor::to_line`].
    pub fn parse(line: &str) -> Result<Tensor, TensorError> {
        let malformed = || TensorError::MalformedTensor(truncate(line));
        let mut fields = line.trim().split(',').map(str::trim);
        let rows: usize = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(malformed)?;
        let cols: usize = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(malformed)?;
        let data = fields
            .map(|f| f.parse::<f64>().map_err(|_| malformed()))
            .collect::<Result<Vec<f64>, _>>()?;
        let len = rows.checked_mul(cols).ok_or_else(malformed)?;
        if data.len() != len {
            return Err(malformed());
        }
        Ok(Tensor { rows, cols, data })
    }
}

fn truncate(line: &str) -> String {
    const MAX: usize = 64;
    match line.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &line[..idx]),
        None => line.to_string(),
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.approx_eq(other, TOLERANCE)
    }
}

impl FromStr for Tensor {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tensor::parse(s)
    }
}

/// Pretty form with five decimals, one bracketed row per line.
impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            write!(f, "[")?;
            for v in &self.data[i * self.cols..(i + 1) * self.cols] {
                write!(f, " {v:.5}")?;
            }
            writeln!(f, " ]")?;
        }
        Ok(())
    }
}
