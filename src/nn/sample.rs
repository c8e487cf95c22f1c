use crate::error::TensorError;
use crate::tensor::Tensor;

/// A batch of training pairs: column `j` of `x` is labeled by column `j` of `y`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    x: Tensor,
    y: Tensor,
}

impl Sample {
    pub fn new(x: Tensor, y: Tensor) -> Result<Self, TensorError> {
        if x.cols() != y.cols() {
            return Err(TensorError::ShapeMismatch {
                op: "sample",
                left: x.shape(),
                right: y.shape(),
            });
        }
        Ok(Sample { x, y })
    }

    /// An empty batch for `inputs`-sized positions and `outputs`-sized labels.
    pub fn empty(inputs: usize, outputs: usize) -> Self {
        Sample {
            x: Tensor::zeros(inputs, 0),
            y: Tensor::zeros(outputs, 0),
        }
    }

    pub fn x(&self) -> &Tensor {
        &self.x
    }

    pub fn y(&self) -> &Tensor {
        &self.y
    }

    /// Number of columns in the batch.
    pub fn len(&self) -> usize {
        self.x.cols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append the columns of `other` after this batch's columns.
    pub fn append(&self, other: &Sample) -> Result<Sample, TensorError> {
        Sample::new(self.x.append_columns(&other.x)?, self.y.append_columns(&other.y)?)
    }

    /// Columns `start..end` of both tensors.
    pub fn slice(&self, start: usize, end: usize) -> Result<Sample, TensorError> {
        Ok(Sample {
            x: self.x.columns(start, end)?,
            y: self.y.columns(start, end)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_columns() {
        assert!(Sample::new(Tensor::zeros(18, 3), Tensor::zeros(1, 3)).is_ok());
        assert!(matches!(
            Sample::new(Tensor::zeros(18, 3), Tensor::zeros(1, 2)),
            Err(TensorError::ShapeMismatch { op: "sample", .. })
        ));
    }

    #[test]
    fn test_append_and_slice() {
        let a = Sample::new(Tensor::filled(2, 1, 1.0), Tensor::filled(1, 1, 0.5)).unwrap();
        let b = Sample::new(Tensor::filled(2, 2, 2.0), Tensor::filled(1, 2, 1.5)).unwrap();
        let all = Sample::empty(2, 1).append(&a).unwrap().append(&b).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.x().get(1, 0).unwrap(), 1.0);
        assert_eq!(all.y().get(0, 2).unwrap(), 1.5);

        let tail = all.slice(1, 3).unwrap();
        assert_eq!(tail, b);
    }

    #[test]
    fn test_empty() {
        let s = Sample::empty(18, 1);
        assert!(s.is_empty());
        assert_eq!(s.x().shape(), (18, 0));
    }
}
