/*!
 * Sparse numeric matrices
 *
 * A [DMatrix] is the numeric value functions are evaluated on: a [Sparsity] pattern and
 * one `f64` per structural nonzero. Positions outside the pattern are structural zeros,
 * which are displayed as `00` to tell them apart from a stored `0`.
 *
 * ```
 * use easy_sens::matrices::DMatrix;
 * use easy_sens::sparsity::Sparsity;
 * let x = DMatrix::new(Sparsity::diagonal(2), vec![1.0, 2.0]).unwrap();
 * assert_eq!(x.get(1, 1), 2.0);
 * assert_eq!(x.get(0, 1), 0.0);
 * assert_eq!(x.to_string(), "[[1, 00], [00, 2]]");
 * ```
 */

pub mod errors;
mod operations;

use crate::matrices::errors::MatrixError;
use crate::sparsity::Sparsity;

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};

/**
 * A sparse matrix of `f64` values stored in the nonzero order of its pattern.
 */
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DMatrix {
    sparsity: Sparsity,
    data: Vec<f64>,
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for DMatrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct DMatrixData {
            sparsity: Sparsity,
            data: Vec<f64>,
        }

        let data = DMatrixData::deserialize(deserializer)?;
        DMatrix::new(data.sparsity, data.data).map_err(serde::de::Error::custom)
    }
}

impl DMatrix {
    /**
     * Creates a matrix from a pattern and one value per structural nonzero.
     */
    pub fn new(sparsity: Sparsity, data: Vec<f64>) -> Result<DMatrix, MatrixError> {
        if sparsity.nnz() != data.len() {
            return Err(MatrixError::NonzeroCount {
                expected: sparsity.nnz(),
                actual: data.len(),
            });
        }
        Ok(DMatrix { sparsity, data })
    }

    /**
     * Creates a matrix from values already known to match the pattern.
     */
    pub(crate) fn from_parts(sparsity: Sparsity, data: Vec<f64>) -> DMatrix {
        debug_assert_eq!(sparsity.nnz(), data.len());
        DMatrix { sparsity, data }
    }

    /**
     * A matrix with every structural nonzero of the pattern set to 0.
     */
    pub fn zeros(sparsity: Sparsity) -> DMatrix {
        let data = vec![0.0; sparsity.nnz()];
        DMatrix { sparsity, data }
    }

    /**
     * Creates a dense 1x1 matrix.
     */
    pub fn scalar(value: f64) -> DMatrix {
        DMatrix {
            sparsity: Sparsity::scalar(),
            data: vec![value],
        }
    }

    /**
     * Creates a dense column vector (Nx1) from a list.
     */
    pub fn column(values: Vec<f64>) -> DMatrix {
        DMatrix {
            sparsity: Sparsity::dense(values.len(), 1),
            data: values,
        }
    }

    /**
     * Creates a dense matrix from values in column major order.
     */
    pub fn dense(rows: usize, columns: usize, values: Vec<f64>) -> Result<DMatrix, MatrixError> {
        DMatrix::new(Sparsity::dense(rows, columns), values)
    }

    pub fn sparsity(&self) -> &Sparsity {
        &self.sparsity
    }

    /**
     * The values of the structural nonzeros in nonzero order.
     */
    pub fn nonzeros(&self) -> &[f64] {
        &self.data
    }

    pub fn into_nonzeros(self) -> Vec<f64> {
        self.data
    }

    pub fn shape(&self) -> (usize, usize) {
        self.sparsity.shape()
    }

    pub fn nnz(&self) -> usize {
        self.sparsity.nnz()
    }

    pub fn numel(&self) -> usize {
        self.sparsity.numel()
    }

    /**
     * Gets the value at this row and column, which is 0 for structural zeros. Rows and
     * Columns are 0 indexed.
     */
    #[track_caller]
    pub fn get(&self, row: usize, column: usize) -> f64 {
        assert!(row < self.sparsity.rows(), "Row out of index");
        assert!(column < self.sparsity.columns(), "Column out of index");
        self.sparsity
            .find(row, column)
            .map(|k| self.data[k])
            .unwrap_or(0.0)
    }

    /**
     * Returns a copy of this matrix without the structural nonzeros that hold a numerical
     * zero. NaN values are kept.
     */
    pub fn prune_zeros(&self) -> DMatrix {
        let kept: Vec<((usize, usize), f64)> = self
            .sparsity
            .coordinates()
            .zip(self.data.iter().copied())
            .filter(|&(_, value)| value != 0.0)
            .collect();
        let sorted: Vec<(usize, usize)> = kept
            .iter()
            .map(|&((row, column), _)| (column, row))
            .collect();
        let sparsity = Sparsity::from_sorted_column_major(
            self.sparsity.rows(),
            self.sparsity.columns(),
            &sorted,
        );
        DMatrix {
            sparsity,
            data: kept.into_iter().map(|(_, value)| value).collect(),
        }
    }

    /**
     * Copies the values of this matrix onto another pattern of the same shape. Nonzeros
     * missing from this matrix are filled with 0 and nonzeros missing from the target
     * pattern are dropped.
     */
    pub fn project(&self, sparsity: &Sparsity) -> Result<DMatrix, MatrixError> {
        if self.shape() != sparsity.shape() {
            return Err(MatrixError::ShapeMismatch {
                left: self.shape(),
                right: sparsity.shape(),
            });
        }
        if &self.sparsity == sparsity {
            return Ok(self.clone());
        }
        let data = sparsity
            .coordinates()
            .map(|(row, column)| {
                self.sparsity
                    .find(row, column)
                    .map(|k| self.data[k])
                    .unwrap_or(0.0)
            })
            .collect();
        Ok(DMatrix {
            sparsity: sparsity.clone(),
            data,
        })
    }

    /**
     * The values of every element in column major order, structural zeros included.
     */
    pub fn to_dense(&self) -> Vec<f64> {
        let rows = self.sparsity.rows();
        let mut values = vec![0.0; self.numel()];
        for ((row, column), value) in self.sparsity.coordinates().zip(self.data.iter()) {
            values[column * rows + row] = *value;
        }
        values
    }
}

/**
 * Formats one element of a sparse matrix given the nonzero index it is stored at, if any.
 */
pub(crate) fn format_sparse<F>(
    f: &mut fmt::Formatter<'_>,
    sparsity: &Sparsity,
    mut element: F,
) -> fmt::Result
where
    F: FnMut(&mut fmt::Formatter<'_>, Option<usize>) -> fmt::Result,
{
    let (rows, columns) = sparsity.shape();
    if rows == 1 && columns == 1 {
        return element(f, sparsity.find(0, 0));
    }
    if columns == 1 {
        write!(f, "[")?;
        for row in 0..rows {
            if row > 0 {
                write!(f, ", ")?;
            }
            element(f, sparsity.find(row, 0))?;
        }
        return write!(f, "]");
    }
    write!(f, "[")?;
    for row in 0..rows {
        if row > 0 {
            write!(f, ", ")?;
        }
        write!(f, "[")?;
        for column in 0..columns {
            if column > 0 {
                write!(f, ", ")?;
            }
            element(f, sparsity.find(row, column))?;
        }
        write!(f, "]")?;
    }
    write!(f, "]")
}

/**
 * Matrices are displayed row by row, with `00` marking structural zeros. Column vectors
 * are displayed flat and 1x1 matrices as their single value.
 */
impl fmt::Display for DMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_sparse(f, &self.sparsity, |f, nonzero| match nonzero {
            Some(k) => write!(f, "{}", self.data[k]),
            None => write!(f, "00"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_number_of_values() {
        assert_eq!(
            DMatrix::new(Sparsity::dense(2, 2), vec![1.0]),
            Err(MatrixError::NonzeroCount {
                expected: 4,
                actual: 1
            })
        );
    }

    #[test]
    fn prune_zeros_keeps_nan() {
        let x = DMatrix::column(vec![0.0, f64::NAN, 2.0]);
        let pruned = x.prune_zeros();
        assert_eq!(pruned.nnz(), 2);
        assert!(pruned.nonzeros()[0].is_nan());
        assert_eq!(pruned.get(0, 0), 0.0);
    }

    #[test]
    fn project_fills_and_drops() {
        let x = DMatrix::new(Sparsity::diagonal(2), vec![3.0, 4.0]).unwrap();
        let target = Sparsity::from_triplets(2, 2, &[(0, 0), (0, 1)]).unwrap();
        let projected = x.project(&target).unwrap();
        assert_eq!(projected.nonzeros(), &[3.0, 0.0]);
        assert!(x.project(&Sparsity::dense(2, 1)).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(DMatrix::scalar(2.5).to_string(), "2.5");
        assert_eq!(DMatrix::zeros(Sparsity::empty(1, 1)).to_string(), "00");
        assert_eq!(DMatrix::column(vec![1.0, -2.0]).to_string(), "[1, -2]");
        assert_eq!(
            DMatrix::dense(1, 2, vec![1.0, 2.0]).unwrap().to_string(),
            "[[1, 2]]"
        );
    }
}
