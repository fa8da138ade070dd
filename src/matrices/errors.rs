use std::error::Error;
use std::fmt;

/**
 * An error indicating failure to build or combine matrices because their shapes or
 * number of values are inconsistent.
 */
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum MatrixError {
    /// Two matrices needed the same shape but did not have it.
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    /// The number of values did not match the number of structural nonzeros.
    NonzeroCount { expected: usize, actual: usize },
}

impl Error for MatrixError {}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixError::ShapeMismatch { left, right } => write!(
                f,
                "Mismatched matrices, left is {}x{}, right is {}x{}",
                left.0, left.1, right.0, right.1
            ),
            MatrixError::NonzeroCount { expected, actual } => write!(
                f,
                "Sparsity pattern has {} nonzeros but {} values were given",
                expected, actual
            ),
        }
    }
}
