use crate::functions::Symbolic;
use crate::matrices::errors::MatrixError;
use crate::matrices::{DMatrix, format_sparse};
use crate::scalar::SXElem;
use crate::sparsity::Sparsity;

use std::fmt;

/**
 * A sparse matrix of scalar expressions, one per structural nonzero of its pattern.
 */
#[derive(Clone, Debug)]
pub struct SXMatrix {
    sparsity: Sparsity,
    elements: Vec<SXElem>,
}

impl SXMatrix {
    /**
     * Creates a matrix of fresh symbols. A matrix with a single nonzero uses the name as
     * is, otherwise nonzero `k` is named `name_k`.
     */
    pub fn sym(name: &str, sparsity: Sparsity) -> SXMatrix {
        let elements = if sparsity.nnz() == 1 {
            vec![SXElem::sym(name)]
        } else {
            (0..sparsity.nnz())
                .map(|k| SXElem::sym(&format!("{}_{}", name, k)))
                .collect()
        };
        SXMatrix { sparsity, elements }
    }

    pub fn new(sparsity: Sparsity, elements: Vec<SXElem>) -> Result<SXMatrix, MatrixError> {
        if sparsity.nnz() != elements.len() {
            return Err(MatrixError::NonzeroCount {
                expected: sparsity.nnz(),
                actual: elements.len(),
            });
        }
        Ok(SXMatrix { sparsity, elements })
    }

    /**
     * A matrix with every structural nonzero of the pattern set to the constant 0.
     */
    pub fn zeros(sparsity: Sparsity) -> SXMatrix {
        let elements = (0..sparsity.nnz()).map(|_| SXElem::constant(0.0)).collect();
        SXMatrix { sparsity, elements }
    }

    /**
     * Lifts a numeric matrix into constant expressions with the same pattern.
     */
    pub fn from_dmatrix(matrix: &DMatrix) -> SXMatrix {
        SXMatrix {
            sparsity: matrix.sparsity().clone(),
            elements: matrix
                .nonzeros()
                .iter()
                .map(|&value| SXElem::constant(value))
                .collect(),
        }
    }

    pub fn sparsity(&self) -> &Sparsity {
        &self.sparsity
    }

    /**
     * The expressions of the structural nonzeros in nonzero order.
     */
    pub fn elements(&self) -> &[SXElem] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<SXElem> {
        self.elements
    }

    pub fn shape(&self) -> (usize, usize) {
        self.sparsity.shape()
    }

    pub fn nnz(&self) -> usize {
        self.sparsity.nnz()
    }

    /**
     * True if every structural nonzero is a symbol.
     */
    pub fn is_symbolic(&self) -> bool {
        self.elements.iter().all(SXElem::is_symbolic)
    }

    /**
     * The numeric value of this matrix if every element is a constant.
     */
    pub fn to_dmatrix(&self) -> Option<DMatrix> {
        let values = self
            .elements
            .iter()
            .map(SXElem::value)
            .collect::<Option<Vec<f64>>>()?;
        DMatrix::new(self.sparsity.clone(), values).ok()
    }

    /**
     * Copies the elements of this matrix onto another pattern of the same shape, filling
     * nonzeros missing from this matrix with the constant 0.
     */
    pub fn project(&self, sparsity: &Sparsity) -> Result<SXMatrix, MatrixError> {
        if self.shape() != sparsity.shape() {
            return Err(MatrixError::ShapeMismatch {
                left: self.shape(),
                right: sparsity.shape(),
            });
        }
        if &self.sparsity == sparsity {
            return Ok(self.clone());
        }
        let elements = sparsity
            .coordinates()
            .map(|(row, column)| match self.sparsity.find(row, column) {
                Some(k) => self.elements[k].clone(),
                None => SXElem::constant(0.0),
            })
            .collect();
        Ok(SXMatrix {
            sparsity: sparsity.clone(),
            elements,
        })
    }

    /**
     * Applies a function to every element, keeping the pattern.
     */
    pub fn map(&self, function: impl Fn(&SXElem) -> SXElem) -> SXMatrix {
        SXMatrix {
            sparsity: self.sparsity.clone(),
            elements: self.elements.iter().map(function).collect(),
        }
    }
}

impl Symbolic for SXMatrix {
    fn sym(name: &str, sparsity: &Sparsity) -> SXMatrix {
        SXMatrix::sym(name, sparsity.clone())
    }

    fn sparsity(&self) -> &Sparsity {
        &self.sparsity
    }
}

/**
 * Displayed in the same layout as a [DMatrix], with `00` marking structural zeros.
 */
impl fmt::Display for SXMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_sparse(f, &self.sparsity, |f, nonzero| match nonzero {
            Some(k) => write!(f, "{}", self.elements[k]),
            None => write!(f, "00"),
        })
    }
}
