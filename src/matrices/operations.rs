/*!
 * Elementwise operator implementations for DMatrix.
 *
 * Addition and subtraction are defined for matrices of the same shape and give a result
 * over the union of both patterns. As with any matrix library, mismatched shapes are a
 * programming error and panic; [DMatrix::checked_add] and [DMatrix::checked_sub] return
 * an error instead.
 */

use crate::matrices::DMatrix;
use crate::matrices::errors::MatrixError;

use std::ops::{Add, Neg, Sub};

impl DMatrix {
    fn elementwise(
        &self,
        rhs: &DMatrix,
        operation: impl Fn(f64, f64) -> f64,
    ) -> Result<DMatrix, MatrixError> {
        if self.shape() != rhs.shape() {
            return Err(MatrixError::ShapeMismatch {
                left: self.shape(),
                right: rhs.shape(),
            });
        }
        let sparsity = self.sparsity().union(rhs.sparsity());
        let left = self.project(&sparsity)?;
        let right = rhs.project(&sparsity)?;
        let data = left
            .nonzeros()
            .iter()
            .zip(right.nonzeros())
            .map(|(&x, &y)| operation(x, y))
            .collect();
        DMatrix::new(sparsity, data)
    }

    /**
     * Elementwise addition over the union of both patterns.
     */
    pub fn checked_add(&self, rhs: &DMatrix) -> Result<DMatrix, MatrixError> {
        self.elementwise(rhs, |x, y| x + y)
    }

    /**
     * Elementwise subtraction over the union of both patterns.
     */
    pub fn checked_sub(&self, rhs: &DMatrix) -> Result<DMatrix, MatrixError> {
        self.elementwise(rhs, |x, y| x - y)
    }
}

/**
 * Elementwise addition for two referenced matrices.
 */
impl Add for &DMatrix {
    type Output = DMatrix;
    #[track_caller]
    fn add(self, rhs: &DMatrix) -> Self::Output {
        match self.checked_add(rhs) {
            Ok(sum) => sum,
            Err(error) => panic!("{}, + is only defined for MxN + MxN", error),
        }
    }
}

/**
 * Elementwise subtraction for two referenced matrices.
 */
impl Sub for &DMatrix {
    type Output = DMatrix;
    #[track_caller]
    fn sub(self, rhs: &DMatrix) -> Self::Output {
        match self.checked_sub(rhs) {
            Ok(difference) => difference,
            Err(error) => panic!("{}, - is only defined for MxN - MxN", error),
        }
    }
}

macro_rules! matrix_operator_impl_value_value {
    (impl $op:tt for DMatrix { fn $method:ident }) => {
        /**
         * Operation for two matrices.
         */
        impl $op for DMatrix {
            type Output = DMatrix;
            #[track_caller]
            #[inline]
            fn $method(self, rhs: DMatrix) -> Self::Output {
                (&self).$method(&rhs)
            }
        }
    };
}

macro_rules! matrix_operator_impl_value_reference {
    (impl $op:tt for DMatrix { fn $method:ident }) => {
        /**
         * Operation for two matrices with the right referenced.
         */
        impl $op<&DMatrix> for DMatrix {
            type Output = DMatrix;
            #[track_caller]
            #[inline]
            fn $method(self, rhs: &DMatrix) -> Self::Output {
                (&self).$method(rhs)
            }
        }
    };
}

macro_rules! matrix_operator_impl_reference_value {
    (impl $op:tt for DMatrix { fn $method:ident }) => {
        /**
         * Operation for two matrices with the left referenced.
         */
        impl $op<DMatrix> for &DMatrix {
            type Output = DMatrix;
            #[track_caller]
            #[inline]
            fn $method(self, rhs: DMatrix) -> Self::Output {
                self.$method(&rhs)
            }
        }
    };
}

matrix_operator_impl_value_value!(impl Add for DMatrix { fn add });
matrix_operator_impl_value_reference!(impl Add for DMatrix { fn add });
matrix_operator_impl_reference_value!(impl Add for DMatrix { fn add });
matrix_operator_impl_value_value!(impl Sub for DMatrix { fn sub });
matrix_operator_impl_value_reference!(impl Sub for DMatrix { fn sub });
matrix_operator_impl_reference_value!(impl Sub for DMatrix { fn sub });

/**
 * Elementwise negation for a referenced matrix, keeping its pattern.
 */
impl Neg for &DMatrix {
    type Output = DMatrix;
    fn neg(self) -> Self::Output {
        DMatrix {
            sparsity: self.sparsity.clone(),
            data: self.data.iter().map(|x| -x).collect(),
        }
    }
}

impl Neg for DMatrix {
    type Output = DMatrix;
    fn neg(self) -> Self::Output {
        -&self
    }
}

#[cfg(test)]
mod tests {
    use crate::matrices::DMatrix;
    use crate::sparsity::Sparsity;

    #[test]
    fn subtraction_uses_union_of_patterns() {
        let a = DMatrix::new(Sparsity::diagonal(2), vec![1.0, 2.0]).unwrap();
        let b = DMatrix::new(
            Sparsity::from_triplets(2, 2, &[(0, 1), (1, 1)]).unwrap(),
            vec![5.0, 2.0],
        )
        .unwrap();
        let difference = &a - &b;
        assert_eq!(difference.nnz(), 3);
        assert_eq!(difference.get(0, 1), -5.0);
        assert_eq!(difference.get(1, 1), 0.0);
        assert_eq!(difference.prune_zeros().nnz(), 2);
    }

    #[test]
    #[should_panic]
    fn mismatched_shapes_panic() {
        let _ = DMatrix::column(vec![1.0, 2.0]) + DMatrix::scalar(1.0);
    }
}
