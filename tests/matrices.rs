extern crate easy_sens;

#[cfg(test)]
mod tests {
    use easy_sens::matrices::DMatrix;
    use easy_sens::matrices::errors::MatrixError;
    use easy_sens::sparsity::{Sparsity, SparsityError};

    #[test]
    fn check_patterns() {
        let diagonal = Sparsity::diagonal(3);
        assert_eq!(diagonal.nnz(), 3);
        assert_eq!(diagonal.numel(), 9);
        assert!(!diagonal.is_dense());
        assert!(Sparsity::dense(2, 2).is_dense());
        assert!(Sparsity::empty(0, 3).is_empty());
        assert!(!Sparsity::empty(2, 3).is_empty());
        assert_eq!(diagonal.to_string(), "3x3, 3 nnz");
        assert_eq!(diagonal.column_starts(), &[0, 1, 2, 3]);
        assert_eq!(diagonal.row_indices(), &[0, 1, 2]);
    }

    #[test]
    fn check_malformed_patterns() {
        assert_eq!(
            Sparsity::new(2, 2, vec![0, 1], vec![0]),
            Err(SparsityError::ColumnStartsLength {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(
            Sparsity::new(2, 2, vec![0, 2, 1], vec![0, 1]),
            Err(SparsityError::ColumnStartsNotMonotonic)
        );
        assert!(matches!(
            Sparsity::from_triplets(2, 2, &[(2, 0)]),
            Err(SparsityError::OutOfBounds { row: 2, .. })
        ));
    }

    #[test]
    fn check_transpose_mapping() {
        // a 2x3 pattern with nonzeros at (0, 0), (1, 1) and (0, 2)
        let pattern = Sparsity::from_triplets(2, 3, &[(0, 2), (0, 0), (1, 1)]).unwrap();
        let (transposed, mapping) = pattern.transpose();
        assert_eq!(transposed.shape(), (3, 2));
        let coordinates: Vec<_> = transposed.coordinates().collect();
        assert_eq!(coordinates, vec![(0, 0), (2, 0), (1, 1)]);
        assert_eq!(mapping, vec![0, 2, 1]);
    }

    #[test]
    fn check_compress() {
        assert_eq!(Sparsity::diagonal(2).compress(), vec![2, 2, 0, 1, 2, 0, 1]);
        assert_eq!(Sparsity::dense(2, 1).compress(), vec![2, 1, 0, 2, 0, 1]);
    }

    #[test]
    fn check_display() {
        let x = DMatrix::new(Sparsity::diagonal(2), vec![1.0, 2.0]).unwrap();
        assert_eq!(x.to_string(), "[[1, 00], [00, 2]]");
        assert_eq!(DMatrix::column(vec![1.5, -2.0]).to_string(), "[1.5, -2]");
        assert_eq!(DMatrix::scalar(3.0).to_string(), "3");
        assert_eq!(DMatrix::zeros(Sparsity::empty(1, 1)).to_string(), "00");
    }

    #[test]
    fn check_addition_uses_the_union() {
        let x = DMatrix::new(Sparsity::diagonal(2), vec![1.0, 2.0]).unwrap();
        let y = DMatrix::dense(2, 2, vec![1.0, 1.0, 1.0, 1.0]).unwrap();
        let sum = &x + &y;
        assert_eq!(sum.sparsity(), &Sparsity::dense(2, 2));
        assert_eq!(sum.to_dense(), vec![2.0, 1.0, 1.0, 3.0]);
        let difference = x.clone() - y.clone();
        assert_eq!(difference.to_dense(), vec![0.0, -1.0, -1.0, 1.0]);
        assert_eq!((-x).nonzeros(), &[-1.0, -2.0]);
    }

    #[test]
    fn check_mismatched_subtraction_is_an_error() {
        let x = DMatrix::column(vec![1.0, 2.0]);
        let y = DMatrix::column(vec![1.0, 2.0, 3.0]);
        assert_eq!(
            x.checked_sub(&y),
            Err(MatrixError::ShapeMismatch {
                left: (2, 1),
                right: (3, 1)
            })
        );
    }

    #[test]
    #[should_panic]
    fn check_mismatched_addition_panics() {
        let _ = &DMatrix::column(vec![1.0]) + &DMatrix::column(vec![1.0, 2.0]);
    }

    #[test]
    fn check_prune_and_project() {
        let x = DMatrix::column(vec![0.0, 4.0, 0.0]);
        let pruned = x.prune_zeros();
        assert_eq!(pruned.nnz(), 1);
        assert_eq!(pruned.get(1, 0), 4.0);
        let projected = pruned.project(&Sparsity::dense(3, 1)).unwrap();
        assert_eq!(projected, x);
        assert!(x.project(&Sparsity::dense(1, 3)).is_err());
    }
}
