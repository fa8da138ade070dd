extern crate easy_sens;

#[cfg(test)]
mod tests {
    use easy_sens::consistency::{
        ConsistencyError, check_second_order_consistency, compare_outputs, second_order_outputs,
    };
    use easy_sens::functions::Function;
    use easy_sens::graph::{MX, MXFunction};
    use easy_sens::matrices::DMatrix;
    use easy_sens::numeric::extra::{Cos, Exp, Ln, Sin, Sqrt};
    use easy_sens::sparsity::Sparsity;

    fn swapped_diagonal() -> MXFunction {
        let x = MX::sym("x", Sparsity::dense(2, 1));
        let y = x.index(&[1, 0]).diag();
        MXFunction::new(vec![x], vec![y]).unwrap()
    }

    #[test]
    fn test_swapped_diagonal_is_consistent() {
        let _ = env_logger::builder().is_test(true).try_init();
        let f = swapped_diagonal();
        assert_eq!(check_second_order_consistency(&f), Ok(()));
    }

    #[test]
    fn test_second_order_wrapper_size() {
        let f = swapped_diagonal();
        let (outputs, reference) = second_order_outputs(&f, None).unwrap();
        // the first order wrapper takes the input and both seeds and returns the output
        // and both sensitivities
        assert_eq!(reference.inputs.len(), 3);
        assert_eq!(reference.outputs.len(), 3);
        assert_eq!(
            reference.outputs,
            vec![
                Sparsity::diagonal(2),
                Sparsity::diagonal(2),
                Sparsity::dense(2, 1)
            ]
        );
        // and the second order wrapper does the same for three inputs and three outputs
        assert_eq!(outputs.len(), 9);
        // the first output is diag(i[[1, 0]]) with i numbered from 0
        assert_eq!(outputs[0].to_string(), "[[1, 00], [00, 0]]");
    }

    #[test]
    fn test_representations_agree_numerically() {
        let f = swapped_diagonal();
        let (graph, reference) = second_order_outputs(&f, None).unwrap();
        let (scalar, _) = second_order_outputs(&f.expand().unwrap(), Some(&reference)).unwrap();
        assert_eq!(graph.len(), scalar.len());
        for (a, b) in graph.iter().zip(&scalar) {
            assert_eq!(a.to_dense(), b.to_dense());
        }
    }

    #[test]
    fn test_polynomials_are_consistent() {
        let _ = env_logger::builder().is_test(true).try_init();
        let x = MX::sym("x", Sparsity::dense(2, 1));
        let y = MX::sym("y", Sparsity::diagonal(2));
        let product = (&x * &x.index(&[1, 0])).diag();
        let mixed = &product * &y - y.sq() + MX::scalar(3.0);
        let f = MXFunction::new(vec![x.clone(), y], vec![product, mixed, x.transpose()]).unwrap();
        assert_eq!(check_second_order_consistency(&f), Ok(()));
    }

    #[test]
    fn test_cubic_is_consistent() {
        let x = MX::sym("x", Sparsity::dense(3, 1));
        let cube = &x * &x.sq();
        let f = MXFunction::new(vec![x.clone()], vec![cube - &x]).unwrap();
        assert_eq!(check_second_order_consistency(&f), Ok(()));
        assert_eq!(f.n_out(), 1);
    }

    #[test]
    fn test_different_functions_are_reported() {
        let x = MX::sym("x", Sparsity::dense(2, 1));
        let double = MXFunction::new(vec![x.clone()], vec![&x * MX::scalar(2.0)]).unwrap();
        let triple = MXFunction::new(vec![x.clone()], vec![&x * MX::scalar(3.0)]).unwrap();
        let (a, _) = second_order_outputs(&double, None).unwrap();
        let (b, _) = second_order_outputs(&triple, None).unwrap();
        let error = compare_outputs(&a, &b).unwrap_err();
        assert_eq!(error.index, 0);
        assert_eq!(error.to_string(), "At output(0) : [0, 2] <-> [0, 3]");
        let wrapped = ConsistencyError::from(error);
        assert!(matches!(wrapped, ConsistencyError::Mismatch(_)));
    }

    #[test]
    fn test_shape_mismatch_is_a_difference() {
        let a = vec![DMatrix::column(vec![1.0, 2.0])];
        let b = vec![DMatrix::column(vec![1.0, 2.0, 0.0])];
        assert!(compare_outputs(&a, &b).is_err());
    }

    fn assert_consistent(name: &str, build: impl Fn(&MX) -> MX) {
        let x = MX::sym("x", Sparsity::dense(2, 1));
        let f = MXFunction::new(vec![x.clone()], vec![build(&x)]).unwrap();
        assert_eq!(check_second_order_consistency(&f), Ok(()), "{}", name);
    }

    #[test]
    fn test_elementary_functions_are_consistent() {
        assert_consistent("exp", |x| x.exp());
        assert_consistent("sin", |x| x.sin());
        assert_consistent("cos", |x| x.cos());
        assert_consistent("ln", |x| (x + MX::scalar(1.0)).ln());
        assert_consistent("sqrt", |x| (x + MX::scalar(1.0)).sqrt());
        assert_consistent("reciprocal", |x| MX::scalar(1.0) / (x + MX::scalar(1.0)));
    }

    #[test]
    fn test_functions_filling_structural_zeros_are_consistent() {
        // cos(0) is 1 so the diagonal input gives a dense output
        let y = MX::sym("y", Sparsity::diagonal(2));
        let f = MXFunction::new(vec![y.clone()], vec![y.cos()]).unwrap();
        assert_eq!(f.sparsity_out(0), &Sparsity::dense(2, 2));
        assert_eq!(check_second_order_consistency(&f), Ok(()));
    }
}
