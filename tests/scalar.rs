extern crate easy_sens;

#[cfg(test)]
mod tests {
    use easy_sens::functions::{Argument, Function, FunctionError, SymbolicFunction};
    use easy_sens::matrices::DMatrix;
    use easy_sens::numeric::extra::{Exp, Sin};
    use easy_sens::scalar::{Instruction, SXElem, SXFunction, SXMatrix};
    use easy_sens::sparsity::Sparsity;

    // f(x) = [x0 * x1 + x0^2, x1 - 3]
    fn polynomial() -> SXFunction {
        let x = SXMatrix::sym("x", Sparsity::dense(2, 1));
        let x0 = x.elements()[0].clone();
        let x1 = x.elements()[1].clone();
        let y = SXMatrix::new(
            Sparsity::dense(2, 1),
            vec![
                x0.clone() * x1.clone() + x0.clone() * x0,
                x1 - SXElem::constant(3.0),
            ],
        )
        .unwrap();
        SXFunction::new(vec![x], vec![y]).unwrap()
    }

    #[test]
    fn test_simplification() {
        let x = SXElem::sym("x");
        let zero = SXElem::constant(0.0);
        let one = SXElem::constant(1.0);
        assert!((x.clone() + zero.clone()).is_equal(&x));
        assert!((zero.clone() - x.clone()).to_string() == "(-x)");
        assert!((x.clone() * zero.clone()).is_zero());
        assert!((zero / x.clone()).is_zero());
        assert!((x.clone() / one).is_equal(&x));
        assert_eq!((x * SXElem::constant(-1.0)).to_string(), "(-x)");
    }

    #[test]
    fn test_evaluate() {
        let f = polynomial();
        let y = f.evaluate(&[DMatrix::column(vec![2.0, 5.0])]).unwrap();
        assert_eq!(y[0].nonzeros(), &[14.0, 2.0]);
    }

    #[test]
    fn test_numeric_sensitivities() {
        let f = polynomial();
        let x = DMatrix::column(vec![2.0, 5.0]);
        // the jacobian is [[x1 + 2 x0, x0], [0, 1]] = [[9, 2], [0, 1]]
        let sensitivities = f
            .eval_sensitivities(
                &[x],
                &[
                    vec![DMatrix::column(vec![1.0, 0.0])],
                    vec![DMatrix::column(vec![0.0, 1.0])],
                ],
                &[vec![DMatrix::column(vec![1.0, 1.0])]],
            )
            .unwrap();
        assert_eq!(sensitivities.forward[0][0].nonzeros(), &[9.0, 0.0]);
        assert_eq!(sensitivities.forward[1][0].nonzeros(), &[2.0, 1.0]);
        assert_eq!(sensitivities.adjoint[0][0].nonzeros(), &[9.0, 3.0]);
    }

    #[test]
    fn test_seeds_are_projected() {
        let f = polynomial();
        let x = DMatrix::column(vec![2.0, 5.0]);
        // a seed with only its second entry stored
        let seed = DMatrix::new(
            Sparsity::from_triplets(2, 1, &[(1, 0)]).unwrap(),
            vec![1.0],
        )
        .unwrap();
        let sensitivities = f.eval_sensitivities(&[x], &[vec![seed]], &[]).unwrap();
        assert_eq!(sensitivities.forward[0][0].nonzeros(), &[2.0, 1.0]);
    }

    #[test]
    fn test_wrong_number_of_seeds() {
        let f = polynomial();
        let x = SXMatrix::sym("i", Sparsity::dense(2, 1));
        let result = f.eval_symbolic(&[x], &[vec![]], &[]);
        assert_eq!(
            result.unwrap_err(),
            FunctionError::ArgumentCount {
                argument: Argument::ForwardSeed,
                expected: 1,
                actual: 0,
            }
        );
    }

    #[test]
    fn test_elementary_derivatives() {
        // d/dx sin(x) * exp(x) = (cos(x) + sin(x)) exp(x)
        let x = SXMatrix::sym("x", Sparsity::scalar());
        let y = x.map(|x| x.clone().sin() * x.clone().exp());
        let f = SXFunction::new(vec![x], vec![y]).unwrap();
        let at = 0.7_f64;
        let sensitivities = f
            .eval_sensitivities(&[DMatrix::scalar(at)], &[vec![DMatrix::scalar(1.0)]], &[])
            .unwrap();
        let expected = (at.cos() + at.sin()) * at.exp();
        assert!((sensitivities.forward[0][0].nonzeros()[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_tape_layout() {
        let f = polynomial();
        let tape = f.instructions();
        assert_eq!(tape[0], Instruction::Input { input: 0, nonzero: 0 });
        assert_eq!(tape[1], Instruction::Input { input: 0, nonzero: 1 });
        assert!(tape.contains(&Instruction::Constant { value: 3.0 }));
        assert_eq!(f.signature().inputs, vec![Sparsity::dense(2, 1)]);
    }

    #[test]
    fn test_constant_matrices_convert_back() {
        let values = DMatrix::new(Sparsity::diagonal(2), vec![1.5, -2.0]).unwrap();
        let constant = SXMatrix::from_dmatrix(&values);
        assert!(!constant.sparsity().is_vector());
        assert_eq!(constant.to_dmatrix(), Some(values));
        let x = SXMatrix::sym("x", Sparsity::dense(2, 1));
        assert!(x.sparsity().is_vector());
        assert_eq!(x.to_dmatrix(), None);
        let doubled = x.map(|e| e.clone() + e.clone());
        assert_eq!(doubled.elements()[1].to_string(), "(x_1+x_1)");
    }
}
