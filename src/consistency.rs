/*!
 * A regression check that second-order sensitivities agree between the two symbolic
 * representations.
 *
 * Given a function in the [graph](crate::graph) representation, the check
 *
 * 1. evaluates it on fresh symbols with one symbolic forward seed per input and one
 *    symbolic adjoint seed per output,
 * 2. wraps the inputs and seeds into a new function returning the outputs and both
 *    sensitivities,
 * 3. repeats the same two steps on that wrapper, obtaining second-order sensitivities,
 * 4. evaluates the resulting function numerically with consecutive integer inputs,
 *
 * once for the graph function and once for its [expansion](crate::graph::MXFunction::expand)
 * into the [scalar](crate::scalar) representation, then compares the two lists of outputs.
 *
 * Both representations must see the same second-level seeds, so the scalar run takes the
 * patterns of its second-level symbols from the graph run's first-level wrapper.
 *
 * ```
 * use easy_sens::consistency::check_second_order_consistency;
 * use easy_sens::graph::{MX, MXFunction};
 * use easy_sens::sparsity::Sparsity;
 * let x = MX::sym("x", Sparsity::dense(2, 1));
 * let f = MXFunction::new(vec![x.clone()], vec![x.index(&[1, 0]).diag()]).unwrap();
 * assert!(check_second_order_consistency(&f).is_ok());
 * ```
 */

use crate::functions::{Function, FunctionError, Signature, Symbolic, SymbolicFunction};
use crate::graph::MXFunction;
use crate::matrices::DMatrix;
use crate::sparsity::Sparsity;

use log::{debug, info, trace, warn};
use std::error::Error;
use std::fmt;

/**
 * Concatenates lists, keeping their order and any repeats.
 */
pub fn flatten<T>(lists: Vec<Vec<T>>) -> Vec<T> {
    lists.into_iter().flatten().collect()
}

/**
 * Evaluates a function and its sensitivities on fresh symbols and wraps everything into a
 * new function taking the inputs, forward seeds and adjoint seeds and returning the
 * outputs, forward sensitivities and adjoint sensitivities in that order.
 *
 * `patterns` gives the sparsity of the symbols to create. When `None`, the function's own
 * patterns are used.
 */
fn differentiate_once<F: SymbolicFunction>(
    f: &F,
    patterns: Option<&Signature>,
) -> Result<F, FunctionError> {
    let own = f.signature();
    let patterns = patterns.unwrap_or(&own);
    let symbols = |name: &str, sparsities: &[Sparsity]| -> Vec<F::Expr> {
        sparsities
            .iter()
            .map(|sparsity| <F::Expr as Symbolic>::sym(name, sparsity))
            .collect()
    };
    let inputs = symbols("i", &patterns.inputs);
    let forward_seeds = vec![symbols("f", &patterns.inputs)];
    let adjoint_seeds = vec![symbols("a", &patterns.outputs)];
    let sensitivities = f.eval_symbolic(&inputs, &forward_seeds, &adjoint_seeds)?;
    F::from_expressions(
        flatten(vec![inputs, flatten(forward_seeds), flatten(adjoint_seeds)]),
        flatten(vec![
            sensitivities.outputs,
            flatten(sensitivities.forward),
            flatten(sensitivities.adjoint),
        ]),
    )
}

/**
 * Builds the second-order wrapper of a function and evaluates it on
 * [numbered inputs](numbered_inputs).
 *
 * The second-level symbols take their patterns from `reference` if given, otherwise from
 * the first-level wrapper itself. Returns the numeric outputs together with the
 * signature of the first-level wrapper, for use as the reference of another run.
 */
pub fn second_order_outputs<F: SymbolicFunction>(
    f: &F,
    reference: Option<&Signature>,
) -> Result<(Vec<DMatrix>, Signature), FunctionError> {
    let first = differentiate_once(f, None)?;
    debug!(
        "First-order wrapper has {} inputs and {} outputs",
        first.n_in(),
        first.n_out()
    );
    let second = differentiate_once(&first, reference)?;
    debug!(
        "Second-order wrapper has {} inputs and {} outputs",
        second.n_in(),
        second.n_out()
    );
    let outputs = second.evaluate(&numbered_inputs(&second))?;
    Ok((outputs, first.signature()))
}

/**
 * Numeric inputs for a function where the nonzeros of every input count up from where
 * the previous input stopped, starting at 0.
 */
pub fn numbered_inputs<F: Function>(f: &F) -> Vec<DMatrix> {
    let mut offset = 0;
    (0..f.n_in())
        .map(|i| {
            let sparsity = f.sparsity_in(i).clone();
            let values = (offset..offset + sparsity.nnz()).map(|v| v as f64).collect();
            offset += sparsity.nnz();
            DMatrix::from_parts(sparsity, values)
        })
        .collect()
}

/**
 * Compares two lists of outputs pairwise, failing on the first pair that differs.
 *
 * A pair is skipped if one side has no elements at all and the other has no nonzero
 * values. Otherwise the pair agrees only if their difference has no nonzero values, so
 * the comparison is exact and ignores where the structural zeros are.
 */
pub fn compare_outputs(expected: &[DMatrix], actual: &[DMatrix]) -> Result<(), MismatchError> {
    if expected.len() != actual.len() {
        warn!(
            "Comparing {} outputs with {} outputs, the extra outputs are ignored",
            expected.len(),
            actual.len()
        );
    }
    for (index, (a, b)) in expected.iter().zip(actual).enumerate() {
        if b.numel() == 0 && a.prune_zeros().nnz() == 0 {
            continue;
        }
        if a.numel() == 0 && b.prune_zeros().nnz() == 0 {
            continue;
        }
        let agrees = match a.checked_sub(b) {
            Ok(difference) => difference.prune_zeros().nnz() == 0,
            Err(_) => false,
        };
        if !agrees {
            return Err(MismatchError {
                index,
                expected: a.clone(),
                actual: b.clone(),
            });
        }
        trace!("Output {} agrees", index);
    }
    Ok(())
}

/**
 * Checks that the second-order sensitivities of a function are identical whether
 * computed on its expression graph or on its expansion into scalar expressions.
 */
pub fn check_second_order_consistency(f: &MXFunction) -> Result<(), ConsistencyError> {
    info!("Computing second-order sensitivities on the expression graph");
    let (graph_outputs, reference) = second_order_outputs(f, None)?;
    info!("Computing second-order sensitivities on the scalar expansion");
    let expanded = f.expand()?;
    let (scalar_outputs, _) = second_order_outputs(&expanded, Some(&reference))?;
    compare_outputs(&graph_outputs, &scalar_outputs)?;
    info!("All {} second-order outputs agree", graph_outputs.len());
    Ok(())
}

/**
 * An output of the second-order wrapper differs between the two representations.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct MismatchError {
    /// The position of the output in the wrapper's output list.
    pub index: usize,
    /// The value through the expression graph.
    pub expected: DMatrix,
    /// The value through the scalar expansion.
    pub actual: DMatrix,
}

impl Error for MismatchError {}

impl fmt::Display for MismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "At output({}) : {} <-> {}",
            self.index, self.expected, self.actual
        )
    }
}

/**
 * An error from running the consistency check.
 */
#[derive(Clone, Debug, PartialEq)]
pub enum ConsistencyError {
    /// The functions could not be built or evaluated.
    Function(FunctionError),
    /// The two representations disagree.
    Mismatch(MismatchError),
}

impl Error for ConsistencyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConsistencyError::Function(error) => Some(error),
            ConsistencyError::Mismatch(error) => Some(error),
        }
    }
}

impl fmt::Display for ConsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyError::Function(error) => write!(f, "{}", error),
            ConsistencyError::Mismatch(error) => write!(f, "{}", error),
        }
    }
}

impl From<FunctionError> for ConsistencyError {
    fn from(error: FunctionError) -> ConsistencyError {
        ConsistencyError::Function(error)
    }
}

impl From<MismatchError> for ConsistencyError {
    fn from(error: MismatchError) -> ConsistencyError {
        ConsistencyError::Mismatch(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MX;

    #[test]
    fn flatten_keeps_order_and_repeats() {
        assert_eq!(flatten(vec![vec![1, 2], vec![], vec![2, 3]]), vec![1, 2, 2, 3]);
    }

    #[test]
    fn empty_sides_are_skipped() {
        let empty = DMatrix::zeros(Sparsity::empty(0, 0));
        let zeros = DMatrix::zeros(Sparsity::dense(2, 1));
        assert!(compare_outputs(&[zeros.clone()], &[empty.clone()]).is_ok());
        assert!(compare_outputs(&[empty], &[zeros]).is_ok());
    }

    #[test]
    fn structural_and_numeric_zeros_agree() {
        let numeric = DMatrix::new(Sparsity::diagonal(2), vec![1.0, 0.0]).unwrap();
        let structural = DMatrix::new(
            Sparsity::from_triplets(2, 2, &[(0, 0)]).unwrap(),
            vec![1.0],
        )
        .unwrap();
        assert!(compare_outputs(&[numeric], &[structural]).is_ok());
    }

    #[test]
    fn first_difference_is_reported() {
        let a = vec![DMatrix::scalar(1.0), DMatrix::scalar(2.0), DMatrix::scalar(3.0)];
        let b = vec![DMatrix::scalar(1.0), DMatrix::scalar(5.0), DMatrix::scalar(4.0)];
        let error = compare_outputs(&a, &b).unwrap_err();
        assert_eq!(error.index, 1);
        assert_eq!(error.to_string(), "At output(1) : 2 <-> 5");
    }

    #[test]
    fn inputs_are_numbered_across_inputs() {
        let x = MX::sym("x", Sparsity::dense(2, 1));
        let y = MX::sym("y", Sparsity::diagonal(2));
        let f = MXFunction::new(vec![x, y], vec![]).unwrap();
        let inputs = numbered_inputs(&f);
        assert_eq!(inputs[0].nonzeros(), &[0.0, 1.0]);
        assert_eq!(inputs[1].nonzeros(), &[2.0, 3.0]);
        assert_eq!(inputs[1].sparsity(), &Sparsity::diagonal(2));
    }
}
