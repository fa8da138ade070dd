/*!
 * The interface shared by functions of both symbolic representations.
 *
 * A function maps a fixed list of matrix inputs to a fixed list of matrix outputs, each
 * with a known [Sparsity]. Every function can be evaluated numerically through the
 * [Function] trait. Functions built from symbolic expressions additionally implement
 * [SymbolicFunction], which evaluates them on symbolic arguments together with forward
 * and adjoint seeds to obtain their sensitivities as new expressions.
 */

use crate::matrices::DMatrix;
use crate::matrices::errors::MatrixError;
use crate::numeric::extra::Real;
use crate::scalar::{SXElem, SXMatrix};
use crate::sparsity::Sparsity;

use std::error::Error;
use std::fmt;

/**
 * The input and output sparsity patterns of a function.
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub inputs: Vec<Sparsity>,
    pub outputs: Vec<Sparsity>,
}

/**
 * The result of a symbolic evaluation with seeds.
 *
 * `forward[d][i]` is the forward sensitivity of output `i` in seed direction `d` and
 * `adjoint[d][j]` the adjoint sensitivity of input `j` in seed direction `d`.
 */
#[derive(Clone, Debug)]
pub struct Sensitivities<M> {
    pub outputs: Vec<M>,
    pub forward: Vec<Vec<M>>,
    pub adjoint: Vec<Vec<M>>,
}

/**
 * A function that can be introspected and evaluated on numeric matrices.
 */
pub trait Function {
    /** The number of inputs. */
    fn n_in(&self) -> usize;

    /** The number of outputs. */
    fn n_out(&self) -> usize;

    /** The pattern of input `i`. */
    fn sparsity_in(&self, i: usize) -> &Sparsity;

    /** The pattern of output `i`. */
    fn sparsity_out(&self, i: usize) -> &Sparsity;

    /**
     * Evaluates the function. Each input must have the shape of the corresponding
     * function input and is projected onto its pattern.
     */
    fn evaluate(&self, inputs: &[DMatrix]) -> Result<Vec<DMatrix>, FunctionError>;

    fn signature(&self) -> Signature {
        Signature {
            inputs: (0..self.n_in()).map(|i| self.sparsity_in(i).clone()).collect(),
            outputs: (0..self.n_out())
                .map(|i| self.sparsity_out(i).clone())
                .collect(),
        }
    }
}

/**
 * A symbolic matrix expression that can stand for a named unknown.
 */
pub trait Symbolic: Clone + fmt::Display {
    /**
     * Creates a fresh symbolic matrix with the given pattern.
     */
    fn sym(name: &str, sparsity: &Sparsity) -> Self;

    fn sparsity(&self) -> &Sparsity;
}

/**
 * A function built from symbolic expressions that can be evaluated symbolically together
 * with seeds for its forward and adjoint sensitivities.
 */
pub trait SymbolicFunction: Function + Sized {
    type Expr: Symbolic;

    /**
     * Creates a function from purely symbolic inputs and outputs depending only on them.
     */
    fn from_expressions(
        inputs: Vec<Self::Expr>,
        outputs: Vec<Self::Expr>,
    ) -> Result<Self, FunctionError>;

    /**
     * Evaluates the function on symbolic inputs, returning its outputs, one set of
     * forward sensitivities per list of `forward_seeds` (one seed per input) and one set
     * of adjoint sensitivities per list of `adjoint_seeds` (one seed per output).
     */
    fn eval_symbolic(
        &self,
        inputs: &[Self::Expr],
        forward_seeds: &[Vec<Self::Expr>],
        adjoint_seeds: &[Vec<Self::Expr>],
    ) -> Result<Sensitivities<Self::Expr>, FunctionError>;
}

/**
 * Which list of arguments an error refers to.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Argument {
    Input,
    ForwardSeed,
    AdjointSeed,
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Input => write!(f, "input"),
            Argument::ForwardSeed => write!(f, "forward seed"),
            Argument::AdjointSeed => write!(f, "adjoint seed"),
        }
    }
}

/**
 * An error indicating a function could not be created or evaluated.
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FunctionError {
    /// A function input is not a purely symbolic matrix.
    NonSymbolicInput { index: usize },
    /// The same symbol appears more than once among the function inputs.
    DuplicateInput { index: usize, name: String },
    /// An output depends on a symbol that is not among the function inputs.
    FreeVariable { name: String },
    /// The wrong number of arguments was given.
    ArgumentCount {
        argument: Argument,
        expected: usize,
        actual: usize,
    },
    /// An argument does not have the shape of the function input or output it seeds.
    ShapeMismatch {
        argument: Argument,
        index: usize,
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// A matrix could not be built from the evaluation results.
    Matrix(MatrixError),
}

impl FunctionError {
    pub(crate) fn check_count(
        argument: Argument,
        expected: usize,
        actual: usize,
    ) -> Result<(), FunctionError> {
        if expected == actual {
            Ok(())
        } else {
            Err(FunctionError::ArgumentCount {
                argument,
                expected,
                actual,
            })
        }
    }

    pub(crate) fn check_shape(
        argument: Argument,
        index: usize,
        expected: &Sparsity,
        actual: &Sparsity,
    ) -> Result<(), FunctionError> {
        if expected.shape() == actual.shape() {
            Ok(())
        } else {
            Err(FunctionError::ShapeMismatch {
                argument,
                index,
                expected: expected.shape(),
                actual: actual.shape(),
            })
        }
    }
}

impl Error for FunctionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FunctionError::Matrix(error) => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for FunctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionError::NonSymbolicInput { index } => {
                write!(f, "Function input {} is not purely symbolic", index)
            }
            FunctionError::DuplicateInput { index, name } => write!(
                f,
                "Function input {} repeats the symbol {} of an earlier input",
                index, name
            ),
            FunctionError::FreeVariable { name } => write!(
                f,
                "Function outputs depend on {} which is not a function input",
                name
            ),
            FunctionError::ArgumentCount {
                argument,
                expected,
                actual,
            } => write!(
                f,
                "Expected {} {} arguments but got {}",
                expected, argument, actual
            ),
            FunctionError::ShapeMismatch {
                argument,
                index,
                expected,
                actual,
            } => write!(
                f,
                "{} {} should be {}x{} but is {}x{}",
                argument, index, expected.0, expected.1, actual.0, actual.1
            ),
            FunctionError::Matrix(error) => write!(f, "{}", error),
        }
    }
}

impl From<MatrixError> for FunctionError {
    fn from(error: MatrixError) -> FunctionError {
        FunctionError::Matrix(error)
    }
}

/**
 * A matrix type that stores one [Real] element per structural nonzero, which lets the
 * evaluation routines work on plain nonzero vectors for numeric and symbolic arguments
 * alike.
 */
pub(crate) trait NonzeroMatrix: Sized {
    type Element: Real;

    fn pattern(&self) -> &Sparsity;

    fn project_onto(&self, sparsity: &Sparsity) -> Result<Self, MatrixError>;

    fn into_values(self) -> Vec<Self::Element>;

    fn from_values(sparsity: Sparsity, values: Vec<Self::Element>) -> Result<Self, MatrixError>;
}

impl NonzeroMatrix for DMatrix {
    type Element = f64;

    fn pattern(&self) -> &Sparsity {
        self.sparsity()
    }

    fn project_onto(&self, sparsity: &Sparsity) -> Result<Self, MatrixError> {
        self.project(sparsity)
    }

    fn into_values(self) -> Vec<f64> {
        self.into_nonzeros()
    }

    fn from_values(sparsity: Sparsity, values: Vec<f64>) -> Result<Self, MatrixError> {
        DMatrix::new(sparsity, values)
    }
}

impl NonzeroMatrix for SXMatrix {
    type Element = SXElem;

    fn pattern(&self) -> &Sparsity {
        self.sparsity()
    }

    fn project_onto(&self, sparsity: &Sparsity) -> Result<Self, MatrixError> {
        self.project(sparsity)
    }

    fn into_values(self) -> Vec<SXElem> {
        self.into_elements()
    }

    fn from_values(sparsity: Sparsity, values: Vec<SXElem>) -> Result<Self, MatrixError> {
        SXMatrix::new(sparsity, values)
    }
}

/**
 * Checks a list of arguments against the patterns they stand for and returns their
 * nonzeros projected onto those patterns.
 */
pub(crate) fn nonzero_arguments<M: NonzeroMatrix>(
    argument: Argument,
    given: &[M],
    expected: &[&Sparsity],
) -> Result<Vec<Vec<M::Element>>, FunctionError> {
    FunctionError::check_count(argument, expected.len(), given.len())?;
    given
        .iter()
        .zip(expected)
        .enumerate()
        .map(|(index, (matrix, sparsity))| {
            FunctionError::check_shape(argument, index, sparsity, matrix.pattern())?;
            Ok(matrix.project_onto(sparsity)?.into_values())
        })
        .collect()
}

/**
 * Wraps lists of nonzeros back into matrices with the given patterns.
 */
pub(crate) fn from_nonzeros<M: NonzeroMatrix>(
    values: Vec<Vec<M::Element>>,
    patterns: &[&Sparsity],
) -> Result<Vec<M>, FunctionError> {
    values
        .into_iter()
        .zip(patterns)
        .map(|(values, sparsity)| Ok(M::from_values((*sparsity).clone(), values)?))
        .collect()
}
