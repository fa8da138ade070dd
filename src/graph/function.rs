use crate::functions::{
    Argument, Function, FunctionError, Sensitivities, Symbolic, SymbolicFunction, from_nonzeros,
    nonzero_arguments,
};
use crate::graph::{MX, MXKind};
use crate::matrices::DMatrix;
use crate::numeric::extra::Real;
use crate::scalar::{SXElem, SXFunction, SXMatrix};
use crate::sparsity::Sparsity;

use log::{debug, trace};
use std::collections::HashMap;

/**
 * A function of matrix expressions.
 *
 * The nodes the outputs depend on are stored in topological order, starting with the
 * inputs, so evaluation is a single pass over them and differentiation in reverse is a
 * single pass back.
 *
 * ```
 * use easy_sens::functions::Function;
 * use easy_sens::graph::{MX, MXFunction};
 * use easy_sens::matrices::DMatrix;
 * use easy_sens::sparsity::Sparsity;
 * let x = MX::sym("x", Sparsity::dense(2, 1));
 * let f = MXFunction::new(vec![x.clone()], vec![x.index(&[1, 0]).diag()]).unwrap();
 * let y = f.evaluate(&[DMatrix::column(vec![1.0, 2.0])]).unwrap();
 * assert_eq!(y[0].nonzeros(), &[2.0, 1.0]);
 * ```
 */
#[derive(Clone, Debug)]
pub struct MXFunction {
    inputs: Vec<MX>,
    outputs: Vec<MX>,
    nodes: Vec<MX>,
    positions: HashMap<usize, usize>,
}

impl MXFunction {
    /**
     * Creates a function from purely symbolic inputs and outputs depending only on them.
     */
    pub fn new(inputs: Vec<MX>, outputs: Vec<MX>) -> Result<MXFunction, FunctionError> {
        let mut nodes = Vec::new();
        let mut positions = HashMap::new();
        for (index, input) in inputs.iter().enumerate() {
            if !input.is_symbolic() {
                return Err(FunctionError::NonSymbolicInput { index });
            }
            if positions.insert(input.id(), nodes.len()).is_some() {
                return Err(FunctionError::DuplicateInput {
                    index,
                    name: input.name().unwrap_or_default().to_string(),
                });
            }
            nodes.push(input.clone());
        }
        for output in &outputs {
            sort(output, &mut positions, &mut nodes)?;
        }
        debug!(
            "Sorted matrix function with {} inputs, {} outputs and {} nodes",
            inputs.len(),
            outputs.len(),
            nodes.len()
        );
        Ok(MXFunction {
            inputs,
            outputs,
            nodes,
            positions,
        })
    }

    pub fn inputs(&self) -> &[MX] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[MX] {
        &self.outputs
    }

    /**
     * The number of distinct nodes the outputs depend on, inputs included.
     */
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn position(&self, node: &MX) -> usize {
        self.positions[&node.id()]
    }

    fn input_patterns(&self) -> Vec<&Sparsity> {
        self.inputs.iter().map(MX::sparsity).collect()
    }

    fn output_patterns(&self) -> Vec<&Sparsity> {
        self.outputs.iter().map(MX::sparsity).collect()
    }

    /**
     * Evaluates every node on the nonzeros of the inputs, for any element type.
     */
    fn nonzero_values<T: Real>(&self, inputs: &[Vec<T>]) -> Vec<Vec<T>> {
        let mut work: Vec<Vec<T>> = Vec::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            let values = match node.kind() {
                // symbols only appear as the leading input nodes
                MXKind::Symbol { .. } => inputs[i].clone(),
                MXKind::Constant { value } => {
                    value.nonzeros().iter().map(|&x| T::from_f64(x)).collect()
                }
                MXKind::Unary { op, arg } => work[self.position(arg)]
                    .iter()
                    .map(|x| op.apply(x.clone()))
                    .collect(),
                MXKind::Binary { op, lhs, rhs } => work[self.position(lhs)]
                    .iter()
                    .zip(&work[self.position(rhs)])
                    .map(|(x, y)| op.apply(x.clone(), y.clone()))
                    .collect(),
                MXKind::GetNonzeros { arg, mapping } => {
                    let arg = &work[self.position(arg)];
                    mapping
                        .iter()
                        .map(|m| match m {
                            Some(k) => arg[*k].clone(),
                            None => T::zero(),
                        })
                        .collect()
                }
                MXKind::AddNonzeros { arg, mapping } => {
                    let mut values = vec![T::zero(); node.nnz()];
                    for (x, target) in work[self.position(arg)].iter().zip(mapping) {
                        if let Some(target) = *target {
                            values[target] = values[target].clone() + x.clone();
                        }
                    }
                    values
                }
            };
            work.push(values);
        }
        work
    }

    fn output_values<T: Clone>(&self, work: &[T]) -> Vec<T> {
        self.outputs
            .iter()
            .map(|output| work[self.position(output)].clone())
            .collect()
    }

    /**
     * Converts this function into an equivalent scalar function by evaluating every node
     * on scalar symbols. The scalar function has the same input and output patterns, and
     * its inputs take the names of the matrix inputs.
     */
    pub fn expand(&self) -> Result<SXFunction, FunctionError> {
        let inputs: Vec<SXMatrix> = self
            .inputs
            .iter()
            .map(|input| SXMatrix::sym(input.name().unwrap_or_default(), input.sparsity().clone()))
            .collect();
        let nonzeros: Vec<Vec<SXElem>> = inputs
            .iter()
            .map(|input| input.elements().to_vec())
            .collect();
        let work = self.nonzero_values(&nonzeros);
        let outputs = from_nonzeros::<SXMatrix>(self.output_values(&work), &self.output_patterns())?;
        debug!("Expanded matrix function with {} nodes", self.nodes.len());
        SXFunction::new(inputs, outputs)
    }

    /**
     * Evaluates the function on symbolic inputs with symbolic seeds, building new
     * expressions for the outputs and their forward and adjoint sensitivities.
     *
     * A sensitivity that is structurally zero is returned as a matrix of the right shape
     * with no structural nonzeros.
     */
    pub fn eval_mx(
        &self,
        inputs: &[MX],
        forward_seeds: &[Vec<MX>],
        adjoint_seeds: &[Vec<MX>],
    ) -> Result<Sensitivities<MX>, FunctionError> {
        let input_patterns = self.input_patterns();
        let output_patterns = self.output_patterns();
        let inputs = projected_arguments(Argument::Input, inputs, &input_patterns)?;
        let values = self.values(inputs);

        let outputs = self.output_values(&values);
        let forward = forward_seeds
            .iter()
            .map(|seeds| {
                let seeds = projected_arguments(Argument::ForwardSeed, seeds, &input_patterns)?;
                let tangents = self.tangents(&values, seeds);
                Ok(self
                    .outputs
                    .iter()
                    .map(|output| or_empty(tangents[self.position(output)].clone(), output))
                    .collect::<Vec<MX>>())
            })
            .collect::<Result<Vec<_>, FunctionError>>()?;
        let adjoint = adjoint_seeds
            .iter()
            .map(|seeds| {
                let seeds = projected_arguments(Argument::AdjointSeed, seeds, &output_patterns)?;
                Ok(self
                    .adjoints(&values, seeds)
                    .into_iter()
                    .zip(&self.inputs)
                    .map(|(adjoint, input)| or_empty(adjoint, input))
                    .collect::<Vec<MX>>())
            })
            .collect::<Result<Vec<_>, FunctionError>>()?;
        Ok(Sensitivities {
            outputs,
            forward,
            adjoint,
        })
    }

    /**
     * Rebuilds every node on new inputs. Nodes whose arguments did not change are reused.
     */
    fn values(&self, inputs: Vec<MX>) -> Vec<MX> {
        let mut values: Vec<MX> = Vec::with_capacity(self.nodes.len());
        let mut inputs = inputs.into_iter();
        for node in &self.nodes {
            let value = match node.kind() {
                MXKind::Symbol { .. } => match inputs.next() {
                    Some(input) => input,
                    None => node.clone(),
                },
                MXKind::Constant { .. } => node.clone(),
                MXKind::Unary { op, arg } => {
                    let x = &values[self.position(arg)];
                    if x.is_equal(arg) {
                        node.clone()
                    } else {
                        MX::unary(*op, x.clone())
                    }
                }
                MXKind::Binary { op, lhs, rhs } => {
                    let x = &values[self.position(lhs)];
                    let y = &values[self.position(rhs)];
                    if x.is_equal(lhs) && y.is_equal(rhs) {
                        node.clone()
                    } else {
                        MX::binary(*op, x.clone(), y.clone())
                    }
                }
                MXKind::GetNonzeros { arg, mapping } => {
                    let x = &values[self.position(arg)];
                    if x.is_equal(arg) {
                        node.clone()
                    } else {
                        MX::get_nonzeros(x.clone(), node.sparsity().clone(), mapping.clone())
                    }
                }
                MXKind::AddNonzeros { arg, mapping } => {
                    let x = &values[self.position(arg)];
                    if x.is_equal(arg) {
                        node.clone()
                    } else {
                        MX::add_nonzeros(x.clone(), node.sparsity().clone(), mapping.clone())
                    }
                }
            };
            values.push(value.project(node.sparsity()));
        }
        values
    }

    /**
     * Propagates one seed direction forwards, returning the tangent of every node on the
     * node's pattern, or `None` where it is zero.
     */
    fn tangents(&self, values: &[MX], seeds: Vec<MX>) -> Vec<Option<MX>> {
        trace!("Forward pass over {} nodes", self.nodes.len());
        let mut tangents: Vec<Option<MX>> = Vec::with_capacity(self.nodes.len());
        let mut seeds = seeds.into_iter();
        for (i, node) in self.nodes.iter().enumerate() {
            let tangent = match node.kind() {
                MXKind::Symbol { .. } => seeds.next(),
                MXKind::Constant { .. } => None,
                MXKind::Unary { op, arg } => {
                    let a = self.position(arg);
                    tangents[a].as_ref().map(|t| {
                        let derivative = op.derivative(&values[a], &values[i]);
                        chain(derivative, t, node.sparsity())
                    })
                }
                MXKind::Binary { op, lhs, rhs } => {
                    let (l, r) = (self.position(lhs), self.position(rhs));
                    let (d_lhs, d_rhs) = op.partials(&values[l], &values[r], &values[i]);
                    let from_lhs = tangents[l]
                        .as_ref()
                        .map(|t| chain(d_lhs, t, node.sparsity()));
                    let from_rhs = tangents[r]
                        .as_ref()
                        .map(|t| chain(d_rhs, t, node.sparsity()));
                    let mut sum = None;
                    accumulate(&mut sum, from_lhs);
                    accumulate(&mut sum, from_rhs);
                    sum
                }
                MXKind::GetNonzeros { arg, mapping } => tangents[self.position(arg)]
                    .as_ref()
                    .map(|t| MX::get_nonzeros(t.clone(), node.sparsity().clone(), mapping.clone())),
                MXKind::AddNonzeros { arg, mapping } => tangents[self.position(arg)]
                    .as_ref()
                    .map(|t| MX::add_nonzeros(t.clone(), node.sparsity().clone(), mapping.clone())),
            };
            tangents.push(tangent.filter(|t| !is_zero(t)));
        }
        tangents
    }

    /**
     * Propagates one seed direction backwards, returning the adjoint of every input, or
     * `None` where it is zero.
     */
    fn adjoints(&self, values: &[MX], seeds: Vec<MX>) -> Vec<Option<MX>> {
        trace!("Reverse pass over {} nodes", self.nodes.len());
        let mut adjoints: Vec<Option<MX>> = vec![None; self.nodes.len()];
        for (output, seed) in self.outputs.iter().zip(seeds) {
            let i = self.position(output);
            accumulate(&mut adjoints[i], Some(seed));
        }
        let mut sensitivities = vec![None; self.inputs.len()];
        for (i, node) in self.nodes.iter().enumerate().rev() {
            let Some(adjoint) = adjoints[i].take() else {
                continue;
            };
            match node.kind() {
                MXKind::Symbol { .. } => sensitivities[i] = Some(adjoint),
                MXKind::Constant { .. } => (),
                MXKind::Unary { op, arg } => {
                    let a = self.position(arg);
                    let derivative = op.derivative(&values[a], &values[i]);
                    let contribution = chain(derivative, &adjoint, arg.sparsity());
                    accumulate(&mut adjoints[a], Some(contribution));
                }
                MXKind::Binary { op, lhs, rhs } => {
                    let (l, r) = (self.position(lhs), self.position(rhs));
                    let (d_lhs, d_rhs) = op.partials(&values[l], &values[r], &values[i]);
                    let to_lhs = chain(d_lhs, &adjoint, lhs.sparsity());
                    let to_rhs = chain(d_rhs, &adjoint, rhs.sparsity());
                    accumulate(&mut adjoints[l], Some(to_lhs));
                    accumulate(&mut adjoints[r], Some(to_rhs));
                }
                MXKind::GetNonzeros { arg, mapping } => {
                    let contribution =
                        MX::add_nonzeros(adjoint, arg.sparsity().clone(), mapping.clone());
                    accumulate(&mut adjoints[self.position(arg)], Some(contribution));
                }
                MXKind::AddNonzeros { arg, mapping } => {
                    let contribution =
                        MX::get_nonzeros(adjoint, arg.sparsity().clone(), mapping.clone());
                    accumulate(&mut adjoints[self.position(arg)], Some(contribution));
                }
            }
        }
        sensitivities
    }
}

/**
 * Adds every node `root` depends on to `nodes` after its arguments, skipping nodes
 * already sorted.
 */
fn sort(
    root: &MX,
    positions: &mut HashMap<usize, usize>,
    nodes: &mut Vec<MX>,
) -> Result<(), FunctionError> {
    let mut stack: Vec<(MX, bool)> = vec![(root.clone(), false)];
    while let Some((node, arguments_sorted)) = stack.pop() {
        if positions.contains_key(&node.id()) {
            continue;
        }
        if let Some(name) = node.name() {
            return Err(FunctionError::FreeVariable {
                name: name.to_string(),
            });
        }
        let arguments = node.kind().arguments();
        if !arguments_sorted && !arguments.is_empty() {
            stack.push((node.clone(), true));
            for argument in arguments.into_iter().rev() {
                stack.push((argument.clone(), false));
            }
            continue;
        }
        positions.insert(node.id(), nodes.len());
        nodes.push(node);
    }
    Ok(())
}

/**
 * Multiplies a seed by a partial derivative and keeps the result on the pattern of the
 * node the seed is propagated to.
 */
fn chain(partial: MX, seed: &MX, sparsity: &Sparsity) -> MX {
    (partial * seed).project(sparsity)
}

fn is_zero(expression: &MX) -> bool {
    expression.nnz() == 0
        || expression
            .constant_value()
            .is_some_and(|value| value.nonzeros().iter().all(|&x| x == 0.0))
}

fn accumulate(sum: &mut Option<MX>, contribution: Option<MX>) {
    let Some(contribution) = contribution.filter(|c| !is_zero(c)) else {
        return;
    };
    *sum = Some(match sum.take() {
        Some(total) => total + contribution,
        None => contribution,
    });
}

fn or_empty(expression: Option<MX>, like: &MX) -> MX {
    match expression {
        Some(expression) => expression,
        None => MX::empty(like.shape().0, like.shape().1),
    }
}

fn projected_arguments(
    argument: Argument,
    given: &[MX],
    expected: &[&Sparsity],
) -> Result<Vec<MX>, FunctionError> {
    FunctionError::check_count(argument, expected.len(), given.len())?;
    given
        .iter()
        .zip(expected)
        .enumerate()
        .map(|(index, (expression, sparsity))| {
            FunctionError::check_shape(argument, index, sparsity, expression.sparsity())?;
            Ok(expression.project(sparsity))
        })
        .collect()
}

impl Function for MXFunction {
    fn n_in(&self) -> usize {
        self.inputs.len()
    }

    fn n_out(&self) -> usize {
        self.outputs.len()
    }

    fn sparsity_in(&self, i: usize) -> &Sparsity {
        self.inputs[i].sparsity()
    }

    fn sparsity_out(&self, i: usize) -> &Sparsity {
        self.outputs[i].sparsity()
    }

    fn evaluate(&self, inputs: &[DMatrix]) -> Result<Vec<DMatrix>, FunctionError> {
        let inputs = nonzero_arguments(Argument::Input, inputs, &self.input_patterns())?;
        let work = self.nonzero_values(&inputs);
        from_nonzeros(self.output_values(&work), &self.output_patterns())
    }
}

impl Symbolic for MX {
    fn sym(name: &str, sparsity: &Sparsity) -> MX {
        MX::sym(name, sparsity.clone())
    }

    fn sparsity(&self) -> &Sparsity {
        MX::sparsity(self)
    }
}

impl SymbolicFunction for MXFunction {
    type Expr = MX;

    fn from_expressions(inputs: Vec<MX>, outputs: Vec<MX>) -> Result<MXFunction, FunctionError> {
        MXFunction::new(inputs, outputs)
    }

    fn eval_symbolic(
        &self,
        inputs: &[MX],
        forward_seeds: &[Vec<MX>],
        adjoint_seeds: &[Vec<MX>],
    ) -> Result<Sensitivities<MX>, FunctionError> {
        self.eval_mx(inputs, forward_seeds, adjoint_seeds)
    }
}
