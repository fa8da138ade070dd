use crate::functions::{
    Argument, Function, FunctionError, NonzeroMatrix, Sensitivities, SymbolicFunction,
    from_nonzeros, nonzero_arguments,
};
use crate::matrices::DMatrix;
use crate::numeric::extra::Real;
use crate::ops::{BinaryOp, UnaryOp};
use crate::scalar::{SXElem, SXMatrix, SXNode};
use crate::sparsity::Sparsity;

use log::{debug, trace};
use std::collections::HashMap;

/**
 * One step of a compiled scalar function. The result of instruction `i` is stored in
 * slot `i` of the work vector and arguments refer to earlier slots.
 */
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    /// Reads nonzero `nonzero` of input `input`.
    Input { input: usize, nonzero: usize },
    Constant { value: f64 },
    Unary { op: UnaryOp, arg: usize },
    Binary { op: BinaryOp, lhs: usize, rhs: usize },
}

/**
 * A function of scalar expressions, compiled into a linear instruction tape.
 *
 * The tape starts with one [Instruction::Input] per input nonzero, followed by every
 * operation the outputs depend on in an order where arguments always come first. Shared
 * subexpressions are recorded once.
 *
 * ```
 * use easy_sens::functions::Function;
 * use easy_sens::matrices::DMatrix;
 * use easy_sens::scalar::{SXFunction, SXMatrix};
 * use easy_sens::sparsity::Sparsity;
 * let x = SXMatrix::sym("x", Sparsity::dense(2, 1));
 * let [a, b] = [x.elements()[0].clone(), x.elements()[1].clone()];
 * let y = SXMatrix::new(Sparsity::scalar(), vec![a.clone() * b + a]).unwrap();
 * let f = SXFunction::new(vec![x], vec![y]).unwrap();
 * let result = f.evaluate(&[DMatrix::column(vec![2.0, 3.0])]).unwrap();
 * assert_eq!(result[0].nonzeros(), &[8.0]);
 * ```
 */
#[derive(Clone, Debug)]
pub struct SXFunction {
    inputs: Vec<SXMatrix>,
    outputs: Vec<SXMatrix>,
    tape: Vec<Instruction>,
    output_slots: Vec<Vec<usize>>,
}

impl SXFunction {
    /**
     * Compiles a function from purely symbolic inputs and outputs depending only on them.
     */
    pub fn new(inputs: Vec<SXMatrix>, outputs: Vec<SXMatrix>) -> Result<SXFunction, FunctionError> {
        let mut slots: HashMap<usize, usize> = HashMap::new();
        let mut tape = Vec::new();
        for (index, input) in inputs.iter().enumerate() {
            if !input.is_symbolic() {
                return Err(FunctionError::NonSymbolicInput { index });
            }
            for (nonzero, element) in input.elements().iter().enumerate() {
                if slots.insert(element.id(), tape.len()).is_some() {
                    return Err(FunctionError::DuplicateInput {
                        index,
                        name: element.name().unwrap_or_default().to_string(),
                    });
                }
                tape.push(Instruction::Input {
                    input: index,
                    nonzero,
                });
            }
        }
        let output_slots = outputs
            .iter()
            .map(|output| {
                output
                    .elements()
                    .iter()
                    .map(|element| record(element, &mut slots, &mut tape))
                    .collect::<Result<Vec<usize>, FunctionError>>()
            })
            .collect::<Result<Vec<_>, FunctionError>>()?;
        debug!(
            "Compiled scalar function with {} inputs, {} outputs and {} instructions",
            inputs.len(),
            outputs.len(),
            tape.len()
        );
        Ok(SXFunction {
            inputs,
            outputs,
            tape,
            output_slots,
        })
    }

    /**
     * The compiled instructions.
     */
    pub fn instructions(&self) -> &[Instruction] {
        &self.tape
    }

    /**
     * The work vector slot holding each nonzero of each output.
     */
    pub fn output_slots(&self) -> &[Vec<usize>] {
        &self.output_slots
    }

    pub fn inputs(&self) -> &[SXMatrix] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[SXMatrix] {
        &self.outputs
    }

    /**
     * Evaluates the function on symbolic inputs with symbolic seeds.
     */
    pub fn eval_sx(
        &self,
        inputs: &[SXMatrix],
        forward_seeds: &[Vec<SXMatrix>],
        adjoint_seeds: &[Vec<SXMatrix>],
    ) -> Result<Sensitivities<SXMatrix>, FunctionError> {
        self.sensitivities(inputs, forward_seeds, adjoint_seeds)
    }

    /**
     * Evaluates the function and its forward and adjoint sensitivities numerically.
     */
    pub fn eval_sensitivities(
        &self,
        inputs: &[DMatrix],
        forward_seeds: &[Vec<DMatrix>],
        adjoint_seeds: &[Vec<DMatrix>],
    ) -> Result<Sensitivities<DMatrix>, FunctionError> {
        self.sensitivities(inputs, forward_seeds, adjoint_seeds)
    }

    fn input_patterns(&self) -> Vec<&Sparsity> {
        self.inputs.iter().map(SXMatrix::sparsity).collect()
    }

    fn output_patterns(&self) -> Vec<&Sparsity> {
        self.outputs.iter().map(SXMatrix::sparsity).collect()
    }

    fn sensitivities<M: NonzeroMatrix>(
        &self,
        inputs: &[M],
        forward_seeds: &[Vec<M>],
        adjoint_seeds: &[Vec<M>],
    ) -> Result<Sensitivities<M>, FunctionError> {
        let input_patterns = self.input_patterns();
        let output_patterns = self.output_patterns();
        let inputs = nonzero_arguments(Argument::Input, inputs, &input_patterns)?;
        let work = self.values(&inputs);

        let outputs = from_nonzeros::<M>(self.gather_outputs(&work), &output_patterns)?;
        let forward = forward_seeds
            .iter()
            .map(|seeds| {
                let seeds = nonzero_arguments(Argument::ForwardSeed, seeds, &input_patterns)?;
                let tangents = self.tangents(&work, &seeds);
                from_nonzeros::<M>(self.gather_outputs(&tangents), &output_patterns)
            })
            .collect::<Result<Vec<_>, FunctionError>>()?;
        let adjoint = adjoint_seeds
            .iter()
            .map(|seeds| {
                let seeds = nonzero_arguments(Argument::AdjointSeed, seeds, &output_patterns)?;
                from_nonzeros::<M>(self.adjoints(&work, &seeds), &input_patterns)
            })
            .collect::<Result<Vec<_>, FunctionError>>()?;
        Ok(Sensitivities {
            outputs,
            forward,
            adjoint,
        })
    }

    fn gather_outputs<T: Clone>(&self, work: &[T]) -> Vec<Vec<T>> {
        self.output_slots
            .iter()
            .map(|slots| slots.iter().map(|&slot| work[slot].clone()).collect())
            .collect()
    }

    /**
     * Runs the tape forwards, returning the value of every slot.
     */
    fn values<T: Real>(&self, inputs: &[Vec<T>]) -> Vec<T> {
        let mut work: Vec<T> = Vec::with_capacity(self.tape.len());
        for instruction in &self.tape {
            let value = match instruction {
                Instruction::Input { input, nonzero } => inputs[*input][*nonzero].clone(),
                Instruction::Constant { value } => T::from_f64(*value),
                Instruction::Unary { op, arg } => op.apply(work[*arg].clone()),
                Instruction::Binary { op, lhs, rhs } => {
                    op.apply(work[*lhs].clone(), work[*rhs].clone())
                }
            };
            work.push(value);
        }
        work
    }

    /**
     * Propagates one seed direction forwards through the tape, returning the tangent of
     * every slot.
     */
    fn tangents<T: Real>(&self, work: &[T], seeds: &[Vec<T>]) -> Vec<T> {
        trace!("Forward sweep over {} instructions", self.tape.len());
        let mut tangents: Vec<T> = Vec::with_capacity(self.tape.len());
        for (i, instruction) in self.tape.iter().enumerate() {
            let tangent = match instruction {
                Instruction::Input { input, nonzero } => seeds[*input][*nonzero].clone(),
                Instruction::Constant { .. } => T::zero(),
                Instruction::Unary { op, arg } => {
                    op.derivative(&work[*arg], &work[i]) * tangents[*arg].clone()
                }
                Instruction::Binary { op, lhs, rhs } => {
                    let (d_lhs, d_rhs) = op.partials(&work[*lhs], &work[*rhs], &work[i]);
                    d_lhs * tangents[*lhs].clone() + d_rhs * tangents[*rhs].clone()
                }
            };
            tangents.push(tangent);
        }
        tangents
    }

    /**
     * Propagates one seed direction backwards through the tape, returning the adjoint of
     * every input nonzero.
     */
    fn adjoints<T: Real>(&self, work: &[T], seeds: &[Vec<T>]) -> Vec<Vec<T>> {
        trace!("Reverse sweep over {} instructions", self.tape.len());
        let mut adjoints: Vec<T> = vec![T::zero(); self.tape.len()];
        for (slots, seed) in self.output_slots.iter().zip(seeds) {
            for (&slot, value) in slots.iter().zip(seed) {
                adjoints[slot] = adjoints[slot].clone() + value.clone();
            }
        }
        let mut sensitivities: Vec<Vec<T>> = self
            .inputs
            .iter()
            .map(|input| vec![T::zero(); input.nnz()])
            .collect();
        for (i, instruction) in self.tape.iter().enumerate().rev() {
            let adjoint = std::mem::replace(&mut adjoints[i], T::zero());
            match instruction {
                Instruction::Input { input, nonzero } => sensitivities[*input][*nonzero] = adjoint,
                Instruction::Constant { .. } => (),
                Instruction::Unary { op, arg } => {
                    let derivative = op.derivative(&work[*arg], &work[i]);
                    adjoints[*arg] = adjoints[*arg].clone() + derivative * adjoint;
                }
                Instruction::Binary { op, lhs, rhs } => {
                    let (d_lhs, d_rhs) = op.partials(&work[*lhs], &work[*rhs], &work[i]);
                    adjoints[*lhs] = adjoints[*lhs].clone() + d_lhs * adjoint.clone();
                    adjoints[*rhs] = adjoints[*rhs].clone() + d_rhs * adjoint;
                }
            }
        }
        sensitivities
    }
}

/**
 * Records an expression and everything it depends on onto the tape, returning the slot
 * holding its value.
 */
fn record(
    root: &SXElem,
    slots: &mut HashMap<usize, usize>,
    tape: &mut Vec<Instruction>,
) -> Result<usize, FunctionError> {
    let mut stack: Vec<(SXElem, bool)> = vec![(root.clone(), false)];
    while let Some((element, arguments_recorded)) = stack.pop() {
        if slots.contains_key(&element.id()) {
            continue;
        }
        let instruction = match element.node() {
            SXNode::Constant(value) => Instruction::Constant { value: *value },
            SXNode::Symbol { name } => {
                return Err(FunctionError::FreeVariable { name: name.clone() });
            }
            SXNode::Unary { op, arg } => {
                if !arguments_recorded {
                    stack.push((element.clone(), true));
                    stack.push((arg.clone(), false));
                    continue;
                }
                Instruction::Unary {
                    op: *op,
                    arg: slots[&arg.id()],
                }
            }
            SXNode::Binary { op, lhs, rhs } => {
                if !arguments_recorded {
                    stack.push((element.clone(), true));
                    stack.push((rhs.clone(), false));
                    stack.push((lhs.clone(), false));
                    continue;
                }
                Instruction::Binary {
                    op: *op,
                    lhs: slots[&lhs.id()],
                    rhs: slots[&rhs.id()],
                }
            }
        };
        slots.insert(element.id(), tape.len());
        tape.push(instruction);
    }
    Ok(slots[&root.id()])
}

impl Function for SXFunction {
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
        let work = self.values(&inputs);
        from_nonzeros(self.gather_outputs(&work), &self.output_patterns())
    }
}

impl SymbolicFunction for SXFunction {
    type Expr = SXMatrix;

    fn from_expressions(
        inputs: Vec<SXMatrix>,
        outputs: Vec<SXMatrix>,
    ) -> Result<SXFunction, FunctionError> {
        SXFunction::new(inputs, outputs)
    }

    fn eval_symbolic(
        &self,
        inputs: &[SXMatrix],
        forward_seeds: &[Vec<SXMatrix>],
        adjoint_seeds: &[Vec<SXMatrix>],
    ) -> Result<Sensitivities<SXMatrix>, FunctionError> {
        self.eval_sx(inputs, forward_seeds, adjoint_seeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_function() -> (SXFunction, SXElem, SXElem) {
        let x = SXMatrix::sym("x", Sparsity::dense(2, 1));
        let a = x.elements()[0].clone();
        let b = x.elements()[1].clone();
        let y = SXMatrix::new(Sparsity::scalar(), vec![a.clone() * b.clone()]).unwrap();
        (SXFunction::new(vec![x], vec![y]).unwrap(), a, b)
    }

    #[test]
    fn tape_records_shared_subexpressions_once() {
        let x = SXMatrix::sym("x", Sparsity::scalar());
        let a = x.elements()[0].clone();
        let shared = a.clone() * a.clone();
        let y = SXMatrix::new(Sparsity::dense(2, 1), vec![shared.clone(), shared]).unwrap();
        let f = SXFunction::new(vec![x], vec![y]).unwrap();
        assert_eq!(f.instructions().len(), 2);
        assert_eq!(f.output_slots(), &[vec![1, 1]]);
    }

    #[test]
    fn free_variables_are_rejected() {
        let x = SXMatrix::sym("x", Sparsity::scalar());
        let z = SXElem::sym("z");
        let y = SXMatrix::new(Sparsity::scalar(), vec![x.elements()[0].clone() + z]).unwrap();
        assert_eq!(
            SXFunction::new(vec![x], vec![y]).unwrap_err(),
            FunctionError::FreeVariable {
                name: "z".to_string()
            }
        );
    }

    #[test]
    fn duplicate_inputs_are_rejected() {
        let x = SXMatrix::sym("x", Sparsity::scalar());
        let result = SXFunction::new(vec![x.clone(), x], vec![]);
        assert!(matches!(
            result,
            Err(FunctionError::DuplicateInput { index: 1, .. })
        ));
    }

    #[test]
    fn symbolic_sensitivities_of_a_product() {
        let (f, a, b) = product_function();
        let seed = SXMatrix::sym("s", Sparsity::dense(2, 1));
        let adjoint_seed = SXMatrix::sym("w", Sparsity::scalar());
        let sensitivities = f
            .eval_sx(&[f.inputs()[0].clone()], &[vec![seed]], &[vec![adjoint_seed]])
            .unwrap();
        assert_eq!(sensitivities.outputs[0].to_string(), format!("({}*{})", a, b));
        assert_eq!(
            sensitivities.forward[0][0].to_string(),
            "((x_1*s_0)+(x_0*s_1))"
        );
        assert_eq!(sensitivities.adjoint[0][0].to_string(), "[(x_1*w), (x_0*w)]");
    }

    #[test]
    fn numeric_sensitivities_of_a_product() {
        let (f, _, _) = product_function();
        let x = DMatrix::column(vec![3.0, 5.0]);
        let sensitivities = f
            .eval_sensitivities(
                &[x],
                &[vec![DMatrix::column(vec![1.0, 0.0])]],
                &[vec![DMatrix::scalar(2.0)]],
            )
            .unwrap();
        assert_eq!(sensitivities.outputs[0].nonzeros(), &[15.0]);
        assert_eq!(sensitivities.forward[0][0].nonzeros(), &[5.0]);
        assert_eq!(sensitivities.adjoint[0][0].nonzeros(), &[10.0, 6.0]);
    }

    #[test]
    fn evaluate_checks_shapes() {
        let (f, _, _) = product_function();
        let error = f.evaluate(&[DMatrix::column(vec![1.0])]).unwrap_err();
        assert_eq!(
            error,
            FunctionError::ShapeMismatch {
                argument: Argument::Input,
                index: 0,
                expected: (2, 1),
                actual: (1, 1),
            }
        );
    }
}
