/*!
 * The expression-graph representation.
 *
 * Every [MX] is a node in a directed acyclic graph of matrix valued operations, and each
 * node carries its own [Sparsity]. Nodes are shared through reference counting, so a
 * subexpression used several times is stored and evaluated once. Unlike the
 * [scalar](crate::scalar) representation, matrix structure is kept: indexing, taking a
 * diagonal or transposing is a single node that moves nonzeros around.
 *
 * All structural operations reduce to two node kinds. A *gather* builds a matrix whose
 * nonzero `k` is nonzero `mapping[k]` of its argument (or 0 if `mapping[k]` is `None`).
 * A *scatter* adds nonzero `k` of its argument into nonzero `mapping[k]` of a new
 * matrix. Each is the adjoint of the other.
 *
 * ```
 * use easy_sens::graph::MX;
 * use easy_sens::sparsity::Sparsity;
 * let x = MX::sym("x", Sparsity::dense(2, 1));
 * let y = x.index(&[1, 0]).diag();
 * assert_eq!(y.sparsity(), &Sparsity::diagonal(2));
 * ```
 */

mod function;
mod operations;

pub use function::MXFunction;

use crate::matrices::DMatrix;
use crate::ops::{BinaryOp, UnaryOp};
use crate::sparsity::Sparsity;

use std::fmt;
use std::rc::Rc;

/**
 * A matrix valued symbolic expression.
 *
 * Cloning is cheap and shares the node. Operators panic on operands of mismatched shapes,
 * the same way matrix arithmetic does; 1x1 operands are broadcast to the other operand's
 * shape.
 */
#[derive(Clone, Debug)]
pub struct MX {
    node: Rc<MXNode>,
}

#[derive(Debug)]
pub(crate) struct MXNode {
    sparsity: Sparsity,
    kind: MXKind,
}

#[derive(Debug)]
pub(crate) enum MXKind {
    Symbol { name: String },
    Constant { value: DMatrix },
    /// Both arguments of unary and binary nodes have the node's sparsity.
    Unary { op: UnaryOp, arg: MX },
    Binary { op: BinaryOp, lhs: MX, rhs: MX },
    /// Nonzero `k` of the node is nonzero `mapping[k]` of the argument, or 0.
    GetNonzeros { arg: MX, mapping: Vec<Option<usize>> },
    /// Nonzero `k` of the argument is added into nonzero `mapping[k]` of the node.
    AddNonzeros { arg: MX, mapping: Vec<Option<usize>> },
}

impl MXKind {
    pub(crate) fn arguments(&self) -> Vec<&MX> {
        match self {
            MXKind::Symbol { .. } | MXKind::Constant { .. } => Vec::new(),
            MXKind::Unary { arg, .. }
            | MXKind::GetNonzeros { arg, .. }
            | MXKind::AddNonzeros { arg, .. } => vec![arg],
            MXKind::Binary { lhs, rhs, .. } => vec![lhs, rhs],
        }
    }

    fn arguments_mut(&mut self) -> Vec<&mut MX> {
        match self {
            MXKind::Symbol { .. } | MXKind::Constant { .. } => Vec::new(),
            MXKind::Unary { arg, .. }
            | MXKind::GetNonzeros { arg, .. }
            | MXKind::AddNonzeros { arg, .. } => vec![arg],
            MXKind::Binary { lhs, rhs, .. } => vec![lhs, rhs],
        }
    }
}

impl MXNode {
    /**
     * Moves every argument onto `detached`, leaving a shared leaf in its place.
     */
    fn detach_arguments(&mut self, leaf: &Rc<MXNode>, detached: &mut Vec<Rc<MXNode>>) {
        for argument in self.kind.arguments_mut() {
            detached.push(std::mem::replace(&mut argument.node, leaf.clone()));
        }
    }
}

/**
 * Arguments this node solely owns are unwound with an explicit stack, so dropping a
 * deep graph does not recurse once per node.
 */
impl Drop for MXNode {
    fn drop(&mut self) {
        let owns_an_argument = self
            .kind
            .arguments()
            .iter()
            .any(|argument| Rc::strong_count(&argument.node) == 1);
        if !owns_an_argument {
            return;
        }
        let leaf = Rc::new(MXNode {
            sparsity: Sparsity::empty(0, 0),
            kind: MXKind::Symbol {
                name: String::new(),
            },
        });
        let mut detached = Vec::new();
        self.detach_arguments(&leaf, &mut detached);
        while let Some(node) = detached.pop() {
            if let Ok(mut node) = Rc::try_unwrap(node) {
                node.detach_arguments(&leaf, &mut detached);
            }
        }
    }
}

impl MX {
    fn from_kind(sparsity: Sparsity, kind: MXKind) -> MX {
        MX {
            node: Rc::new(MXNode { sparsity, kind }),
        }
    }

    /**
     * Creates a new named symbolic matrix, distinct from every other symbol even if they
     * share a name.
     */
    pub fn sym(name: &str, sparsity: Sparsity) -> MX {
        MX::from_kind(
            sparsity,
            MXKind::Symbol {
                name: name.to_string(),
            },
        )
    }

    pub fn constant(value: DMatrix) -> MX {
        MX::from_kind(value.sparsity().clone(), MXKind::Constant { value })
    }

    /**
     * A constant with every structural nonzero of the pattern set to 0.
     */
    pub fn zeros(sparsity: Sparsity) -> MX {
        MX::constant(DMatrix::zeros(sparsity))
    }

    /**
     * A matrix of the given shape with no structural nonzeros, the representation of a
     * structurally zero result.
     */
    pub fn empty(rows: usize, columns: usize) -> MX {
        MX::zeros(Sparsity::empty(rows, columns))
    }

    /**
     * A dense 1x1 constant.
     */
    pub fn scalar(value: f64) -> MX {
        MX::constant(DMatrix::scalar(value))
    }

    pub(crate) fn kind(&self) -> &MXKind {
        &self.node.kind
    }

    /**
     * An identifier unique to this node for as long as it is alive.
     */
    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.node) as usize
    }

    pub fn sparsity(&self) -> &Sparsity {
        &self.node.sparsity
    }

    pub fn shape(&self) -> (usize, usize) {
        self.node.sparsity.shape()
    }

    pub fn nnz(&self) -> usize {
        self.node.sparsity.nnz()
    }

    pub fn numel(&self) -> usize {
        self.node.sparsity.numel()
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self.kind(), MXKind::Symbol { .. })
    }

    /**
     * The name of this expression if it is a symbol.
     */
    pub fn name(&self) -> Option<&str> {
        match self.kind() {
            MXKind::Symbol { name } => Some(name),
            _ => None,
        }
    }

    /**
     * The value of this expression if it is a constant.
     */
    pub fn constant_value(&self) -> Option<&DMatrix> {
        match self.kind() {
            MXKind::Constant { value } => Some(value),
            _ => None,
        }
    }

    /**
     * True if this is a constant with every structural nonzero equal to `value`.
     */
    fn is_constant_of(&self, value: f64) -> bool {
        self.constant_value()
            .is_some_and(|constant| constant.nonzeros().iter().all(|&x| x == value))
    }

    /**
     * True if both expressions are the same node.
     */
    pub fn is_equal(&self, other: &MX) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /**
     * Applies a unary operation elementwise. Operations which do not map 0 to 0 first
     * make their argument dense.
     */
    pub fn unary(op: UnaryOp, arg: MX) -> MX {
        let arg = if op.preserves_zero() {
            if arg.nnz() == 0 {
                return arg;
            }
            arg
        } else {
            let dense = Sparsity::dense(arg.shape().0, arg.shape().1);
            arg.project(&dense)
        };
        if let Some(value) = arg.constant_value() {
            let data = value.nonzeros().iter().map(|&x| op.apply(x)).collect();
            return MX::constant(DMatrix::from_parts(value.sparsity().clone(), data));
        }
        MX::from_kind(arg.sparsity().clone(), MXKind::Unary { op, arg })
    }

    /**
     * Applies a binary operation elementwise. Sums and differences are nonzero over the
     * union of both patterns, products over their intersection and quotients over the
     * pattern of the numerator.
     */
    #[track_caller]
    pub fn binary(op: BinaryOp, lhs: MX, rhs: MX) -> MX {
        let (lhs, rhs) = broadcast(lhs, rhs);
        let sparsity = match op {
            BinaryOp::Add | BinaryOp::Sub => lhs.sparsity().union(rhs.sparsity()),
            BinaryOp::Mul => lhs.sparsity().intersection(rhs.sparsity()),
            BinaryOp::Div => lhs.sparsity().clone(),
        };
        if sparsity.nnz() == 0 {
            return MX::zeros(sparsity);
        }
        match op {
            BinaryOp::Add if lhs.nnz() == 0 => return rhs.project(&sparsity),
            BinaryOp::Add | BinaryOp::Sub if rhs.nnz() == 0 => return lhs.project(&sparsity),
            BinaryOp::Sub if lhs.nnz() == 0 => {
                return MX::unary(UnaryOp::Neg, rhs.project(&sparsity));
            }
            _ => (),
        }
        let lhs = lhs.project(&sparsity);
        let rhs = rhs.project(&sparsity);
        if let (Some(x), Some(y)) = (lhs.constant_value(), rhs.constant_value()) {
            let data = x
                .nonzeros()
                .iter()
                .zip(y.nonzeros())
                .map(|(&x, &y)| op.apply(x, y))
                .collect();
            return MX::constant(DMatrix::from_parts(sparsity, data));
        }
        match op {
            BinaryOp::Mul if lhs.is_constant_of(1.0) => return rhs,
            BinaryOp::Mul if rhs.is_constant_of(1.0) => return lhs,
            BinaryOp::Mul if lhs.is_constant_of(0.0) || rhs.is_constant_of(0.0) => {
                return MX::zeros(sparsity);
            }
            BinaryOp::Div if rhs.is_constant_of(1.0) => return lhs,
            _ => (),
        }
        MX::from_kind(sparsity, MXKind::Binary { op, lhs, rhs })
    }

    /**
     * Builds a matrix with the given pattern whose nonzero `k` is nonzero `mapping[k]` of
     * `arg`, or 0 where `mapping[k]` is `None`.
     */
    pub(crate) fn get_nonzeros(arg: MX, sparsity: Sparsity, mapping: Vec<Option<usize>>) -> MX {
        debug_assert_eq!(mapping.len(), sparsity.nnz());
        let identity = mapping.iter().enumerate().all(|(k, m)| *m == Some(k));
        if identity && &sparsity == arg.sparsity() {
            return arg;
        }
        if arg.nnz() == 0 || mapping.iter().all(Option::is_none) {
            return MX::zeros(sparsity);
        }
        if let Some(value) = arg.constant_value() {
            let data = mapping
                .iter()
                .map(|m| m.map(|k| value.nonzeros()[k]).unwrap_or(0.0))
                .collect();
            return MX::constant(DMatrix::from_parts(sparsity, data));
        }
        if let MXKind::GetNonzeros {
            arg: inner,
            mapping: inner_mapping,
        } = arg.kind()
        {
            let composed = mapping
                .iter()
                .map(|m| m.and_then(|k| inner_mapping[k]))
                .collect();
            return MX::get_nonzeros(inner.clone(), sparsity, composed);
        }
        MX::from_kind(sparsity, MXKind::GetNonzeros { arg, mapping })
    }

    /**
     * Builds a matrix with the given pattern where nonzero `k` of `arg` is added into
     * nonzero `mapping[k]`, or dropped where `mapping[k]` is `None`.
     */
    pub(crate) fn add_nonzeros(arg: MX, sparsity: Sparsity, mapping: Vec<Option<usize>>) -> MX {
        debug_assert_eq!(mapping.len(), arg.nnz());
        // without repeated targets this is a gather from the inverse mapping
        let mut inverse = vec![None; sparsity.nnz()];
        let mut injective = true;
        for (k, target) in mapping.iter().enumerate() {
            if let Some(target) = *target {
                if inverse[target].is_some() {
                    injective = false;
                    break;
                }
                inverse[target] = Some(k);
            }
        }
        if injective {
            return MX::get_nonzeros(arg, sparsity, inverse);
        }
        if let Some(value) = arg.constant_value() {
            let mut data = vec![0.0; sparsity.nnz()];
            for (k, target) in mapping.iter().enumerate() {
                if let Some(target) = *target {
                    data[target] += value.nonzeros()[k];
                }
            }
            return MX::constant(DMatrix::from_parts(sparsity, data));
        }
        MX::from_kind(sparsity, MXKind::AddNonzeros { arg, mapping })
    }

    /**
     * Copies this expression onto another pattern of the same shape. Nonzeros missing
     * from this expression become 0 and nonzeros missing from the pattern are dropped.
     */
    #[track_caller]
    pub fn project(&self, sparsity: &Sparsity) -> MX {
        assert!(
            self.shape() == sparsity.shape(),
            "Cannot project a {}x{} expression onto a {}x{} pattern",
            self.shape().0,
            self.shape().1,
            sparsity.rows(),
            sparsity.columns()
        );
        if self.sparsity() == sparsity {
            return self.clone();
        }
        let mapping = sparsity
            .coordinates()
            .map(|(row, column)| self.sparsity().find(row, column))
            .collect();
        MX::get_nonzeros(self.clone(), sparsity.clone(), mapping)
    }

    /**
     * Selects elements by their column major linear index, giving a column vector with
     * one entry per index. Structural zeros stay structural zeros.
     */
    #[track_caller]
    pub fn index(&self, elements: &[usize]) -> MX {
        let mut positions = Vec::new();
        let mut mapping = Vec::new();
        for (i, &element) in elements.iter().enumerate() {
            assert!(element < self.numel(), "Element {} out of index", element);
            if let Some(k) = self.sparsity().find_element(element) {
                positions.push((0, i));
                mapping.push(Some(k));
            }
        }
        let sparsity = Sparsity::from_sorted_column_major(elements.len(), 1, &positions);
        MX::get_nonzeros(self.clone(), sparsity, mapping)
    }

    /**
     * For a vector, the square matrix with the vector on its diagonal. For a square
     * matrix, the column vector of its diagonal.
     */
    #[track_caller]
    pub fn diag(&self) -> MX {
        let (rows, columns) = self.shape();
        if rows == 1 || columns == 1 {
            let n = rows.max(columns);
            // a vector's nonzero order is the order along its length
            let positions: Vec<(usize, usize)> = self
                .sparsity()
                .coordinates()
                .map(|(row, column)| (row + column, row + column))
                .collect();
            let sparsity = Sparsity::from_sorted_column_major(n, n, &positions);
            let mapping = (0..self.nnz()).map(Some).collect();
            return MX::get_nonzeros(self.clone(), sparsity, mapping);
        }
        assert!(
            rows == columns,
            "diag is only defined for vectors and square matrices, not {}x{}",
            rows,
            columns
        );
        let mut positions = Vec::new();
        let mut mapping = Vec::new();
        for i in 0..rows {
            if let Some(k) = self.sparsity().find(i, i) {
                positions.push((0, i));
                mapping.push(Some(k));
            }
        }
        let sparsity = Sparsity::from_sorted_column_major(rows, 1, &positions);
        MX::get_nonzeros(self.clone(), sparsity, mapping)
    }

    pub fn transpose(&self) -> MX {
        let (sparsity, mapping) = self.sparsity().transpose();
        MX::get_nonzeros(self.clone(), sparsity, mapping.into_iter().map(Some).collect())
    }

    pub fn sq(&self) -> MX {
        MX::unary(UnaryOp::Sq, self.clone())
    }
}

/**
 * Broadcasts a 1x1 operand to the shape of the other operand.
 */
#[track_caller]
fn broadcast(lhs: MX, rhs: MX) -> (MX, MX) {
    if lhs.shape() == rhs.shape() {
        return (lhs, rhs);
    }
    if lhs.sparsity().is_scalar() {
        let lhs = broadcast_scalar(lhs, rhs.shape());
        return (lhs, rhs);
    }
    if rhs.sparsity().is_scalar() {
        let rhs = broadcast_scalar(rhs, lhs.shape());
        return (lhs, rhs);
    }
    panic!(
        "Mismatched expressions, left is {}x{}, right is {}x{}, elementwise operations are only defined for MxN and MxN or 1x1",
        lhs.shape().0,
        lhs.shape().1,
        rhs.shape().0,
        rhs.shape().1
    );
}

fn broadcast_scalar(scalar: MX, (rows, columns): (usize, usize)) -> MX {
    if scalar.nnz() == 0 {
        return MX::empty(rows, columns);
    }
    let sparsity = Sparsity::dense(rows, columns);
    let mapping = vec![Some(0); sparsity.nnz()];
    MX::get_nonzeros(scalar, sparsity, mapping)
}

fn write_mapping(f: &mut fmt::Formatter<'_>, mapping: &[Option<usize>]) -> fmt::Result {
    write!(f, "[")?;
    for (i, m) in mapping.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        match m {
            Some(k) => write!(f, "{}", k)?,
            None => write!(f, "00")?,
        }
    }
    write!(f, "]")
}

enum Token<'a> {
    Expression(&'a MX),
    Text(&'static str),
    Mapping(&'a [Option<usize>]),
}

/**
 * Expressions are written with an explicit stack so deep graphs do not exhaust the call
 * stack. Shared nodes are written out in full wherever they are used.
 */
impl fmt::Display for MX {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![Token::Expression(self)];
        while let Some(token) = pending.pop() {
            let expression = match token {
                Token::Text(text) => {
                    write!(f, "{}", text)?;
                    continue;
                }
                Token::Mapping(mapping) => {
                    write_mapping(f, mapping)?;
                    continue;
                }
                Token::Expression(expression) => expression,
            };
            match expression.kind() {
                MXKind::Symbol { name } => write!(f, "{}", name)?,
                MXKind::Constant { value } => write!(f, "{}", value)?,
                MXKind::Unary { op, arg } => {
                    match op {
                        UnaryOp::Neg => write!(f, "(-")?,
                        _ => write!(f, "{}(", op)?,
                    }
                    pending.push(Token::Text(")"));
                    pending.push(Token::Expression(arg));
                }
                MXKind::Binary { op, lhs, rhs } => {
                    write!(f, "(")?;
                    pending.push(Token::Text(")"));
                    pending.push(Token::Expression(rhs));
                    pending.push(Token::Text(op.symbol()));
                    pending.push(Token::Expression(lhs));
                }
                MXKind::GetNonzeros { arg, mapping } => {
                    pending.push(Token::Mapping(mapping));
                    pending.push(Token::Expression(arg));
                }
                MXKind::AddNonzeros { arg, mapping } => {
                    write!(f, "scatter(")?;
                    pending.push(Token::Text(")"));
                    pending.push(Token::Mapping(mapping));
                    pending.push(Token::Text(", "));
                    pending.push(Token::Expression(arg));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_and_diag_compose_into_one_gather() {
        let x = MX::sym("x", Sparsity::dense(2, 1));
        let y = x.index(&[1, 0]).diag();
        assert_eq!(y.to_string(), "x[1, 0]");
        assert_eq!(y.sparsity(), &Sparsity::diagonal(2));
    }

    #[test]
    fn index_keeps_structural_zeros() {
        let x = MX::sym("x", Sparsity::diagonal(2));
        // elements 0 and 3 are the diagonal, 2 is the upper right structural zero
        let y = x.index(&[2, 3]);
        assert_eq!(y.shape(), (2, 1));
        assert_eq!(y.nnz(), 1);
        assert_eq!(y.to_string(), "x[1]");
    }

    #[test]
    fn products_use_the_intersection() {
        let x = MX::sym("x", Sparsity::diagonal(2));
        let y = MX::sym("y", Sparsity::dense(2, 2));
        assert_eq!((&x * &y).sparsity(), &Sparsity::diagonal(2));
        assert_eq!((&x + &y).sparsity(), &Sparsity::dense(2, 2));
    }

    #[test]
    fn structural_zeros_vanish() {
        let x = MX::sym("x", Sparsity::dense(2, 1));
        let zero = MX::empty(2, 1);
        assert!((&x + &zero).is_equal(&x));
        assert_eq!((&x * &zero).nnz(), 0);
        assert!((MX::scalar(1.0) * x.clone()).is_equal(&x));
    }

    #[test]
    fn scatter_with_repeated_targets() {
        let x = MX::sym("x", Sparsity::dense(2, 1));
        let y = MX::add_nonzeros(x.clone(), Sparsity::scalar(), vec![Some(0), Some(0)]);
        assert_eq!(y.to_string(), "scatter(x, [0, 0])");
        let z = MX::add_nonzeros(x, Sparsity::dense(2, 1), vec![Some(1), Some(0)]);
        assert_eq!(z.to_string(), "x[1, 0]");
    }

    #[test]
    fn transpose_of_a_row() {
        let x = MX::sym("x", Sparsity::dense(1, 3));
        let t = x.transpose();
        assert_eq!(t.shape(), (3, 1));
        assert!(t.transpose().is_equal(&x));
    }

    #[test]
    #[should_panic]
    fn mismatched_shapes_panic() {
        let _ = MX::sym("x", Sparsity::dense(2, 1)) + MX::sym("y", Sparsity::dense(3, 1));
    }

    #[test]
    fn deep_graphs_display_and_drop() {
        let x = MX::sym("x", Sparsity::dense(2, 1));
        let mut sum = x.clone();
        for _ in 0..200_000 {
            sum = &sum + &x;
        }
        assert!(sum.to_string().ends_with("+x)"));
        drop(sum);
        assert_eq!(x.to_string(), "x");
    }
}
