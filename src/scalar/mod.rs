/*!
 * The scalar-expression representation.
 *
 * Every [SXElem] is a tree of scalar operations over named symbols and constants. Matrices
 * of expressions ([SXMatrix]) hold one element per structural nonzero, so all matrix
 * structure is resolved into scalar operations when expressions are built. Functions of
 * scalar expressions ([SXFunction]) are compiled into a flat instruction tape which is
 * evaluated, differentiated forwards and differentiated backwards by simple sweeps.
 *
 * Elements simplify trivial identities as they are built:
 *
 * ```
 * use easy_sens::scalar::SXElem;
 * let x = SXElem::sym("x");
 * let y = (x.clone() * SXElem::constant(1.0)) + SXElem::constant(0.0);
 * assert!(y.is_equal(&x));
 * assert!((x * SXElem::constant(0.0)).is_zero());
 * ```
 */

mod function;
mod matrix;
mod operations;

pub use function::{Instruction, SXFunction};
pub use matrix::SXMatrix;

use crate::ops::{BinaryOp, UnaryOp};

use std::fmt;
use std::rc::Rc;

/**
 * A scalar symbolic expression.
 *
 * Cloning an element is cheap and shares the expression; [SXElem::is_equal] compares
 * elements by identity.
 */
#[derive(Clone, Debug)]
pub struct SXElem {
    node: Rc<SXNode>,
}

#[derive(Debug)]
pub(crate) enum SXNode {
    Constant(f64),
    Symbol { name: String },
    Unary { op: UnaryOp, arg: SXElem },
    Binary { op: BinaryOp, lhs: SXElem, rhs: SXElem },
}

impl SXNode {
    fn arguments_mut(&mut self) -> Vec<&mut SXElem> {
        match self {
            SXNode::Constant(_) | SXNode::Symbol { .. } => Vec::new(),
            SXNode::Unary { arg, .. } => vec![arg],
            SXNode::Binary { lhs, rhs, .. } => vec![lhs, rhs],
        }
    }

    /**
     * Moves every argument onto `detached`, leaving a shared leaf in its place.
     */
    fn detach_arguments(&mut self, leaf: &Rc<SXNode>, detached: &mut Vec<Rc<SXNode>>) {
        for argument in self.arguments_mut() {
            detached.push(std::mem::replace(&mut argument.node, leaf.clone()));
        }
    }
}

/**
 * Dropping a long chain of expressions would otherwise recurse once per link, so
 * arguments this node solely owns are unwound with an explicit stack.
 */
impl Drop for SXNode {
    fn drop(&mut self) {
        let owns_an_argument = self
            .arguments_mut()
            .iter()
            .any(|argument| Rc::strong_count(&argument.node) == 1);
        if !owns_an_argument {
            return;
        }
        let leaf = Rc::new(SXNode::Constant(0.0));
        let mut detached = Vec::new();
        self.detach_arguments(&leaf, &mut detached);
        while let Some(node) = detached.pop() {
            if let Ok(mut node) = Rc::try_unwrap(node) {
                node.detach_arguments(&leaf, &mut detached);
            }
        }
    }
}

impl SXElem {
    fn from_node(node: SXNode) -> SXElem {
        SXElem { node: Rc::new(node) }
    }

    /**
     * Creates a new named symbol, distinct from every other symbol even if they share
     * a name.
     */
    pub fn sym(name: &str) -> SXElem {
        SXElem::from_node(SXNode::Symbol {
            name: name.to_string(),
        })
    }

    pub fn constant(value: f64) -> SXElem {
        SXElem::from_node(SXNode::Constant(value))
    }

    /**
     * Applies a unary operation, folding constants and cancelling double negation.
     */
    pub fn unary(op: UnaryOp, arg: SXElem) -> SXElem {
        if let Some(value) = arg.value() {
            return SXElem::constant(op.apply(value));
        }
        if op == UnaryOp::Neg {
            if let SXNode::Unary {
                op: UnaryOp::Neg,
                arg: inner,
            } = arg.node()
            {
                return inner.clone();
            }
        }
        SXElem::from_node(SXNode::Unary { op, arg })
    }

    /**
     * Applies a binary operation, folding constants and removing additions of zero,
     * multiplications by one or zero and divisions by one. A product of an element with
     * itself becomes a square.
     */
    pub fn binary(op: BinaryOp, lhs: SXElem, rhs: SXElem) -> SXElem {
        if let (Some(x), Some(y)) = (lhs.value(), rhs.value()) {
            return SXElem::constant(op.apply(x, y));
        }
        match op {
            BinaryOp::Add if lhs.is_zero() => return rhs,
            BinaryOp::Add if rhs.is_zero() => return lhs,
            BinaryOp::Sub if rhs.is_zero() => return lhs,
            BinaryOp::Sub if lhs.is_zero() => return SXElem::unary(UnaryOp::Neg, rhs),
            BinaryOp::Mul if lhs.is_zero() || rhs.is_zero() => return SXElem::constant(0.0),
            BinaryOp::Mul if lhs.is_one() => return rhs,
            BinaryOp::Mul if rhs.is_one() => return lhs,
            BinaryOp::Mul if lhs.is_minus_one() => return SXElem::unary(UnaryOp::Neg, rhs),
            BinaryOp::Mul if rhs.is_minus_one() => return SXElem::unary(UnaryOp::Neg, lhs),
            BinaryOp::Div if lhs.is_zero() => return SXElem::constant(0.0),
            BinaryOp::Div if rhs.is_one() => return lhs,
            BinaryOp::Mul if lhs.is_equal(&rhs) => return SXElem::unary(UnaryOp::Sq, lhs),
            _ => (),
        }
        SXElem::from_node(SXNode::Binary { op, lhs, rhs })
    }

    pub(crate) fn node(&self) -> &SXNode {
        &self.node
    }

    /**
     * An identifier unique to this expression for as long as it is alive.
     */
    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.node) as usize
    }

    /**
     * The value of this element if it is a constant.
     */
    pub fn value(&self) -> Option<f64> {
        match self.node() {
            SXNode::Constant(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        self.value().is_some()
    }

    pub fn is_zero(&self) -> bool {
        self.value() == Some(0.0)
    }

    pub fn is_one(&self) -> bool {
        self.value() == Some(1.0)
    }

    fn is_minus_one(&self) -> bool {
        self.value() == Some(-1.0)
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self.node(), SXNode::Symbol { .. })
    }

    /**
     * The name of this element if it is a symbol.
     */
    pub fn name(&self) -> Option<&str> {
        match self.node() {
            SXNode::Symbol { name } => Some(name),
            _ => None,
        }
    }

    /**
     * True if both elements are the same expression.
     */
    pub fn is_equal(&self, other: &SXElem) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

enum Token<'a> {
    Element(&'a SXElem),
    Text(&'static str),
}

/**
 * Elements are written with an explicit stack so deep expressions do not exhaust the
 * call stack.
 */
impl fmt::Display for SXElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![Token::Element(self)];
        while let Some(token) = pending.pop() {
            let element = match token {
                Token::Text(text) => {
                    write!(f, "{}", text)?;
                    continue;
                }
                Token::Element(element) => element,
            };
            match element.node() {
                SXNode::Constant(value) => write!(f, "{}", value)?,
                SXNode::Symbol { name } => write!(f, "{}", name)?,
                SXNode::Unary { op, arg } => {
                    match op {
                        UnaryOp::Neg => write!(f, "(-")?,
                        _ => write!(f, "{}(", op)?,
                    }
                    pending.push(Token::Text(")"));
                    pending.push(Token::Element(arg));
                }
                SXNode::Binary { op, lhs, rhs } => {
                    write!(f, "(")?;
                    pending.push(Token::Text(")"));
                    pending.push(Token::Element(rhs));
                    pending.push(Token::Text(op.symbol()));
                    pending.push(Token::Element(lhs));
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
    fn constants_fold() {
        let x = SXElem::constant(2.0) * SXElem::constant(3.0) - SXElem::constant(1.0);
        assert_eq!(x.value(), Some(5.0));
    }

    #[test]
    fn double_negation_cancels() {
        let x = SXElem::sym("x");
        assert!((-(-x.clone())).is_equal(&x));
    }

    #[test]
    fn display() {
        let x = SXElem::sym("x");
        let y = SXElem::sym("y");
        let z = SXElem::unary(UnaryOp::Sin, x.clone() * y) - x;
        assert_eq!(z.to_string(), "(sin((x*y))-x)");
    }

    #[test]
    fn products_with_itself_are_squares() {
        let x = SXElem::sym("x");
        assert_eq!((x.clone() * x).to_string(), "sq(x)");
    }

    #[test]
    fn deep_chains_display_and_drop() {
        let x = SXElem::sym("x");
        let mut sum = x.clone();
        for _ in 0..200_000 {
            sum = sum + x.clone();
        }
        let text = sum.to_string();
        assert!(text.starts_with("(((("));
        assert!(text.ends_with("+x)"));
        drop(sum);
        // the symbol is still usable once the chain is gone
        assert_eq!(x.to_string(), "x");
    }
}
