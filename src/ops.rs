/*!
 * Elementary operations shared by both symbolic representations.
 *
 * Each operation knows how to apply itself and how to compute its local partial
 * derivatives for any [Real] element type, so the same rules drive numeric
 * evaluation, scalar-expression sweeps and expression-graph differentiation.
 */

use crate::numeric::extra::Real;

use std::fmt;

/**
 * Operations of one argument.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Sq,
    Sqrt,
    Exp,
    Ln,
    Sin,
    Cos,
}

/**
 * Operations of two arguments.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl UnaryOp {
    pub fn apply<T: Real>(self, x: T) -> T {
        match self {
            UnaryOp::Neg => -x,
            UnaryOp::Sq => x.clone() * x,
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Ln => x.ln(),
            UnaryOp::Sin => x.sin(),
            UnaryOp::Cos => x.cos(),
        }
    }

    /**
     * Computes `d op(x) / dx` given the argument and the already computed result.
     */
    pub fn derivative<T: Real>(self, x: &T, result: &T) -> T {
        match self {
            // d(-x) / dx = -1
            UnaryOp::Neg => -T::one(),
            // d(x^2) / dx = 2x
            UnaryOp::Sq => T::from_f64(2.0) * x.clone(),
            // d(sqrt(x)) / dx = 1 / (2 sqrt(x))
            UnaryOp::Sqrt => T::one() / (result.clone() + result.clone()),
            // d(e^x) / dx = e^x
            UnaryOp::Exp => result.clone(),
            // d(ln(x)) / dx = 1 / x
            UnaryOp::Ln => T::one() / x.clone(),
            // d(sin(x)) / dx = cos(x)
            UnaryOp::Sin => x.clone().cos(),
            // d(cos(x)) / dx = -sin(x)
            UnaryOp::Cos => -(x.clone().sin()),
        }
    }

    /**
     * True if `op(0) == 0`, in which case applying the operation never fills in
     * structural zeros of its argument.
     */
    pub fn preserves_zero(self) -> bool {
        matches!(
            self,
            UnaryOp::Neg | UnaryOp::Sq | UnaryOp::Sqrt | UnaryOp::Sin
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Sq => "sq",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Exp => "exp",
            UnaryOp::Ln => "log",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
        }
    }
}

impl BinaryOp {
    pub fn apply<T: Real>(self, x: T, y: T) -> T {
        match self {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div => x / y,
        }
    }

    /**
     * Computes `(d op(x, y) / dx, d op(x, y) / dy)` given both arguments and the
     * already computed result.
     */
    pub fn partials<T: Real>(self, x: &T, y: &T, result: &T) -> (T, T) {
        match self {
            BinaryOp::Add => (T::one(), T::one()),
            BinaryOp::Sub => (T::one(), -T::one()),
            BinaryOp::Mul => (y.clone(), x.clone()),
            // d(x / y) / dy = -x / y^2 = -(x / y) / y
            BinaryOp::Div => (T::one() / y.clone(), -(result.clone() / y.clone())),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unary_derivatives_match_hand_computed_values() {
        let x = 0.7_f64;
        assert_eq!(UnaryOp::Sq.derivative(&x, &(x * x)), 1.4);
        assert_eq!(UnaryOp::Exp.derivative(&x, &x.exp()), x.exp());
        assert_eq!(UnaryOp::Cos.derivative(&x, &x.cos()), -x.sin());
        assert_eq!(UnaryOp::Neg.derivative(&x, &-x), -1.0);
    }

    #[test]
    fn division_partials() {
        let (dx, dy) = BinaryOp::Div.partials(&3.0, &2.0, &1.5);
        assert_eq!(dx, 0.5);
        assert_eq!(dy, -0.75);
    }

    #[test]
    fn zero_preservation() {
        for op in [UnaryOp::Neg, UnaryOp::Sq, UnaryOp::Sqrt, UnaryOp::Sin] {
            assert!(op.preserves_zero());
            assert_eq!(op.apply(0.0_f64), 0.0);
        }
        for op in [UnaryOp::Exp, UnaryOp::Ln, UnaryOp::Cos] {
            assert!(!op.preserves_zero());
        }
    }
}
