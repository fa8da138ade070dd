/*!
 * Operator implementations for SXElem.
 *
 * Elements implement the standard library traits for addition, subtraction,
 * multiplication, division and negation for all combinations of by value and by
 * reference, and every trait of the [numeric](crate::numeric) module, so they can be
 * used anywhere a generic [Real](crate::numeric::extra::Real) is expected.
 */

use crate::numeric::extra::{Cos, Exp, Ln, Sin, Sqrt};
use crate::numeric::{FromF64, ZeroOne};
use crate::ops::{BinaryOp, UnaryOp};
use crate::scalar::SXElem;

use std::ops::{Add, Div, Mul, Neg, Sub};

impl ZeroOne for SXElem {
    #[inline]
    fn zero() -> SXElem {
        SXElem::constant(0.0)
    }
    #[inline]
    fn one() -> SXElem {
        SXElem::constant(1.0)
    }
}

impl FromF64 for SXElem {
    #[inline]
    fn from_f64(value: f64) -> SXElem {
        SXElem::constant(value)
    }
}

macro_rules! operator_impl_reference_reference {
    (impl $op:tt for SXElem { fn $method:ident => $binary:expr }) => {
        /**
         * Operation for two referenced elements.
         */
        impl $op<&SXElem> for &SXElem {
            type Output = SXElem;
            #[inline]
            fn $method(self, rhs: &SXElem) -> Self::Output {
                SXElem::binary($binary, self.clone(), rhs.clone())
            }
        }
    };
}

macro_rules! operator_impl_value_value {
    (impl $op:tt for SXElem { fn $method:ident => $binary:expr }) => {
        /**
         * Operation for two elements.
         */
        impl $op for SXElem {
            type Output = SXElem;
            #[inline]
            fn $method(self, rhs: SXElem) -> Self::Output {
                SXElem::binary($binary, self, rhs)
            }
        }
    };
}

macro_rules! operator_impl_value_reference {
    (impl $op:tt for SXElem { fn $method:ident => $binary:expr }) => {
        /**
         * Operation for two elements with the right referenced.
         */
        impl $op<&SXElem> for SXElem {
            type Output = SXElem;
            #[inline]
            fn $method(self, rhs: &SXElem) -> Self::Output {
                SXElem::binary($binary, self, rhs.clone())
            }
        }
    };
}

macro_rules! operator_impl_reference_value {
    (impl $op:tt for SXElem { fn $method:ident => $binary:expr }) => {
        /**
         * Operation for two elements with the left referenced.
         */
        impl $op<SXElem> for &SXElem {
            type Output = SXElem;
            #[inline]
            fn $method(self, rhs: SXElem) -> Self::Output {
                SXElem::binary($binary, self.clone(), rhs)
            }
        }
    };
}

macro_rules! operator_impls {
    (impl $op:tt for SXElem { fn $method:ident => $binary:expr }) => {
        operator_impl_reference_reference!(impl $op for SXElem { fn $method => $binary });
        operator_impl_value_value!(impl $op for SXElem { fn $method => $binary });
        operator_impl_value_reference!(impl $op for SXElem { fn $method => $binary });
        operator_impl_reference_value!(impl $op for SXElem { fn $method => $binary });
    };
}

operator_impls!(impl Add for SXElem { fn add => BinaryOp::Add });
operator_impls!(impl Sub for SXElem { fn sub => BinaryOp::Sub });
operator_impls!(impl Mul for SXElem { fn mul => BinaryOp::Mul });
operator_impls!(impl Div for SXElem { fn div => BinaryOp::Div });

impl Neg for SXElem {
    type Output = SXElem;
    #[inline]
    fn neg(self) -> Self::Output {
        SXElem::unary(UnaryOp::Neg, self)
    }
}

impl Neg for &SXElem {
    type Output = SXElem;
    #[inline]
    fn neg(self) -> Self::Output {
        SXElem::unary(UnaryOp::Neg, self.clone())
    }
}

macro_rules! elementary_impl {
    ($trait:tt, $method:ident, $unary:expr) => {
        impl $trait for SXElem {
            type Output = SXElem;
            #[inline]
            fn $method(self) -> Self::Output {
                SXElem::unary($unary, self)
            }
        }

        impl $trait for &SXElem {
            type Output = SXElem;
            #[inline]
            fn $method(self) -> Self::Output {
                SXElem::unary($unary, self.clone())
            }
        }
    };
}

elementary_impl!(Sqrt, sqrt, UnaryOp::Sqrt);
elementary_impl!(Exp, exp, UnaryOp::Exp);
elementary_impl!(Ln, ln, UnaryOp::Ln);
elementary_impl!(Sin, sin, UnaryOp::Sin);
elementary_impl!(Cos, cos, UnaryOp::Cos);
