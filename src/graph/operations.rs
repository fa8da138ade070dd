/*!
 * Operator implementations for MX.
 *
 * These mirror the operators on [SXElem](crate::scalar::SXElem): every combination of by
 * value and by reference for `+ - * /`, negation, and the elementary functions of the
 * [numeric](crate::numeric) module, so an expression graph can be used anywhere a generic
 * [Real](crate::numeric::extra::Real) is expected.
 */

use crate::graph::MX;
use crate::numeric::extra::{Cos, Exp, Ln, Sin, Sqrt};
use crate::numeric::{FromF64, ZeroOne};
use crate::ops::{BinaryOp, UnaryOp};

use std::ops::{Add, Div, Mul, Neg, Sub};

/**
 * Zero is a 1x1 structural zero, so multiplying by it removes nonzeros instead of
 * storing numerical zeros.
 */
impl ZeroOne for MX {
    #[inline]
    fn zero() -> MX {
        MX::empty(1, 1)
    }
    #[inline]
    fn one() -> MX {
        MX::scalar(1.0)
    }
}

impl FromF64 for MX {
    #[inline]
    fn from_f64(value: f64) -> MX {
        MX::scalar(value)
    }
}

macro_rules! operator_impl_reference_reference {
    (impl $op:tt for MX { fn $method:ident => $binary:expr }) => {
        /**
         * Elementwise operation for two referenced expressions.
         */
        impl $op<&MX> for &MX {
            type Output = MX;
            #[track_caller]
            #[inline]
            fn $method(self, rhs: &MX) -> Self::Output {
                MX::binary($binary, self.clone(), rhs.clone())
            }
        }
    };
}

macro_rules! operator_impl_value_value {
    (impl $op:tt for MX { fn $method:ident => $binary:expr }) => {
        /**
         * Elementwise operation for two expressions.
         */
        impl $op for MX {
            type Output = MX;
            #[track_caller]
            #[inline]
            fn $method(self, rhs: MX) -> Self::Output {
                MX::binary($binary, self, rhs)
            }
        }
    };
}

macro_rules! operator_impl_value_reference {
    (impl $op:tt for MX { fn $method:ident => $binary:expr }) => {
        /**
         * Elementwise operation for two expressions with the right referenced.
         */
        impl $op<&MX> for MX {
            type Output = MX;
            #[track_caller]
            #[inline]
            fn $method(self, rhs: &MX) -> Self::Output {
                MX::binary($binary, self, rhs.clone())
            }
        }
    };
}

macro_rules! operator_impl_reference_value {
    (impl $op:tt for MX { fn $method:ident => $binary:expr }) => {
        /**
         * Elementwise operation for two expressions with the left referenced.
         */
        impl $op<MX> for &MX {
            type Output = MX;
            #[track_caller]
            #[inline]
            fn $method(self, rhs: MX) -> Self::Output {
                MX::binary($binary, self.clone(), rhs)
            }
        }
    };
}

operator_impl_reference_reference!(impl Add for MX { fn add => BinaryOp::Add });
operator_impl_value_value!(impl Add for MX { fn add => BinaryOp::Add });
operator_impl_value_reference!(impl Add for MX { fn add => BinaryOp::Add });
operator_impl_reference_value!(impl Add for MX { fn add => BinaryOp::Add });
operator_impl_reference_reference!(impl Sub for MX { fn sub => BinaryOp::Sub });
operator_impl_value_value!(impl Sub for MX { fn sub => BinaryOp::Sub });
operator_impl_value_reference!(impl Sub for MX { fn sub => BinaryOp::Sub });
operator_impl_reference_value!(impl Sub for MX { fn sub => BinaryOp::Sub });
operator_impl_reference_reference!(impl Mul for MX { fn mul => BinaryOp::Mul });
operator_impl_value_value!(impl Mul for MX { fn mul => BinaryOp::Mul });
operator_impl_value_reference!(impl Mul for MX { fn mul => BinaryOp::Mul });
operator_impl_reference_value!(impl Mul for MX { fn mul => BinaryOp::Mul });
operator_impl_reference_reference!(impl Div for MX { fn div => BinaryOp::Div });
operator_impl_value_value!(impl Div for MX { fn div => BinaryOp::Div });
operator_impl_value_reference!(impl Div for MX { fn div => BinaryOp::Div });
operator_impl_reference_value!(impl Div for MX { fn div => BinaryOp::Div });

impl Neg for MX {
    type Output = MX;
    #[inline]
    fn neg(self) -> Self::Output {
        MX::unary(UnaryOp::Neg, self)
    }
}

impl Neg for &MX {
    type Output = MX;
    #[inline]
    fn neg(self) -> Self::Output {
        MX::unary(UnaryOp::Neg, self.clone())
    }
}

macro_rules! elementary_impl {
    ($trait:tt, $method:ident, $unary:expr) => {
        impl $trait for MX {
            type Output = MX;
            #[inline]
            fn $method(self) -> Self::Output {
                MX::unary($unary, self)
            }
        }

        impl $trait for &MX {
            type Output = MX;
            #[inline]
            fn $method(self) -> Self::Output {
                MX::unary($unary, self.clone())
            }
        }
    };
}

elementary_impl!(Sqrt, sqrt, UnaryOp::Sqrt);
elementary_impl!(Exp, exp, UnaryOp::Exp);
elementary_impl!(Ln, ln, UnaryOp::Ln);
elementary_impl!(Sin, sin, UnaryOp::Sin);
elementary_impl!(Cos, cos, UnaryOp::Cos);
