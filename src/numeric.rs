/*!
 * Numerical type definitions
 *
 * Both symbolic representations and plain `f64` implement the traits in this module,
 * which lets one generic routine evaluate a function numerically, expand it into scalar
 * expressions, or build its derivative graph, depending only on the element type it is
 * instantiated with.
 */

use std::ops::{Add, Div, Mul, Neg, Sub};

/**
 * A general purpose numeric trait that defines all the behaviour the evaluation and
 * differentiation routines need their element types to support.
 *
 * Operations are only required by value, as every implementing type is cheap to clone:
 * `f64` is `Copy` and both symbolic types are reference counted handles.
 */
pub trait Numeric
where
    Self: Add<Output = Self>
        + Sub<Output = Self>
        + Mul<Output = Self>
        + Div<Output = Self>
        + Neg<Output = Self>
        + Sized
        + Clone
        + ZeroOne
        + FromF64,
{
}

/**
 * Anything which implements all the super traits will automatically implement this trait too.
 */
impl<T> Numeric for T where
    T: Add<Output = Self>
        + Sub<Output = Self>
        + Mul<Output = Self>
        + Div<Output = Self>
        + Neg<Output = Self>
        + Sized
        + Clone
        + ZeroOne
        + FromF64
{
}

/**
 * A trait defining how to obtain 0 and 1 for every implementing type.
 */
pub trait ZeroOne: Sized {
    fn zero() -> Self;
    fn one() -> Self;
}

impl ZeroOne for f64 {
    #[inline]
    fn zero() -> f64 {
        0.0
    }
    #[inline]
    fn one() -> f64 {
        1.0
    }
}

/**
 * A trait for lifting a numerical constant into the implementing type.
 */
pub trait FromF64: Sized {
    fn from_f64(value: f64) -> Self;
}

impl FromF64 for f64 {
    #[inline]
    fn from_f64(value: f64) -> f64 {
        value
    }
}

/**
 * Additional traits for the elementary functions.
 */
pub mod extra {
    use crate::numeric::Numeric;

    /**
     * A type which can be square rooted.
     */
    pub trait Sqrt {
        type Output;
        fn sqrt(self) -> Self::Output;
    }

    /**
     * A type which can compute e^self.
     */
    pub trait Exp {
        type Output;
        fn exp(self) -> Self::Output;
    }

    /**
     * A type which can compute the natural logarithm of self.
     */
    pub trait Ln {
        type Output;
        fn ln(self) -> Self::Output;
    }

    /**
     * A type which can compute the sine of self.
     */
    pub trait Sin {
        type Output;
        fn sin(self) -> Self::Output;
    }

    /**
     * A type which can compute the cosine of self.
     */
    pub trait Cos {
        type Output;
        fn cos(self) -> Self::Output;
    }

    macro_rules! elementary_float {
        ($T:ty, $trait:tt, $method:ident) => {
            impl $trait for $T {
                type Output = $T;
                #[inline]
                fn $method(self) -> Self::Output {
                    <$T>::$method(self)
                }
            }
        };
    }

    elementary_float!(f64, Sqrt, sqrt);
    elementary_float!(f64, Exp, exp);
    elementary_float!(f64, Ln, ln);
    elementary_float!(f64, Sin, sin);
    elementary_float!(f64, Cos, cos);

    /**
     * A [Numeric] type which also supports all the elementary functions.
     */
    pub trait Real
    where
        Self: Numeric
            + Sqrt<Output = Self>
            + Exp<Output = Self>
            + Ln<Output = Self>
            + Sin<Output = Self>
            + Cos<Output = Self>,
    {
    }

    impl<T> Real for T where
        T: Numeric
            + Sqrt<Output = Self>
            + Exp<Output = Self>
            + Ln<Output = Self>
            + Sin<Output = Self>
            + Cos<Output = Self>
    {
    }
}
