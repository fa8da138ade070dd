/*!
 * Symbolic forward and adjoint sensitivities over two representations of the same
 * function, and a check that they agree to second order.
 *
 * Functions can be built from an [expression graph](graph) of matrix valued nodes, or
 * from [scalar expressions](scalar) where every structural nonzero is its own tree. Both
 * evaluate numerically and symbolically with seeds through the common
 * [functions] interface, and a graph function can be expanded into an equivalent scalar
 * function. The [consistency] module differentiates a function twice in each
 * representation and compares the results.
 *
 * # Examples
 *
 * ```
 * use easy_sens::consistency::check_second_order_consistency;
 * use easy_sens::graph::{MX, MXFunction};
 * use easy_sens::sparsity::Sparsity;
 * let x = MX::sym("x", Sparsity::dense(2, 1));
 * let y = (&x * &x.index(&[1, 0])).diag();
 * let f = MXFunction::new(vec![x], vec![y]).unwrap();
 * check_second_order_consistency(&f).unwrap();
 * ```
 *
 * Scalar functions can be turned into C source with the [codegen] module.
 */

pub mod numeric;
pub mod ops;
pub mod sparsity;
pub mod matrices;
pub mod functions;
pub mod scalar;
pub mod graph;
pub mod consistency;
pub mod codegen;
