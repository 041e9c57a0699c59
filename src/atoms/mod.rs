//! Atom functions for building expressions.
//!
//! Every atom builds an `Expr::Atom` node tagged with its `Op`:
//!
//! - **Affine atoms**: operations that preserve linearity (add, mul, sum, reshape, etc.)
//! - **Nonlinear atoms**: operations with specific curvature (norms, quadratic forms, etc.)

pub mod affine;
pub mod nonlinear;

pub use affine::{
    dot, flatten, hstack, index, matmul, reshape, slice, sum, sum_axis, trace, transpose, vstack,
};

pub use nonlinear::{
    abs, exp, log, max2, maximum, min2, minimum, neg_part, norm, norm1, norm2, norm_inf, pos,
    power, quad_form, quad_over_lin, sqrt, sum_squares,
};
