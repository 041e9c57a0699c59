//! Nonlinear atoms for convex optimization.
//!
//! These atoms have specific curvature properties (convex or concave)
//! and require DCP composition rules to be applied correctly.

use std::sync::Arc;

use super::affine::{binary, unary};
use crate::error::{DmcpError, Result};
use crate::expr::{Expr, Op};

// ============================================================================
// Norms (all convex)
// ============================================================================

/// L1 norm: ||x||_1 = sum(|x_i|).
pub fn norm1(x: &Expr) -> Expr {
    unary(Op::Norm1, x)
}

/// L2 norm: ||x||_2 = sqrt(sum(x_i^2)).
pub fn norm2(x: &Expr) -> Expr {
    unary(Op::Norm2, x)
}

/// Infinity norm: ||x||_inf = max(|x_i|).
pub fn norm_inf(x: &Expr) -> Expr {
    unary(Op::NormInf, x)
}

/// General p-norm for p = 1, 2 or infinity.
///
/// # Errors
///
/// Returns `UnsupportedInput` for any other p.
pub fn norm(x: &Expr, p: f64) -> Result<Expr> {
    if p == 1.0 {
        Ok(norm1(x))
    } else if p == 2.0 {
        Ok(norm2(x))
    } else if p.is_infinite() && p > 0.0 {
        Ok(norm_inf(x))
    } else {
        Err(DmcpError::UnsupportedInput(format!(
            "norm p={} is not supported; use p=1, 2, or inf",
            p
        )))
    }
}

// ============================================================================
// Element-wise atoms
// ============================================================================

/// Absolute value |x|, convex.
pub fn abs(x: &Expr) -> Expr {
    unary(Op::Abs, x)
}

/// Positive part max(x, 0), convex and increasing.
pub fn pos(x: &Expr) -> Expr {
    unary(Op::Pos, x)
}

/// Negative part max(-x, 0), convex and decreasing.
pub fn neg_part(x: &Expr) -> Expr {
    unary(Op::NegPart, x)
}

/// Exponential function (elementwise): exp(x). Convex when x is affine.
pub fn exp(x: &Expr) -> Expr {
    unary(Op::Exp, x)
}

/// Natural logarithm (elementwise). Concave when x is concave.
pub fn log(x: &Expr) -> Expr {
    unary(Op::Log, x)
}

/// Power function (elementwise): x^p
///
/// - p > 1 or p < 0: convex when x is affine
/// - 0 < p < 1: concave when x is affine
/// - p = 1: x itself
pub fn power(x: &Expr, p: f64) -> Expr {
    unary(Op::Power(p), x)
}

pub fn sqrt(x: &Expr) -> Expr {
    power(x, 0.5)
}

// ============================================================================
// Maximum and minimum
// ============================================================================

/// Elementwise maximum of expressions. A single argument is returned as is.
pub fn maximum(mut exprs: Vec<Expr>) -> Expr {
    match exprs.len() {
        1 => exprs.remove(0),
        _ => Expr::atom(Op::Maximum, exprs.into_iter().map(Arc::new).collect()),
    }
}

pub fn max2(a: &Expr, b: &Expr) -> Expr {
    maximum(vec![a.clone(), b.clone()])
}

/// Elementwise minimum of expressions. A single argument is returned as is.
pub fn minimum(mut exprs: Vec<Expr>) -> Expr {
    match exprs.len() {
        1 => exprs.remove(0),
        _ => Expr::atom(Op::Minimum, exprs.into_iter().map(Arc::new).collect()),
    }
}

pub fn min2(a: &Expr, b: &Expr) -> Expr {
    minimum(vec![a.clone(), b.clone()])
}

// ============================================================================
// Quadratic atoms
// ============================================================================

/// Quadratic form: x' P x.
///
/// Convex if P is a PSD constant or PSD parameter, concave if P is NSD.
pub fn quad_form(x: &Expr, p: &Expr) -> Expr {
    binary(Op::QuadForm, x.clone(), p.clone())
}

/// Sum of squares: ||x||_2^2.
pub fn sum_squares(x: &Expr) -> Expr {
    unary(Op::SumSquares, x)
}

/// Quadratic over linear: ||x||_2^2 / y, jointly convex for y > 0.
pub fn quad_over_lin(x: &Expr, y: &Expr) -> Expr {
    binary(Op::QuadOverLin, x.clone(), y.clone())
}
