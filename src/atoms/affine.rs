//! Affine atoms and operator overloading.
//!
//! Affine atoms are both convex and concave. They include:
//! - Addition, subtraction, negation
//! - Scalar and matrix multiplication
//! - Sum, reshape, index, stack operations
//! - Transpose and trace

use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

use crate::expr::{constant, Expr, IndexSpec, Op, Shape};

pub(crate) fn unary(op: Op, x: &Expr) -> Expr {
    Expr::atom(op, vec![Arc::new(x.clone())])
}

pub(crate) fn binary(op: Op, a: Expr, b: Expr) -> Expr {
    Expr::atom(op, vec![Arc::new(a), Arc::new(b)])
}

fn variadic(op: Op, exprs: Vec<Expr>) -> Expr {
    Expr::atom(op, exprs.into_iter().map(Arc::new).collect())
}

// ============================================================================
// Operator overloading for Expr
// ============================================================================

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::atom(Op::Neg, vec![Arc::new(self)])
    }
}

impl Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        unary(Op::Neg, self)
    }
}

/// Implement a binary operator for every owned/borrowed pairing of `Expr`.
macro_rules! impl_expr_binop {
    ($trait:ident, $method:ident, |$a:ident, $b:ident| $body:expr) => {
        impl $trait<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                let ($a, $b) = (self, rhs);
                $body
            }
        }

        impl $trait<&Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                let ($a, $b) = (self, rhs.clone());
                $body
            }
        }

        impl $trait<Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                let ($a, $b) = (self.clone(), rhs);
                $body
            }
        }

        impl $trait<&Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                let ($a, $b) = (self.clone(), rhs.clone());
                $body
            }
        }
    };
}

impl_expr_binop!(Add, add, |a, b| binary(Op::Add, a, b));
impl_expr_binop!(Sub, sub, |a, b| binary(Op::Add, a, -b));
impl_expr_binop!(Mul, mul, |a, b| binary(Op::Mul, a, b));

// Scalar multiplication puts the constant on the left.
impl Mul<f64> for Expr {
    type Output = Expr;

    fn mul(self, rhs: f64) -> Expr {
        binary(Op::Mul, constant(rhs), self)
    }
}

impl Mul<f64> for &Expr {
    type Output = Expr;

    fn mul(self, rhs: f64) -> Expr {
        binary(Op::Mul, constant(rhs), self.clone())
    }
}

impl Mul<Expr> for f64 {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        binary(Op::Mul, constant(self), rhs)
    }
}

impl Mul<&Expr> for f64 {
    type Output = Expr;

    fn mul(self, rhs: &Expr) -> Expr {
        binary(Op::Mul, constant(self), rhs.clone())
    }
}

impl Div<f64> for Expr {
    type Output = Expr;

    fn div(self, rhs: f64) -> Expr {
        binary(Op::Mul, constant(1.0 / rhs), self)
    }
}

impl Div<f64> for &Expr {
    type Output = Expr;

    fn div(self, rhs: f64) -> Expr {
        binary(Op::Mul, constant(1.0 / rhs), self.clone())
    }
}

// ============================================================================
// Affine atom functions
// ============================================================================

/// Sum of all elements.
pub fn sum(expr: &Expr) -> Expr {
    unary(Op::Sum(None), expr)
}

/// Sum along a specific axis.
pub fn sum_axis(expr: &Expr, axis: usize) -> Expr {
    unary(Op::Sum(Some(axis)), expr)
}

/// Reshape an expression to a new shape.
pub fn reshape(expr: &Expr, shape: impl Into<Shape>) -> Expr {
    unary(Op::Reshape(shape.into()), expr)
}

/// Flatten an expression to a vector.
pub fn flatten(expr: &Expr) -> Expr {
    reshape(expr, Shape::vector(expr.shape().size()))
}

pub fn transpose(expr: &Expr) -> Expr {
    unary(Op::Transpose, expr)
}

/// Matrix trace.
pub fn trace(expr: &Expr) -> Expr {
    unary(Op::Trace, expr)
}

/// Vertical stack (row-wise concatenation).
pub fn vstack(exprs: Vec<Expr>) -> Expr {
    variadic(Op::VStack, exprs)
}

/// Horizontal stack (column-wise concatenation).
pub fn hstack(exprs: Vec<Expr>) -> Expr {
    variadic(Op::HStack, exprs)
}

/// Matrix-vector or matrix-matrix multiplication.
pub fn matmul(a: &Expr, b: &Expr) -> Expr {
    binary(Op::MatMul, a.clone(), b.clone())
}

/// Inner product a'b.
pub fn dot(a: &Expr, b: &Expr) -> Expr {
    binary(Op::MatMul, transpose(a), b.clone())
}

/// Index into an expression.
pub fn index(expr: &Expr, idx: usize) -> Expr {
    unary(Op::Index(IndexSpec::element(vec![idx])), expr)
}

/// Slice a range from an expression.
pub fn slice(expr: &Expr, start: usize, stop: usize) -> Expr {
    unary(Op::Index(IndexSpec::range(start, stop)), expr)
}
