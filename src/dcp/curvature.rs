//! Curvature tracking for DCP (Disciplined Convex Programming).
//!
//! This module implements the curvature rules that determine whether an
//! expression is convex, concave, affine, or unknown. Parameters are constants
//! here: a product of a variable with a parameter of known sign is affine,
//! which is what makes a fixed sub-problem of a multi-convex problem DCP.

use std::sync::Arc;

use super::sign::Sign;
use crate::expr::{Array, Atom, Attribute, Expr, Op};

/// Curvature of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curvature {
    /// Constant value (most restrictive).
    Constant,
    /// Affine function (both convex and concave).
    Affine,
    /// Convex function.
    Convex,
    /// Concave function.
    Concave,
    /// Unknown curvature (not DCP-compliant).
    Unknown,
}

impl Curvature {
    /// Check if the curvature is convex (constant, affine, or convex).
    pub fn is_convex(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine | Curvature::Convex)
    }

    /// Check if the curvature is concave (constant, affine, or concave).
    pub fn is_concave(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine | Curvature::Concave)
    }

    /// Check if the curvature is affine (constant or affine).
    pub fn is_affine(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine)
    }

    pub fn is_constant(self) -> bool {
        matches!(self, Curvature::Constant)
    }

    /// Negate the curvature (convex <-> concave).
    pub fn negate(self) -> Self {
        match self {
            Curvature::Convex => Curvature::Concave,
            Curvature::Concave => Curvature::Convex,
            other => other,
        }
    }
}

/// Combine curvatures for addition: a + b.
pub fn add_curvature(a: Curvature, b: Curvature) -> Curvature {
    use Curvature::*;
    match (a, b) {
        (Constant, x) | (x, Constant) => x,
        (Affine, x) | (x, Affine) => x,
        (Convex, Convex) => Convex,
        (Concave, Concave) => Concave,
        _ => Unknown,
    }
}

/// Curvature of `c * expr` where `c` is constant with the given sign.
pub fn scaled_curvature(sign: Sign, curv: Curvature) -> Curvature {
    match sign {
        Sign::Zero => Curvature::Constant,
        Sign::Nonnegative => curv,
        Sign::Nonpositive => curv.negate(),
        Sign::Unknown if curv.is_affine() => curv,
        Sign::Unknown => Curvature::Unknown,
    }
}

/// Definiteness of a matrix-valued constant or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsdStatus {
    /// Positive semi-definite.
    Psd,
    /// Negative semi-definite.
    Nsd,
    /// Indefinite, non-symmetric or not known.
    Neither,
}

impl PsdStatus {
    /// Determine PSD status of concrete data.
    pub fn of_array(arr: &Array) -> Self {
        match arr.is_psd() {
            Some(true) => PsdStatus::Psd,
            Some(false) if arr.neg().is_psd() == Some(true) => PsdStatus::Nsd,
            _ => PsdStatus::Neither,
        }
    }

    /// Determine PSD status of an expression.
    ///
    /// Constants are inspected numerically. Parameters are judged by their
    /// attribute only, so the verdict does not change when their value does.
    pub fn of_expr(expr: &Expr) -> Self {
        match expr {
            Expr::Constant(c) => PsdStatus::of_array(&c.value),
            Expr::Parameter(p) => match p.attr {
                Attribute::Psd => PsdStatus::Psd,
                Attribute::Nonneg if p.shape.size() == 1 => PsdStatus::Psd,
                Attribute::Nonpos if p.shape.size() == 1 => PsdStatus::Nsd,
                _ => PsdStatus::Neither,
            },
            _ => PsdStatus::Neither,
        }
    }
}

impl Expr {
    /// Get the curvature of this expression.
    pub fn curvature(&self) -> Curvature {
        match self {
            Expr::Variable(_) => Curvature::Affine,
            Expr::Constant(_) | Expr::Parameter(_) => Curvature::Constant,
            Expr::Atom(atom) => atom.curvature(),
        }
    }

    /// Check if this expression is convex.
    pub fn is_convex(&self) -> bool {
        self.curvature().is_convex()
    }

    /// Check if this expression is concave.
    pub fn is_concave(&self) -> bool {
        self.curvature().is_concave()
    }

    /// Check if this expression is affine.
    pub fn is_affine(&self) -> bool {
        self.curvature().is_affine()
    }
}

/// `curv` if the argument is affine, else unknown.
fn of_affine(arg: &Expr, curv: Curvature) -> Curvature {
    if arg.is_affine() {
        curv
    } else {
        Curvature::Unknown
    }
}

impl Atom {
    fn curvature(&self) -> Curvature {
        let arg = |i: usize| self.args[i].as_ref();
        match &self.op {
            Op::Add => add_curvature(arg(0).curvature(), arg(1).curvature()),
            Op::Neg => arg(0).curvature().negate(),
            Op::Mul | Op::MatMul => product_curvature(arg(0), arg(1)),
            Op::Sum(_) | Op::Reshape(_) | Op::Index(_) | Op::Transpose | Op::Trace => {
                arg(0).curvature()
            }
            Op::VStack | Op::HStack => combine_all_curvatures(&self.args),

            Op::Norm1 | Op::Norm2 | Op::NormInf | Op::Abs | Op::SumSquares | Op::Exp => {
                of_affine(arg(0), Curvature::Convex)
            }
            // max(x, 0) is increasing, max(-x, 0) decreasing.
            Op::Pos if arg(0).is_convex() => Curvature::Convex,
            Op::NegPart if arg(0).is_concave() => Curvature::Convex,
            Op::Pos | Op::NegPart => Curvature::Unknown,
            Op::Maximum if self.args.iter().all(|e| e.is_convex()) => Curvature::Convex,
            Op::Minimum if self.args.iter().all(|e| e.is_concave()) => Curvature::Concave,
            Op::Maximum | Op::Minimum => Curvature::Unknown,
            Op::QuadForm => {
                if arg(0).is_constant() {
                    return arg(1).curvature();
                }
                let curv = match PsdStatus::of_expr(arg(1)) {
                    PsdStatus::Psd => Curvature::Convex,
                    PsdStatus::Nsd => Curvature::Concave,
                    PsdStatus::Neither => Curvature::Unknown,
                };
                of_affine(arg(0), curv)
            }
            Op::QuadOverLin => {
                if arg(0).is_affine() && arg(1).is_concave() {
                    Curvature::Convex
                } else {
                    Curvature::Unknown
                }
            }
            Op::Log if arg(0).is_concave() => Curvature::Concave,
            Op::Log => Curvature::Unknown,
            Op::Power(p) => {
                let p = *p;
                if p == 0.0 {
                    Curvature::Constant
                } else if p == 1.0 {
                    arg(0).curvature()
                } else if p > 1.0 || p < 0.0 {
                    of_affine(arg(0), Curvature::Convex)
                } else if p > 0.0 && p < 1.0 {
                    of_affine(arg(0), Curvature::Concave)
                } else {
                    Curvature::Unknown
                }
            }
        }
    }
}

impl Expr {
    fn is_constant_curvature(&self) -> bool {
        self.curvature().is_constant()
    }
}

/// Curvature of an elementwise or matrix product.
///
/// One side must be constant (a constant leaf, a parameter, or a tree of
/// them); its sign decides whether the other side's curvature is kept or
/// flipped.
fn product_curvature(a: &Expr, b: &Expr) -> Curvature {
    match (a.is_constant_curvature(), b.is_constant_curvature()) {
        (true, true) => Curvature::Constant,
        (true, false) => scaled_curvature(a.sign(), b.curvature()),
        (false, true) => scaled_curvature(b.sign(), a.curvature()),
        (false, false) => Curvature::Unknown,
    }
}

/// Combine curvatures for stacking operations.
fn combine_all_curvatures(exprs: &[Arc<Expr>]) -> Curvature {
    exprs
        .iter()
        .map(|e| e.curvature())
        .fold(Curvature::Constant, add_curvature)
}
