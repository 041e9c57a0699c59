//! Sign tracking for DCP (Disciplined Convex Programming).
//!
//! This module tracks whether expressions are non-negative, non-positive,
//! or have unknown sign. Sign information is used in DCP composition rules.
//! Variables and parameters take their sign from their declared attribute,
//! never from their current value.

use std::sync::Arc;

use super::curvature::PsdStatus;
use crate::expr::{Array, Atom, Attribute, Expr, Op};

/// Sign of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    /// Expression is always >= 0.
    Nonnegative,
    /// Expression is always <= 0.
    Nonpositive,
    /// Expression is always == 0.
    Zero,
    /// Sign is unknown.
    Unknown,
}

impl Sign {
    /// Sign implied by a declared attribute.
    pub fn from_attr(attr: Attribute) -> Self {
        match attr {
            Attribute::Nonneg => Sign::Nonnegative,
            Attribute::Nonpos => Sign::Nonpositive,
            Attribute::Psd | Attribute::Unconstrained => Sign::Unknown,
        }
    }

    /// Sign of concrete data.
    pub fn of_array(value: &Array) -> Self {
        match (value.is_nonneg(), value.is_nonpos()) {
            (true, true) => Sign::Zero,
            (true, false) => Sign::Nonnegative,
            (false, true) => Sign::Nonpositive,
            (false, false) => Sign::Unknown,
        }
    }

    /// Check if the sign is non-negative (>= 0).
    pub fn is_nonneg(self) -> bool {
        matches!(self, Sign::Nonnegative | Sign::Zero)
    }

    /// Check if the sign is non-positive (<= 0).
    pub fn is_nonpos(self) -> bool {
        matches!(self, Sign::Nonpositive | Sign::Zero)
    }

    pub fn is_zero(self) -> bool {
        matches!(self, Sign::Zero)
    }

    /// Negate the sign.
    pub fn negate(self) -> Self {
        match self {
            Sign::Nonnegative => Sign::Nonpositive,
            Sign::Nonpositive => Sign::Nonnegative,
            other => other,
        }
    }
}

/// Combine signs for addition: a + b.
pub fn add_sign(a: Sign, b: Sign) -> Sign {
    use Sign::*;
    match (a, b) {
        (Zero, x) | (x, Zero) => x,
        (Nonnegative, Nonnegative) => Nonnegative,
        (Nonpositive, Nonpositive) => Nonpositive,
        _ => Unknown,
    }
}

/// Combine signs for multiplication: a * b.
pub fn mul_sign(a: Sign, b: Sign) -> Sign {
    use Sign::*;
    match (a, b) {
        (Zero, _) | (_, Zero) => Zero,
        (Nonnegative, Nonnegative) | (Nonpositive, Nonpositive) => Nonnegative,
        (Nonnegative, Nonpositive) | (Nonpositive, Nonnegative) => Nonpositive,
        (Unknown, _) | (_, Unknown) => Unknown,
    }
}

impl Expr {
    /// Get the sign of this expression.
    pub fn sign(&self) -> Sign {
        match self {
            Expr::Variable(v) => Sign::from_attr(v.attr),
            Expr::Parameter(p) => Sign::from_attr(p.attr),
            Expr::Constant(c) => Sign::of_array(&c.value),
            Expr::Atom(atom) => atom.sign(),
        }
    }

    /// Check if this expression is non-negative.
    pub fn is_nonneg(&self) -> bool {
        self.sign().is_nonneg()
    }

    /// Check if this expression is non-positive.
    pub fn is_nonpos(&self) -> bool {
        self.sign().is_nonpos()
    }
}

impl Atom {
    fn sign(&self) -> Sign {
        let arg = |i: usize| self.args[i].sign();
        match &self.op {
            Op::Add => add_sign(arg(0), arg(1)),
            Op::Neg => arg(0).negate(),
            // Products of same-signed factors keep their sign pattern for
            // matrix products as well.
            Op::Mul | Op::MatMul => mul_sign(arg(0), arg(1)),
            Op::Sum(_) | Op::Reshape(_) | Op::Index(_) | Op::Transpose | Op::Trace => arg(0),
            Op::VStack | Op::HStack => combine_signs(&self.args),

            Op::Norm1
            | Op::Norm2
            | Op::NormInf
            | Op::Abs
            | Op::Pos
            | Op::NegPart
            | Op::SumSquares
            | Op::QuadOverLin
            | Op::Exp => Sign::Nonnegative,
            Op::Maximum => {
                if self.args.iter().any(|e| e.is_nonneg()) {
                    Sign::Nonnegative
                } else if self.args.iter().all(|e| e.is_nonpos()) {
                    Sign::Nonpositive
                } else {
                    Sign::Unknown
                }
            }
            Op::Minimum => {
                if self.args.iter().any(|e| e.is_nonpos()) {
                    Sign::Nonpositive
                } else if self.args.iter().all(|e| e.is_nonneg()) {
                    Sign::Nonnegative
                } else {
                    Sign::Unknown
                }
            }
            Op::QuadForm => match PsdStatus::of_expr(&self.args[1]) {
                PsdStatus::Psd => Sign::Nonnegative,
                PsdStatus::Nsd => Sign::Nonpositive,
                PsdStatus::Neither => Sign::Unknown,
            },
            // log(x) changes sign at x = 1.
            Op::Log => Sign::Unknown,
            Op::Power(p) => {
                if *p == 0.0 || arg(0).is_nonneg() {
                    Sign::Nonnegative
                } else {
                    Sign::Unknown
                }
            }
        }
    }
}

/// Combine signs for stacking/concatenation.
fn combine_signs(exprs: &[Arc<Expr>]) -> Sign {
    let signs: Vec<Sign> = exprs.iter().map(|e| e.sign()).collect();
    if signs.iter().all(|s| s.is_zero()) {
        Sign::Zero
    } else if signs.iter().all(|s| s.is_nonneg()) {
        Sign::Nonnegative
    } else if signs.iter().all(|s| s.is_nonpos()) {
        Sign::Nonpositive
    } else {
        Sign::Unknown
    }
}
