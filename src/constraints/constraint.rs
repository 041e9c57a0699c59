//! Constraint types for optimization problems.
//!
//! Every constraint is one of five relational forms:
//! - Inequality: lhs <= rhs, with both sides kept as written
//! - NonNeg: expr >= 0 (nonnegative orthant)
//! - NonPos: expr <= 0 (nonpositive orthant)
//! - Psd: expr is positive semi-definite (PSD cone)
//! - Zero: expr == 0 (zero cone / equality)

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::expr::{Expr, ExprId, VariableData};

/// A constraint in an optimization problem.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// General inequality `lhs <= rhs`.
    Inequality {
        /// The smaller side.
        lhs: Arc<Expr>,
        /// The larger side.
        rhs: Arc<Expr>,
    },

    /// Nonnegative orthant: expr >= 0.
    NonNeg(Arc<Expr>),

    /// Nonpositive orthant: expr <= 0.
    NonPos(Arc<Expr>),

    /// PSD cone: the square matrix expr is positive semi-definite.
    Psd(Arc<Expr>),

    /// Equality constraint: expr == 0.
    Zero(Arc<Expr>),
}

impl Constraint {
    /// Create an equality constraint: lhs == rhs.
    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Constraint::Zero(Arc::new(lhs - rhs))
    }

    /// Create an inequality constraint: lhs <= rhs.
    pub fn leq(lhs: Expr, rhs: Expr) -> Self {
        Constraint::Inequality {
            lhs: Arc::new(lhs),
            rhs: Arc::new(rhs),
        }
    }

    /// Create an inequality constraint: lhs >= rhs, stored as rhs <= lhs.
    pub fn geq(lhs: Expr, rhs: Expr) -> Self {
        Constraint::leq(rhs, lhs)
    }

    /// Create a nonnegative orthant constraint: expr >= 0.
    pub fn nonneg(expr: Expr) -> Self {
        Constraint::NonNeg(Arc::new(expr))
    }

    /// Create a nonpositive orthant constraint: expr <= 0.
    pub fn nonpos(expr: Expr) -> Self {
        Constraint::NonPos(Arc::new(expr))
    }

    /// Create a PSD cone constraint: expr >> 0.
    pub fn psd(expr: Expr) -> Self {
        Constraint::Psd(Arc::new(expr))
    }

    /// Short name of the constraint kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Constraint::Inequality { .. } => "inequality",
            Constraint::NonNeg(_) => "nonneg",
            Constraint::NonPos(_) => "nonpos",
            Constraint::Psd(_) => "psd",
            Constraint::Zero(_) => "zero",
        }
    }

    /// Check if this constraint is DCP-compliant.
    ///
    /// - Inequality: convex <= concave
    /// - NonNeg: expression must be concave
    /// - NonPos: expression must be convex
    /// - Psd, Zero: expression must be affine
    pub fn is_dcp(&self) -> bool {
        match self {
            Constraint::Inequality { lhs, rhs } => lhs.is_convex() && rhs.is_concave(),
            Constraint::NonNeg(expr) => expr.is_concave(),
            Constraint::NonPos(expr) => expr.is_convex(),
            Constraint::Psd(expr) | Constraint::Zero(expr) => expr.is_affine(),
        }
    }

    /// Get all expressions in this constraint.
    pub fn expressions(&self) -> Vec<&Expr> {
        match self {
            Constraint::Inequality { lhs, rhs } => vec![lhs.as_ref(), rhs.as_ref()],
            Constraint::NonNeg(e)
            | Constraint::NonPos(e)
            | Constraint::Psd(e)
            | Constraint::Zero(e) => vec![e.as_ref()],
        }
    }

    /// Get all variable IDs in this constraint.
    pub fn variables(&self) -> Vec<ExprId> {
        self.variable_data().into_iter().map(|v| v.id).collect()
    }

    /// Every distinct variable in this constraint, sorted by id.
    pub fn variable_data(&self) -> Vec<VariableData> {
        let mut found = BTreeMap::new();
        self.collect_variables(&mut found);
        found.into_values().collect()
    }

    pub(crate) fn collect_variables(&self, found: &mut BTreeMap<ExprId, VariableData>) {
        for expr in self.expressions() {
            expr.collect_variables(found);
        }
    }

    /// Get all parameter IDs in this constraint.
    pub fn parameters(&self) -> Vec<ExprId> {
        let mut ids: Vec<ExprId> = self
            .expressions()
            .into_iter()
            .flat_map(|e| e.parameters())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Extension trait for creating constraints from expressions.
pub trait ConstraintExt {
    /// Create equality constraint: self == rhs.
    fn equals(&self, rhs: &Expr) -> Constraint;

    /// Create inequality constraint: self <= rhs.
    fn leq(&self, rhs: &Expr) -> Constraint;

    /// Create inequality constraint: self >= rhs.
    fn geq(&self, rhs: &Expr) -> Constraint;

    /// Create PSD constraint: self - rhs is positive semi-definite.
    fn succeq(&self, rhs: &Expr) -> Constraint;
}

impl ConstraintExt for Expr {
    fn equals(&self, rhs: &Expr) -> Constraint {
        Constraint::eq(self.clone(), rhs.clone())
    }

    fn leq(&self, rhs: &Expr) -> Constraint {
        Constraint::leq(self.clone(), rhs.clone())
    }

    fn geq(&self, rhs: &Expr) -> Constraint {
        Constraint::geq(self.clone(), rhs.clone())
    }

    fn succeq(&self, rhs: &Expr) -> Constraint {
        Constraint::psd(self - rhs)
    }
}
