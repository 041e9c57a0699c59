//! Problem definition.
//!
//! The `Problem` struct represents an optimization problem with:
//! - An objective (minimize or maximize)
//! - A set of constraints
//!
//! Use the builder pattern to construct problems:
//! ```ignore
//! let problem = Problem::minimize(objective)
//!     .subject_to([constraint1, constraint2])
//!     .build();
//! ```

use std::collections::BTreeMap;

use crate::constraints::Constraint;
use crate::error::{DmcpError, Result};
use crate::expr::{Expr, ExprId, VariableData};

/// Objective type for optimization problems.
#[derive(Debug, Clone)]
pub enum Objective {
    /// Minimize the expression.
    Minimize(Expr),
    /// Maximize the expression.
    Maximize(Expr),
}

impl Objective {
    /// Get the expression being optimized.
    pub fn expr(&self) -> &Expr {
        match self {
            Objective::Minimize(e) | Objective::Maximize(e) => e,
        }
    }

    /// Check if this is a minimization.
    pub fn is_minimize(&self) -> bool {
        matches!(self, Objective::Minimize(_))
    }

    /// Same sense, different expression.
    pub fn with_expr(&self, expr: Expr) -> Objective {
        match self {
            Objective::Minimize(_) => Objective::Minimize(expr),
            Objective::Maximize(_) => Objective::Maximize(expr),
        }
    }
}

/// An optimization problem.
#[derive(Debug, Clone)]
pub struct Problem {
    /// The objective to optimize.
    pub objective: Objective,
    /// The constraints, in the order they were given.
    pub constraints: Vec<Constraint>,
}

impl Problem {
    /// Create a problem from its parts.
    pub fn new(objective: Objective, constraints: Vec<Constraint>) -> Self {
        Problem {
            objective,
            constraints,
        }
    }

    /// Create a minimization problem.
    pub fn minimize(expr: Expr) -> ProblemBuilder {
        ProblemBuilder {
            objective: Objective::Minimize(expr),
            constraints: Vec::new(),
        }
    }

    /// Create a maximization problem.
    pub fn maximize(expr: Expr) -> ProblemBuilder {
        ProblemBuilder {
            objective: Objective::Maximize(expr),
            constraints: Vec::new(),
        }
    }

    /// Check if this problem is DCP-compliant.
    ///
    /// A problem is DCP if:
    /// - Minimize: objective is convex
    /// - Maximize: objective is concave
    /// - All constraints are DCP
    pub fn is_dcp(&self) -> bool {
        self.objective_is_dcp() && self.constraints.iter().all(|c| c.is_dcp())
    }

    /// Like `is_dcp`, but report what is wrong.
    pub fn check_dcp(&self) -> Result<()> {
        if self.is_dcp() {
            Ok(())
        } else {
            Err(DmcpError::NotDcp(self.dcp_violation_message()))
        }
    }

    fn objective_is_dcp(&self) -> bool {
        match &self.objective {
            Objective::Minimize(e) => e.is_convex(),
            Objective::Maximize(e) => e.is_concave(),
        }
    }

    /// Get all variable IDs in this problem.
    pub fn variables(&self) -> Vec<ExprId> {
        self.variable_data().into_iter().map(|v| v.id).collect()
    }

    /// Every distinct variable in the objective and constraints, sorted by id.
    pub fn variable_data(&self) -> Vec<VariableData> {
        let mut found = BTreeMap::new();
        self.objective.expr().collect_variables(&mut found);
        for c in &self.constraints {
            c.collect_variables(&mut found);
        }
        found.into_values().collect()
    }

    /// Get all parameter IDs in this problem.
    pub fn parameters(&self) -> Vec<ExprId> {
        let mut ids = self.objective.expr().parameters();
        ids.extend(self.constraints.iter().flat_map(|c| c.parameters()));
        ids.sort();
        ids.dedup();
        ids
    }

    fn dcp_violation_message(&self) -> String {
        let mut violations = Vec::new();

        if !self.objective_is_dcp() {
            let (curvature, needed) = match &self.objective {
                Objective::Minimize(e) => (e.curvature(), "convex for minimization"),
                Objective::Maximize(e) => (e.curvature(), "concave for maximization"),
            };
            violations.push(format!(
                "Objective has curvature {:?} but must be {}",
                curvature, needed
            ));
        }

        for (i, c) in self.constraints.iter().enumerate() {
            if !c.is_dcp() {
                violations.push(format!("Constraint {} ({}) is not DCP", i, c.kind()));
            }
        }

        violations.join("; ")
    }
}

/// Builder for constructing problems.
#[derive(Debug, Clone)]
pub struct ProblemBuilder {
    objective: Objective,
    constraints: Vec<Constraint>,
}

impl ProblemBuilder {
    /// Add constraints to the problem.
    pub fn subject_to(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    /// Add a single constraint.
    pub fn constraint(mut self, c: Constraint) -> Self {
        self.constraints.push(c);
        self
    }

    /// Build the problem.
    pub fn build(self) -> Problem {
        Problem::new(self.objective, self.constraints)
    }
}
