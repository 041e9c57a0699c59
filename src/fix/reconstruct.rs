//! Rebuilding constraints and problems over substituted expressions.

use std::collections::BTreeSet;

use crate::constraints::Constraint;
use crate::error::Result;
use crate::expr::{ExprId, ParameterData};
use crate::problem::Problem;

use super::substitute::Substitution;

impl Substitution {
    /// Substitute into a constraint, keeping its kind.
    ///
    /// Both sides of an inequality are substituted independently; the
    /// orthant, cone and equality forms substitute their single operand.
    pub fn constraint(&self, constraint: &Constraint) -> Result<Constraint> {
        Ok(match constraint {
            Constraint::Inequality { lhs, rhs } => Constraint::Inequality {
                lhs: self.arg(lhs)?,
                rhs: self.arg(rhs)?,
            },
            Constraint::NonNeg(expr) => Constraint::NonNeg(self.arg(expr)?),
            Constraint::NonPos(expr) => Constraint::NonPos(self.arg(expr)?),
            Constraint::Psd(expr) => Constraint::Psd(self.arg(expr)?),
            Constraint::Zero(expr) => Constraint::Zero(self.arg(expr)?),
        })
    }

    /// Substitute into the objective and every constraint, in order.
    pub fn problem(&self, problem: &Problem) -> Result<Problem> {
        let objective = problem
            .objective
            .with_expr(self.expr(problem.objective.expr())?);
        let constraints = problem
            .constraints
            .iter()
            .map(|c| self.constraint(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Problem::new(objective, constraints))
    }
}

/// Rebuild `problem` with every variable in `fix_ids` replaced by its parameter.
///
/// The objective sense and the kind and order of every constraint are kept.
pub fn reconstruct(
    problem: &Problem,
    fix_ids: &BTreeSet<ExprId>,
    parameters: &[ParameterData],
) -> Result<Problem> {
    Substitution::new(fix_ids.clone(), parameters.to_vec()).problem(problem)
}
