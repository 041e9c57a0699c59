//! Fixing variables.
//!
//! Fixing freezes a set of variables at their current values. Each fixed
//! variable is replaced by a parameter with the same id, shape, name and
//! attribute, carrying the value adjusted to the attribute's sign. The result
//! is a new expression, constraint or problem; the input is left untouched.
//!
//! A nonconvex problem such as `minimize x * y` becomes DCP once one factor is
//! fixed, which is how alternating schemes take their convex steps:
//!
//! ```ignore
//! let x = VariableBuilder::scalar().nonneg().value(2.0).build();
//! let y = variable(());
//! let problem = Problem::minimize(&x * &y).constraint(y.geq(&constant(1.0))).build();
//! assert!(!problem.is_dcp());
//!
//! let step = problem.fix([&x])?;
//! assert!(step.is_dcp());
//! ```
//!
//! The pieces are exposed separately: [`synthesize`] builds the parameters,
//! [`substitute`] rewrites one expression tree and [`reconstruct`] rebuilds a
//! problem constraint by constraint.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::constraints::Constraint;
use crate::error::{DmcpError, Result};
use crate::expr::{Expr, ExprId, VariableData};
use crate::problem::Problem;

mod reconstruct;
mod substitute;
mod synthesize;

pub use reconstruct::reconstruct;
pub use substitute::{substitute, Substitution};
pub use synthesize::{parameter_for, synthesize};

/// Objects whose variables can be fixed.
pub trait Fixable {
    /// What fixing produces.
    type Output;

    /// Every distinct variable reachable from this object, sorted by id.
    fn reachable_variables(&self) -> Vec<VariableData>;

    /// Rebuild this object through `subst`.
    fn apply(&self, subst: &Substitution) -> Result<Self::Output>;

    /// Fix `vars` at their current values. See [`fix`].
    fn fix<'a, I>(&self, vars: I) -> Result<Self::Output>
    where
        I: IntoIterator<Item = &'a Expr>,
    {
        fix(self, vars)
    }
}

impl Fixable for Expr {
    type Output = Expr;

    fn reachable_variables(&self) -> Vec<VariableData> {
        self.variable_data()
    }

    fn apply(&self, subst: &Substitution) -> Result<Expr> {
        subst.expr(self)
    }
}

impl Fixable for Constraint {
    type Output = Constraint;

    fn reachable_variables(&self) -> Vec<VariableData> {
        self.variable_data()
    }

    fn apply(&self, subst: &Substitution) -> Result<Constraint> {
        subst.constraint(self)
    }
}

impl Fixable for Problem {
    type Output = Problem;

    fn reachable_variables(&self) -> Vec<VariableData> {
        self.variable_data()
    }

    fn apply(&self, subst: &Substitution) -> Result<Problem> {
        subst.problem(self)
    }
}

/// Collect the ids of a fix list.
///
/// # Errors
///
/// `UnsupportedInput` if an entry is not a variable leaf.
pub fn fix_ids<'a, I>(vars: I) -> Result<BTreeSet<ExprId>>
where
    I: IntoIterator<Item = &'a Expr>,
{
    vars.into_iter()
        .map(|v| match v {
            Expr::Variable(data) => Ok(data.id),
            Expr::Parameter(p) => Err(DmcpError::UnsupportedInput(format!(
                "cannot fix parameter {}; only variables can be fixed",
                p.id.raw()
            ))),
            Expr::Constant(_) => Err(DmcpError::UnsupportedInput(
                "cannot fix a constant; only variables can be fixed".into(),
            )),
            Expr::Atom(atom) => Err(DmcpError::UnsupportedInput(format!(
                "cannot fix a {} expression; only variables can be fixed",
                atom.op.name()
            ))),
        })
        .collect()
}

/// Replace `vars` in `obj` by parameters holding their current values.
///
/// Parameters are synthesized for every variable reachable from `obj`, then
/// only the ones in `vars` are substituted. Variables in `vars` that do not
/// occur in `obj` are ignored. Unset variables freeze to zero.
///
/// # Errors
///
/// `UnsupportedInput` if `vars` contains anything but variables.
pub fn fix<'a, T, I>(obj: &T, vars: I) -> Result<T::Output>
where
    T: Fixable + ?Sized,
    I: IntoIterator<Item = &'a Expr>,
{
    let ids = fix_ids(vars)?;
    let reachable = obj.reachable_variables();

    let absent: Vec<u64> = ids
        .iter()
        .filter(|id| reachable.binary_search_by_key(*id, |v| v.id).is_err())
        .map(|id| id.raw())
        .collect();
    if !absent.is_empty() {
        warn!(
            component = "fix",
            operation = "fix",
            status = "ignored",
            var_ids = ?absent,
            "Fix list names variables that do not occur"
        );
    }

    let parameters = synthesize(reachable);
    debug!(
        component = "fix",
        operation = "fix",
        status = "start",
        num_fixed = ids.len(),
        num_parameters = parameters.len(),
        "Fixing variables"
    );

    let out = obj.apply(&Substitution::new(ids, parameters))?;
    debug!(
        component = "fix",
        operation = "fix",
        status = "success",
        "Fixed variables"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{norm2, sum};
    use crate::constraints::ConstraintExt;
    use crate::expr::{constant, parameter, variable, VariableBuilder};

    #[test]
    fn test_fix_ids_sorted_and_deduped() {
        let x = variable(());
        let y = variable(());
        let ids = fix_ids([&y, &x, &y]).unwrap();
        let expected: Vec<_> = [&x, &y].iter().filter_map(|e| e.variable_id()).collect();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_fix_ids_rejects_non_variables() {
        let x = variable(2);
        for bad in [constant(1.0), parameter(1.0), sum(&x)] {
            match fix_ids([&x, &bad]) {
                Err(DmcpError::UnsupportedInput(msg)) => assert!(msg.contains("only variables")),
                other => panic!("Expected UnsupportedInput, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_fix_expr() {
        let x = VariableBuilder::vector(2).value(vec![3.0, 4.0]).build();
        let e = norm2(&x);
        let out = e.fix([&x]).unwrap();
        assert!(out.variables().is_empty());
        assert_eq!(out.parameters(), vec![x.variable_id().unwrap()]);
        assert!(out.is_convex());
    }

    #[test]
    fn test_fix_constraint() {
        let x = VariableBuilder::scalar().nonpos().value(5.0).build();
        let y = variable(());
        let c = x.leq(&y);
        let out = fix(&c, [&x]).unwrap();
        match out {
            Constraint::Inequality { lhs, rhs } => {
                assert_eq!(lhs.value().and_then(|v| v.as_scalar()), Some(-5.0));
                assert_eq!(rhs.variable_id(), y.variable_id());
            }
            other => panic!("Expected Inequality, got {}", other.kind()),
        }
    }

    #[test]
    fn test_absent_variable_ignored() {
        let x = variable(());
        let stray = variable(());
        let problem = Problem::minimize(x.clone()).build();
        let out = problem.fix([&stray]).unwrap();
        assert_eq!(out.variables(), vec![x.variable_id().unwrap()]);
        assert!(out.parameters().is_empty());
    }

    #[test]
    fn test_error_leaves_nothing_half_built() {
        let x = variable(());
        let problem = Problem::minimize(x.clone()).build();
        assert!(problem.fix([&x, &constant(0.0)]).is_err());
        assert_eq!(problem.variables(), vec![x.variable_id().unwrap()]);
    }
}
