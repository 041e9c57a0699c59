//! Expression tree substitution.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{trace, warn};

use crate::error::{DmcpError, Result};
use crate::expr::{Expr, ExprId, ParameterData};

/// Replacement context for one fix call.
///
/// Holds the ids to replace and the synthesized parameters, indexed by id.
/// The sorted parameter list is kept alongside the index for callers that
/// rely on its order.
#[derive(Debug, Clone)]
pub struct Substitution {
    fix_ids: BTreeSet<ExprId>,
    parameters: Vec<ParameterData>,
    by_id: HashMap<ExprId, Arc<Expr>>,
}

impl Substitution {
    pub fn new(fix_ids: BTreeSet<ExprId>, parameters: Vec<ParameterData>) -> Self {
        let by_id = parameters
            .iter()
            .map(|p| (p.id, Arc::new(Expr::Parameter(p.clone()))))
            .collect();
        Substitution {
            fix_ids,
            parameters,
            by_id,
        }
    }

    /// Ids of the variables being fixed.
    pub fn fix_ids(&self) -> &BTreeSet<ExprId> {
        &self.fix_ids
    }

    /// Synthesized parameters, sorted by id.
    pub fn parameters(&self) -> &[ParameterData] {
        &self.parameters
    }

    /// Substitute into an expression tree.
    ///
    /// Fixed variables become their parameter; other leaves are kept; every
    /// atom with arguments is rebuilt over substituted arguments in the same
    /// order. Shared subtrees are walked once per occurrence.
    pub fn expr(&self, expr: &Expr) -> Result<Expr> {
        match expr {
            Expr::Variable(v) if self.fix_ids.contains(&v.id) => {
                self.replacement(v.id).map(|p| p.as_ref().clone())
            }
            Expr::Atom(atom) if !atom.args.is_empty() => {
                let args = atom
                    .args
                    .iter()
                    .map(|a| self.arg(a))
                    .collect::<Result<Vec<_>>>()?;
                Ok(expr.with_args(args))
            }
            leaf => Ok(leaf.clone()),
        }
    }

    /// Substitute into a shared subtree, reusing the `Arc` for leaves that stay.
    pub(super) fn arg(&self, arg: &Arc<Expr>) -> Result<Arc<Expr>> {
        match arg.as_ref() {
            Expr::Variable(v) if self.fix_ids.contains(&v.id) => self.replacement(v.id),
            Expr::Atom(atom) if !atom.args.is_empty() => self.expr(arg).map(Arc::new),
            _ => Ok(Arc::clone(arg)),
        }
    }

    fn replacement(&self, id: ExprId) -> Result<Arc<Expr>> {
        match self.by_id.get(&id) {
            Some(param) => {
                trace!(
                    component = "fix",
                    operation = "substitute",
                    status = "success",
                    var_id = id.raw(),
                    "Replaced variable with parameter"
                );
                Ok(Arc::clone(param))
            }
            None => {
                warn!(
                    component = "fix",
                    operation = "substitute",
                    status = "error",
                    var_id = id.raw(),
                    num_parameters = self.parameters.len(),
                    "Fixed variable has no parameter"
                );
                Err(DmcpError::MissingSubstitution { id: id.raw() })
            }
        }
    }
}

/// Replace every variable in `fix_ids` with its parameter from `parameters`.
///
/// # Errors
///
/// `MissingSubstitution` if a fixed variable occurs in `expr` but no parameter
/// carries its id.
pub fn substitute(
    expr: &Expr,
    fix_ids: &BTreeSet<ExprId>,
    parameters: &[ParameterData],
) -> Result<Expr> {
    Substitution::new(fix_ids.clone(), parameters.to_vec()).expr(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{matmul, norm2, sum, vstack};
    use crate::expr::{constant, variable, Op};
    use crate::fix::synthesize::synthesize;

    fn ids(exprs: &[&Expr]) -> BTreeSet<ExprId> {
        exprs.iter().filter_map(|e| e.variable_id()).collect()
    }

    #[test]
    fn test_leaf_replacement() {
        let x = variable(3);
        x.set_value(vec![1.0, 2.0, 3.0]).unwrap();
        let params = synthesize(x.variable_data());

        let out = substitute(&x, &ids(&[&x]), &params).unwrap();
        assert_eq!(out.parameter_id(), x.variable_id());
        assert_eq!(out.value(), x.value());
    }

    #[test]
    fn test_unfixed_leaves_unchanged() {
        let x = variable(3);
        let c = constant(1.0);
        let params = synthesize(x.variable_data());

        let out = substitute(&x, &BTreeSet::new(), &params).unwrap();
        assert_eq!(out.variable_id(), x.variable_id());
        let out = substitute(&c, &ids(&[&x]), &params).unwrap();
        assert!(out.is_constant());
    }

    #[test]
    fn test_argument_order_preserved() {
        let a = variable((2, 3));
        let b = variable(3);
        let e = matmul(&a, &b);
        let params = synthesize(e.variable_data());

        let out = substitute(&e, &ids(&[&b]), &params).unwrap();
        match &out {
            Expr::Atom(atom) => {
                assert_eq!(atom.op, Op::MatMul);
                assert_eq!(atom.args[0].variable_id(), a.variable_id());
                assert_eq!(atom.args[1].parameter_id(), b.variable_id());
            }
            _ => panic!("Expected Atom"),
        }
        assert_eq!(out.shape(), e.shape());
    }

    #[test]
    fn test_shared_subtree_substituted_everywhere() {
        let x = variable(2);
        let y = variable(2);
        let shared = &x + &y;
        let e = vstack(vec![shared.clone(), norm2(&shared)]);
        let params = synthesize(e.variable_data());

        let out = substitute(&e, &ids(&[&x]), &params).unwrap();
        assert_eq!(out.variables(), vec![y.variable_id().unwrap()]);
        assert_eq!(out.parameters(), vec![x.variable_id().unwrap()]);
    }

    #[test]
    fn test_unreplaced_leaf_arc_is_shared() {
        let x = variable(2);
        let y = variable(2);
        let e = &x + &y;
        let params = synthesize(e.variable_data());

        let out = substitute(&e, &ids(&[&x]), &params).unwrap();
        assert!(Arc::ptr_eq(&e.args()[1], &out.args()[1]));
    }

    #[test]
    fn test_missing_parameter_is_an_error() {
        let x = variable(2);
        let y = variable(2);
        let e = sum(&(&x + &y));
        // Parameters synthesized only for y, but x is marked fixed.
        let params = synthesize(y.variable_data());

        let err = substitute(&e, &ids(&[&x]), &params).unwrap_err();
        match err {
            DmcpError::MissingSubstitution { id } => assert_eq!(id, x.variable_id().unwrap().raw()),
            other => panic!("Expected MissingSubstitution, got {:?}", other),
        }
    }

    #[test]
    fn test_input_not_mutated() {
        let x = variable(2);
        let e = norm2(&x);
        let params = synthesize(e.variable_data());
        let _ = substitute(&e, &ids(&[&x]), &params).unwrap();
        assert_eq!(e.variables(), vec![x.variable_id().unwrap()]);
        assert!(e.parameters().is_empty());
    }
}
