//! Tests for fixing variables in expressions, constraints and problems.

use dmcp::expr::ParameterData;
use dmcp::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Depth-first search for a parameter leaf.
fn find_parameter(expr: &Expr, id: ExprId) -> Option<ParameterData> {
    match expr {
        Expr::Parameter(p) if p.id == id => Some(p.clone()),
        Expr::Atom(atom) => atom.args.iter().find_map(|a| find_parameter(a, id)),
        _ => None,
    }
}

fn problem_parameter(problem: &Problem, id: ExprId) -> Option<ParameterData> {
    find_parameter(problem.objective.expr(), id).or_else(|| {
        problem
            .constraints
            .iter()
            .flat_map(|c| c.expressions())
            .find_map(|e| find_parameter(e, id))
    })
}

/// `out` has the same tree as `src`, with leaves in `fixed` swapped for
/// parameters of the same id.
fn assert_isomorphic(src: &Expr, out: &Expr, fixed: &[ExprId]) {
    match (src, out) {
        (Expr::Variable(v), Expr::Parameter(p)) => {
            assert!(fixed.contains(&v.id), "variable {:?} replaced but not fixed", v.id);
            assert_eq!(v.id, p.id);
            assert_eq!(v.shape, p.shape);
        }
        (Expr::Variable(a), Expr::Variable(b)) => {
            assert!(!fixed.contains(&a.id), "fixed variable {:?} survived", a.id);
            assert_eq!(a.id, b.id);
        }
        (Expr::Constant(a), Expr::Constant(b)) => assert_eq!(a.id, b.id),
        (Expr::Parameter(a), Expr::Parameter(b)) => assert_eq!(a.id, b.id),
        (Expr::Atom(a), Expr::Atom(b)) => {
            assert_eq!(a.op, b.op);
            assert_eq!(a.args.len(), b.args.len());
            for (x, y) in a.args.iter().zip(&b.args) {
                assert_isomorphic(x, y, fixed);
            }
        }
        (a, b) => panic!("Node kinds differ: {:?} vs {:?}", a, b),
    }
}

fn id(expr: &Expr) -> ExprId {
    expr.variable_id().expect("not a variable")
}

// ============================================================================
// Transform laws
// ============================================================================

#[test]
fn test_identity_preserved() {
    init_tracing();
    let x = variable(3);
    let y = variable(3);
    let z = variable(());
    let e = sum(&(&x + &y)) + &z;

    let out = e.fix([&x, &z]).unwrap();
    assert_eq!(out.parameters(), {
        let mut ids = vec![id(&x), id(&z)];
        ids.sort();
        ids
    });
    assert_eq!(out.variables(), vec![id(&y)]);
}

#[test]
fn test_structure_preserved() {
    init_tracing();
    let a = constant_dmatrix(nalgebra::DMatrix::from_row_slice(
        2,
        3,
        &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
    ));
    let x = variable(3);
    let t = variable(());
    let e = vstack(vec![
        norm2(&(matmul(&a, &x) - constant_vec(vec![1.0, 1.0]))) - &t,
        quad_over_lin(&x, &t),
    ]);

    let out = e.fix([&x]).unwrap();
    assert_isomorphic(&e, &out, &[id(&x)]);
    assert_eq!(out.shape(), e.shape());
}

#[test]
fn test_sign_adjustment() {
    init_tracing();
    let v = vec![-2.0, 0.5];
    let pos = VariableBuilder::vector(2).nonneg().value(v.clone()).build();
    let neg = VariableBuilder::vector(2).nonpos().value(v.clone()).build();
    let free = VariableBuilder::vector(2).value(v.clone()).build();
    let e = &(&pos + &neg) + &free;

    let out = e.fix([&pos, &neg, &free]).unwrap();
    let value = |x: &Expr| find_parameter(&out, id(x)).unwrap().value;
    assert_eq!(value(&pos), Array::from_vec(vec![2.0, 0.5]));
    assert_eq!(value(&neg), Array::from_vec(vec![-2.0, -0.5]));
    assert_eq!(value(&free), Array::from_vec(v));

    // Source values are not touched.
    assert_eq!(pos.value(), Some(Array::from_vec(vec![-2.0, 0.5])));
}

#[test]
fn test_sign_adjustment_sparse() {
    init_tracing();
    let mut coo = nalgebra_sparse::CooMatrix::new(2, 2);
    coo.push(0, 0, -3.0);
    coo.push(1, 1, 4.0);
    let v = nalgebra_sparse::CscMatrix::from(&coo);

    let x = VariableBuilder::matrix(2, 2).nonneg().value(v.clone()).build();
    let y = VariableBuilder::matrix(2, 2).nonpos().value(v.clone()).build();
    let e = &(&x + &y) + &constant_sparse(v);

    let out = e.fix([&x, &y]).unwrap();
    let fx = find_parameter(&out, id(&x)).unwrap().value;
    let fy = find_parameter(&out, id(&y)).unwrap().value;
    assert!(matches!(fx, Array::Sparse(_)));
    assert!(matches!(fy, Array::Sparse(_)));
    assert_eq!(
        fx.to_dense(),
        nalgebra::DMatrix::from_row_slice(2, 2, &[3.0, 0.0, 0.0, 4.0])
    );
    assert_eq!(
        fy.to_dense(),
        nalgebra::DMatrix::from_row_slice(2, 2, &[-3.0, 0.0, 0.0, -4.0])
    );
    assert!(out.is_affine());
}

#[test]
fn test_unfixed_variable_shares_value() {
    init_tracing();
    let x = variable(());
    let y = variable(());
    let out = (&x + &y).fix([&x]).unwrap();

    let y_out = out.args()[1].clone();
    assert_eq!(y_out.variable_id(), Some(id(&y)));
    y.set_value(7.0).unwrap();
    assert_eq!(y_out.value().and_then(|v| v.as_scalar()), Some(7.0));
}

#[test]
fn test_empty_fix_list_is_identity() {
    init_tracing();
    let x = VariableBuilder::vector(2).nonneg().value(vec![1.0, 2.0]).build();
    let problem = Problem::minimize(norm1(&x))
        .constraint(sum(&x).leq(&constant(4.0)))
        .build();

    let out = problem.fix(std::iter::empty::<&Expr>()).unwrap();
    assert_eq!(out.variables(), problem.variables());
    assert!(out.parameters().is_empty());
    assert_isomorphic(problem.objective.expr(), out.objective.expr(), &[]);
}

#[test]
fn test_constraint_kinds_round_trip() {
    init_tracing();
    let x = variable(2);
    let m = psd_variable(2);
    let problem = Problem::minimize(sum(&x))
        .subject_to([
            x.leq(&constant(1.0)),
            x.geq(&constant(-1.0)),
            Constraint::nonneg(x.clone()),
            Constraint::nonpos(-&x),
            m.succeq(&eye(2)),
            x.equals(&constant_vec(vec![0.0, 0.0])),
        ])
        .build();

    let out = problem.fix([&x, &m]).unwrap();
    let kinds = |p: &Problem| p.constraints.iter().map(|c| c.kind()).collect::<Vec<_>>();
    assert_eq!(kinds(&out), kinds(&problem));
    for (src, fixed) in problem.constraints.iter().zip(&out.constraints) {
        for (a, b) in src.expressions().into_iter().zip(fixed.expressions()) {
            assert_isomorphic(a, b, &[id(&x), id(&m)]);
        }
    }
    assert!(out.variables().is_empty());
}

// ============================================================================
// Problems
// ============================================================================

#[test]
fn test_fix_one_of_two() {
    init_tracing();
    let x = VariableBuilder::scalar().nonneg().name("x").value(3.0).build();
    let y = variable(());
    let problem = Problem::minimize(&x + &y)
        .subject_to([
            Constraint::nonneg(x.clone()),
            (&x + &y).leq(&constant(10.0)),
        ])
        .build();

    let out = problem.fix([&x]).unwrap();
    assert!(out.objective.is_minimize());
    assert_eq!(out.variables(), vec![id(&y)]);
    assert_eq!(out.parameters(), vec![id(&x)]);

    let p = problem_parameter(&out, id(&x)).unwrap();
    assert_eq!(p.value.as_scalar(), Some(3.0));
    assert_eq!(p.attr, Attribute::Nonneg);
    assert_eq!(p.name.as_deref(), Some("x"));

    match &out.constraints[0] {
        Constraint::NonNeg(e) => assert_eq!(e.parameter_id(), Some(id(&x))),
        other => panic!("Expected NonNeg, got {}", other.kind()),
    }
    assert!(out.is_dcp());
}

#[test]
fn test_fix_all_unset_is_zero() {
    init_tracing();
    let x = VariableBuilder::scalar().nonneg().value(3.0).build();
    let y = variable(());
    let problem = Problem::minimize(&x + &y)
        .subject_to([(&x + &y).leq(&constant(10.0))])
        .build();

    let out = problem.fix([&x, &y]).unwrap();
    assert!(out.variables().is_empty());
    let py = problem_parameter(&out, id(&y)).unwrap();
    assert!(py.value.is_zero());
    assert_eq!(py.attr, Attribute::Unconstrained);
    assert_eq!(
        problem_parameter(&out, id(&x)).unwrap().value.as_scalar(),
        Some(3.0)
    );
}

#[test]
fn test_bilinear_becomes_dcp() {
    init_tracing();
    let x = VariableBuilder::vector(2).nonneg().value(vec![1.0, 2.0]).build();
    let y = VariableBuilder::vector(2).nonneg().build();
    let problem = Problem::minimize(sum(&(&x * &y)))
        .subject_to([sum(&y).geq(&constant(1.0))])
        .build();
    assert!(matches!(problem.check_dcp(), Err(DmcpError::NotDcp(_))));

    let step_y = problem.fix([&x]).unwrap();
    assert!(step_y.check_dcp().is_ok());
    let step_x = problem.fix([&y]).unwrap();
    assert!(step_x.is_dcp());
}

#[test]
fn test_maximize_sense_kept() {
    init_tracing();
    let x = VariableBuilder::scalar().value(1.5).build();
    let y = variable(());
    let problem = Problem::maximize(&x - &y)
        .constraint(y.geq(&constant(0.0)))
        .build();

    let out = fix(&problem, [&x]).unwrap();
    assert!(!out.objective.is_minimize());
    assert!(out.is_dcp());
}

#[test]
fn test_fix_list_rejects_non_variable() {
    init_tracing();
    let x = variable(2);
    let problem = Problem::minimize(sum(&x)).build();
    let not_a_variable = sum(&x);

    match problem.fix([&x, &not_a_variable]) {
        Err(DmcpError::UnsupportedInput(msg)) => assert!(msg.contains("sum")),
        other => panic!("Expected UnsupportedInput, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_each_call_snapshots_current_value() {
    init_tracing();
    let x = VariableBuilder::scalar().nonneg().value(3.0).build();
    let y = variable(());
    let problem = Problem::minimize(&x * &y)
        .constraint(y.geq(&constant(1.0)))
        .build();

    let first = problem.fix([&x]).unwrap();
    x.set_value(-2.0).unwrap();
    let second = problem.fix([&x]).unwrap();

    let value = |p: &Problem| problem_parameter(p, id(&x)).unwrap().value.as_scalar();
    assert_eq!(value(&first), Some(3.0));
    assert_eq!(value(&second), Some(2.0));
}

#[test]
fn test_fix_slice_of_variables() {
    init_tracing();
    let vars: Vec<Expr> = (0..3).map(|_| variable(2)).collect();
    let e = vstack(vars.clone());

    let out = e.fix(&vars[..2]).unwrap();
    assert_eq!(out.variables(), vec![id(&vars[2])]);
    assert_eq!(out.parameters().len(), 2);
}
