//! # dmcp
//!
//! Disciplined multi-convex programming on top of a DCP expression layer.
//!
//! A multi-convex problem becomes convex once some of its variables are held
//! constant. dmcp builds problems out of expression trees, checks them against
//! the DCP rules and provides the transform that holds variables constant:
//! [`fix`] replaces chosen variables by parameters carrying their current
//! values and rebuilds the expression, constraint or problem around them.
//!
//! ## Quick Start
//!
//! ```ignore
//! use dmcp::prelude::*;
//!
//! let x = VariableBuilder::vector(3).nonneg().value(vec![1.0, 2.0, 3.0]).build();
//! let y = variable(3);
//!
//! // Bilinear, so not DCP as written.
//! let problem = Problem::minimize(dot(&x, &y))
//!     .subject_to([y.geq(&constant(0.0)), sum(&y).leq(&constant(1.0))])
//!     .build();
//! assert!(!problem.is_dcp());
//!
//! // With x frozen at its value the problem is a linear program in y.
//! let step = problem.fix([&x])?;
//! step.check_dcp()?;
//! ```
//!
//! ## DCP Rules
//!
//! - **Minimization** requires a **convex** objective
//! - **Maximization** requires a **concave** objective
//! - **Equality constraints** require **affine** expressions
//! - **Inequality constraints** `lhs <= rhs` require convex `lhs` and concave `rhs`
//! - **PSD constraints** require an affine square matrix
//!
//! Parameters count as constants. Their sign comes from their attribute, so
//! `x * y` with `x` fixed to a nonneg parameter is affine in `y`.
//!
//! ## Architecture
//!
//! - **Expression trees** built using the `Expr` enum with `Arc` sharing; every
//!   operator node is an `Atom` with an `Op` tag and ordered arguments
//! - **DCP verification** via curvature and sign tracking
//! - **Fixing** in three steps: parameter synthesis, tree substitution and
//!   problem reconstruction

pub mod atoms;
pub mod constraints;
pub mod dcp;
pub mod error;
pub mod expr;
pub mod fix;
pub mod problem;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use dmcp::prelude::*;
/// ```
pub mod prelude {
    // Expression types
    pub use crate::expr::{
        constant, constant_dmatrix, constant_sparse, constant_vec, eye, named_variable,
        nonneg_variable, nonpos_variable, parameter, psd_variable, variable, zeros, Array,
        Attribute, Expr, ExprId, ParameterBuilder, Shape, VariableBuilder, VariableExt,
    };

    // Atoms
    pub use crate::atoms::{
        abs, dot, exp, flatten, hstack, index, log, matmul, max2, maximum, min2, minimum,
        neg_part, norm, norm1, norm2, norm_inf, pos, power, quad_form, quad_over_lin, reshape,
        slice, sqrt, sum, sum_axis, sum_squares, trace, transpose, vstack,
    };

    // Constraints
    pub use crate::constraints::{Constraint, ConstraintExt};

    // DCP
    pub use crate::dcp::{Curvature, Sign};

    // Problem
    pub use crate::problem::{Objective, Problem, ProblemBuilder};

    // Fixing
    pub use crate::fix::{fix, Fixable, Substitution};

    // Errors
    pub use crate::error::{DmcpError, Result};
}

// Re-export main types at crate root
pub use error::{DmcpError, Result};
pub use fix::{fix, Fixable};
pub use problem::Problem;
