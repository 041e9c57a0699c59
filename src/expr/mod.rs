//! Expression types and creation utilities.
//!
//! This module provides the core expression types for building optimization problems:
//! - `Expr` - the expression enum: variable, constant and parameter leaves plus `Atom` nodes
//! - `Shape` - shape information for expressions
//! - Variable creation via `variable()` and `VariableBuilder`
//! - Constant creation via `constant()` and related functions
//! - Parameter creation via `parameter()` and `ParameterBuilder`

pub mod constant;
pub mod expression;
pub mod parameter;
pub mod shape;
pub mod variable;

// Re-export main types
pub use constant::{constant, constant_dmatrix, constant_sparse, constant_vec, eye, zeros};
pub use expression::{
    Array, Atom, Attribute, ConstantData, Expr, ExprId, IndexSpec, Op, ParameterData, ValueSlot,
    VariableData,
};
pub use parameter::{parameter, ParameterBuilder};
pub use shape::Shape;
pub use variable::{
    named_variable, nonneg_variable, nonpos_variable, psd_variable, variable, VariableBuilder,
    VariableExt,
};
