//! Parameter creation.
//!
//! A parameter is a leaf whose value is supplied when the expression is built
//! rather than chosen by the solver. Parameters carry the same attributes as
//! variables, which lets them stand in for a variable that has been fixed.

use super::expression::{Array, Attribute, Expr, ExprId, ParameterData};
use super::shape::Shape;

/// Builder for parameters.
pub struct ParameterBuilder {
    id: Option<ExprId>,
    shape: Shape,
    name: Option<String>,
    attr: Attribute,
    value: Option<Array>,
}

impl ParameterBuilder {
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            id: None,
            shape: shape.into(),
            name: None,
            attr: Attribute::Unconstrained,
            value: None,
        }
    }

    /// Reuse an existing id instead of allocating a fresh one.
    pub fn id(mut self, id: ExprId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn attr(mut self, attr: Attribute) -> Self {
        self.attr = attr;
        self
    }

    pub fn value(mut self, value: impl Into<Array>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Build the parameter data. Without a value the parameter is all zeros.
    pub fn build_data(self) -> ParameterData {
        let value = self.value.unwrap_or_else(|| Array::zeros(&self.shape));
        ParameterData {
            id: self.id.unwrap_or_default(),
            shape: self.shape,
            name: self.name,
            attr: self.attr,
            value,
        }
    }

    pub fn build(self) -> Expr {
        Expr::Parameter(self.build_data())
    }
}

/// Create an unconstrained parameter holding `value`.
pub fn parameter(value: impl Into<Array>) -> Expr {
    let value = value.into();
    ParameterBuilder::new(value.shape()).value(value).build()
}
