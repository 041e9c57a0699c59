//! Variable creation with builder pattern.

use std::sync::{Arc, RwLock};

use super::expression::{Array, Attribute, Expr, ExprId, VariableData};
use super::shape::Shape;

/// Builder for creating variables with various attributes.
#[derive(Default)]
pub struct VariableBuilder {
    shape: Shape,
    name: Option<String>,
    attr: Attribute,
    value: Option<Array>,
}

impl VariableBuilder {
    /// Create a new variable builder with the given shape.
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
            ..Default::default()
        }
    }

    pub fn scalar() -> Self {
        Self::new(Shape::scalar())
    }

    pub fn vector(n: usize) -> Self {
        Self::new(Shape::vector(n))
    }

    pub fn matrix(m: usize, n: usize) -> Self {
        Self::new(Shape::matrix(m, n))
    }

    /// Set the name of the variable.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the sign/structure attribute. Attributes are exclusive; the last
    /// one set wins.
    pub fn attr(mut self, attr: Attribute) -> Self {
        self.attr = attr;
        self
    }

    /// Constrain the variable to be non-negative (x >= 0).
    pub fn nonneg(self) -> Self {
        self.attr(Attribute::Nonneg)
    }

    /// Constrain the variable to be non-positive (x <= 0).
    pub fn nonpos(self) -> Self {
        self.attr(Attribute::Nonpos)
    }

    /// Constrain the (square) variable to be positive semi-definite.
    pub fn psd(self) -> Self {
        self.attr(Attribute::Psd)
    }

    /// Initial value. It is not shape-checked until `build`.
    pub fn value(mut self, value: impl Into<Array>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Build the variable expression.
    ///
    /// An initial value whose shape does not match is dropped, leaving the
    /// variable unset.
    pub fn build(self) -> Expr {
        let value = self
            .value
            .filter(|v| v.shape().is_compatible(&self.shape));
        Expr::Variable(VariableData {
            id: ExprId::new(),
            shape: self.shape,
            name: self.name,
            attr: self.attr,
            value: Arc::new(RwLock::new(value)),
        })
    }
}

/// Create a variable with the given shape.
///
/// # Examples
///
/// ```
/// use dmcp::expr::variable;
///
/// // Scalar variable
/// let x = variable(());
///
/// // Vector variable
/// let y = variable(5);
///
/// // Matrix variable
/// let z = variable((3, 4));
/// ```
pub fn variable(shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).build()
}

/// Extension trait for variable-like operations on Expr.
///
/// Non-variables pass through unchanged.
pub trait VariableExt {
    /// Mark this variable as non-negative.
    fn nonneg(self) -> Expr;

    /// Mark this variable as non-positive.
    fn nonpos(self) -> Expr;

    /// Mark this variable as positive semi-definite.
    fn psd(self) -> Expr;

    /// Give a name to this expression (if it's a variable).
    fn named(self, name: impl Into<String>) -> Expr;
}

fn with_attr(expr: Expr, attr: Attribute) -> Expr {
    match expr {
        Expr::Variable(mut v) => {
            v.attr = attr;
            Expr::Variable(v)
        }
        other => other,
    }
}

impl VariableExt for Expr {
    fn nonneg(self) -> Expr {
        with_attr(self, Attribute::Nonneg)
    }

    fn nonpos(self) -> Expr {
        with_attr(self, Attribute::Nonpos)
    }

    fn psd(self) -> Expr {
        with_attr(self, Attribute::Psd)
    }

    fn named(self, name: impl Into<String>) -> Expr {
        match self {
            Expr::Variable(mut v) => {
                v.name = Some(name.into());
                Expr::Variable(v)
            }
            other => other,
        }
    }
}

/// Create a named variable with the given shape.
pub fn named_variable(name: impl Into<String>, shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).name(name).build()
}

/// Create a non-negative variable with the given shape.
pub fn nonneg_variable(shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).nonneg().build()
}

/// Create a non-positive variable with the given shape.
pub fn nonpos_variable(shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).nonpos().build()
}

/// Create an n x n positive semi-definite matrix variable.
pub fn psd_variable(n: usize) -> Expr {
    VariableBuilder::matrix(n, n).psd().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_builder() {
        let x = VariableBuilder::vector(5).name("x").nonneg().build();

        if let Expr::Variable(v) = &x {
            assert_eq!(v.shape, Shape::vector(5));
            assert_eq!(v.name, Some("x".to_string()));
            assert_eq!(v.attr, Attribute::Nonneg);
            assert!(v.value().is_none());
        } else {
            panic!("Expected Variable");
        }
    }

    #[test]
    fn test_last_attribute_wins() {
        let x = VariableBuilder::scalar().nonneg().nonpos().build();
        if let Expr::Variable(v) = &x {
            assert_eq!(v.attr, Attribute::Nonpos);
        } else {
            panic!("Expected Variable");
        }
    }

    #[test]
    fn test_initial_value() {
        let x = VariableBuilder::vector(2).value(vec![1.0, -1.0]).build();
        assert_eq!(x.value(), Some(Array::from_vec(vec![1.0, -1.0])));

        let bad = VariableBuilder::vector(3).value(vec![1.0]).build();
        assert!(bad.value().is_none());
    }

    #[test]
    fn test_variable_ext() {
        let x = variable((2, 2)).psd().named("X");
        if let Expr::Variable(v) = &x {
            assert_eq!(v.attr, Attribute::Psd);
            assert_eq!(v.name, Some("X".to_string()));
        } else {
            panic!("Expected Variable");
        }
    }

    #[test]
    fn test_convenience_functions() {
        assert_eq!(psd_variable(3).shape(), Shape::matrix(3, 3));
        assert!(nonneg_variable(2).is_variable());
        assert_eq!(named_variable("w", 4).shape(), Shape::vector(4));
    }
}
