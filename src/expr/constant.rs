//! Constant expression creation.

use nalgebra::DMatrix;
use nalgebra_sparse::CscMatrix;

use super::expression::{Array, ConstantData, Expr, ExprId};
use super::shape::Shape;

fn from_array(value: Array) -> Expr {
    Expr::Constant(ConstantData {
        id: ExprId::new(),
        value,
    })
}

/// Create a constant expression from a scalar.
pub fn constant(value: f64) -> Expr {
    from_array(Array::Scalar(value))
}

/// Create a constant expression from a vector.
pub fn constant_vec(values: Vec<f64>) -> Expr {
    from_array(Array::from_vec(values))
}

/// Create a constant expression from a nalgebra DMatrix.
pub fn constant_dmatrix(matrix: DMatrix<f64>) -> Expr {
    from_array(Array::Dense(matrix))
}

/// Create a constant expression from a sparse CSC matrix.
pub fn constant_sparse(matrix: CscMatrix<f64>) -> Expr {
    from_array(Array::Sparse(matrix))
}

/// Create a zero constant with the given shape.
pub fn zeros(shape: impl Into<Shape>) -> Expr {
    from_array(Array::zeros(&shape.into()))
}

/// Create an identity matrix constant.
pub fn eye(n: usize) -> Expr {
    constant_dmatrix(DMatrix::identity(n, n))
}
