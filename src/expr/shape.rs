//! Shape representation for expressions.
//!
//! Shapes follow NumPy conventions:
//! - `()` is a scalar
//! - `(n,)` is a vector of length n
//! - `(m, n)` is an m x n matrix

use std::fmt;

/// Shape of an expression.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a scalar shape.
    pub fn scalar() -> Self {
        Shape(vec![])
    }

    /// Create a vector shape.
    pub fn vector(n: usize) -> Self {
        Shape(vec![n])
    }

    /// Create a matrix shape.
    pub fn matrix(m: usize, n: usize) -> Self {
        Shape(vec![m, n])
    }

    /// Create a shape from dimensions.
    pub fn from_dims(dims: impl Into<Vec<usize>>) -> Self {
        Shape(dims.into())
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.0.iter().product::<usize>().max(1)
    }

    /// Number of dimensions (0 for scalar, 1 for vector, 2 for matrix).
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of rows (1 for scalar, n for vector, m for matrix).
    pub fn rows(&self) -> usize {
        self.0.first().copied().unwrap_or(1)
    }

    /// Number of columns (1 for scalar and vector, n for matrix).
    pub fn cols(&self) -> usize {
        if self.0.len() >= 2 {
            self.0[1]
        } else {
            1
        }
    }

    /// Check whether two shapes describe the same row/column layout.
    ///
    /// Values are stored as column matrices, so `(n,)` and `(n, 1)` are
    /// interchangeable here, as are `()` and `(1, 1)`.
    pub fn is_compatible(&self, other: &Shape) -> bool {
        self.rows() == other.rows() && self.cols() == other.cols()
    }

    /// Get the transposed shape.
    pub fn transpose(&self) -> Self {
        match self.0.len() {
            0 => Shape::scalar(),
            1 => Shape::matrix(1, self.0[0]),
            _ => {
                let mut dims = self.0.clone();
                dims.reverse();
                Shape(dims)
            }
        }
    }

    /// Broadcast two shapes together, NumPy style.
    pub fn broadcast(&self, other: &Shape) -> Option<Shape> {
        let ndim = self.ndim().max(other.ndim());
        let pad = |s: &Shape| -> Vec<usize> {
            std::iter::repeat(1)
                .take(ndim - s.ndim())
                .chain(s.0.iter().copied())
                .collect()
        };

        pad(self)
            .into_iter()
            .zip(pad(other))
            .map(|(a, b)| match (a, b) {
                _ if a == b => Some(a),
                (1, b) => Some(b),
                (a, 1) => Some(a),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Shape)
    }

    /// Result shape of a matrix product, if the inner dimensions agree.
    pub fn matmul(&self, other: &Shape) -> Option<Shape> {
        match (self.ndim(), other.ndim()) {
            (2, 2) if self.cols() == other.rows() => {
                Some(Shape::matrix(self.rows(), other.cols()))
            }
            (2, 1) if self.cols() == other.rows() => Some(Shape::vector(self.rows())),
            (1, 2) if self.rows() == other.rows() => Some(Shape::vector(other.cols())),
            (1, 1) if self.rows() == other.rows() => Some(Shape::scalar()),
            _ => None,
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({:?})", self.0)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "()"),
            [n] => write!(f, "({},)", n),
            dims => {
                let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

impl From<()> for Shape {
    fn from(_: ()) -> Self {
        Shape::scalar()
    }
}

impl From<usize> for Shape {
    fn from(n: usize) -> Self {
        Shape::vector(n)
    }
}

impl From<(usize, usize)> for Shape {
    fn from((m, n): (usize, usize)) -> Self {
        Shape::matrix(m, n)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape(dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar() {
        let s = Shape::scalar();
        assert!(s.is_scalar());
        assert_eq!(s.size(), 1);
        assert_eq!((s.rows(), s.cols()), (1, 1));
    }

    #[test]
    fn test_vector_and_matrix() {
        let v = Shape::vector(5);
        assert_eq!((v.ndim(), v.rows(), v.cols()), (1, 5, 1));

        let m = Shape::matrix(3, 4);
        assert_eq!((m.ndim(), m.size()), (2, 12));
    }

    #[test]
    fn test_compatible() {
        assert!(Shape::vector(3).is_compatible(&Shape::matrix(3, 1)));
        assert!(Shape::scalar().is_compatible(&Shape::matrix(1, 1)));
        assert!(!Shape::vector(3).is_compatible(&Shape::matrix(1, 3)));
    }

    #[test]
    fn test_transpose() {
        assert_eq!(Shape::vector(3).transpose(), Shape::matrix(1, 3));
        assert_eq!(Shape::matrix(3, 4).transpose(), Shape::matrix(4, 3));
    }

    #[test]
    fn test_broadcast() {
        assert_eq!(
            Shape::scalar().broadcast(&Shape::matrix(3, 4)),
            Some(Shape::matrix(3, 4))
        );
        assert_eq!(
            Shape::vector(4).broadcast(&Shape::matrix(3, 4)),
            Some(Shape::matrix(3, 4))
        );
        assert_eq!(Shape::vector(3).broadcast(&Shape::vector(4)), None);
    }

    #[test]
    fn test_matmul() {
        assert_eq!(
            Shape::matrix(3, 4).matmul(&Shape::vector(4)),
            Some(Shape::vector(3))
        );
        assert_eq!(Shape::matrix(3, 4).matmul(&Shape::vector(3)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Shape::scalar().to_string(), "()");
        assert_eq!(Shape::vector(2).to_string(), "(2,)");
        assert_eq!(Shape::matrix(2, 3).to_string(), "(2, 3)");
    }
}
