//! Core expression types for dmcp.
//!
//! The `Expr` enum has three kinds of leaves (variables, constants and
//! parameters) and one kind of interior node, `Atom`, which pairs an operation
//! tag with an ordered list of child expressions. Expressions form an immutable
//! DAG using `Arc` for sharing. The only mutable state is a variable's value
//! slot, which is shared between every clone of that variable.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use nalgebra::DMatrix;
use nalgebra_sparse::CscMatrix;

use super::shape::Shape;
use crate::error::{DmcpError, Result};

/// Unique identifier for expressions.
///
/// Ids are handed out from a global counter, so they are unique and increase
/// with creation order. A parameter created to stand in for a variable reuses
/// that variable's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(u64);

impl ExprId {
    /// Generate a new unique ID.
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        ExprId(NEXT_ID.fetch_add(1, Ordering::SeqCst))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ExprId {
    fn default() -> Self {
        Self::new()
    }
}

/// Efficient array storage (dense or sparse).
#[derive(Debug, Clone)]
pub enum Array {
    /// Dense matrix storage.
    Dense(DMatrix<f64>),
    /// Sparse CSC matrix storage.
    Sparse(CscMatrix<f64>),
    /// Scalar value.
    Scalar(f64),
}

impl Array {
    /// An all-zero array laid out for `shape`.
    pub fn zeros(shape: &Shape) -> Self {
        if shape.is_scalar() {
            Array::Scalar(0.0)
        } else {
            Array::Dense(DMatrix::zeros(shape.rows(), shape.cols()))
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Array::Dense(m) => Shape::matrix(m.nrows(), m.ncols()),
            Array::Sparse(m) => Shape::matrix(m.nrows(), m.ncols()),
            Array::Scalar(_) => Shape::scalar(),
        }
    }

    /// Get the total number of elements.
    pub fn size(&self) -> usize {
        match self {
            Array::Dense(m) => m.len(),
            Array::Sparse(m) => m.nrows() * m.ncols(),
            Array::Scalar(_) => 1,
        }
    }

    /// Try to get as a scalar value.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Array::Scalar(v) => Some(*v),
            Array::Dense(m) if m.nrows() == 1 && m.ncols() == 1 => Some(m[(0, 0)]),
            _ => None,
        }
    }

    /// Apply `f` to every stored element. Implicit sparse zeros are left alone,
    /// so `f` must map zero to zero.
    fn map_stored(&self, f: impl Fn(f64) -> f64) -> Array {
        match self {
            Array::Scalar(v) => Array::Scalar(f(*v)),
            Array::Dense(m) => Array::Dense(m.map(f)),
            Array::Sparse(m) => {
                let mut out = m.clone();
                out.values_mut().iter_mut().for_each(|v| *v = f(*v));
                Array::Sparse(out)
            }
        }
    }

    /// Elementwise absolute value.
    pub fn abs(&self) -> Array {
        self.map_stored(f64::abs)
    }

    /// Elementwise negation.
    pub fn neg(&self) -> Array {
        self.map_stored(|v| -v)
    }

    /// Check if all elements are non-negative.
    pub fn is_nonneg(&self) -> bool {
        match self {
            Array::Scalar(v) => *v >= 0.0,
            Array::Dense(m) => m.iter().all(|&v| v >= 0.0),
            Array::Sparse(m) => m.values().iter().all(|&v| v >= 0.0),
        }
    }

    /// Check if all elements are non-positive.
    pub fn is_nonpos(&self) -> bool {
        match self {
            Array::Scalar(v) => *v <= 0.0,
            Array::Dense(m) => m.iter().all(|&v| v <= 0.0),
            Array::Sparse(m) => m.values().iter().all(|&v| v <= 0.0),
        }
    }

    /// Check if all elements are zero.
    pub fn is_zero(&self) -> bool {
        self.is_nonneg() && self.is_nonpos()
    }

    /// Check if the matrix is positive semi-definite.
    ///
    /// Returns `None` when the question does not apply (non-square,
    /// non-symmetric or sparse storage).
    pub fn is_psd(&self) -> Option<bool> {
        match self {
            Array::Scalar(v) => Some(*v >= 0.0),
            Array::Dense(m) => {
                if m.nrows() != m.ncols() {
                    return None;
                }
                let n = m.nrows();
                for i in 0..n {
                    for j in (i + 1)..n {
                        if (m[(i, j)] - m[(j, i)]).abs() > 1e-10 {
                            return None;
                        }
                    }
                }
                // Cholesky needs strict definiteness; a tiny shift admits
                // singular PSD matrices such as the zero matrix.
                let shifted = m + DMatrix::<f64>::identity(n, n) * 1e-12;
                Some(shifted.cholesky().is_some())
            }
            Array::Sparse(_) => None,
        }
    }

    /// Dense copy of the data as a column-major matrix.
    pub fn to_dense(&self) -> DMatrix<f64> {
        match self {
            Array::Scalar(v) => DMatrix::from_element(1, 1, *v),
            Array::Dense(m) => m.clone(),
            Array::Sparse(m) => {
                let mut dense = DMatrix::zeros(m.nrows(), m.ncols());
                for (i, j, v) in m.triplet_iter() {
                    dense[(i, j)] = *v;
                }
                dense
            }
        }
    }

    /// Create from a vector.
    pub fn from_vec(v: Vec<f64>) -> Self {
        let n = v.len();
        Array::Dense(DMatrix::from_vec(n, 1, v))
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.to_dense() == other.to_dense()
    }
}

impl From<f64> for Array {
    fn from(v: f64) -> Self {
        Array::Scalar(v)
    }
}

impl From<Vec<f64>> for Array {
    fn from(v: Vec<f64>) -> Self {
        Array::from_vec(v)
    }
}

impl From<DMatrix<f64>> for Array {
    fn from(m: DMatrix<f64>) -> Self {
        Array::Dense(m)
    }
}

impl From<CscMatrix<f64>> for Array {
    fn from(m: CscMatrix<f64>) -> Self {
        Array::Sparse(m)
    }
}

/// Sign or structure attribute declared on a variable or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Attribute {
    /// No declared restriction.
    #[default]
    Unconstrained,
    /// Every element is >= 0.
    Nonneg,
    /// Every element is <= 0.
    Nonpos,
    /// The (square) matrix is positive semi-definite.
    Psd,
}

/// Shared, externally mutable value storage of a variable.
pub type ValueSlot = Arc<RwLock<Option<Array>>>;

/// Data for a variable expression.
#[derive(Debug, Clone)]
pub struct VariableData {
    /// Unique identifier.
    pub id: ExprId,
    /// Shape of the variable.
    pub shape: Shape,
    /// Optional name for display.
    pub name: Option<String>,
    /// Declared sign/structure attribute.
    pub attr: Attribute,
    /// Current value; shared by every clone of this variable.
    pub value: ValueSlot,
}

impl VariableData {
    /// Snapshot of the current value, if one has been set.
    pub fn value(&self) -> Option<Array> {
        match self.value.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Store a new value after checking its shape.
    pub fn set_value(&self, value: Array) -> Result<()> {
        if !value.shape().is_compatible(&self.shape) {
            return Err(DmcpError::ShapeMismatch {
                expected: self.shape.to_string(),
                got: value.shape().to_string(),
            });
        }
        self.write(Some(value));
        Ok(())
    }

    /// Reset the value to unset.
    pub fn clear_value(&self) {
        self.write(None);
    }

    fn write(&self, value: Option<Array>) {
        match self.value.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}

/// Data for a constant expression.
#[derive(Debug, Clone)]
pub struct ConstantData {
    /// Unique identifier.
    pub id: ExprId,
    /// The constant value.
    pub value: Array,
}

impl ConstantData {
    pub fn shape(&self) -> Shape {
        self.value.shape()
    }
}

/// Data for a parameter: a leaf with a fixed value known at build time.
#[derive(Debug, Clone)]
pub struct ParameterData {
    /// Identifier; equal to the source variable's id when the parameter
    /// stands in for a fixed variable.
    pub id: ExprId,
    /// Shape of the parameter.
    pub shape: Shape,
    /// Optional name for display.
    pub name: Option<String>,
    /// Declared sign/structure attribute.
    pub attr: Attribute,
    /// The parameter value. Always present.
    pub value: Array,
}

/// Specification for indexing operations.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    /// Ranges for each dimension: (start, stop, step).
    /// None means take the whole dimension.
    pub ranges: Vec<Option<(usize, usize, usize)>>,
}

impl IndexSpec {
    /// Create an index spec for a single element.
    pub fn element(indices: Vec<usize>) -> Self {
        IndexSpec {
            ranges: indices.into_iter().map(|i| Some((i, i + 1, 1))).collect(),
        }
    }

    /// Create an index spec for a range.
    pub fn range(start: usize, stop: usize) -> Self {
        IndexSpec {
            ranges: vec![Some((start, stop, 1))],
        }
    }
}

/// Operation performed by an interior node.
///
/// Non-expression operands (axes, target shapes, exponents) live on the tag;
/// expression operands live in `Atom::args`.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    // Affine
    Add,
    Neg,
    /// Elementwise or scalar product.
    Mul,
    MatMul,
    Sum(Option<usize>),
    Reshape(Shape),
    Index(IndexSpec),
    VStack,
    HStack,
    Transpose,
    Trace,

    // Nonlinear
    Norm1,
    Norm2,
    NormInf,
    Abs,
    Pos,
    NegPart,
    Maximum,
    Minimum,
    /// x' P x with args `[x, P]`.
    QuadForm,
    SumSquares,
    /// ||x||^2 / y with args `[x, y]`.
    QuadOverLin,
    Exp,
    Log,
    Power(f64),
}

impl Op {
    /// Number of expression arguments, or `None` for variadic operations.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Op::Add | Op::Mul | Op::MatMul | Op::QuadForm | Op::QuadOverLin => Some(2),
            Op::VStack | Op::HStack | Op::Maximum | Op::Minimum => None,
            _ => Some(1),
        }
    }

    /// Short lowercase name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Neg => "neg",
            Op::Mul => "mul",
            Op::MatMul => "matmul",
            Op::Sum(_) => "sum",
            Op::Reshape(_) => "reshape",
            Op::Index(_) => "index",
            Op::VStack => "vstack",
            Op::HStack => "hstack",
            Op::Transpose => "transpose",
            Op::Trace => "trace",
            Op::Norm1 => "norm1",
            Op::Norm2 => "norm2",
            Op::NormInf => "norm_inf",
            Op::Abs => "abs",
            Op::Pos => "pos",
            Op::NegPart => "neg_part",
            Op::Maximum => "maximum",
            Op::Minimum => "minimum",
            Op::QuadForm => "quad_form",
            Op::SumSquares => "sum_squares",
            Op::QuadOverLin => "quad_over_lin",
            Op::Exp => "exp",
            Op::Log => "log",
            Op::Power(_) => "power",
        }
    }
}

/// An interior node: an operation applied to an ordered list of arguments.
#[derive(Debug, Clone)]
pub struct Atom {
    pub op: Op,
    pub args: Vec<Arc<Expr>>,
}

/// The core expression type.
///
/// All expressions are immutable and use `Arc` for efficient sharing.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A decision variable.
    Variable(VariableData),
    /// A constant value.
    Constant(ConstantData),
    /// A fixed-value placeholder.
    Parameter(ParameterData),
    /// An operation over child expressions.
    Atom(Atom),
}

impl Expr {
    /// Build an interior node.
    pub fn atom(op: Op, args: Vec<Arc<Expr>>) -> Expr {
        debug_assert!(
            op.arity().map_or(true, |n| n == args.len()),
            "{} takes {:?} arguments, got {}",
            op.name(),
            op.arity(),
            args.len()
        );
        Expr::Atom(Atom { op, args })
    }

    /// Get the shape of the expression.
    pub fn shape(&self) -> Shape {
        match self {
            Expr::Variable(v) => v.shape.clone(),
            Expr::Constant(c) => c.shape(),
            Expr::Parameter(p) => p.shape.clone(),
            Expr::Atom(atom) => atom.shape(),
        }
    }

    /// Ordered child expressions. Leaves have none.
    pub fn args(&self) -> &[Arc<Expr>] {
        match self {
            Expr::Atom(atom) => &atom.args,
            _ => &[],
        }
    }

    /// Rebuild this node with the same operation over new arguments.
    ///
    /// Leaves have no arguments and are returned as they are.
    pub fn with_args(&self, args: Vec<Arc<Expr>>) -> Expr {
        match self {
            Expr::Atom(atom) => {
                debug_assert_eq!(atom.args.len(), args.len());
                Expr::Atom(Atom {
                    op: atom.op.clone(),
                    args,
                })
            }
            leaf => leaf.clone(),
        }
    }

    /// Get the unique ID if this is a variable.
    pub fn variable_id(&self) -> Option<ExprId> {
        match self {
            Expr::Variable(v) => Some(v.id),
            _ => None,
        }
    }

    /// Get the ID if this is a parameter.
    pub fn parameter_id(&self) -> Option<ExprId> {
        match self {
            Expr::Parameter(p) => Some(p.id),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Constant(_))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Expr::Variable(_))
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self, Expr::Parameter(_))
    }

    /// Get the constant value if this is a constant expression.
    pub fn constant_value(&self) -> Option<&Array> {
        match self {
            Expr::Constant(c) => Some(&c.value),
            _ => None,
        }
    }

    /// Current value of a leaf. Atoms are not evaluated and return `None`.
    pub fn value(&self) -> Option<Array> {
        match self {
            Expr::Variable(v) => v.value(),
            Expr::Constant(c) => Some(c.value.clone()),
            Expr::Parameter(p) => Some(p.value.clone()),
            Expr::Atom(_) => None,
        }
    }

    /// Set the value of a variable.
    pub fn set_value(&self, value: impl Into<Array>) -> Result<()> {
        match self {
            Expr::Variable(v) => v.set_value(value.into()),
            _ => Err(DmcpError::UnsupportedInput(
                "only variables carry a settable value".into(),
            )),
        }
    }

    /// Reset a variable's value to unset. No effect on other expressions.
    pub fn clear_value(&self) {
        if let Expr::Variable(v) = self {
            v.clear_value();
        }
    }

    /// Collect all variable IDs in this expression.
    pub fn variables(&self) -> Vec<ExprId> {
        self.variable_data().into_iter().map(|v| v.id).collect()
    }

    /// Every distinct variable in this expression, sorted by id.
    pub fn variable_data(&self) -> Vec<VariableData> {
        let mut found = BTreeMap::new();
        self.collect_variables(&mut found);
        found.into_values().collect()
    }

    /// Collect all parameter IDs in this expression.
    pub fn parameters(&self) -> Vec<ExprId> {
        let mut ids = Vec::new();
        self.collect_parameters(&mut ids);
        ids.sort();
        ids.dedup();
        ids
    }

    pub(crate) fn collect_variables(&self, found: &mut BTreeMap<ExprId, VariableData>) {
        match self {
            Expr::Variable(v) => {
                found.entry(v.id).or_insert_with(|| v.clone());
            }
            Expr::Constant(_) | Expr::Parameter(_) => {}
            Expr::Atom(atom) => atom.args.iter().for_each(|a| a.collect_variables(found)),
        }
    }

    fn collect_parameters(&self, ids: &mut Vec<ExprId>) {
        match self {
            Expr::Parameter(p) => ids.push(p.id),
            Expr::Variable(_) | Expr::Constant(_) => {}
            Expr::Atom(atom) => atom.args.iter().for_each(|a| a.collect_parameters(ids)),
        }
    }
}

impl Atom {
    fn shape(&self) -> Shape {
        let arg_shape = |i: usize| self.args[i].shape();
        match &self.op {
            Op::Add | Op::Mul => arg_shape(0)
                .broadcast(&arg_shape(1))
                .unwrap_or_else(Shape::scalar),
            Op::MatMul => arg_shape(0)
                .matmul(&arg_shape(1))
                .unwrap_or_else(Shape::scalar),
            Op::Sum(Some(_)) => {
                let dims = arg_shape(0);
                if dims.ndim() <= 1 {
                    Shape::scalar()
                } else {
                    Shape::vector(dims.cols())
                }
            }
            Op::Reshape(shape) => shape.clone(),
            Op::Index(spec) => {
                let base = arg_shape(0);
                let mut dims = Vec::new();
                for (i, r) in spec.ranges.iter().enumerate() {
                    match r {
                        Some((start, stop, step)) => {
                            // Reversed ranges are empty; a zero step is read as 1.
                            let size = stop.saturating_sub(*start).div_ceil((*step).max(1));
                            if size != 1 {
                                dims.push(size);
                            }
                        }
                        None if i < base.ndim() => dims.push(base.dims()[i]),
                        None => {}
                    }
                }
                Shape::from_dims(dims)
            }
            Op::VStack => match self.args.first() {
                Some(first) => Shape::matrix(
                    self.args.iter().map(|e| e.shape().rows()).sum(),
                    first.shape().cols(),
                ),
                None => Shape::scalar(),
            },
            Op::HStack => match self.args.first() {
                Some(first) => Shape::matrix(
                    first.shape().rows(),
                    self.args.iter().map(|e| e.shape().cols()).sum(),
                ),
                None => Shape::scalar(),
            },
            Op::Transpose => arg_shape(0).transpose(),
            Op::Neg
            | Op::Abs
            | Op::Pos
            | Op::NegPart
            | Op::Exp
            | Op::Log
            | Op::Power(_) => arg_shape(0),
            Op::Maximum | Op::Minimum => self
                .args
                .first()
                .map(|e| e.shape())
                .unwrap_or_else(Shape::scalar),
            Op::Sum(None)
            | Op::Trace
            | Op::Norm1
            | Op::Norm2
            | Op::NormInf
            | Op::QuadForm
            | Op::SumSquares
            | Op::QuadOverLin => Shape::scalar(),
        }
    }
}

// Convenient From implementations for automatic conversion
impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        crate::expr::constant(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        crate::expr::constant(value as f64)
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}
