// MIT/Apache2 License

use crate::InvalidArgument;
use lyon_geom::{Angle, Point, Transform, Vector};

/// Whether a new operation is applied before or after the existing transform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MatrixOrder {
    /// The new operation happens first. This is the GDI+ default.
    Prepend,
    /// The new operation happens after the existing transform.
    Append,
}

impl Default for MatrixOrder {
    #[inline]
    fn default() -> Self {
        MatrixOrder::Prepend
    }
}

/// A 3x2 affine matrix in GDI+ layout: points are row vectors, so `(x, y)` maps to
/// `(x * m11 + y * m21 + dx, x * m12 + y * m22 + dy)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix {
    inner: Transform<f32>,
}

impl Default for Matrix {
    #[inline]
    fn default() -> Self {
        Matrix::identity()
    }
}

impl Matrix {
    #[inline]
    pub fn identity() -> Self {
        Matrix {
            inner: Transform::identity(),
        }
    }

    /// Build a matrix from its six elements.
    #[inline]
    pub fn new(m11: f32, m12: f32, m21: f32, m22: f32, dx: f32, dy: f32) -> Self {
        Matrix {
            inner: Transform::new(m11, m12, m21, m22, dx, dy),
        }
    }

    /// The six elements, as `[m11, m12, m21, m22, dx, dy]`.
    #[inline]
    pub fn elements(&self) -> [f32; 6] {
        let t = &self.inner;
        [t.m11, t.m12, t.m21, t.m22, t.m31, t.m32]
    }

    #[inline]
    pub fn determinant(&self) -> f32 {
        self.inner.determinant()
    }

    /// A matrix is invertible when its determinant is finite and non-zero.
    #[inline]
    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det != 0.0 && self.elements().iter().all(|e| e.is_finite())
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.inner == Transform::identity()
    }

    /// The inverse matrix.
    #[inline]
    pub fn inverted(&self) -> crate::Result<Matrix> {
        if !self.is_invertible() {
            return Err(InvalidArgument::SingularMatrix.into());
        }
        self.inner
            .inverse()
            .map(|inner| Matrix { inner })
            .ok_or(crate::Error::InvalidArgument(InvalidArgument::SingularMatrix))
    }

    /// Combine with another matrix.
    #[inline]
    pub fn multiply(&mut self, other: &Matrix, order: MatrixOrder) {
        self.inner = match order {
            MatrixOrder::Prepend => other.inner.then(&self.inner),
            MatrixOrder::Append => self.inner.then(&other.inner),
        };
    }

    #[inline]
    pub fn translate(&mut self, dx: f32, dy: f32, order: MatrixOrder) {
        let offset = Vector::new(dx, dy);
        self.inner = match order {
            MatrixOrder::Prepend => self.inner.pre_translate(offset),
            MatrixOrder::Append => self.inner.then_translate(offset),
        };
    }

    #[inline]
    pub fn scale(&mut self, sx: f32, sy: f32, order: MatrixOrder) {
        self.inner = match order {
            MatrixOrder::Prepend => self.inner.pre_scale(sx, sy),
            MatrixOrder::Append => self.inner.then_scale(sx, sy),
        };
    }

    /// Rotate by `degrees`, clockwise in a y-down coordinate space.
    #[inline]
    pub fn rotate(&mut self, degrees: f32, order: MatrixOrder) {
        let angle = Angle::degrees(degrees);
        self.inner = match order {
            MatrixOrder::Prepend => self.inner.pre_rotate(angle),
            MatrixOrder::Append => self.inner.then_rotate(angle),
        };
    }

    #[inline]
    pub fn transform_point(&self, point: Point<f32>) -> Point<f32> {
        self.inner.transform_point(point)
    }

    /// The underlying transform, for handing to a backend.
    #[inline]
    pub fn as_transform(&self) -> &Transform<f32> {
        &self.inner
    }
}

impl From<Transform<f32>> for Matrix {
    #[inline]
    fn from(inner: Transform<f32>) -> Self {
        Matrix { inner }
    }
}
