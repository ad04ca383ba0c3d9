//! 2D affine transforms.
//!
//! A matrix holds six coefficients `(a, b, c, d, e, f)` and maps the row
//! vector `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`. Composition is
//! explicit about order: `Prepend` applies the other matrix before the
//! existing one, `Append` after it.

use crate::geom::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixOrder {
    /// The other matrix is applied first.
    Prepend,
    /// The other matrix is applied last.
    Append,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn scaling_at(sx: f64, sy: f64, center: Point) -> Self {
        Self::about(center, Self::scaling(sx, sy))
    }

    /// Rotation by `degrees`, clockwise in a y-down coordinate system.
    pub fn rotation(degrees: f64) -> Self {
        let radians = degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    pub fn rotation_at(degrees: f64, center: Point) -> Self {
        Self::about(center, Self::rotation(degrees))
    }

    /// Skew by the given angles in degrees along each axis.
    pub fn skewing(degrees_x: f64, degrees_y: f64) -> Self {
        Self::new(
            1.0,
            degrees_y.to_radians().tan(),
            degrees_x.to_radians().tan(),
            1.0,
            0.0,
            0.0,
        )
    }

    pub fn skewing_at(degrees_x: f64, degrees_y: f64, center: Point) -> Self {
        Self::about(center, Self::skewing(degrees_x, degrees_y))
    }

    /// Conjugates `op` so it acts about `center` instead of the origin.
    fn about(center: Point, op: Matrix) -> Self {
        Self::translation(-center.x, -center.y)
            .then(op)
            .then(Self::translation(center.x, center.y))
    }

    /// Returns the matrix applying `self` first and `other` second.
    pub fn then(self, other: Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn multiply(&mut self, other: Matrix, order: MatrixOrder) {
        *self = self.multiplied(other, order);
    }

    pub fn multiplied(self, other: Matrix, order: MatrixOrder) -> Matrix {
        match order {
            MatrixOrder::Prepend => other.then(self),
            MatrixOrder::Append => self.then(other),
        }
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn transform_points(&self, points: &mut [Point]) {
        for p in points.iter_mut() {
            *p = self.transform_point(*p);
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_eq(p: Point, x: f64, y: f64) {
        assert!(
            (p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9,
            "({}, {}) != ({}, {})",
            p.x,
            p.y,
            x,
            y
        );
    }

    fn assert_matrix_eq(m: Matrix, n: Matrix) {
        for (l, r) in [
            (m.a, n.a),
            (m.b, n.b),
            (m.c, n.c),
            (m.d, n.d),
            (m.e, n.e),
            (m.f, n.f),
        ] {
            assert!((l - r).abs() < 1e-9, "{:?} != {:?}", m, n);
        }
    }

    #[test]
    fn prepend_applies_other_first() {
        let mut m = Matrix::scaling(2.0, 2.0);
        m.multiply(Matrix::translation(3.0, 0.0), MatrixOrder::Prepend);
        // Translate first, then scale.
        assert_point_eq(m.transform_point(Point::new(1.0, 0.0)), 8.0, 0.0);
    }

    #[test]
    fn append_applies_other_last() {
        let mut m = Matrix::scaling(2.0, 2.0);
        m.multiply(Matrix::translation(3.0, 0.0), MatrixOrder::Append);
        // Scale first, then translate.
        assert_point_eq(m.transform_point(Point::new(1.0, 0.0)), 5.0, 0.0);
    }

    #[test]
    fn composition_is_associative() {
        let a = Matrix::rotation(30.0);
        let b = Matrix::translation(5.0, -2.0);
        let c = Matrix::scaling(1.5, 0.5);
        assert_matrix_eq(a.then(b).then(c), a.then(b.then(c)));
    }

    #[test]
    fn rotation_quarter_turn() {
        let m = Matrix::rotation(90.0);
        // y-down convention: +x rotates onto +y.
        assert_point_eq(m.transform_point(Point::new(1.0, 0.0)), 0.0, 1.0);
    }

    #[test]
    fn rotation_about_center_fixes_center() {
        let center = Point::new(10.0, 20.0);
        let m = Matrix::rotation_at(123.0, center);
        assert_point_eq(m.transform_point(center), center.x, center.y);
    }

    #[test]
    fn transforms_point_batches() {
        let m = Matrix::translation(1.0, 2.0);
        let mut points = [Point::new(0.0, 0.0), Point::new(3.0, 4.0)];
        m.transform_points(&mut points);
        assert_point_eq(points[0], 1.0, 2.0);
        assert_point_eq(points[1], 4.0, 6.0);
    }

    #[test]
    fn identity_checks() {
        assert!(Matrix::default().is_identity());
        assert!(!Matrix::translation(1.0, 0.0).is_identity());
    }
}
