//! Page coordinate setup.
//!
//! A surface fixes its length unit, axis direction, and trim margins at
//! construction time; from those it derives the default view matrix that
//! maps the caller's conceptual page space onto the backend's native
//! y-down point space. The matrix is computed once and never changes.

use crate::geom::Size;
use crate::matrix::Matrix;

/// Length units usable as the caller-facing coordinate system.
///
/// Conversions are fixed ratios against the typographic point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageUnit {
    #[default]
    Point,
    Inch,
    Millimeter,
    Centimeter,
    /// 1/360 of an inch, a legacy presentation-graphics unit.
    Presentation,
}

impl PageUnit {
    pub fn points_per_unit(self) -> f64 {
        match self {
            PageUnit::Point => 1.0,
            PageUnit::Inch => 72.0,
            PageUnit::Millimeter => 72.0 / 25.4,
            PageUnit::Centimeter => 72.0 / 2.54,
            PageUnit::Presentation => 72.0 / 360.0,
        }
    }

    pub fn from_points(self, value: f64) -> f64 {
        value / self.points_per_unit()
    }

    pub fn to_points(self, value: f64) -> f64 {
        value * self.points_per_unit()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AxisDirection {
    /// y grows toward the bottom of the page, native to point space.
    #[default]
    Downwards,
    /// y grows toward the top of the page; the view matrix flips the axis.
    Upwards,
}

/// Trim margins in points, applied as an offset inside the physical page.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrimMargins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl TrimMargins {
    pub fn is_zero(&self) -> bool {
        self.left == 0.0 && self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0
    }
}

/// Immutable per-surface coordinate configuration.
#[derive(Clone, Debug)]
pub struct PageCoords {
    size: Size,
    size_points: Size,
    unit: PageUnit,
    direction: AxisDirection,
    trim: TrimMargins,
    default_view: Matrix,
    effective_height: f64,
}

impl PageCoords {
    /// `size_points` is the physical page size in points; the returned
    /// setup exposes the same size in `unit` and the derived view matrix.
    pub fn new(
        size_points: Size,
        unit: PageUnit,
        direction: AxisDirection,
        trim: TrimMargins,
    ) -> Self {
        let mut effective_height = size_points.height;
        if !trim.is_zero() {
            effective_height += trim.top + trim.bottom;
        }

        let mut default_view = Matrix::IDENTITY;
        if direction != AxisDirection::Downwards {
            default_view.multiply(
                Matrix::new(1.0, 0.0, 0.0, -1.0, 0.0, effective_height),
                crate::matrix::MatrixOrder::Prepend,
            );
        }
        if !trim.is_zero() {
            default_view.multiply(
                Matrix::translation(trim.left, -trim.top),
                crate::matrix::MatrixOrder::Prepend,
            );
        }

        let size = Size::new(
            unit.from_points(size_points.width),
            unit.from_points(size_points.height),
        );

        Self {
            size,
            size_points,
            unit,
            direction,
            trim,
            default_view,
            effective_height,
        }
    }

    /// Page size in the caller's unit.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Physical page size in points, excluding trim growth.
    pub fn size_points(&self) -> Size {
        self.size_points
    }

    pub fn unit(&self) -> PageUnit {
        self.unit
    }

    pub fn direction(&self) -> AxisDirection {
        self.direction
    }

    pub fn trim(&self) -> TrimMargins {
        self.trim
    }

    pub fn default_view(&self) -> Matrix {
        self.default_view
    }

    /// Page height in points including trim growth, used for axis flips.
    pub fn effective_height(&self) -> f64 {
        self.effective_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn unit_ratios() {
        assert_eq!(PageUnit::Inch.to_points(1.0), 72.0);
        assert_approx_eq!(PageUnit::Millimeter.to_points(25.4), 72.0, 1e-9);
        assert_approx_eq!(PageUnit::Centimeter.to_points(2.54), 72.0, 1e-9);
        assert_approx_eq!(PageUnit::Presentation.to_points(360.0), 72.0, 1e-9);
        assert_eq!(PageUnit::Point.from_points(10.0), 10.0);
    }

    #[test]
    fn letter_downwards_is_identity() {
        let coords = PageCoords::new(
            Size::new(612.0, 792.0),
            PageUnit::Point,
            AxisDirection::Downwards,
            TrimMargins::default(),
        );
        assert!(coords.default_view().is_identity());
    }

    #[test]
    fn letter_upwards_flips_y() {
        let coords = PageCoords::new(
            Size::new(612.0, 792.0),
            PageUnit::Point,
            AxisDirection::Upwards,
            TrimMargins::default(),
        );
        let m = coords.default_view();
        let top = m.transform_point(Point::new(0.0, 0.0));
        let bottom = m.transform_point(Point::new(0.0, 792.0));
        assert_eq!(top, Point::new(0.0, 792.0));
        assert_eq!(bottom, Point::new(0.0, 0.0));
    }

    #[test]
    fn size_is_reported_in_the_chosen_unit() {
        let coords = PageCoords::new(
            Size::new(612.0, 792.0),
            PageUnit::Inch,
            AxisDirection::Downwards,
            TrimMargins::default(),
        );
        assert_approx_eq!(coords.size().width, 8.5, 1e-9);
        assert_approx_eq!(coords.size().height, 11.0, 1e-9);
    }

    #[test]
    fn trim_margins_offset_and_grow_the_page() {
        let trim = TrimMargins {
            left: 10.0,
            top: 20.0,
            right: 10.0,
            bottom: 20.0,
        };
        let coords = PageCoords::new(
            Size::new(600.0, 800.0),
            PageUnit::Point,
            AxisDirection::Downwards,
            trim,
        );
        assert_eq!(coords.effective_height(), 840.0);
        let p = coords.default_view().transform_point(Point::new(0.0, 0.0));
        assert_eq!(p, Point::new(10.0, -20.0));
    }
}
