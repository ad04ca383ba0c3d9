//! Path construction.
//!
//! A [`Path`] is a flat command list (move/line/cubic/close) plus a fill
//! rule. Shape adders flatten arcs and cardinal splines into cubic
//! segments, so backends only ever see the four primitive commands.

use crate::error::{Error, Result};
use crate::geom::{Point, Rect, Size};

/// Interior rule for self-intersecting paths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillMode {
    /// Nonzero winding.
    #[default]
    Winding,
    /// Even-odd.
    Alternate,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    /// Cubic bezier: two control points, then the end point.
    CurveTo(Point, Point, Point),
    Close,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
    pub fill_mode: FillMode,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fill_mode(fill_mode: FillMode) -> Self {
        Self {
            commands: Vec::new(),
            fill_mode,
        }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn move_to(&mut self, p: Point) {
        self.commands.push(PathCommand::MoveTo(p));
    }

    pub fn line_to(&mut self, p: Point) {
        self.commands.push(PathCommand::LineTo(p));
    }

    pub fn curve_to(&mut self, c1: Point, c2: Point, end: Point) {
        self.commands.push(PathCommand::CurveTo(c1, c2, end));
    }

    pub fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }

    /// Continues from the current point if there is one, otherwise moves.
    fn extend_to(&mut self, p: Point) {
        if self.commands.is_empty() {
            self.move_to(p);
        } else {
            self.line_to(p);
        }
    }

    pub fn add_line(&mut self, p1: Point, p2: Point) {
        self.extend_to(p1);
        self.line_to(p2);
    }

    pub fn add_lines(&mut self, points: &[Point]) -> Result<()> {
        if points.len() < 2 {
            return Err(Error::TooFewPoints(points.len()));
        }
        self.extend_to(points[0]);
        for p in &points[1..] {
            self.line_to(*p);
        }
        Ok(())
    }

    /// Bezier chain: requires `4 + 3n` points. An empty slice is a no-op.
    pub fn add_beziers(&mut self, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        if (points.len() - 1) % 3 != 0 {
            return Err(Error::InvalidPointCount(points.len()));
        }
        self.extend_to(points[0]);
        for chunk in points[1..].chunks_exact(3) {
            self.curve_to(chunk[0], chunk[1], chunk[2]);
        }
        Ok(())
    }

    /// Open cardinal spline through `points`.
    pub fn add_curve(&mut self, points: &[Point], tension: f64) -> Result<()> {
        if points.len() < 2 {
            return Err(Error::TooFewPoints(points.len()));
        }
        self.extend_to(points[0]);
        for seg in curve_segments(points, tension) {
            self.curve_to(seg.c1, seg.c2, seg.end);
        }
        Ok(())
    }

    pub fn add_rectangle(&mut self, rect: Rect) {
        self.move_to(Point::new(rect.x, rect.y));
        self.line_to(Point::new(rect.right(), rect.y));
        self.line_to(Point::new(rect.right(), rect.bottom()));
        self.line_to(Point::new(rect.x, rect.bottom()));
        self.close();
    }

    /// Rectangle with elliptical corners of the given size.
    pub fn add_rounded_rectangle(&mut self, rect: Rect, corner: Size) {
        let ew = corner.width;
        let eh = corner.height;
        self.add_arc(Rect::new(rect.x, rect.y, ew, eh), 180.0, 90.0);
        self.add_arc(Rect::new(rect.right() - ew, rect.y, ew, eh), 270.0, 90.0);
        self.add_arc(
            Rect::new(rect.right() - ew, rect.bottom() - eh, ew, eh),
            0.0,
            90.0,
        );
        self.add_arc(Rect::new(rect.x, rect.bottom() - eh, ew, eh), 90.0, 90.0);
        self.close();
    }

    pub fn add_ellipse(&mut self, rect: Rect) {
        let (start, segments) = arc_segments(rect, 0.0, 360.0);
        self.move_to(start);
        for seg in segments {
            self.curve_to(seg.c1, seg.c2, seg.end);
        }
        self.close();
    }

    /// Elliptical arc inside `rect`, angles in degrees. Sweeps of 360 or
    /// more cover the whole ellipse.
    pub fn add_arc(&mut self, rect: Rect, start_angle: f64, sweep_angle: f64) {
        if sweep_angle.abs() >= 360.0 {
            self.add_ellipse(rect);
            return;
        }
        let (start, segments) = arc_segments(rect, start_angle, sweep_angle);
        self.extend_to(start);
        for seg in segments {
            self.curve_to(seg.c1, seg.c2, seg.end);
        }
    }

    /// Pie slice: center, arc, and back to the center.
    pub fn add_pie(&mut self, rect: Rect, start_angle: f64, sweep_angle: f64) {
        let sweep = sweep_angle.clamp(-360.0, 360.0);
        let (start, segments) = arc_segments(rect, start_angle, sweep);
        self.move_to(rect.center());
        self.line_to(start);
        for seg in segments {
            self.curve_to(seg.c1, seg.c2, seg.end);
        }
        self.close();
    }

    pub fn add_polygon(&mut self, points: &[Point]) -> Result<()> {
        if points.len() < 2 {
            return Err(Error::TooFewPoints(points.len()));
        }
        self.move_to(points[0]);
        for p in &points[1..] {
            self.line_to(*p);
        }
        self.close();
        Ok(())
    }

    pub fn add_path(&mut self, other: &Path) {
        self.commands.extend_from_slice(&other.commands);
    }
}

/// One cubic segment continuing from an implicit start point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CubicSegment {
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

/// Point on the ellipse inscribed in `rect` at the parametric angle
/// `degrees` (y-down, 0 = rightmost point).
pub(crate) fn arc_point(rect: Rect, degrees: f64) -> Point {
    let center = rect.center();
    let t = degrees.to_radians();
    Point::new(
        center.x + rect.width / 2.0 * t.cos(),
        center.y + rect.height / 2.0 * t.sin(),
    )
}

/// Flattens an elliptical arc into cubic segments of at most a quarter
/// turn each. Returns the arc start point and the segments.
pub(crate) fn arc_segments(
    rect: Rect,
    start_angle: f64,
    sweep_angle: f64,
) -> (Point, Vec<CubicSegment>) {
    let sweep = sweep_angle.clamp(-360.0, 360.0);
    let center = rect.center();
    let rx = rect.width / 2.0;
    let ry = rect.height / 2.0;

    let start = arc_point(rect, start_angle);
    let count = (sweep.abs() / 90.0).ceil().max(1.0) as usize;
    let delta = sweep.to_radians() / count as f64;
    let kappa = 4.0 / 3.0 * (delta / 4.0).tan();

    let point_at = |t: f64| {
        Point::new(center.x + rx * t.cos(), center.y + ry * t.sin())
    };
    let tangent_at = |t: f64| Point::new(-rx * t.sin(), ry * t.cos());

    let mut t0 = start_angle.to_radians();
    let mut segments = Vec::with_capacity(count);
    for _ in 0..count {
        let t1 = t0 + delta;
        let p0 = point_at(t0);
        let p1 = point_at(t1);
        let d0 = tangent_at(t0);
        let d1 = tangent_at(t1);
        segments.push(CubicSegment {
            c1: Point::new(p0.x + kappa * d0.x, p0.y + kappa * d0.y),
            c2: Point::new(p1.x - kappa * d1.x, p1.y - kappa * d1.y),
            end: p1,
        });
        t0 = t1;
    }
    (start, segments)
}

/// Converts an open cardinal spline to cubic segments starting at
/// `points[0]`. Requires at least two points.
pub(crate) fn curve_segments(points: &[Point], tension: f64) -> Vec<CubicSegment> {
    let t3 = tension / 3.0;
    let n = points.len();
    let mut segments = Vec::with_capacity(n - 1);
    for i in 0..n - 1 {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(n - 1)];
        segments.push(CubicSegment {
            c1: Point::new(p1.x + t3 * (p2.x - p0.x), p1.y + t3 * (p2.y - p0.y)),
            c2: Point::new(p2.x - t3 * (p3.x - p1.x), p2.y - t3 * (p3.y - p1.y)),
            end: p2,
        });
    }
    segments
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

    #[test]
    fn bezier_chain_point_counts() {
        for n in [4usize, 7, 10] {
            let mut path = Path::new();
            let points: Vec<_> = (0..n).map(|i| Point::new(i as f64, 0.0)).collect();
            path.add_beziers(&points).unwrap();
            assert_eq!(path.commands().len(), 1 + (n - 1) / 3);
        }
        for n in [5usize, 8] {
            let mut path = Path::new();
            let points: Vec<_> = (0..n).map(|i| Point::new(i as f64, 0.0)).collect();
            assert!(matches!(
                path.add_beziers(&points).unwrap_err(),
                Error::InvalidPointCount(_)
            ));
        }
    }

    #[test]
    fn empty_bezier_chain_is_a_no_op() {
        let mut path = Path::new();
        path.add_beziers(&[]).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn arc_flattening_hits_endpoints() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let (start, segments) = arc_segments(rect, 0.0, 90.0);
        assert_point_eq(start, 10.0, 5.0);
        let end = segments.last().unwrap().end;
        assert_point_eq(end, 5.0, 10.0);
    }

    #[test]
    fn full_sweep_arc_becomes_an_ellipse() {
        let rect = Rect::new(0.0, 0.0, 4.0, 2.0);
        let mut arc = Path::new();
        arc.add_arc(rect, 0.0, 360.0);
        let mut ellipse = Path::new();
        ellipse.add_ellipse(rect);
        assert_eq!(arc, ellipse);

        let mut over = Path::new();
        over.add_arc(rect, 0.0, -400.0);
        assert_eq!(over, ellipse);
    }

    #[test]
    fn pie_starts_at_the_center() {
        let mut path = Path::new();
        path.add_pie(Rect::new(0.0, 0.0, 10.0, 10.0), 0.0, 90.0);
        assert_eq!(path.commands()[0], PathCommand::MoveTo(Point::new(5.0, 5.0)));
        assert_eq!(path.commands().last(), Some(&PathCommand::Close));
    }

    #[test]
    fn curve_interpolates_its_input_points() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(20.0, 0.0),
        ];
        let segments = curve_segments(&points, 0.5);
        assert_eq!(segments.len(), 2);
        assert_point_eq(segments[0].end, 10.0, 5.0);
        assert_point_eq(segments[1].end, 20.0, 0.0);
    }

    #[test]
    fn polygon_needs_two_points() {
        let mut path = Path::new();
        assert!(matches!(
            path.add_polygon(&[Point::new(0.0, 0.0)]).unwrap_err(),
            Error::TooFewPoints(1)
        ));
    }
}
