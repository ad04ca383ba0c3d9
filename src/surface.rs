//! The drawing surface.
//!
//! A [`Surface`] owns one backend and forwards validated geometry, text,
//! and image requests to it. All argument validation happens before any
//! backend call, so a failed call never leaves partial output. The
//! surface also keeps the current world transform and the graphics state
//! stack, relaying transform deltas and save/restore pairs so the
//! backend's own matrix stack stays in lockstep.

use std::cell::RefCell;
use std::rc::Rc;

use crate::backend::{CombineMode, RenderBackend};
use crate::backends::recording::RecordingBackend;
use crate::coords::{AxisDirection, PageCoords, PageUnit, TrimMargins};
use crate::error::{Error, Result};
use crate::geom::{Point, Rect, Size};
use crate::image::{DocumentId, Form, FormInner, Image};
use crate::matrix::{Matrix, MatrixOrder};
use crate::path::{FillMode, Path};
use crate::state::{StateSnapshot, StateStack, StateToken};
use crate::style::{Brush, Font, LineAlignment, Pen, SmoothingMode, StringFormat};

/// Construction-time page configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct PageOptions {
    pub unit: PageUnit,
    pub direction: AxisDirection,
    pub trim: TrimMargins,
    pub document: Option<DocumentId>,
}

pub struct Surface<B: RenderBackend> {
    backend: B,
    coords: PageCoords,
    transform: Matrix,
    render_transform: Matrix,
    stack: StateStack,
    clip: Vec<Path>,
    smoothing: SmoothingMode,
    document: Option<DocumentId>,
    bound_form: Option<Rc<RefCell<FormInner>>>,
    closed: bool,
}

impl<B: RenderBackend> Surface<B> {
    /// `size_points` is the physical page size in points; `unit` is the
    /// coordinate system the caller wants to draw in.
    pub fn new(
        backend: B,
        size_points: Size,
        unit: PageUnit,
        direction: AxisDirection,
    ) -> Result<Self> {
        Self::with_options(
            backend,
            size_points,
            PageOptions {
                unit,
                direction,
                ..PageOptions::default()
            },
        )
    }

    pub fn with_options(backend: B, size_points: Size, options: PageOptions) -> Result<Self> {
        let coords = PageCoords::new(size_points, options.unit, options.direction, options.trim);
        let mut surface = Self {
            backend,
            render_transform: coords.default_view(),
            coords,
            transform: Matrix::IDENTITY,
            stack: StateStack::new(),
            clip: Vec::new(),
            smoothing: SmoothingMode::Default,
            document: options.document,
            bound_form: None,
            closed: false,
        };
        // The backend starts in the page's native convention; the default
        // view matrix goes out once, all later relays are deltas.
        let view = surface.coords.default_view();
        if !view.is_identity() {
            surface.backend.add_transform(view, MatrixOrder::Append)?;
        }
        Ok(surface)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn page_size(&self) -> Size {
        self.coords.size()
    }

    pub fn page_size_points(&self) -> Size {
        self.coords.size_points()
    }

    pub fn page_unit(&self) -> PageUnit {
        self.coords.unit()
    }

    pub fn page_direction(&self) -> AxisDirection {
        self.coords.direction()
    }

    pub fn document(&self) -> Option<DocumentId> {
        self.document
    }

    pub fn smoothing_mode(&self) -> SmoothingMode {
        self.smoothing
    }

    pub fn set_smoothing_mode(&mut self, mode: SmoothingMode) {
        self.smoothing = mode;
    }

    /// World-to-page-unit transform.
    pub fn transform(&self) -> Matrix {
        self.transform
    }

    /// Default view matrix composed with the current transform; what the
    /// backend effectively applies to world coordinates.
    pub fn render_transform(&self) -> Matrix {
        self.render_transform
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::SurfaceClosed);
        }
        if let Some(form) = &self.bound_form {
            if form.borrow().finished {
                return Err(Error::SurfaceClosed);
            }
        }
        Ok(())
    }

    /// Releases the backend. Idempotent; any open state frames are simply
    /// discarded. Every operation after this fails with `SurfaceClosed`.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.stack.level() > 0 {
            log::debug!(
                "closing surface with {} open state frame(s)",
                self.stack.level()
            );
        }
        if let Some(form) = self.bound_form.take() {
            let mut inner = form.borrow_mut();
            inner.finished = true;
            inner.bound = false;
        }
        self.backend.close()
    }

    // ----- graphics state -------------------------------------------------

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            transform: self.transform,
            clip: self.clip.clone(),
            smoothing: self.smoothing,
        }
    }

    fn apply_snapshot(&mut self, snap: StateSnapshot) {
        self.transform = snap.transform;
        self.clip = snap.clip;
        self.smoothing = snap.smoothing;
        self.render_transform = self.transform.then(self.coords.default_view());
    }

    /// Captures the current state and returns a token for restoring it.
    pub fn save(&mut self) -> Result<StateToken> {
        self.ensure_open()?;
        let token = self.stack.push(self.snapshot());
        self.backend.save(token)?;
        Ok(token)
    }

    /// Restores the state captured by `token`, discarding any frames saved
    /// since that were never restored themselves.
    pub fn restore_to(&mut self, token: StateToken) -> Result<()> {
        self.ensure_open()?;
        let snap = self
            .stack
            .restore(token)
            .ok_or(Error::NoMatchingSavedState)?;
        self.apply_snapshot(snap);
        self.backend.restore(token)
    }

    /// Restores the most recent save.
    pub fn restore(&mut self) -> Result<()> {
        self.ensure_open()?;
        let (token, snap) = self.stack.restore_top().ok_or(Error::NothingToRestore)?;
        self.apply_snapshot(snap);
        self.backend.restore(token)
    }

    /// Saves the state and remaps `src` onto `dst`, so drawing continues
    /// in an independent coordinate space mapped onto that destination
    /// rectangle. Only the native unit is accepted.
    pub fn begin_container(&mut self, dst: Rect, src: Rect, unit: PageUnit) -> Result<StateToken> {
        self.ensure_open()?;
        if unit != PageUnit::Point {
            return Err(Error::UnsupportedUnit(unit));
        }
        let token = self.stack.push(self.snapshot());
        self.backend.begin_container(token, dst, src, unit)?;

        let sx = dst.width / src.width;
        let sy = dst.height / src.height;
        let mut remap = Matrix::IDENTITY;
        remap.multiply(Matrix::translation(-src.x, -src.y), MatrixOrder::Prepend);
        remap.multiply(Matrix::scaling(sx, sy), MatrixOrder::Prepend);
        remap.multiply(
            Matrix::translation(dst.x / sx, dst.y / sy),
            MatrixOrder::Prepend,
        );
        self.apply_transform(remap, MatrixOrder::Prepend)?;
        Ok(token)
    }

    pub fn end_container(&mut self, token: StateToken) -> Result<()> {
        self.ensure_open()?;
        let snap = self
            .stack
            .restore(token)
            .ok_or(Error::NoMatchingSavedState)?;
        self.apply_snapshot(snap);
        self.backend.end_container(token)
    }

    /// Number of open save/container frames.
    pub fn state_level(&self) -> usize {
        self.stack.level()
    }

    // ----- transform ------------------------------------------------------

    fn apply_transform(&mut self, delta: Matrix, order: MatrixOrder) -> Result<()> {
        self.transform.multiply(delta, order);
        self.render_transform = self.transform.then(self.coords.default_view());
        self.backend.add_transform(delta, order)
    }

    pub fn multiply_transform(&mut self, matrix: Matrix, order: MatrixOrder) -> Result<()> {
        self.ensure_open()?;
        self.apply_transform(matrix, order)
    }

    pub fn translate_transform(&mut self, dx: f64, dy: f64) -> Result<()> {
        self.multiply_transform(Matrix::translation(dx, dy), MatrixOrder::Prepend)
    }

    pub fn translate_transform_order(&mut self, dx: f64, dy: f64, order: MatrixOrder) -> Result<()> {
        self.multiply_transform(Matrix::translation(dx, dy), order)
    }

    pub fn scale_transform(&mut self, sx: f64, sy: f64) -> Result<()> {
        self.multiply_transform(Matrix::scaling(sx, sy), MatrixOrder::Prepend)
    }

    pub fn scale_transform_order(&mut self, sx: f64, sy: f64, order: MatrixOrder) -> Result<()> {
        self.multiply_transform(Matrix::scaling(sx, sy), order)
    }

    pub fn scale_at_transform(&mut self, sx: f64, sy: f64, center: Point) -> Result<()> {
        self.multiply_transform(Matrix::scaling_at(sx, sy, center), MatrixOrder::Prepend)
    }

    /// Rotation in degrees.
    pub fn rotate_transform(&mut self, degrees: f64) -> Result<()> {
        self.multiply_transform(Matrix::rotation(degrees), MatrixOrder::Prepend)
    }

    pub fn rotate_transform_order(&mut self, degrees: f64, order: MatrixOrder) -> Result<()> {
        self.multiply_transform(Matrix::rotation(degrees), order)
    }

    pub fn rotate_at_transform(&mut self, degrees: f64, center: Point) -> Result<()> {
        self.multiply_transform(Matrix::rotation_at(degrees, center), MatrixOrder::Prepend)
    }

    /// Skew angles in degrees.
    pub fn skew_transform(&mut self, degrees_x: f64, degrees_y: f64) -> Result<()> {
        self.multiply_transform(Matrix::skewing(degrees_x, degrees_y), MatrixOrder::Prepend)
    }

    pub fn skew_at_transform(
        &mut self,
        degrees_x: f64,
        degrees_y: f64,
        center: Point,
    ) -> Result<()> {
        self.multiply_transform(
            Matrix::skewing_at(degrees_x, degrees_y, center),
            MatrixOrder::Prepend,
        )
    }

    // ----- stroked primitives ---------------------------------------------

    pub fn draw_line(&mut self, pen: &Pen, p1: Point, p2: Point) -> Result<()> {
        self.ensure_open()?;
        self.backend.realize(Some(pen), None)?;
        self.backend.append_line(p1, p2)?;
        self.backend.append_stroke(false)
    }

    /// Connected line segments through `points`.
    pub fn draw_lines(&mut self, pen: &Pen, points: &[Point]) -> Result<()> {
        self.ensure_open()?;
        if points.len() < 2 {
            return Err(Error::TooFewPoints(points.len()));
        }
        let mut path = Path::new();
        path.add_lines(points)?;
        self.backend.realize(Some(pen), None)?;
        self.backend.append_path(&path)?;
        self.backend.append_stroke(false)
    }

    pub fn draw_bezier(
        &mut self,
        pen: &Pen,
        p1: Point,
        p2: Point,
        p3: Point,
        p4: Point,
    ) -> Result<()> {
        self.draw_beziers(pen, &[p1, p2, p3, p4])
    }

    /// Bezier chain: `4 + 3n` points. An empty slice draws nothing.
    pub fn draw_beziers(&mut self, pen: &Pen, points: &[Point]) -> Result<()> {
        self.ensure_open()?;
        if points.is_empty() {
            return Ok(());
        }
        if (points.len() - 1) % 3 != 0 {
            return Err(Error::InvalidPointCount(points.len()));
        }
        self.backend.realize(Some(pen), None)?;
        self.backend.append_beziers(points)?;
        self.backend.append_stroke(false)
    }

    /// Cardinal spline with the default tension of 0.5.
    pub fn draw_curve(&mut self, pen: &Pen, points: &[Point]) -> Result<()> {
        self.draw_curve_tension(pen, points, 0.5)
    }

    pub fn draw_curve_tension(&mut self, pen: &Pen, points: &[Point], tension: f64) -> Result<()> {
        self.ensure_open()?;
        if points.len() < 2 {
            return Err(Error::TooFewPoints(points.len()));
        }
        self.backend.realize(Some(pen), None)?;
        self.backend.append_curve(points, tension)?;
        self.backend.append_stroke(false)
    }

    /// Spline over `segments` segments starting at `offset`, copying the
    /// sub-range before delegating.
    pub fn draw_curve_segment(
        &mut self,
        pen: &Pen,
        points: &[Point],
        offset: usize,
        segments: usize,
        tension: f64,
    ) -> Result<()> {
        self.ensure_open()?;
        let count = segments + 1;
        if segments == 0 {
            return Err(Error::TooFewPoints(count));
        }
        if offset + count > points.len() {
            return Err(Error::PointRangeOutOfBounds {
                offset,
                count,
                len: points.len(),
            });
        }
        let sub: Vec<Point> = points[offset..offset + count].to_vec();
        self.draw_curve_tension(pen, &sub, tension)
    }

    /// Elliptical arc; sweeps of 360 degrees or more degrade to the full
    /// ellipse.
    pub fn draw_arc(&mut self, pen: &Pen, rect: Rect, start_angle: f64, sweep_angle: f64) -> Result<()> {
        if sweep_angle.abs() >= 360.0 {
            return self.draw_ellipse(Some(pen), None, rect);
        }
        self.ensure_open()?;
        self.backend.realize(Some(pen), None)?;
        self.backend.append_arc(rect, start_angle, sweep_angle)?;
        self.backend.append_stroke(false)
    }

    // ----- closed shapes --------------------------------------------------

    fn paint(
        &mut self,
        pen: Option<&Pen>,
        brush: Option<&Brush>,
        fill_mode: FillMode,
        close_path: bool,
    ) -> Result<()> {
        match (pen, brush) {
            (Some(_), Some(_)) => self.backend.append_stroke_and_fill(fill_mode, close_path),
            (Some(_), None) => self.backend.append_stroke(close_path),
            (None, Some(_)) => self.backend.append_fill(fill_mode, close_path),
            (None, None) => Err(Error::NeedPenOrBrush),
        }
    }

    fn require_paint(pen: Option<&Pen>, brush: Option<&Brush>) -> Result<()> {
        if pen.is_none() && brush.is_none() {
            return Err(Error::NeedPenOrBrush);
        }
        Ok(())
    }

    pub fn draw_rectangle(
        &mut self,
        pen: Option<&Pen>,
        brush: Option<&Brush>,
        rect: Rect,
    ) -> Result<()> {
        self.ensure_open()?;
        Self::require_paint(pen, brush)?;
        self.backend.realize(pen, brush)?;
        self.backend.append_rectangle(rect)?;
        self.paint(pen, brush, FillMode::Winding, true)
    }

    pub fn draw_rounded_rectangle(
        &mut self,
        pen: Option<&Pen>,
        brush: Option<&Brush>,
        rect: Rect,
        corner: Size,
    ) -> Result<()> {
        self.ensure_open()?;
        Self::require_paint(pen, brush)?;
        self.backend.realize(pen, brush)?;
        self.backend.append_rounded_rectangle(rect, corner)?;
        self.paint(pen, brush, FillMode::Winding, true)
    }

    pub fn draw_ellipse(
        &mut self,
        pen: Option<&Pen>,
        brush: Option<&Brush>,
        rect: Rect,
    ) -> Result<()> {
        self.ensure_open()?;
        Self::require_paint(pen, brush)?;
        self.backend.realize(pen, brush)?;
        self.backend.append_ellipse(rect)?;
        self.paint(pen, brush, FillMode::Winding, true)
    }

    pub fn draw_circle(
        &mut self,
        pen: Option<&Pen>,
        brush: Option<&Brush>,
        center: Point,
        radius: f64,
    ) -> Result<()> {
        self.draw_ellipse(
            pen,
            brush,
            Rect::new(center.x - radius, center.y - radius, 2.0 * radius, 2.0 * radius),
        )
    }

    pub fn draw_polygon(
        &mut self,
        pen: Option<&Pen>,
        brush: Option<&Brush>,
        points: &[Point],
        fill_mode: FillMode,
    ) -> Result<()> {
        self.ensure_open()?;
        if points.len() < 2 {
            return Err(Error::TooFewPoints(points.len()));
        }
        Self::require_paint(pen, brush)?;
        self.backend.realize(pen, brush)?;
        self.backend.append_polygon(points)?;
        self.paint(pen, brush, fill_mode, true)
    }

    /// Pie slice of the ellipse inside `rect`, angles in degrees.
    pub fn draw_pie(
        &mut self,
        pen: Option<&Pen>,
        brush: Option<&Brush>,
        rect: Rect,
        start_angle: f64,
        sweep_angle: f64,
    ) -> Result<()> {
        self.ensure_open()?;
        Self::require_paint(pen, brush)?;
        let mut path = Path::new();
        path.add_pie(rect, start_angle, sweep_angle);
        self.backend.realize(pen, brush)?;
        self.backend.append_path(&path)?;
        self.paint(pen, brush, FillMode::Winding, true)
    }

    pub fn draw_path(&mut self, pen: Option<&Pen>, brush: Option<&Brush>, path: &Path) -> Result<()> {
        self.ensure_open()?;
        Self::require_paint(pen, brush)?;
        self.backend.realize(pen, brush)?;
        self.backend.append_path(path)?;
        self.paint(pen, brush, path.fill_mode, false)
    }

    // ----- text and images ------------------------------------------------

    /// Draws `text` inside `layout`. Empty text is a no-op. Baseline
    /// alignment requires a zero-height layout rectangle.
    pub fn draw_string(
        &mut self,
        text: &str,
        font: &Font,
        brush: &Brush,
        layout: Rect,
        format: &StringFormat,
    ) -> Result<()> {
        self.ensure_open()?;
        if format.line_alignment == LineAlignment::BaseLine && layout.height != 0.0 {
            return Err(Error::BaselineLayoutHeight);
        }
        if text.is_empty() {
            return Ok(());
        }
        self.backend.draw_string(text, font, brush, layout, format)
    }

    /// Draws the image at its natural size.
    pub fn draw_image(&mut self, image: &Image, position: Point) -> Result<()> {
        let size = image.point_size();
        self.draw_image_scaled(image, Rect::from_origin_size(position, size))
    }

    pub fn draw_image_scaled(&mut self, image: &Image, rect: Rect) -> Result<()> {
        self.ensure_open()?;
        self.check_form_consistency(image)?;
        self.backend
            .draw_image(image, rect.x, rect.y, rect.width, rect.height)
    }

    /// Draws the `src` sub-rectangle of the image into `dst`. The source
    /// rectangle must be given in the native unit.
    pub fn draw_image_rect(
        &mut self,
        image: &Image,
        dst: Rect,
        src: Rect,
        src_unit: PageUnit,
    ) -> Result<()> {
        self.ensure_open()?;
        if src_unit != PageUnit::Point {
            return Err(Error::UnsupportedUnit(src_unit));
        }
        self.check_form_consistency(image)?;
        self.backend.draw_image_rect(image, dst, src)
    }

    fn check_form_consistency(&self, image: &Image) -> Result<()> {
        let Image::Form(form) = image else {
            return Ok(());
        };
        if let Some(bound) = &self.bound_form {
            if Rc::ptr_eq(bound, &form.inner) {
                return Err(Error::FormDrawnOnItself);
            }
        }
        if let (Some(theirs), Some(ours)) = (form.document(), self.document) {
            if theirs != ours {
                return Err(Error::ForeignForm);
            }
        }
        // Drawing seals the form's content, closing its surface if one is
        // still open.
        form.finish();
        Ok(())
    }

    // ----- clipping and diagnostics ---------------------------------------

    pub fn intersect_clip_rect(&mut self, rect: Rect) -> Result<()> {
        let mut path = Path::new();
        path.add_rectangle(rect);
        self.intersect_clip(&path)
    }

    /// Intersects the current clip with `path`. Clip state participates in
    /// save/restore like the transform.
    pub fn intersect_clip(&mut self, path: &Path) -> Result<()> {
        self.ensure_open()?;
        self.clip.push(path.clone());
        self.backend.set_clip(path, CombineMode::Intersect)
    }

    /// Emits a diagnostic comment with no effect on output geometry.
    pub fn write_comment(&mut self, text: &str) -> Result<()> {
        self.ensure_open()?;
        self.backend.write_comment(text)
    }

    /// Bounding box of the world-space `rect` in default page space,
    /// where y is measured upward from the bottom edge of the physical
    /// page. Trim margins do not move the reference edge.
    pub fn world_to_default_page(&self, rect: Rect) -> Rect {
        let height = self.coords.size_points().height;
        let mut corners = [
            Point::new(rect.x, rect.y),
            Point::new(rect.right(), rect.y),
            Point::new(rect.right(), rect.bottom()),
            Point::new(rect.x, rect.bottom()),
        ];
        self.transform.transform_points(&mut corners);
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in corners {
            let y = height - p.y;
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

impl Surface<RecordingBackend> {
    /// A measurement-only context: same validation and state behavior,
    /// output goes nowhere.
    pub fn measure(size_points: Size, unit: PageUnit, direction: AxisDirection) -> Result<Self> {
        Self::new(RecordingBackend::new(), size_points, unit, direction)
    }
}

impl Form {
    /// Opens the form's one drawing surface. Fails if the form already had
    /// one or has been finished.
    pub fn surface(&self) -> Result<Surface<RecordingBackend>> {
        let ops = self.bind()?;
        let size = self.size();
        let mut surface = Surface::with_options(
            RecordingBackend::with_shared(ops),
            size,
            PageOptions {
                document: self.document(),
                ..PageOptions::default()
            },
        )?;
        surface.bound_form = Some(self.inner.clone());
        Ok(surface)
    }
}

impl<B: RenderBackend> Surface<B> {
    /// Consumes the surface and hands back the backend, e.g. to retrieve
    /// an SVG writer's sink or a raster backend's pixels. `close` should
    /// have been called first so the backend has flushed its output.
    pub fn into_backend(self) -> B {
        self.backend
    }
}
