//! The fixed command contract between a surface and its render target.
//!
//! Geometry arrives in page-unit coordinates; the running transform is
//! relayed separately through [`RenderBackend::add_transform`], which
//! carries only the incremental matrix just multiplied in. A backend must
//! therefore mirror every save/restore/transform call with its own matrix
//! stack in the same order, or all subsequent geometry silently lands in
//! the wrong place.

use crate::coords::PageUnit;
use crate::error::Result;
use crate::geom::{Point, Rect, Size};
use crate::image::Image;
use crate::matrix::{Matrix, MatrixOrder};
use crate::path::{FillMode, Path};
use crate::state::StateToken;
use crate::style::{Brush, Font, Pen, StringFormat};

/// How a new clip combines with the current one. Only intersection is
/// supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombineMode {
    Intersect,
}

pub trait RenderBackend {
    /// Called exactly once when the surface is disposed.
    fn close(&mut self) -> Result<()>;

    /// Announces the pen and brush the next paint operation will use.
    fn realize(&mut self, pen: Option<&Pen>, brush: Option<&Brush>) -> Result<()>;

    fn append_line(&mut self, p1: Point, p2: Point) -> Result<()>;
    fn append_beziers(&mut self, points: &[Point]) -> Result<()>;
    fn append_curve(&mut self, points: &[Point], tension: f64) -> Result<()>;
    fn append_arc(&mut self, rect: Rect, start_angle: f64, sweep_angle: f64) -> Result<()>;
    fn append_rectangle(&mut self, rect: Rect) -> Result<()>;
    fn append_rounded_rectangle(&mut self, rect: Rect, corner: Size) -> Result<()>;
    fn append_ellipse(&mut self, rect: Rect) -> Result<()>;
    fn append_polygon(&mut self, points: &[Point]) -> Result<()>;
    fn append_path(&mut self, path: &Path) -> Result<()>;

    fn append_stroke(&mut self, close_path: bool) -> Result<()>;
    fn append_fill(&mut self, fill_mode: FillMode, close_path: bool) -> Result<()>;
    fn append_stroke_and_fill(&mut self, fill_mode: FillMode, close_path: bool) -> Result<()>;

    fn save(&mut self, token: StateToken) -> Result<()>;
    fn restore(&mut self, token: StateToken) -> Result<()>;
    fn begin_container(
        &mut self,
        token: StateToken,
        dst: Rect,
        src: Rect,
        unit: PageUnit,
    ) -> Result<()>;
    fn end_container(&mut self, token: StateToken) -> Result<()>;
    /// Relays the incremental transform just multiplied into the surface's
    /// running matrix, never the cumulative one.
    fn add_transform(&mut self, matrix: Matrix, order: MatrixOrder) -> Result<()>;

    fn set_clip(&mut self, path: &Path, mode: CombineMode) -> Result<()>;
    fn reset_clip(&mut self) -> Result<()>;

    fn draw_string(
        &mut self,
        text: &str,
        font: &Font,
        brush: &Brush,
        layout: Rect,
        format: &StringFormat,
    ) -> Result<()>;
    fn draw_image(&mut self, image: &Image, x: f64, y: f64, width: f64, height: f64)
    -> Result<()>;
    fn draw_image_rect(&mut self, image: &Image, dst: Rect, src: Rect) -> Result<()>;

    /// Diagnostic marker; must have no effect on output geometry.
    fn write_comment(&mut self, text: &str) -> Result<()>;
}
