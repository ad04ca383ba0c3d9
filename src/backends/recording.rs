//! Recording backend.
//!
//! Captures every contract call as a [`RecordedOp`]. It backs
//! measurement-only contexts, stores form content, and gives tests a way
//! to assert on the exact command stream a surface produces. A recording
//! can be replayed against any other backend.

use std::cell::RefCell;
use std::rc::Rc;

use crate::backend::{CombineMode, RenderBackend};
use crate::coords::PageUnit;
use crate::error::Result;
use crate::geom::{Point, Rect, Size};
use crate::image::Image;
use crate::matrix::{Matrix, MatrixOrder};
use crate::path::{FillMode, Path};
use crate::state::StateToken;
use crate::style::{Brush, Font, Pen, StringFormat};

#[derive(Clone, Debug, PartialEq)]
pub enum RecordedOp {
    Close,
    Realize {
        pen: Option<Pen>,
        brush: Option<Brush>,
    },
    AppendLine {
        p1: Point,
        p2: Point,
    },
    AppendBeziers {
        points: Vec<Point>,
    },
    AppendCurve {
        points: Vec<Point>,
        tension: f64,
    },
    AppendArc {
        rect: Rect,
        start_angle: f64,
        sweep_angle: f64,
    },
    AppendRectangle {
        rect: Rect,
    },
    AppendRoundedRectangle {
        rect: Rect,
        corner: Size,
    },
    AppendEllipse {
        rect: Rect,
    },
    AppendPolygon {
        points: Vec<Point>,
    },
    AppendPath {
        path: Path,
    },
    AppendStroke {
        close_path: bool,
    },
    AppendFill {
        fill_mode: FillMode,
        close_path: bool,
    },
    AppendStrokeAndFill {
        fill_mode: FillMode,
        close_path: bool,
    },
    Save {
        token: StateToken,
    },
    Restore {
        token: StateToken,
    },
    BeginContainer {
        token: StateToken,
        dst: Rect,
        src: Rect,
        unit: PageUnit,
    },
    EndContainer {
        token: StateToken,
    },
    AddTransform {
        matrix: Matrix,
        order: MatrixOrder,
    },
    SetClip {
        path: Path,
        mode: CombineMode,
    },
    ResetClip,
    DrawString {
        text: String,
        font: Font,
        brush: Brush,
        layout: Rect,
        format: StringFormat,
    },
    DrawImage {
        image: Image,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    DrawImageRect {
        image: Image,
        dst: Rect,
        src: Rect,
    },
    WriteComment {
        text: String,
    },
}

pub struct RecordingBackend {
    ops: Rc<RefCell<Vec<RecordedOp>>>,
    closed: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::with_shared(Rc::new(RefCell::new(Vec::new())))
    }

    /// Records into shared storage, so forms keep their content even if
    /// their surface is dropped without an explicit close.
    pub(crate) fn with_shared(ops: Rc<RefCell<Vec<RecordedOp>>>) -> Self {
        Self { ops, closed: false }
    }

    /// Snapshot of everything recorded so far.
    pub fn ops(&self) -> Vec<RecordedOp> {
        self.ops.borrow().clone()
    }

    fn record(&mut self, op: RecordedOp) -> Result<()> {
        self.ops.borrow_mut().push(op);
        Ok(())
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for RecordingBackend {
    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.record(RecordedOp::Close)?;
        }
        Ok(())
    }

    fn realize(&mut self, pen: Option<&Pen>, brush: Option<&Brush>) -> Result<()> {
        self.record(RecordedOp::Realize {
            pen: pen.cloned(),
            brush: brush.cloned(),
        })
    }

    fn append_line(&mut self, p1: Point, p2: Point) -> Result<()> {
        self.record(RecordedOp::AppendLine { p1, p2 })
    }

    fn append_beziers(&mut self, points: &[Point]) -> Result<()> {
        self.record(RecordedOp::AppendBeziers {
            points: points.to_vec(),
        })
    }

    fn append_curve(&mut self, points: &[Point], tension: f64) -> Result<()> {
        self.record(RecordedOp::AppendCurve {
            points: points.to_vec(),
            tension,
        })
    }

    fn append_arc(&mut self, rect: Rect, start_angle: f64, sweep_angle: f64) -> Result<()> {
        self.record(RecordedOp::AppendArc {
            rect,
            start_angle,
            sweep_angle,
        })
    }

    fn append_rectangle(&mut self, rect: Rect) -> Result<()> {
        self.record(RecordedOp::AppendRectangle { rect })
    }

    fn append_rounded_rectangle(&mut self, rect: Rect, corner: Size) -> Result<()> {
        self.record(RecordedOp::AppendRoundedRectangle { rect, corner })
    }

    fn append_ellipse(&mut self, rect: Rect) -> Result<()> {
        self.record(RecordedOp::AppendEllipse { rect })
    }

    fn append_polygon(&mut self, points: &[Point]) -> Result<()> {
        self.record(RecordedOp::AppendPolygon {
            points: points.to_vec(),
        })
    }

    fn append_path(&mut self, path: &Path) -> Result<()> {
        self.record(RecordedOp::AppendPath { path: path.clone() })
    }

    fn append_stroke(&mut self, close_path: bool) -> Result<()> {
        self.record(RecordedOp::AppendStroke { close_path })
    }

    fn append_fill(&mut self, fill_mode: FillMode, close_path: bool) -> Result<()> {
        self.record(RecordedOp::AppendFill {
            fill_mode,
            close_path,
        })
    }

    fn append_stroke_and_fill(&mut self, fill_mode: FillMode, close_path: bool) -> Result<()> {
        self.record(RecordedOp::AppendStrokeAndFill {
            fill_mode,
            close_path,
        })
    }

    fn save(&mut self, token: StateToken) -> Result<()> {
        self.record(RecordedOp::Save { token })
    }

    fn restore(&mut self, token: StateToken) -> Result<()> {
        self.record(RecordedOp::Restore { token })
    }

    fn begin_container(
        &mut self,
        token: StateToken,
        dst: Rect,
        src: Rect,
        unit: PageUnit,
    ) -> Result<()> {
        self.record(RecordedOp::BeginContainer {
            token,
            dst,
            src,
            unit,
        })
    }

    fn end_container(&mut self, token: StateToken) -> Result<()> {
        self.record(RecordedOp::EndContainer { token })
    }

    fn add_transform(&mut self, matrix: Matrix, order: MatrixOrder) -> Result<()> {
        self.record(RecordedOp::AddTransform { matrix, order })
    }

    fn set_clip(&mut self, path: &Path, mode: CombineMode) -> Result<()> {
        self.record(RecordedOp::SetClip {
            path: path.clone(),
            mode,
        })
    }

    fn reset_clip(&mut self) -> Result<()> {
        self.record(RecordedOp::ResetClip)
    }

    fn draw_string(
        &mut self,
        text: &str,
        font: &Font,
        brush: &Brush,
        layout: Rect,
        format: &StringFormat,
    ) -> Result<()> {
        self.record(RecordedOp::DrawString {
            text: text.to_string(),
            font: font.clone(),
            brush: brush.clone(),
            layout,
            format: *format,
        })
    }

    fn draw_image(
        &mut self,
        image: &Image,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        self.record(RecordedOp::DrawImage {
            image: image.clone(),
            x,
            y,
            width,
            height,
        })
    }

    fn draw_image_rect(&mut self, image: &Image, dst: Rect, src: Rect) -> Result<()> {
        self.record(RecordedOp::DrawImageRect {
            image: image.clone(),
            dst,
            src,
        })
    }

    fn write_comment(&mut self, text: &str) -> Result<()> {
        self.record(RecordedOp::WriteComment {
            text: text.to_string(),
        })
    }
}

/// Re-issues a recording against another backend, in order.
pub fn replay<B: RenderBackend>(ops: &[RecordedOp], backend: &mut B) -> Result<()> {
    for op in ops {
        match op {
            RecordedOp::Close => backend.close()?,
            RecordedOp::Realize { pen, brush } => {
                backend.realize(pen.as_ref(), brush.as_ref())?
            }
            RecordedOp::AppendLine { p1, p2 } => backend.append_line(*p1, *p2)?,
            RecordedOp::AppendBeziers { points } => backend.append_beziers(points)?,
            RecordedOp::AppendCurve { points, tension } => {
                backend.append_curve(points, *tension)?
            }
            RecordedOp::AppendArc {
                rect,
                start_angle,
                sweep_angle,
            } => backend.append_arc(*rect, *start_angle, *sweep_angle)?,
            RecordedOp::AppendRectangle { rect } => backend.append_rectangle(*rect)?,
            RecordedOp::AppendRoundedRectangle { rect, corner } => {
                backend.append_rounded_rectangle(*rect, *corner)?
            }
            RecordedOp::AppendEllipse { rect } => backend.append_ellipse(*rect)?,
            RecordedOp::AppendPolygon { points } => backend.append_polygon(points)?,
            RecordedOp::AppendPath { path } => backend.append_path(path)?,
            RecordedOp::AppendStroke { close_path } => backend.append_stroke(*close_path)?,
            RecordedOp::AppendFill {
                fill_mode,
                close_path,
            } => backend.append_fill(*fill_mode, *close_path)?,
            RecordedOp::AppendStrokeAndFill {
                fill_mode,
                close_path,
            } => backend.append_stroke_and_fill(*fill_mode, *close_path)?,
            RecordedOp::Save { token } => backend.save(*token)?,
            RecordedOp::Restore { token } => backend.restore(*token)?,
            RecordedOp::BeginContainer {
                token,
                dst,
                src,
                unit,
            } => backend.begin_container(*token, *dst, *src, *unit)?,
            RecordedOp::EndContainer { token } => backend.end_container(*token)?,
            RecordedOp::AddTransform { matrix, order } => {
                backend.add_transform(*matrix, *order)?
            }
            RecordedOp::SetClip { path, mode } => backend.set_clip(path, *mode)?,
            RecordedOp::ResetClip => backend.reset_clip()?,
            RecordedOp::DrawString {
                text,
                font,
                brush,
                layout,
                format,
            } => backend.draw_string(text, font, brush, *layout, format)?,
            RecordedOp::DrawImage {
                image,
                x,
                y,
                width,
                height,
            } => backend.draw_image(image, *x, *y, *width, *height)?,
            RecordedOp::DrawImageRect { image, dst, src } => {
                backend.draw_image_rect(image, *dst, *src)?
            }
            RecordedOp::WriteComment { text } => backend.write_comment(text)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn records_a_stroke_sequence() {
        let mut backend = RecordingBackend::new();
        let pen = Pen::new(Color::rgb(0.0, 0.0, 0.0), 1.0);
        backend.realize(Some(&pen), None).unwrap();
        backend
            .append_line(Point::new(0.0, 0.0), Point::new(10.0, 10.0))
            .unwrap();
        backend.append_stroke(false).unwrap();
        let ops = backend.ops();
        assert_eq!(ops.len(), 3);
        assert_eq!(
            ops[1],
            RecordedOp::AppendLine {
                p1: Point::new(0.0, 0.0),
                p2: Point::new(10.0, 10.0),
            }
        );
    }

    #[test]
    fn close_is_recorded_once() {
        let mut backend = RecordingBackend::new();
        backend.close().unwrap();
        backend.close().unwrap();
        assert_eq!(backend.ops(), vec![RecordedOp::Close]);
    }

    #[test]
    fn replay_reproduces_the_recording() {
        let mut original = RecordingBackend::new();
        original
            .append_rectangle(Rect::new(1.0, 2.0, 3.0, 4.0))
            .unwrap();
        original.append_fill(FillMode::Winding, true).unwrap();
        original.write_comment("hello").unwrap();

        let mut copy = RecordingBackend::new();
        replay(&original.ops(), &mut copy).unwrap();
        assert_eq!(original.ops(), copy.ops());
    }
}
