//! Raster backend on top of tiny-skia.
//!
//! Geometry accumulates in a `PathBuilder`; the paint operations rasterize
//! it with the relayed transform applied at draw time. Clipping goes
//! through an alpha mask that successive clips intersect into.

use tiny_skia::{
    FillRule, IntSize, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, StrokeDash,
    Transform,
};

use crate::backend::{CombineMode, RenderBackend};
use crate::backends::recording::{RecordedOp, replay};
use crate::color::Color;
use crate::coords::PageUnit;
use crate::error::{Error, Result};
use crate::geom::{Point, Rect, Size};
use crate::image::{Image, RasterImage};
use crate::matrix::{Matrix, MatrixOrder};
use crate::path::{self, FillMode, Path, PathCommand};
use crate::state::StateToken;
use crate::style::{Brush, Font, LineCap, LineJoin, Pen, StringFormat};

#[derive(Clone)]
struct RasterState {
    transform: Matrix,
    clip: Option<Mask>,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            transform: Matrix::IDENTITY,
            clip: None,
        }
    }
}

/// Renders into an in-memory pixmap, `zoom` pixels per point.
pub struct RasterBackend {
    pixmap: Pixmap,
    zoom: f32,
    builder: PathBuilder,
    state: RasterState,
    stack: Vec<(StateToken, RasterState)>,
    pen: Option<Pen>,
    brush: Option<Brush>,
}

impl RasterBackend {
    /// Width and height are in points; the pixmap is scaled by `zoom` and
    /// cleared to white.
    pub fn new(width: f64, height: f64, zoom: f32) -> Result<Self> {
        let px_w = (width * zoom as f64).round() as u32;
        let px_h = (height * zoom as f64).round() as u32;
        let mut pixmap = Pixmap::new(px_w, px_h)
            .ok_or_else(|| Error::Backend(format!("bad pixmap size {}x{}", px_w, px_h)))?;
        pixmap.fill(tiny_skia::Color::WHITE);
        Ok(Self {
            pixmap,
            zoom,
            builder: PathBuilder::new(),
            state: RasterState::default(),
            stack: Vec::new(),
            pen: None,
            brush: None,
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| Error::Backend(e.to_string()))
    }

    fn skia_transform(&self) -> Transform {
        let m = self.state.transform;
        Transform::from_row(
            m.a as f32, m.b as f32, m.c as f32, m.d as f32, m.e as f32, m.f as f32,
        )
        .post_scale(self.zoom, self.zoom)
    }

    fn skia_color(color: &Color) -> tiny_skia::Color {
        let (r, g, b) = match *color {
            Color::Rgb { r, g, b } => (r, g, b),
            Color::Cmyk { c, m, y, k } => (
                (1.0 - c) * (1.0 - k),
                (1.0 - m) * (1.0 - k),
                (1.0 - y) * (1.0 - k),
            ),
            Color::Gray { value } => (value, value, value),
        };
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        tiny_skia::Color::from_rgba8(channel(r), channel(g), channel(b), 255)
    }

    fn fill_rule(mode: FillMode) -> FillRule {
        match mode {
            FillMode::Winding => FillRule::Winding,
            FillMode::Alternate => FillRule::EvenOdd,
        }
    }

    fn take_path(&mut self, close_path: bool) -> Option<tiny_skia::Path> {
        let mut builder = std::mem::replace(&mut self.builder, PathBuilder::new());
        if builder.is_empty() {
            return None;
        }
        if close_path {
            builder.close();
        }
        builder.finish()
    }

    fn stroke_settings(pen: &Pen) -> Stroke {
        let dash = if pen.dash_pattern.is_empty() {
            None
        } else {
            let pattern: Vec<f32> = pen.dash_pattern.iter().map(|v| *v as f32).collect();
            StrokeDash::new(pattern, pen.dash_offset as f32)
        };
        Stroke {
            width: pen.width as f32,
            miter_limit: pen.miter_limit as f32,
            line_cap: match pen.cap {
                LineCap::Flat => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Square => tiny_skia::LineCap::Square,
            },
            line_join: match pen.join {
                LineJoin::Miter => tiny_skia::LineJoin::Miter,
                LineJoin::Round => tiny_skia::LineJoin::Round,
                LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
            },
            dash,
        }
    }

    fn fill_skia_path(&mut self, path: &tiny_skia::Path, fill_mode: FillMode) {
        let Some(brush) = &self.brush else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(Self::skia_color(&brush.color()));
        paint.anti_alias = true;
        self.pixmap.fill_path(
            path,
            &paint,
            Self::fill_rule(fill_mode),
            self.skia_transform(),
            self.state.clip.as_ref(),
        );
    }

    fn stroke_skia_path(&mut self, path: &tiny_skia::Path) {
        let Some(pen) = &self.pen else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(Self::skia_color(&pen.color));
        paint.anti_alias = true;
        let stroke = Self::stroke_settings(pen);
        self.pixmap.stroke_path(
            path,
            &paint,
            &stroke,
            self.skia_transform(),
            self.state.clip.as_ref(),
        );
    }

    fn move_to(&mut self, p: Point) {
        self.builder.move_to(p.x as f32, p.y as f32);
    }

    fn line_to(&mut self, p: Point) {
        self.builder.line_to(p.x as f32, p.y as f32);
    }

    fn curve_to(&mut self, c1: Point, c2: Point, end: Point) {
        self.builder.cubic_to(
            c1.x as f32,
            c1.y as f32,
            c2.x as f32,
            c2.y as f32,
            end.x as f32,
            end.y as f32,
        );
    }

    /// Continues the open figure if there is one, otherwise starts one.
    fn extend_to(&mut self, p: Point) {
        if self.builder.is_empty() {
            self.move_to(p);
        } else {
            self.line_to(p);
        }
    }

    fn append_commands(&mut self, commands: &[PathCommand]) {
        for cmd in commands {
            match cmd {
                PathCommand::MoveTo(p) => self.move_to(*p),
                PathCommand::LineTo(p) => self.line_to(*p),
                PathCommand::CurveTo(c1, c2, end) => self.curve_to(*c1, *c2, *end),
                PathCommand::Close => self.builder.close(),
            }
        }
    }

    fn skia_path_of(path: &Path) -> Option<tiny_skia::Path> {
        let mut builder = PathBuilder::new();
        for cmd in path.commands() {
            match cmd {
                PathCommand::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
                PathCommand::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
                PathCommand::CurveTo(c1, c2, end) => builder.cubic_to(
                    c1.x as f32,
                    c1.y as f32,
                    c2.x as f32,
                    c2.y as f32,
                    end.x as f32,
                    end.y as f32,
                ),
                PathCommand::Close => builder.close(),
            }
        }
        builder.finish()
    }

    fn image_pixmap(image: &RasterImage) -> Result<Pixmap> {
        // tiny-skia wants premultiplied alpha.
        let mut data = Vec::with_capacity(image.rgba().len());
        for px in image.rgba().chunks_exact(4) {
            let c = tiny_skia::ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        let size = IntSize::from_wh(image.width_px(), image.height_px())
            .ok_or_else(|| Error::Backend("zero-sized image".into()))?;
        Pixmap::from_vec(data, size).ok_or_else(|| Error::Backend("bad image buffer".into()))
    }

    fn draw_raster(&mut self, image: &RasterImage, rect: Rect) -> Result<()> {
        let source = Self::image_pixmap(image)?;
        // Maps image pixel space onto the destination rectangle.
        let placement = Transform::from_row(
            (rect.width / image.width_px() as f64) as f32,
            0.0,
            0.0,
            (rect.height / image.height_px() as f64) as f32,
            rect.x as f32,
            rect.y as f32,
        )
        .post_concat(self.skia_transform());
        self.pixmap.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &PixmapPaint::default(),
            placement,
            self.state.clip.as_ref(),
        );
        Ok(())
    }

    fn replay_form(&mut self, ops: Vec<RecordedOp>, local: Matrix) -> Result<()> {
        let saved_state = self.state.clone();
        let saved_pen = self.pen.take();
        let saved_brush = self.brush.take();
        let saved_depth = self.stack.len();
        self.state.transform = local.then(saved_state.transform);
        let result = replay(&ops, self);
        self.stack.truncate(saved_depth);
        self.state = saved_state;
        self.pen = saved_pen;
        self.brush = saved_brush;
        result
    }

    fn intersect_clip_path(&mut self, path: &tiny_skia::Path, rule: FillRule) -> Result<()> {
        let transform = self.skia_transform();
        match &mut self.state.clip {
            Some(mask) => {
                mask.intersect_path(path, rule, true, transform);
            }
            None => {
                let mut mask = Mask::new(self.pixmap.width(), self.pixmap.height())
                    .ok_or_else(|| Error::Backend("mask allocation failed".into()))?;
                mask.fill_path(path, rule, true, transform);
                self.state.clip = Some(mask);
            }
        }
        Ok(())
    }

    fn pop_to(&mut self, token: StateToken) -> Result<()> {
        while let Some((t, state)) = self.stack.pop() {
            if t == token {
                self.state = state;
                return Ok(());
            }
        }
        Err(Error::Backend(
            "restore token not found in raster backend".into(),
        ))
    }
}

impl RenderBackend for RasterBackend {
    fn close(&mut self) -> Result<()> {
        // Pixels are already in place; nothing to flush.
        Ok(())
    }

    fn realize(&mut self, pen: Option<&Pen>, brush: Option<&Brush>) -> Result<()> {
        self.pen = pen.cloned();
        self.brush = brush.cloned();
        Ok(())
    }

    fn append_line(&mut self, p1: Point, p2: Point) -> Result<()> {
        self.move_to(p1);
        self.line_to(p2);
        Ok(())
    }

    fn append_beziers(&mut self, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        self.extend_to(points[0]);
        for chunk in points[1..].chunks_exact(3) {
            self.curve_to(chunk[0], chunk[1], chunk[2]);
        }
        Ok(())
    }

    fn append_curve(&mut self, points: &[Point], tension: f64) -> Result<()> {
        if points.len() < 2 {
            return Ok(());
        }
        self.extend_to(points[0]);
        for seg in path::curve_segments(points, tension) {
            self.curve_to(seg.c1, seg.c2, seg.end);
        }
        Ok(())
    }

    fn append_arc(&mut self, rect: Rect, start_angle: f64, sweep_angle: f64) -> Result<()> {
        if sweep_angle.abs() >= 360.0 {
            return self.append_ellipse(rect);
        }
        let (start, segments) = path::arc_segments(rect, start_angle, sweep_angle);
        self.extend_to(start);
        for seg in segments {
            self.curve_to(seg.c1, seg.c2, seg.end);
        }
        Ok(())
    }

    fn append_rectangle(&mut self, rect: Rect) -> Result<()> {
        self.move_to(Point::new(rect.x, rect.y));
        self.line_to(Point::new(rect.right(), rect.y));
        self.line_to(Point::new(rect.right(), rect.bottom()));
        self.line_to(Point::new(rect.x, rect.bottom()));
        self.builder.close();
        Ok(())
    }

    fn append_rounded_rectangle(&mut self, rect: Rect, corner: Size) -> Result<()> {
        let mut path = Path::new();
        path.add_rounded_rectangle(rect, corner);
        self.append_commands(path.commands());
        Ok(())
    }

    fn append_ellipse(&mut self, rect: Rect) -> Result<()> {
        let (start, segments) = path::arc_segments(rect, 0.0, 360.0);
        self.move_to(start);
        for seg in segments {
            self.curve_to(seg.c1, seg.c2, seg.end);
        }
        self.builder.close();
        Ok(())
    }

    fn append_polygon(&mut self, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        self.move_to(points[0]);
        for p in &points[1..] {
            self.line_to(*p);
        }
        self.builder.close();
        Ok(())
    }

    fn append_path(&mut self, path: &Path) -> Result<()> {
        self.append_commands(path.commands());
        Ok(())
    }

    fn append_stroke(&mut self, close_path: bool) -> Result<()> {
        if let Some(path) = self.take_path(close_path) {
            self.stroke_skia_path(&path);
        }
        Ok(())
    }

    fn append_fill(&mut self, fill_mode: FillMode, close_path: bool) -> Result<()> {
        if let Some(path) = self.take_path(close_path) {
            self.fill_skia_path(&path, fill_mode);
        }
        Ok(())
    }

    fn append_stroke_and_fill(&mut self, fill_mode: FillMode, close_path: bool) -> Result<()> {
        if let Some(path) = self.take_path(close_path) {
            self.fill_skia_path(&path, fill_mode);
            self.stroke_skia_path(&path);
        }
        Ok(())
    }

    fn save(&mut self, token: StateToken) -> Result<()> {
        self.stack.push((token, self.state.clone()));
        Ok(())
    }

    fn restore(&mut self, token: StateToken) -> Result<()> {
        self.pop_to(token)
    }

    fn begin_container(
        &mut self,
        token: StateToken,
        _dst: Rect,
        _src: Rect,
        _unit: PageUnit,
    ) -> Result<()> {
        // The remap itself arrives through add_transform.
        self.stack.push((token, self.state.clone()));
        Ok(())
    }

    fn end_container(&mut self, token: StateToken) -> Result<()> {
        self.pop_to(token)
    }

    fn add_transform(&mut self, matrix: Matrix, order: MatrixOrder) -> Result<()> {
        self.state.transform.multiply(matrix, order);
        Ok(())
    }

    fn set_clip(&mut self, path: &Path, _mode: CombineMode) -> Result<()> {
        let Some(skia_path) = Self::skia_path_of(path) else {
            return Ok(());
        };
        self.intersect_clip_path(&skia_path, Self::fill_rule(path.fill_mode))
    }

    fn reset_clip(&mut self) -> Result<()> {
        self.state.clip = None;
        Ok(())
    }

    fn draw_string(
        &mut self,
        _text: &str,
        _font: &Font,
        _brush: &Brush,
        _layout: Rect,
        _format: &StringFormat,
    ) -> Result<()> {
        Err(Error::Unsupported("raster backend does not render text"))
    }

    fn draw_image(&mut self, image: &Image, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        match image {
            Image::Raster(raster) => self.draw_raster(raster, Rect::new(x, y, width, height)),
            Image::Form(form) => {
                let size = form.size();
                let local = Matrix::scaling(width / size.width, height / size.height)
                    .then(Matrix::translation(x, y));
                let ops: Vec<RecordedOp> = form
                    .recorded_ops()
                    .into_iter()
                    .filter(|op| !matches!(op, RecordedOp::Close))
                    .collect();
                self.replay_form(ops, local)
            }
        }
    }

    fn draw_image_rect(&mut self, image: &Image, dst: Rect, src: Rect) -> Result<()> {
        // Clip to the destination, then draw the whole image scaled so the
        // source sub-rectangle lands exactly on it.
        let sx = dst.width / src.width;
        let sy = dst.height / src.height;
        let full = image.point_size();
        let drawn = Rect::new(
            dst.x - src.x * sx,
            dst.y - src.y * sy,
            full.width * sx,
            full.height * sy,
        );

        let saved_clip = self.state.clip.clone();
        let mut clip_path = Path::new();
        clip_path.add_rectangle(dst);
        let result = match Self::skia_path_of(&clip_path) {
            Some(skia_path) => self
                .intersect_clip_path(&skia_path, FillRule::Winding)
                .and_then(|_| self.draw_image(image, drawn.x, drawn.y, drawn.width, drawn.height)),
            None => Ok(()),
        };
        self.state.clip = saved_clip;
        result
    }

    fn write_comment(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::AxisDirection;
    use crate::surface::Surface;

    fn surface(width: f64, height: f64) -> Surface<RasterBackend> {
        let backend = RasterBackend::new(width, height, 1.0).unwrap();
        Surface::new(
            backend,
            Size::new(width, height),
            PageUnit::Point,
            AxisDirection::Downwards,
        )
        .unwrap()
    }

    fn pixel(backend: &RasterBackend, x: u32, y: u32) -> (u8, u8, u8) {
        let p = backend.pixmap().pixel(x, y).unwrap();
        (p.red(), p.green(), p.blue())
    }

    #[test]
    fn filled_rectangle_colors_its_pixels() {
        let mut s = surface(100.0, 100.0);
        let brush = Brush::solid(Color::rgb(1.0, 0.0, 0.0));
        s.draw_rectangle(None, Some(&brush), Rect::new(10.0, 10.0, 30.0, 30.0))
            .unwrap();
        s.close().unwrap();
        let b = s.into_backend();
        assert_eq!(pixel(&b, 25, 25), (255, 0, 0));
        assert_eq!(pixel(&b, 60, 60), (255, 255, 255));
    }

    #[test]
    fn clip_confines_painting() {
        let mut s = surface(100.0, 100.0);
        let brush = Brush::solid(Color::rgb(0.0, 0.0, 1.0));
        s.intersect_clip_rect(Rect::new(0.0, 0.0, 50.0, 100.0)).unwrap();
        s.draw_rectangle(None, Some(&brush), Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        s.close().unwrap();
        let b = s.into_backend();
        assert_eq!(pixel(&b, 10, 50), (0, 0, 255));
        assert_eq!(pixel(&b, 90, 50), (255, 255, 255));
    }

    #[test]
    fn upward_axis_flips_the_page() {
        let backend = RasterBackend::new(100.0, 100.0, 1.0).unwrap();
        let mut s = Surface::new(
            backend,
            Size::new(100.0, 100.0),
            PageUnit::Point,
            AxisDirection::Upwards,
        )
        .unwrap();
        let brush = Brush::solid(Color::rgb(0.0, 0.5, 0.0));
        // With the upward axis y=0 is the page bottom, so this strip
        // paints the lowest device rows.
        s.draw_rectangle(None, Some(&brush), Rect::new(0.0, 0.0, 100.0, 10.0))
            .unwrap();
        s.close().unwrap();
        let b = s.into_backend();
        assert_eq!(pixel(&b, 50, 95).2, 0);
        assert_ne!(pixel(&b, 50, 95), (255, 255, 255));
        assert_eq!(pixel(&b, 50, 5), (255, 255, 255));
    }

    #[test]
    fn transform_moves_subsequent_drawing() {
        let mut s = surface(100.0, 100.0);
        let brush = Brush::solid(Color::gray(0.0));
        s.translate_transform(40.0, 40.0).unwrap();
        s.draw_rectangle(None, Some(&brush), Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        s.close().unwrap();
        let b = s.into_backend();
        assert_eq!(pixel(&b, 45, 45), (0, 0, 0));
        assert_eq!(pixel(&b, 5, 5), (255, 255, 255));
    }

    #[test]
    fn zoom_scales_the_pixmap() {
        let backend = RasterBackend::new(100.0, 50.0, 2.0).unwrap();
        assert_eq!(backend.pixmap().width(), 200);
        assert_eq!(backend.pixmap().height(), 100);
    }

    #[test]
    fn raster_images_are_composited() {
        let mut s = surface(100.0, 100.0);
        // 2x2 solid red image.
        let image = RasterImage::new(2, 2, vec![255, 0, 0, 255].repeat(4));
        s.draw_image_scaled(&Image::Raster(image), Rect::new(10.0, 10.0, 20.0, 20.0))
            .unwrap();
        s.close().unwrap();
        let b = s.into_backend();
        assert_eq!(pixel(&b, 20, 20), (255, 0, 0));
        assert_eq!(pixel(&b, 50, 50), (255, 255, 255));
    }

    #[test]
    fn forms_replay_into_pixels() {
        use crate::image::Form;
        let form = Form::new(Size::new(10.0, 10.0));
        {
            let mut fs = form.surface().unwrap();
            let brush = Brush::solid(Color::rgb(0.0, 0.0, 1.0));
            fs.draw_rectangle(None, Some(&brush), Rect::new(0.0, 0.0, 10.0, 10.0))
                .unwrap();
            fs.close().unwrap();
        }
        let mut s = surface(100.0, 100.0);
        s.draw_image_scaled(&Image::Form(form), Rect::new(30.0, 30.0, 10.0, 10.0))
            .unwrap();
        s.close().unwrap();
        let b = s.into_backend();
        assert_eq!(pixel(&b, 35, 35), (0, 0, 255));
        assert_eq!(pixel(&b, 5, 5), (255, 255, 255));
    }

    #[test]
    fn text_is_not_supported() {
        let mut s = surface(100.0, 100.0);
        let font = Font::new("Helvetica", 12.0);
        let brush = Brush::solid(Color::gray(0.0));
        let err = s
            .draw_string(
                "hi",
                &font,
                &brush,
                Rect::new(0.0, 0.0, 100.0, 20.0),
                &StringFormat::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }
}
