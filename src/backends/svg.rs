//! SVG backend using a streaming XML writer.
//!
//! Paints become `<path>` elements with a `transform` attribute mirroring
//! the relayed matrix; clips become `<clipPath>` definitions wrapping the
//! subsequent content in a group. Raster images are embedded as base64
//! PNG data URIs; forms are replayed inline inside a scaling group.

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use png::{ColorType, Encoder as PngEncoder};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::backend::{CombineMode, RenderBackend};
use crate::backends::recording::{RecordedOp, replay};
use crate::color::Color;
use crate::coords::PageUnit;
use crate::error::Result;
use crate::geom::{Point, Rect, Size};
use crate::image::{Image, RasterImage};
use crate::matrix::{Matrix, MatrixOrder};
use crate::path::{self, FillMode, Path, PathCommand};
use crate::state::StateToken;
use crate::style::{
    Alignment, Brush, Font, LineAlignment, LineCap, LineJoin, Pen, StringFormat,
};

#[derive(Clone, Debug)]
struct SvgState {
    transform: Matrix,
    /// Number of clip groups open when this state was captured.
    open_groups: usize,
}

impl Default for SvgState {
    fn default() -> Self {
        Self {
            transform: Matrix::IDENTITY,
            open_groups: 0,
        }
    }
}

/// Streams an SVG document into the provided sink.
pub struct SvgBackend<W: Write> {
    writer: Writer<W>,
    open_root: bool,
    current_path: String,
    state: SvgState,
    stack: Vec<(StateToken, SvgState)>,
    total_open_groups: usize,
    /// Clip groups below this depth belong to the enclosing content and
    /// stay open across a form replay.
    group_floor: usize,
    pen: Option<Pen>,
    brush: Option<Brush>,
    clip_counter: usize,
}

impl<W: Write> SvgBackend<W> {
    /// Width and height are in points; a matching `viewBox` is set.
    pub fn new(inner: W, width: f64, height: f64) -> Result<Self> {
        let mut writer = Writer::new_with_indent(inner, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let width_attr = format!("{}pt", width);
        let height_attr = format!("{}pt", height);
        let view_box_attr = format!("0 0 {} {}", width, height);

        let mut start = BytesStart::new("svg");
        start.push_attribute(("xmlns", "http://www.w3.org/2000/svg"));
        start.push_attribute(("version", "1.1"));
        start.push_attribute(("width", width_attr.as_str()));
        start.push_attribute(("height", height_attr.as_str()));
        start.push_attribute(("viewBox", view_box_attr.as_str()));
        writer.write_event(Event::Start(start))?;

        Ok(Self {
            writer,
            open_root: true,
            current_path: String::new(),
            state: SvgState::default(),
            stack: Vec::new(),
            total_open_groups: 0,
            group_floor: 0,
            pen: None,
            brush: None,
            clip_counter: 0,
        })
    }

    /// Finish the document, closing the root element and returning the
    /// inner sink.
    pub fn finish(mut self) -> Result<W> {
        self.close_document()?;
        Ok(self.writer.into_inner())
    }

    fn close_document(&mut self) -> Result<()> {
        if self.open_root {
            while self.total_open_groups > 0 {
                self.writer.write_event(Event::End(BytesEnd::new("g")))?;
                self.total_open_groups -= 1;
            }
            self.writer.write_event(Event::End(BytesEnd::new("svg")))?;
            self.open_root = false;
        }
        Ok(())
    }

    fn css_color(color: &Color) -> String {
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
        format!("rgb({},{},{})", channel(r), channel(g), channel(b))
    }

    fn path_data(commands: &[PathCommand]) -> String {
        let mut d = String::new();
        for cmd in commands {
            if !d.is_empty() {
                d.push(' ');
            }
            match cmd {
                PathCommand::MoveTo(p) => d.push_str(&format!("M {} {}", p.x, p.y)),
                PathCommand::LineTo(p) => d.push_str(&format!("L {} {}", p.x, p.y)),
                PathCommand::CurveTo(c1, c2, end) => d.push_str(&format!(
                    "C {} {} {} {} {} {}",
                    c1.x, c1.y, c2.x, c2.y, end.x, end.y
                )),
                PathCommand::Close => d.push('Z'),
            }
        }
        d
    }

    fn push_segment(&mut self, segment: &str) {
        if !self.current_path.is_empty() {
            self.current_path.push(' ');
        }
        self.current_path.push_str(segment);
    }

    fn move_to(&mut self, p: Point) {
        self.push_segment(&format!("M {} {}", p.x, p.y));
    }

    fn line_to(&mut self, p: Point) {
        self.push_segment(&format!("L {} {}", p.x, p.y));
    }

    fn curve_to(&mut self, c1: Point, c2: Point, end: Point) {
        self.push_segment(&format!(
            "C {} {} {} {} {} {}",
            c1.x, c1.y, c2.x, c2.y, end.x, end.y
        ));
    }

    /// Continues the open figure if there is one, otherwise starts one.
    fn extend_to(&mut self, p: Point) {
        if self.current_path.is_empty() {
            self.move_to(p);
        } else {
            self.line_to(p);
        }
    }

    fn transform_attr(&self, elem: &mut BytesStart<'_>) {
        let m = self.state.transform;
        if !m.is_identity() {
            let attr = format!("matrix({} {} {} {} {} {})", m.a, m.b, m.c, m.d, m.e, m.f);
            elem.push_attribute(("transform", attr.as_str()));
        }
    }

    fn stroke_attrs(&self, elem: &mut BytesStart<'_>) {
        let Some(pen) = &self.pen else {
            elem.push_attribute(("stroke", "none"));
            return;
        };
        let color = Self::css_color(&pen.color);
        elem.push_attribute(("stroke", color.as_str()));
        let width = pen.width.to_string();
        elem.push_attribute(("stroke-width", width.as_str()));
        elem.push_attribute((
            "stroke-linecap",
            match pen.cap {
                LineCap::Flat => "butt",
                LineCap::Round => "round",
                LineCap::Square => "square",
            },
        ));
        elem.push_attribute((
            "stroke-linejoin",
            match pen.join {
                LineJoin::Miter => "miter",
                LineJoin::Round => "round",
                LineJoin::Bevel => "bevel",
            },
        ));
        if pen.join == LineJoin::Miter {
            let miter = pen.miter_limit.to_string();
            elem.push_attribute(("stroke-miterlimit", miter.as_str()));
        }
        if !pen.dash_pattern.is_empty() {
            let dashes = pen
                .dash_pattern
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            elem.push_attribute(("stroke-dasharray", dashes.as_str()));
            if pen.dash_offset != 0.0 {
                let offset = pen.dash_offset.to_string();
                elem.push_attribute(("stroke-dashoffset", offset.as_str()));
            }
        }
    }

    fn fill_attrs(&self, elem: &mut BytesStart<'_>, fill_mode: FillMode) {
        let Some(brush) = &self.brush else {
            elem.push_attribute(("fill", "none"));
            return;
        };
        let color = Self::css_color(&brush.color());
        elem.push_attribute(("fill", color.as_str()));
        elem.push_attribute((
            "fill-rule",
            match fill_mode {
                FillMode::Winding => "nonzero",
                FillMode::Alternate => "evenodd",
            },
        ));
    }

    fn flush_path(&mut self, stroke: bool, fill: Option<FillMode>, close_path: bool) -> Result<()> {
        if self.current_path.is_empty() {
            return Ok(());
        }
        if close_path && !self.current_path.ends_with('Z') {
            self.current_path.push_str(" Z");
        }
        let d = std::mem::take(&mut self.current_path);
        let mut elem = BytesStart::new("path");
        elem.push_attribute(("d", d.as_str()));
        match fill {
            Some(mode) => self.fill_attrs(&mut elem, mode),
            None => elem.push_attribute(("fill", "none")),
        }
        if stroke {
            self.stroke_attrs(&mut elem);
        } else {
            elem.push_attribute(("stroke", "none"));
        }
        self.transform_attr(&mut elem);
        self.writer.write_event(Event::Empty(elem))?;
        Ok(())
    }

    fn append_commands(&mut self, commands: &[PathCommand]) {
        for cmd in commands {
            match cmd {
                PathCommand::MoveTo(p) => self.move_to(*p),
                PathCommand::LineTo(p) => self.line_to(*p),
                PathCommand::CurveTo(c1, c2, end) => self.curve_to(*c1, *c2, *end),
                PathCommand::Close => self.push_segment("Z"),
            }
        }
    }

    fn encode_data_uri(&self, image: &RasterImage) -> Result<String> {
        let mut png_bytes = Vec::new();
        let mut encoder = PngEncoder::new(&mut png_bytes, image.width_px(), image.height_px());
        encoder.set_color(ColorType::Rgba);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.rgba())?;
        writer.finish()?;
        let encoded = BASE64_STANDARD.encode(png_bytes);
        Ok(format!("data:image/png;base64,{}", encoded))
    }

    fn write_raster(&mut self, image: &RasterImage, rect: Rect) -> Result<()> {
        let href = self.encode_data_uri(image)?;
        let mut elem = BytesStart::new("image");
        let x = rect.x.to_string();
        let y = rect.y.to_string();
        let w = rect.width.to_string();
        let h = rect.height.to_string();
        elem.push_attribute(("x", x.as_str()));
        elem.push_attribute(("y", y.as_str()));
        elem.push_attribute(("width", w.as_str()));
        elem.push_attribute(("height", h.as_str()));
        elem.push_attribute(("href", href.as_str()));
        elem.push_attribute(("preserveAspectRatio", "none"));
        self.transform_attr(&mut elem);
        self.writer.write_event(Event::Empty(elem))?;
        Ok(())
    }

    fn replay_form(&mut self, ops: Vec<RecordedOp>, local: Matrix) -> Result<()> {
        let combined = local.then(self.state.transform);
        let mut group = BytesStart::new("g");
        let attr = format!(
            "matrix({} {} {} {} {} {})",
            combined.a, combined.b, combined.c, combined.d, combined.e, combined.f
        );
        group.push_attribute(("transform", attr.as_str()));
        self.writer.write_event(Event::Start(group))?;

        let saved_state = self.state.clone();
        let saved_pen = self.pen.take();
        let saved_brush = self.brush.take();
        let saved_depth = self.stack.len();
        let saved_floor = self.group_floor;
        let baseline_groups = self.total_open_groups;
        self.state.transform = Matrix::IDENTITY;
        self.group_floor = baseline_groups;
        let result = replay(&ops, self);
        self.stack.truncate(saved_depth);
        self.state = saved_state;
        self.pen = saved_pen;
        self.brush = saved_brush;
        self.group_floor = saved_floor;
        while self.total_open_groups > baseline_groups {
            self.writer.write_event(Event::End(BytesEnd::new("g")))?;
            self.total_open_groups -= 1;
        }
        result?;

        self.writer.write_event(Event::End(BytesEnd::new("g")))?;
        Ok(())
    }

    fn pop_to(&mut self, token: StateToken) -> Result<()> {
        while let Some((t, state)) = self.stack.pop() {
            if t == token {
                while self.total_open_groups > state.open_groups {
                    self.writer.write_event(Event::End(BytesEnd::new("g")))?;
                    self.total_open_groups -= 1;
                }
                self.state = state;
                return Ok(());
            }
        }
        Err(crate::error::Error::Backend(
            "restore token not found in SVG backend".into(),
        ))
    }
}

impl<W: Write> RenderBackend for SvgBackend<W> {
    fn close(&mut self) -> Result<()> {
        self.close_document()
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
        self.push_segment("Z");
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
        self.push_segment("Z");
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
        self.push_segment("Z");
        Ok(())
    }

    fn append_path(&mut self, path: &Path) -> Result<()> {
        self.append_commands(path.commands());
        Ok(())
    }

    fn append_stroke(&mut self, close_path: bool) -> Result<()> {
        self.flush_path(true, None, close_path)
    }

    fn append_fill(&mut self, fill_mode: FillMode, close_path: bool) -> Result<()> {
        self.flush_path(false, Some(fill_mode), close_path)
    }

    fn append_stroke_and_fill(&mut self, fill_mode: FillMode, close_path: bool) -> Result<()> {
        self.flush_path(true, Some(fill_mode), close_path)
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
        let id = format!("clip{}", self.clip_counter);
        self.clip_counter += 1;

        let mut clip_elem = BytesStart::new("clipPath");
        clip_elem.push_attribute(("id", id.as_str()));
        self.writer.write_event(Event::Start(clip_elem))?;
        let d = Self::path_data(path.commands());
        let mut path_elem = BytesStart::new("path");
        path_elem.push_attribute(("d", d.as_str()));
        path_elem.push_attribute((
            "clip-rule",
            match path.fill_mode {
                FillMode::Winding => "nonzero",
                FillMode::Alternate => "evenodd",
            },
        ));
        self.transform_attr(&mut path_elem);
        self.writer.write_event(Event::Empty(path_elem))?;
        self.writer
            .write_event(Event::End(BytesEnd::new("clipPath")))?;

        let mut group = BytesStart::new("g");
        let clip_ref = format!("url(#{})", id);
        group.push_attribute(("clip-path", clip_ref.as_str()));
        self.writer.write_event(Event::Start(group))?;
        self.total_open_groups += 1;
        Ok(())
    }

    fn reset_clip(&mut self) -> Result<()> {
        while self.total_open_groups > self.group_floor {
            self.writer.write_event(Event::End(BytesEnd::new("g")))?;
            self.total_open_groups -= 1;
        }
        Ok(())
    }

    fn draw_string(
        &mut self,
        text: &str,
        font: &Font,
        brush: &Brush,
        layout: Rect,
        format: &StringFormat,
    ) -> Result<()> {
        let (x, anchor) = match format.alignment {
            Alignment::Near => (layout.x, "start"),
            Alignment::Center => (layout.x + layout.width / 2.0, "middle"),
            Alignment::Far => (layout.right(), "end"),
        };
        // Approximate vertical placement from the em size.
        let y = match format.line_alignment {
            LineAlignment::Near => layout.y + font.size,
            LineAlignment::Center => layout.y + layout.height / 2.0 + font.size / 3.0,
            LineAlignment::Far => layout.bottom() - font.size / 4.0,
            LineAlignment::BaseLine => layout.y,
        };

        let mut elem = BytesStart::new("text");
        let x_attr = x.to_string();
        let y_attr = y.to_string();
        let size_attr = font.size.to_string();
        let fill = Self::css_color(&brush.color());
        elem.push_attribute(("x", x_attr.as_str()));
        elem.push_attribute(("y", y_attr.as_str()));
        elem.push_attribute(("font-family", font.family.as_str()));
        elem.push_attribute(("font-size", size_attr.as_str()));
        if font.bold {
            elem.push_attribute(("font-weight", "bold"));
        }
        if font.italic {
            elem.push_attribute(("font-style", "italic"));
        }
        elem.push_attribute(("text-anchor", anchor));
        elem.push_attribute(("fill", fill.as_str()));
        self.transform_attr(&mut elem);
        self.writer.write_event(Event::Start(elem))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.writer.write_event(Event::End(BytesEnd::new("text")))?;
        Ok(())
    }

    fn draw_image(&mut self, image: &Image, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        match image {
            Image::Raster(raster) => self.write_raster(raster, Rect::new(x, y, width, height)),
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

        let id = format!("clip{}", self.clip_counter);
        self.clip_counter += 1;
        let mut clip_elem = BytesStart::new("clipPath");
        clip_elem.push_attribute(("id", id.as_str()));
        self.writer.write_event(Event::Start(clip_elem))?;
        let mut rect_elem = BytesStart::new("rect");
        let x = dst.x.to_string();
        let y = dst.y.to_string();
        let w = dst.width.to_string();
        let h = dst.height.to_string();
        rect_elem.push_attribute(("x", x.as_str()));
        rect_elem.push_attribute(("y", y.as_str()));
        rect_elem.push_attribute(("width", w.as_str()));
        rect_elem.push_attribute(("height", h.as_str()));
        self.transform_attr(&mut rect_elem);
        self.writer.write_event(Event::Empty(rect_elem))?;
        self.writer
            .write_event(Event::End(BytesEnd::new("clipPath")))?;

        let mut group = BytesStart::new("g");
        let clip_ref = format!("url(#{})", id);
        group.push_attribute(("clip-path", clip_ref.as_str()));
        self.writer.write_event(Event::Start(group))?;
        self.draw_image(image, drawn.x, drawn.y, drawn.width, drawn.height)?;
        self.writer.write_event(Event::End(BytesEnd::new("g")))?;
        Ok(())
    }

    fn write_comment(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_event(Event::Comment(BytesText::new(text)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::AxisDirection;
    use crate::surface::Surface;

    fn render<F>(draw: F) -> String
    where
        F: FnOnce(&mut Surface<SvgBackend<Vec<u8>>>),
    {
        let backend = SvgBackend::new(Vec::new(), 612.0, 792.0).unwrap();
        let mut surface = Surface::new(
            backend,
            Size::new(612.0, 792.0),
            PageUnit::Point,
            AxisDirection::Downwards,
        )
        .unwrap();
        draw(&mut surface);
        surface.close().unwrap();
        let bytes = surface.into_backend().finish().unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn emits_a_well_formed_document() {
        let out = render(|_| {});
        assert!(out.starts_with("<?xml"));
        assert!(out.contains("<svg"));
        assert!(out.ends_with("</svg>"));
    }

    #[test]
    fn stroked_rectangle_becomes_a_path_element() {
        let pen = Pen::new(Color::rgb(1.0, 0.0, 0.0), 2.0);
        let out = render(|s| {
            s.draw_rectangle(Some(&pen), None, Rect::new(10.0, 10.0, 100.0, 50.0))
                .unwrap();
        });
        assert!(out.contains("<path"));
        assert!(out.contains("stroke=\"rgb(255,0,0)\""));
        assert!(out.contains("stroke-width=\"2\""));
        assert!(out.contains("fill=\"none\""));
    }

    #[test]
    fn transforms_show_up_as_matrix_attributes() {
        let pen = Pen::new(Color::gray(0.0), 1.0);
        let out = render(|s| {
            s.translate_transform(5.0, 6.0).unwrap();
            s.draw_line(&pen, Point::new(0.0, 0.0), Point::new(1.0, 1.0))
                .unwrap();
        });
        assert!(out.contains("matrix(1 0 0 1 5 6)"));
    }

    #[test]
    fn clip_opens_a_group_that_restore_closes() {
        let brush = Brush::solid(Color::gray(0.5));
        let out = render(|s| {
            let token = s.save().unwrap();
            s.intersect_clip_rect(Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
            s.draw_rectangle(None, Some(&brush), Rect::new(10.0, 10.0, 10.0, 10.0))
                .unwrap();
            s.restore_to(token).unwrap();
        });
        assert!(out.contains("<clipPath"));
        assert!(out.contains("clip-path=\"url(#clip0)\""));
        assert_eq!(out.matches("<g").count(), out.matches("</g>").count());
    }

    #[test]
    fn comments_are_emitted_verbatim() {
        let out = render(|s| {
            s.write_comment("section start").unwrap();
        });
        assert!(out.contains("<!--section start-->"));
    }

    #[test]
    fn text_uses_anchor_alignment() {
        let font = Font::new("Helvetica", 12.0);
        let brush = Brush::solid(Color::gray(0.0));
        let format = StringFormat {
            alignment: Alignment::Center,
            ..StringFormat::default()
        };
        let out = render(|s| {
            s.draw_string("hello", &font, &brush, Rect::new(0.0, 0.0, 100.0, 20.0), &format)
                .unwrap();
        });
        assert!(out.contains("text-anchor=\"middle\""));
        assert!(out.contains(">hello</text>"));
    }

    #[test]
    fn forms_replay_inside_a_group() {
        use crate::image::Form;
        let form = Form::new(Size::new(10.0, 10.0));
        {
            let mut fs = form.surface().unwrap();
            let pen = Pen::new(Color::gray(0.0), 1.0);
            fs.draw_line(&pen, Point::new(0.0, 0.0), Point::new(10.0, 10.0))
                .unwrap();
            fs.close().unwrap();
        }
        let out = render(|s| {
            s.draw_image(&Image::Form(form.clone()), Point::new(20.0, 20.0))
                .unwrap();
        });
        assert!(out.contains("matrix(1 0 0 1 20 20)"));
        assert!(out.contains("<path"));
    }
}
