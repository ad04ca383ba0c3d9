//! Device-independent 2D drawing surfaces.
//!
//! A [`Surface`] accepts drawing calls in a caller-chosen unit and axis
//! direction, validates them, and relays them to a [`RenderBackend`]
//! working in a fixed page-space convention. Backends included here:
//! an op recorder (also the storage for reusable forms), an SVG writer,
//! and a tiny-skia rasterizer.

pub mod backend;
pub mod backends;
pub mod color;
pub mod coords;
pub mod error;
pub mod geom;
pub mod image;
pub mod matrix;
pub mod path;
pub mod state;
pub mod style;
pub mod surface;

pub use backend::{CombineMode, RenderBackend};
pub use backends::recording::{RecordedOp, RecordingBackend, replay};
pub use color::{Color, ColorContext, ColorSpace, ColorSpaceConverter, SimpleConverter};
pub use coords::{AxisDirection, PageUnit, TrimMargins};
pub use error::{Error, ErrorCategory, Result};
pub use geom::{Point, Rect, Size};
pub use image::{DocumentId, Form, Image, RasterImage};
pub use matrix::{Matrix, MatrixOrder};
pub use path::{FillMode, Path, PathCommand};
pub use state::StateToken;
pub use style::{
    Alignment, Brush, Font, LineAlignment, LineCap, LineJoin, Pen, SmoothingMode, StringFormat,
};
pub use surface::{PageOptions, Surface};

#[cfg(feature = "svg")]
pub use backends::svg::SvgBackend;

#[cfg(feature = "raster")]
pub use backends::raster::RasterBackend;
