//! Backend implementations.
//!
//! The recording backend is always available and underpins form replay;
//! the SVG and raster backends are feature-gated.

pub mod recording;

#[cfg(feature = "svg")]
pub mod svg;

#[cfg(feature = "raster")]
pub mod raster;
