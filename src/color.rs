//! Color values and cross-space conversion.
//!
//! A color is exactly one of RGB, CMYK, or grayscale, with normalized
//! `f64` channels. Conversion between spaces goes through a
//! [`ColorContext`], an explicit capability the caller threads through
//! instead of a process-wide global; crossing spaces without a configured
//! converter is an error. Channels stay floating point end to end, so
//! gray round-trips through RGB are exact.

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Rgb,
    Cmyk,
    Gray,
}

/// A color in one of the three supported spaces. Channels are in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Color {
    Rgb { r: f64, g: f64, b: f64 },
    Cmyk { c: f64, m: f64, y: f64, k: f64 },
    Gray { value: f64 },
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Color::Rgb { r, g, b }
    }

    pub fn cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Color::Cmyk { c, m, y, k }
    }

    pub fn gray(value: f64) -> Self {
        Color::Gray { value }
    }

    pub fn space(&self) -> ColorSpace {
        match self {
            Color::Rgb { .. } => ColorSpace::Rgb,
            Color::Cmyk { .. } => ColorSpace::Cmyk,
            Color::Gray { .. } => ColorSpace::Gray,
        }
    }
}

/// Perceptual-space math a [`ColorContext`] delegates to.
///
/// RGB channels are treated as linear-light for these purposes.
pub trait ColorSpaceConverter {
    fn rgb_to_cmyk(&self, r: f64, g: f64, b: f64) -> [f64; 4];
    fn cmyk_to_rgb(&self, c: f64, m: f64, y: f64, k: f64) -> [f64; 3];
    /// Lightness of an RGB color, used for conversions into grayscale.
    fn rgb_lightness(&self, r: f64, g: f64, b: f64) -> f64;
}

/// Owns the (optional) converter and performs all cross-space conversion.
#[derive(Default)]
pub struct ColorContext {
    converter: Option<Box<dyn ColorSpaceConverter>>,
}

impl ColorContext {
    /// A context with no converter: only same-space conversion succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_converter(converter: Box<dyn ColorSpaceConverter>) -> Self {
        Self {
            converter: Some(converter),
        }
    }

    pub fn set_converter(&mut self, converter: Box<dyn ColorSpaceConverter>) {
        self.converter = Some(converter);
    }

    pub fn is_configured(&self) -> bool {
        self.converter.is_some()
    }

    /// Converts `color` into `target`.
    ///
    /// Same-space conversion returns the identical value and never needs a
    /// converter; every cross-space conversion requires one, even where the
    /// math itself is direct replication.
    pub fn convert(&self, color: Color, target: ColorSpace) -> Result<Color> {
        if color.space() == target {
            return Ok(color);
        }
        let converter = self
            .converter
            .as_deref()
            .ok_or(Error::ConverterNotConfigured)?;
        Ok(match (color, target) {
            (Color::Rgb { r, g, b }, ColorSpace::Cmyk) => {
                let [c, m, y, k] = converter.rgb_to_cmyk(r, g, b);
                Color::cmyk(c, m, y, k)
            }
            (Color::Rgb { r, g, b }, ColorSpace::Gray) => {
                Color::gray(converter.rgb_lightness(r, g, b))
            }
            (Color::Cmyk { c, m, y, k }, ColorSpace::Rgb) => {
                let [r, g, b] = converter.cmyk_to_rgb(c, m, y, k);
                Color::rgb(r, g, b)
            }
            (Color::Cmyk { c, m, y, k }, ColorSpace::Gray) => {
                let [r, g, b] = converter.cmyk_to_rgb(c, m, y, k);
                Color::gray(converter.rgb_lightness(r, g, b))
            }
            // Grayscale expands by direct replication, no perceptual step.
            (Color::Gray { value }, ColorSpace::Rgb) => Color::rgb(value, value, value),
            // K is ink coverage: white (1.0) carries no ink, so the fold is
            // 1 - value. This way Gray -> Cmyk -> Gray is exact.
            (Color::Gray { value }, ColorSpace::Cmyk) => Color::cmyk(0.0, 0.0, 0.0, 1.0 - value),
            (c, _) => c,
        })
    }
}

/// Naive converter using the standard CMYK blend and HSL lightness.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleConverter;

impl ColorSpaceConverter for SimpleConverter {
    fn rgb_to_cmyk(&self, r: f64, g: f64, b: f64) -> [f64; 4] {
        let k = 1.0 - r.max(g).max(b);
        if k >= 1.0 {
            return [0.0, 0.0, 0.0, 1.0];
        }
        let c = (1.0 - r - k) / (1.0 - k);
        let m = (1.0 - g - k) / (1.0 - k);
        let y = (1.0 - b - k) / (1.0 - k);
        [c, m, y, k]
    }

    fn cmyk_to_rgb(&self, c: f64, m: f64, y: f64, k: f64) -> [f64; 3] {
        [
            (1.0 - c) * (1.0 - k),
            (1.0 - m) * (1.0 - k),
            (1.0 - y) * (1.0 - k),
        ]
    }

    fn rgb_lightness(&self, r: f64, g: f64, b: f64) -> f64 {
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        (max + min) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_space_needs_no_converter() {
        let ctx = ColorContext::new();
        let c = Color::rgb(0.25, 0.5, 0.75);
        assert_eq!(ctx.convert(c, ColorSpace::Rgb).unwrap(), c);
    }

    #[test]
    fn cross_space_without_converter_fails() {
        let ctx = ColorContext::new();
        let err = ctx
            .convert(Color::gray(0.5), ColorSpace::Rgb)
            .unwrap_err();
        assert!(matches!(err, Error::ConverterNotConfigured));
    }

    #[test]
    fn rgb_cmyk_round_trip_is_close() {
        let ctx = ColorContext::with_converter(Box::new(SimpleConverter));
        let original = Color::rgb(0.8, 0.4, 0.2);
        let cmyk = ctx.convert(original, ColorSpace::Cmyk).unwrap();
        let back = ctx.convert(cmyk, ColorSpace::Rgb).unwrap();
        match (original, back) {
            (Color::Rgb { r, g, b }, Color::Rgb { r: r2, g: g2, b: b2 }) => {
                assert!((r - r2).abs() < 1e-6);
                assert!((g - g2).abs() < 1e-6);
                assert!((b - b2).abs() < 1e-6);
            }
            _ => panic!("unexpected spaces"),
        }
    }

    #[test]
    fn gray_rgb_round_trip_is_exact() {
        let ctx = ColorContext::with_converter(Box::new(SimpleConverter));
        let gray = Color::gray(0.3);
        let rgb = ctx.convert(gray, ColorSpace::Rgb).unwrap();
        assert_eq!(rgb, Color::rgb(0.3, 0.3, 0.3));
        assert_eq!(ctx.convert(rgb, ColorSpace::Gray).unwrap(), gray);
    }

    #[test]
    fn gray_to_cmyk_folds_lightness_into_ink_coverage() {
        // Gray carries lightness, K carries ink: the fold is K = 1 - value,
        // so dark gray means heavy ink and the round trip is exact.
        let ctx = ColorContext::with_converter(Box::new(SimpleConverter));
        let cmyk = ctx.convert(Color::gray(0.25), ColorSpace::Cmyk).unwrap();
        assert_eq!(cmyk, Color::cmyk(0.0, 0.0, 0.0, 0.75));
        assert_eq!(
            ctx.convert(cmyk, ColorSpace::Gray).unwrap(),
            Color::gray(0.25)
        );
    }
}
