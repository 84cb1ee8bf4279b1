// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning a string and a resolved style into pixels.
//!
//! The actual glyph rasterization is behind [`TextRasterizer`]; the default
//! backend is [`ParleyRasterizer`]. [`TextRenderer`] drives a backend and
//! adds everything that is independent of it: case transforms, font path
//! resolution, stacking of color layers, the small-size upscale hack and GIF
//! transparency.

mod parley_backend;
mod post;

use std::path::PathBuf;

use image::RgbaImage;
use tiny_skia::Pixmap;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::style::{Color, ImageFormat, ResolvedStyle};

pub use parley_backend::ParleyRasterizer;
pub use post::encode;

/// Small sizes are rendered this many times larger and scaled back down.
pub const SCALE_FACTOR: u32 = 5;

/// Font parameters handed to a [`TextRasterizer`], already scaled.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    /// Absolute path of the font file, or `None` for the default sans-serif.
    pub font: Option<PathBuf>,
    /// Font size in pixels.
    pub size: f32,
    /// Extra space between letters, in pixels.
    pub letter_spacing: f32,
    /// Extra space between lines, in pixels.
    pub line_spacing: f32,
}

/// Pixel size of a block of (possibly multi-line) text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Extent {
    /// Width of the widest line.
    pub width: u32,
    /// Height of all lines together.
    pub height: u32,
}

/// The external glyph rendering capability.
///
/// Text may contain line breaks; both operations lay it out the same way so
/// that whatever `draw` paints fits inside what `measure` reports, with the
/// text block's top-left corner at `origin`.
pub trait TextRasterizer {
    /// Measures `text` set in `face`.
    fn measure(&mut self, text: &str, face: &Face) -> Result<Extent>;

    /// Paints `text` onto `canvas` in `color`.
    fn draw(
        &mut self,
        canvas: &mut Pixmap,
        text: &str,
        face: &Face,
        origin: (f32, f32),
        color: Color,
    ) -> Result<()>;
}

impl<T: TextRasterizer + ?Sized> TextRasterizer for Box<T> {
    fn measure(&mut self, text: &str, face: &Face) -> Result<Extent> {
        (**self).measure(text, face)
    }

    fn draw(
        &mut self,
        canvas: &mut Pixmap,
        text: &str,
        face: &Face,
        origin: (f32, f32),
        color: Color,
    ) -> Result<()> {
        (**self).draw(canvas, text, face, origin, color)
    }
}

/// Size of one color layer at render scale.
#[derive(Clone, Copy, Debug)]
struct LayerGeometry {
    factor: u32,
    width: u32,
    height: u32,
}

/// Renders styled text into a composite image using a [`TextRasterizer`].
#[derive(Debug)]
pub struct TextRenderer<R> {
    backend: R,
    config: Config,
}

impl<R: TextRasterizer> TextRenderer<R> {
    /// Wraps `backend` with the scaling and font settings from `config`.
    pub fn new(backend: R, config: &Config) -> Self {
        Self {
            backend,
            config: config.clone(),
        }
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &R {
        &self.backend
    }

    /// The supersampling factor used for `style`.
    ///
    /// Only styles that opt in with `upscale` and whose size does not exceed
    /// the configured threshold are supersampled.
    pub fn scale_factor(&self, style: &ResolvedStyle) -> u32 {
        if style.upscale() && style.size() <= self.config.scale_threshold {
            SCALE_FACTOR
        } else {
            1
        }
    }

    /// Size of a single layer of `text` as it will be stored.
    pub fn measure(&mut self, text: &str, style: &ResolvedStyle) -> Result<Extent> {
        let text = style.process_text(text);
        let face = self.face(style, self.scale_factor(style))?;
        let layer = self.layer_geometry(&text, style, &face)?;
        Ok(Extent {
            width: layer.width / layer.factor,
            height: layer.height / layer.factor,
        })
    }

    /// Renders `text` with every layer of `style` stacked vertically.
    pub fn render(&mut self, text: &str, style: &ResolvedStyle) -> Result<RgbaImage> {
        let text = style.process_text(text);
        let factor = self.scale_factor(style);
        let face = self.face(style, factor)?;
        let layer = self.layer_geometry(&text, style, &face)?;

        let layers = style.layer_count();
        let total_height = layer
            .height
            .checked_mul(layers)
            .ok_or_else(|| Error::Render(format!("{layers} layers do not fit in an image")))?;
        let mut canvas = Pixmap::new(layer.width, total_height).ok_or_else(|| {
            Error::Render(format!(
                "cannot allocate a {}x{total_height} canvas",
                layer.width
            ))
        })?;

        let background = style.background_color();
        if !background.is_transparent() {
            canvas.fill(tiny_skia::Color::from_rgba8(
                background.r,
                background.g,
                background.b,
                background.a,
            ));
        }

        let x = style.x_offset() as f32 * factor as f32;
        for (i, color) in style.layer_colors().enumerate() {
            let y = style.y_offset() as f32 * factor as f32 + (i as f32) * layer.height as f32;
            self.backend.draw(&mut canvas, &text, &face, (x, y), color)?;
        }

        let mut image = post::premultiplied_image(canvas)?;
        if factor > 1 {
            image = post::downsample(&image, factor, &self.config);
            image = post::sharpen(&image, &self.config);
        }
        post::demultiply(&mut image);

        if style.format() == ImageFormat::Gif {
            post::key_out_background(&mut image);
        }
        Ok(image)
    }

    fn face(&self, style: &ResolvedStyle, factor: u32) -> Result<Face> {
        let font = match style.font() {
            Some(font) => {
                let path = self.config.font_root.join(font);
                if !path.is_file() {
                    return Err(Error::FontResolution { path });
                }
                Some(path)
            }
            None => None,
        };
        let factor = factor as f32;
        Ok(Face {
            font,
            size: style.size() * factor,
            letter_spacing: style.kerning() * factor,
            line_spacing: style.interline_spacing() * factor,
        })
    }

    fn layer_geometry(
        &mut self,
        text: &str,
        style: &ResolvedStyle,
        face: &Face,
    ) -> Result<LayerGeometry> {
        let factor = self.scale_factor(style);
        let extent = self.backend.measure(text, face)?;
        // Padded to whole multiples of the factor so every layer scales down
        // to an integral height.
        let width = padded_length(extent.width, style.extra_width(), factor).ok_or_else(|| {
            Error::Render(format!("extra width {} is too large", style.extra_width()))
        })?;
        let height = padded_length(extent.height, style.extra_height(), factor).ok_or_else(|| {
            Error::Render(format!("extra height {} is too large", style.extra_height()))
        })?;
        Ok(LayerGeometry {
            factor,
            width: width.max(factor),
            height: height.max(factor),
        })
    }
}

/// `length` plus `extra` output pixels at `factor`, rounded up to a multiple
/// of `factor`, or `None` if that does not fit in a `u32`.
fn padded_length(length: u32, extra: u32, factor: u32) -> Option<u32> {
    let total = extra.checked_mul(factor)?.checked_add(length)?;
    round_up(total, factor)
}

fn round_up(value: u32, multiple: u32) -> Option<u32> {
    value.div_ceil(multiple).checked_mul(multiple)
}

/// Converts a non-negative layout length to whole pixels, rounding up.
#[expect(
    clippy::cast_possible_truncation,
    reason = "layout lengths are clamped to the u32 range first"
)]
pub(crate) fn to_px(length: f32) -> u32 {
    length.ceil().clamp(0.0, u32::MAX as f32) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_up_to_factor() {
        assert_eq!(round_up(0, 5), Some(0));
        assert_eq!(round_up(1, 5), Some(5));
        assert_eq!(round_up(10, 5), Some(10));
        assert_eq!(round_up(7, 1), Some(7));
        assert_eq!(round_up(u32::MAX, 5), None);
    }

    #[test]
    fn padding_that_overflows_is_reported() {
        assert_eq!(padded_length(12, 2, 5), Some(25));
        assert_eq!(padded_length(12, 1_000_000_000, 5), None);
        assert_eq!(padded_length(12, u32::MAX, 1), None);
        assert_eq!(padded_length(0, u32::MAX, 1), Some(u32::MAX));
    }

    #[test]
    fn to_px_rounds_up_and_clamps() {
        assert_eq!(to_px(10.2), 11);
        assert_eq!(to_px(-4.0), 0);
        assert_eq!(to_px(f32::NAN), 0);
    }
}
