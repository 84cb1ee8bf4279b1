// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Default [`TextRasterizer`]: lays text out with Parley, extracts outlines
//! with Skrifa and fills them with Tiny-Skia.
//!
//! The reported extent covers both the layout's line boxes and the actual
//! glyph ink, plus [`INK_PADDING`] on every side, so accents and descenders
//! that reach outside their line box are never cropped.

use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use parley::layout::{Alignment, AlignmentOptions, GlyphRun, Layout, PositionedLayoutItem};
use parley::style::{FontFamily, FontStack, StyleProperty};
use parley::{FontContext, LayoutContext};
use skrifa::{
    instance::{LocationRef, NormalizedCoord, Size},
    outline::{DrawSettings, OutlinePen},
    raw::FontRef as ReadFontsRef,
    GlyphId, MetadataProvider, OutlineGlyph,
};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

use super::{to_px, Extent, Face, TextRasterizer};
use crate::error::{Error, Result};
use crate::style::Color;

/// Font stack used when a style names no font file.
const DEFAULT_FONT_STACK: &str = "sans-serif";

/// Empty margin kept around the ink, in pixels at render size.
pub(crate) const INK_PADDING: f32 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct ColorBrush {
    color: Color,
}

/// Renders text with Parley using system fonts or explicit font files.
///
/// Font files are registered with the font collection the first time a
/// style references them and reused afterwards.
pub struct ParleyRasterizer {
    font_cx: FontContext,
    layout_cx: LayoutContext<ColorBrush>,
    families: HashMap<PathBuf, String>,
}

impl core::fmt::Debug for ParleyRasterizer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ParleyRasterizer")
            .field("families", &self.families)
            .finish_non_exhaustive()
    }
}

impl Default for ParleyRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ParleyRasterizer {
    /// Creates a rasterizer backed by the system font collection.
    pub fn new() -> Self {
        Self::with_font_context(FontContext::default())
    }

    /// Creates a rasterizer using an existing font context.
    pub fn with_font_context(font_cx: FontContext) -> Self {
        Self {
            font_cx,
            layout_cx: LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    /// Registers the font file at `path` and returns its family name.
    fn family_for(&mut self, path: &Path) -> Result<String> {
        if let Some(family) = self.families.get(path) {
            return Ok(family.clone());
        }
        let data = std::fs::read(path).map_err(|_| Error::FontResolution {
            path: path.to_path_buf(),
        })?;
        let registered = self.font_cx.collection.register_fonts(data);
        let family = registered
            .first()
            .and_then(|(id, _)| self.font_cx.collection.family_name(*id))
            .map(str::to_owned)
            .ok_or_else(|| {
                Error::Render(format!("{} contains no usable fonts", path.display()))
            })?;
        log::debug!("registered font family {family:?} from {}", path.display());
        self.families.insert(path.to_path_buf(), family.clone());
        Ok(family)
    }

    fn build(
        &mut self,
        text: &str,
        face: &Face,
        family: Option<&str>,
        color: Color,
        line_height: f32,
    ) -> Layout<ColorBrush> {
        let font_stack = match family {
            Some(name) => FontStack::Single(FontFamily::Named(name.into())),
            None => FontStack::from(DEFAULT_FONT_STACK),
        };
        let mut builder = self.layout_cx.ranged_builder(&mut self.font_cx, text, 1.0);
        builder.push_default(StyleProperty::Brush(ColorBrush { color }));
        builder.push_default(StyleProperty::FontStack(font_stack));
        builder.push_default(StyleProperty::FontSize(face.size));
        builder.push_default(StyleProperty::LetterSpacing(face.letter_spacing));
        builder.push_default(StyleProperty::LineHeight(line_height));

        let mut layout: Layout<ColorBrush> = builder.build(text);
        layout.break_all_lines(None);
        layout.align(None, Alignment::Start, AlignmentOptions::default());
        layout
    }

    /// Lays `text` out and returns it with the bounds everything drawn from
    /// it will fall into.
    fn layout(
        &mut self,
        text: &str,
        face: &Face,
        color: Color,
    ) -> Result<(Layout<ColorBrush>, Bounds)> {
        let family = match &face.font {
            Some(path) => Some(self.family_for(path)?),
            None => None,
        };

        // A first pass at one em per line yields the fonts' own ascent,
        // descent and leading; interline spacing is added on top of that.
        let natural = self
            .build(text, face, family.as_deref(), color, 1.0)
            .lines()
            .map(|line| {
                let m = line.metrics();
                m.ascent + m.descent.abs() + m.leading
            })
            .fold(0.0_f32, f32::max);
        let natural = if natural > 0.0 { natural } else { face.size };
        let line_height = (natural + face.line_spacing).max(0.0) / face.size;

        let layout = self.build(text, face, family.as_deref(), color, line_height);
        let bounds = block_bounds(&layout)?.padded(INK_PADDING);
        Ok((layout, bounds))
    }
}

impl TextRasterizer for ParleyRasterizer {
    fn measure(&mut self, text: &str, face: &Face) -> Result<Extent> {
        let (_, bounds) = self.layout(text, face, Color::default())?;
        Ok(Extent {
            width: to_px(bounds.width()),
            height: to_px(bounds.height()),
        })
    }

    fn draw(
        &mut self,
        canvas: &mut Pixmap,
        text: &str,
        face: &Face,
        origin: (f32, f32),
        color: Color,
    ) -> Result<()> {
        let (layout, bounds) = self.layout(text, face, color)?;
        // Shift so the top-left of the bounds lands on `origin`.
        let origin = (origin.0 - bounds.left, origin.1 - bounds.top);
        let mut paint = Paint::default();
        for_each_glyph_path(&layout, origin, |path, color| {
            paint.set_color_rgba8(color.r, color.g, color.b, color.a);
            canvas.fill_path(path, &paint, FillRule::Winding, Transform::identity(), None);
        })
    }
}

/// An axis-aligned box in layout coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Bounds {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl Bounds {
    fn include(&mut self, other: tiny_skia::Rect) {
        self.left = self.left.min(other.left());
        self.top = self.top.min(other.top());
        self.right = self.right.max(other.right());
        self.bottom = self.bottom.max(other.bottom());
    }

    fn padded(self, padding: f32) -> Self {
        Self {
            left: self.left - padding,
            top: self.top - padding,
            right: self.right + padding,
            bottom: self.bottom + padding,
        }
    }

    fn width(&self) -> f32 {
        self.right - self.left
    }

    fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Union of the line boxes, every line's ascent and descent, and the ink of
/// every glyph.
fn block_bounds(layout: &Layout<ColorBrush>) -> Result<Bounds> {
    let mut bounds = Bounds {
        left: 0.0,
        top: 0.0,
        right: layout.full_width(),
        bottom: layout.height(),
    };
    for line in layout.lines() {
        let m = line.metrics();
        bounds.top = bounds.top.min(m.baseline - m.ascent);
        bounds.bottom = bounds.bottom.max(m.baseline + m.descent.abs());
    }
    for_each_glyph_path(layout, (0.0, 0.0), |path, _| bounds.include(path.bounds()))?;
    Ok(bounds)
}

/// Calls `f` with the outline of every glyph of `layout`, placed relative
/// to `origin`, and the color it should be filled with.
fn for_each_glyph_path(
    layout: &Layout<ColorBrush>,
    origin: (f32, f32),
    mut f: impl FnMut(&tiny_skia::Path, Color),
) -> Result<()> {
    let mut pen = GlyphPathBuilder::default();
    for line in layout.lines() {
        for item in line.items() {
            if let PositionedLayoutItem::GlyphRun(glyph_run) = item {
                glyph_run_paths(&glyph_run, &mut pen, origin, &mut f)?;
            }
        }
    }
    Ok(())
}

fn glyph_run_paths(
    glyph_run: &GlyphRun<'_, ColorBrush>,
    pen: &mut GlyphPathBuilder,
    origin: (f32, f32),
    f: &mut impl FnMut(&tiny_skia::Path, Color),
) -> Result<()> {
    let mut run_x = glyph_run.offset();
    let run_y = glyph_run.baseline();
    let color = glyph_run.style().brush.color;

    let run = glyph_run.run();
    let font = run.font();
    let font_size = run.font_size();
    let normalized_coords = run
        .normalized_coords()
        .iter()
        .map(|coord| NormalizedCoord::from_bits(*coord))
        .collect::<Vec<_>>();

    let font_ref = ReadFontsRef::from_index(font.data.as_ref(), font.index)
        .map_err(|err| Error::Render(format!("unreadable font data: {err}")))?;
    let outlines = font_ref.outline_glyphs();

    for glyph in glyph_run.glyphs() {
        let glyph_x = origin.0 + run_x + glyph.x;
        let glyph_y = origin.1 + run_y - glyph.y;
        run_x += glyph.advance;

        let glyph_id = GlyphId::from(glyph.id);
        if let Some(outline) = outlines.get(glyph_id) {
            pen.set_origin(glyph_x, glyph_y);
            if let Some(path) = pen.build(&outline, font_size, &normalized_coords)? {
                f(&path, color);
            }
        }
    }
    Ok(())
}

/// Collects a Skrifa outline into a Tiny-Skia path, flipping the y axis.
///
/// Adapted from the pen in Parley's `tiny_skia_render` example; it builds
/// paths instead of filling them so the same outlines serve measuring.
#[derive(Default)]
struct GlyphPathBuilder {
    x: f32,
    y: f32,
    open_path: PathBuilder,
}

impl GlyphPathBuilder {
    fn set_origin(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    fn build(
        &mut self,
        glyph: &OutlineGlyph<'_>,
        size: f32,
        normalized_coords: &[NormalizedCoord],
    ) -> Result<Option<tiny_skia::Path>> {
        let location_ref = LocationRef::new(normalized_coords);
        let settings = DrawSettings::unhinted(Size::new(size), location_ref);
        let drawn = glyph.draw(settings, self);
        // Whatever happened, start the next glyph from an empty path.
        let builder = core::mem::take(&mut self.open_path);
        drawn.map_err(|err| Error::Render(format!("glyph outline: {err}")))?;
        Ok(builder.finish())
    }
}

impl OutlinePen for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.open_path.move_to(self.x + x, self.y - y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.open_path.line_to(self.x + x, self.y - y);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.open_path
            .quad_to(self.x + cx0, self.y - cy0, self.x + x, self.y - y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.open_path.cubic_to(
            self.x + cx0,
            self.y - cy0,
            self.x + cx1,
            self.y - cy1,
            self.x + x,
            self.y - y,
        );
    }

    fn close(&mut self) {
        self.open_path.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::{font_dir, isolated_rasterizer};

    fn test_font() -> PathBuf {
        font_dir().join("DejaVuSans.ttf")
    }

    #[test]
    fn font_files_are_registered_once() {
        let mut rasterizer = isolated_rasterizer();
        let first = rasterizer.family_for(&test_font()).unwrap();
        let second = rasterizer.family_for(&test_font()).unwrap();
        assert_eq!(first, "DejaVu Sans");
        assert_eq!(first, second);
        assert_eq!(rasterizer.families.len(), 1);
    }

    #[test]
    fn unreadable_font_is_a_font_error() {
        let mut rasterizer = isolated_rasterizer();
        let missing = font_dir().join("Nope.ttf");
        assert!(matches!(
            rasterizer.family_for(&missing),
            Err(Error::FontResolution { path }) if path == missing
        ));
    }

    #[test]
    fn bounds_cover_ink_outside_the_line_box() {
        let mut bounds = Bounds {
            left: 0.0,
            top: 0.0,
            right: 10.0,
            bottom: 10.0,
        };
        bounds.include(tiny_skia::Rect::from_ltrb(-1.5, -3.0, 4.0, 12.0).unwrap());
        let padded = bounds.padded(INK_PADDING);
        assert_eq!(padded.width(), 13.5);
        assert_eq!(padded.height(), 17.0);
        assert_eq!((padded.left, padded.top), (-2.5, -4.0));
    }
}
