// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::path::{Path, PathBuf};

use parley::fontique::{Collection, CollectionOptions};
use parley::FontContext;
use tiny_skia::{Paint, Pixmap, Rect, Transform};

use crate::raster::to_px;
use crate::{
    Color, Config, Error, Extent, Face, ParleyRasterizer, RenderCache, Result, TextRasterizer,
};

/// Horizontal advance of every character, relative to the font size.
pub(crate) const ADVANCE: f32 = 0.6;
/// Height of every line, relative to the font size.
pub(crate) const LINE_HEIGHT: f32 = 1.2;

/// A rasterizer that draws every text block as a solid rectangle and
/// records how it was called.
#[derive(Debug, Default)]
pub(crate) struct BlockRasterizer {
    pub(crate) measures: usize,
    pub(crate) draws: usize,
    pub(crate) sizes: Vec<f32>,
    pub(crate) texts: Vec<String>,
    pub(crate) fail: bool,
}

impl BlockRasterizer {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

/// The extent [`BlockRasterizer`] reports for `text` at `size`.
pub(crate) fn block_extent(text: &str, size: f32) -> Extent {
    let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    let lines = text.lines().count().max(1);
    Extent {
        width: to_px(longest as f32 * size * ADVANCE),
        height: to_px(lines as f32 * size * LINE_HEIGHT),
    }
}

impl TextRasterizer for BlockRasterizer {
    fn measure(&mut self, text: &str, face: &Face) -> Result<Extent> {
        self.measures += 1;
        self.sizes.push(face.size);
        if self.fail {
            return Err(Error::Render("backend refused".into()));
        }
        Ok(block_extent(text, face.size))
    }

    fn draw(
        &mut self,
        canvas: &mut Pixmap,
        text: &str,
        face: &Face,
        origin: (f32, f32),
        color: Color,
    ) -> Result<()> {
        self.draws += 1;
        self.texts.push(text.to_owned());
        let extent = block_extent(text, face.size);
        let Some(rect) = Rect::from_xywh(
            origin.0,
            origin.1,
            extent.width as f32,
            extent.height as f32,
        ) else {
            return Ok(());
        };
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = false;
        canvas.fill_rect(rect, &paint, Transform::identity(), None);
        Ok(())
    }
}

/// A configuration storing everything below `root`.
pub(crate) fn test_config(root: &Path) -> Config {
    Config {
        storage_root: root.join("public"),
        font_root: root.join("fonts"),
        ..Config::default()
    }
}

pub(crate) fn block_cache(root: &Path) -> RenderCache<BlockRasterizer> {
    RenderCache::new(test_config(root), BlockRasterizer::default())
}

/// Directory holding the fonts used by the rendering tests.
pub(crate) fn font_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("assets")
        .join("dejavu_fonts")
}

/// A Parley rasterizer that sees no system fonts, only files it is given.
pub(crate) fn isolated_rasterizer() -> ParleyRasterizer {
    let collection = Collection::new(CollectionOptions {
        shared: false,
        system_fonts: false,
    });
    ParleyRasterizer::with_font_context(FontContext {
        collection,
        source_cache: Default::default(),
    })
}
