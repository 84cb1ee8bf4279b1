// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty Text renders strings into cached PNG or GIF images so a web page
//! can show typographically styled text as a background image.
//!
//! Every image is addressed by a digest of its text and effective style and
//! written exactly once. Later requests for the same pair find the file and
//! return without rendering.
//!
//! ```no_run
//! use pretty_text::{Config, RenderCache, StyleDescriptor, StyleOverrides};
//!
//! let cache = RenderCache::with_parley(Config::with_storage_root("public"));
//! let style = StyleDescriptor::new(StyleOverrides {
//!     color: Some("#666".parse()?),
//!     size: Some(30.0),
//!     ..StyleOverrides::default()
//! });
//! let image = cache.render("A headline", &style)?;
//! println!("{} is {}x{}", image.path(), image.width()?, image.height()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The glyph rasterizer is pluggable through [`TextRasterizer`]; the default
//! [`ParleyRasterizer`] uses Parley for layout and Tiny-Skia for filling.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET

extern crate alloc;

mod cache;
mod error;
mod handle;

pub mod config;
pub mod fingerprint;
pub mod raster;
pub mod style;

pub use cache::RenderCache;
pub use config::{Config, ConfigError, ScaleFilter};
pub use error::{Error, Result};
pub use fingerprint::{fingerprint, CacheKey, CachePath};
pub use handle::{Geometry, ImageHandle};
pub use raster::{Extent, Face, ParleyRasterizer, TextRasterizer, TextRenderer, SCALE_FACTOR};
pub use style::{
    CaseTransform, Color, ImageFormat, ResolvedStyle, StyleDescriptor, StyleError, StyleOverrides,
};

#[cfg(test)]
mod tests;
