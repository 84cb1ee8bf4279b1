// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The result of a render request.

use core::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Pixel size of one layer of a stored image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Geometry {
    /// Width in pixels.
    pub width: u32,
    /// Height of a single color layer in pixels.
    pub height: u32,
}

/// A rendered text backed by a complete file in the cache.
///
/// Geometry is read from the stored image the first time it is asked for
/// and kept for the lifetime of the handle, so it always reflects what is
/// actually on disk.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    content: String,
    url_path: String,
    file_path: PathBuf,
    layers: u32,
    geometry: OnceLock<Geometry>,
}

impl ImageHandle {
    pub(crate) fn new(content: String, url_path: String, file_path: PathBuf, layers: u32) -> Self {
        Self {
            content,
            url_path,
            file_path,
            layers: layers.max(1),
            geometry: OnceLock::new(),
        }
    }

    /// The public path of the image, starting with `/`.
    pub fn path(&self) -> &str {
        &self.url_path
    }

    /// Where the image is stored on disk.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// The text the image was rendered from.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of color layers stacked in the stored image.
    pub fn layers(&self) -> u32 {
        self.layers
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> Result<u32> {
        Ok(self.geometry()?.width)
    }

    /// Height of a single layer in pixels.
    pub fn height(&self) -> Result<u32> {
        Ok(self.geometry()?.height)
    }

    /// Width and single-layer height, read from disk on first use.
    pub fn geometry(&self) -> Result<Geometry> {
        if let Some(geometry) = self.geometry.get() {
            return Ok(*geometry);
        }
        let (width, height) =
            image::image_dimensions(&self.file_path).map_err(|source| Error::Geometry {
                path: self.file_path.clone(),
                source,
            })?;
        let geometry = Geometry {
            width,
            height: height / self.layers,
        };
        Ok(*self.geometry.get_or_init(|| geometry))
    }

    /// Returns `true` once the geometry has been read.
    pub fn is_resolved(&self) -> bool {
        self.geometry.get().is_some()
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.url_path == other.url_path && self.content == other.content
    }
}

impl Eq for ImageHandle {}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}
