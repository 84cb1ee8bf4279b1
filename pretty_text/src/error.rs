// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for rendering and caching.

use std::path::PathBuf;

use crate::style::StyleError;

/// Errors returned by [`RenderCache::render`](crate::RenderCache::render).
///
/// A failed request never leaves a handle behind: either the image is fully
/// written and a handle is returned, or one of these is.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The style has an invalid attribute value.
    #[error("invalid style: {0}")]
    StyleResolution(#[from] StyleError),

    /// The referenced font file does not exist.
    #[error("font file not found: {}", path.display())]
    FontResolution {
        /// The resolved path that was looked up.
        path: PathBuf,
    },

    /// The rasterizer could not produce an image.
    #[error("rendering failed: {0}")]
    Render(String),

    /// The image could not be written to the cache.
    #[error("failed to persist {}", path.display())]
    Persist {
        /// The directory or file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A stored image could not be read back.
    #[error("failed to read image geometry from {}", path.display())]
    Geometry {
        /// The stored image.
        path: PathBuf,
        /// The decoder error.
        #[source]
        source: image::ImageError,
    },
}

/// Result alias using [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;
