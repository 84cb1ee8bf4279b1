// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content addressing for rendered images.
//!
//! The digest and the attribute order below are part of the on-disk format:
//! changing either orphans every file already in the cache.

use core::fmt;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::style::{ImageFormat, ResolvedStyle};

/// Hex digits per directory segment. Bounds every directory to 256 children.
pub const FRAGMENT_WIDTH: usize = 2;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Separates serialized fields so adjacent values cannot run together.
const FIELD_SEPARATOR: u8 = 0x1f;

/// Stable digest of a text and its effective style.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding of the digest.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.0.len() * 2);
        for &b in &self.0 {
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
        }
        out
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", self.to_hex())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Computes the cache key for `text` rendered with `style`.
///
/// The literal text is hashed followed by every effective attribute in a
/// fixed order. The cosmetic `html_font` label is left out, and the
/// background is the effective one, so PNG styles that differ only in
/// their stored background share a key.
pub fn fingerprint(text: &str, style: &ResolvedStyle) -> CacheKey {
    let mut hasher = Sha256::new();
    let mut field = |value: &dyn fmt::Display| {
        hasher.update(value.to_string().as_bytes());
        hasher.update([FIELD_SEPARATOR]);
    };

    field(&text);
    field(&style.format());
    field(&style.color());
    field(&ColorList(style.additional_colors()));
    field(&style.background_color());
    field(&style.size());
    field(&style.font().unwrap_or(""));
    field(&style.case_transform());
    field(&style.extra_width());
    field(&style.extra_height());
    field(&style.x_offset());
    field(&style.y_offset());
    field(&style.kerning());
    field(&style.interline_spacing());
    field(&style.upscale());

    CacheKey(hasher.finalize().into())
}

struct ColorList<'a>(&'a [crate::Color]);

impl fmt::Display for ColorList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, color) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{color}")?;
        }
        Ok(())
    }
}

/// Location of a rendered image relative to the image directory.
///
/// The hex digest is split into [`FRAGMENT_WIDTH`]-character segments; all
/// but the last become nested directories and the last one, plus the format
/// extension, is the file name. Segments are always joined with `/`, so the
/// same string doubles as a URL path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CachePath {
    relative: String,
}

impl CachePath {
    /// Derives the path for `key` stored as `format`.
    pub fn new(key: &CacheKey, format: ImageFormat) -> Self {
        let hex = key.to_hex();
        let fragments: Vec<&str> = hex
            .as_bytes()
            .chunks(FRAGMENT_WIDTH)
            .map(|chunk| core::str::from_utf8(chunk).unwrap_or_default())
            .collect();
        let mut relative = fragments.join("/");
        relative.push('.');
        relative.push_str(format.extension());
        Self { relative }
    }

    /// The `/`-separated relative path.
    pub fn as_str(&self) -> &str {
        &self.relative
    }

    /// The path segments, directories first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.relative.split('/')
    }

    /// Joins this path onto `root` using platform separators.
    pub fn under(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(self.segments());
        path
    }
}

impl fmt::Display for CachePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_and_full_width() {
        let key = fingerprint("Hello", &ResolvedStyle::DEFAULT);
        let hex = key.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn path_layout() {
        let key = CacheKey([0xab; 32]);
        let path = CachePath::new(&key, ImageFormat::Gif);
        let segments: Vec<_> = path.segments().collect();
        assert_eq!(segments.len(), 32);
        assert!(segments[..31].iter().all(|s| *s == "ab"));
        assert_eq!(segments[31], "ab.gif");
        assert!(path.as_str().starts_with("ab/ab/"));
    }

    #[test]
    fn under_uses_every_segment() {
        let key = CacheKey([0x01; 32]);
        let path = CachePath::new(&key, ImageFormat::Png).under(Path::new("root"));
        assert_eq!(path.components().count(), 33);
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
    }
}
