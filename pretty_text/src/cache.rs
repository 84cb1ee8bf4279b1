// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The write-once image cache.
//!
//! The filesystem is the only shared state. Files are written to a unique
//! temporary name next to their destination and renamed into place, so a
//! reader either sees a complete image or nothing.

use std::fs;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::{Mutex, MutexGuard, RawMutex};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fingerprint::{fingerprint, CacheKey, CachePath};
use crate::handle::ImageHandle;
use crate::raster::{encode, ParleyRasterizer, TextRasterizer, TextRenderer};
use crate::style::{ResolvedStyle, StyleDescriptor, StyleOverrides};

/// Renders text to images on first request and serves the stored file on
/// every request after that.
///
/// A `RenderCache` is `Sync` when its rasterizer is `Send`; share it between
/// request handlers behind an `Arc`. Each rasterizer in the pool renders one
/// image at a time, so misses for different keys run in parallel up to the
/// pool size.
#[derive(Debug)]
pub struct RenderCache<R = ParleyRasterizer> {
    config: Config,
    image_root: PathBuf,
    renderers: Vec<Mutex<TextRenderer<R>>>,
    next_renderer: AtomicUsize,
    locks: KeyLocks,
    tmp_counter: AtomicU64,
}

impl RenderCache<ParleyRasterizer> {
    /// Creates a cache backed by the Parley rasterizer and system fonts, with
    /// one rasterizer per available core.
    pub fn with_parley(config: Config) -> Self {
        let workers = std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);
        Self::with_pool(config, workers, ParleyRasterizer::new)
    }
}

impl<R: TextRasterizer> RenderCache<R> {
    /// Creates a cache that renders misses with `rasterizer`.
    pub fn new(config: Config, rasterizer: R) -> Self {
        Self::from_rasterizers(config, vec![rasterizer])
    }

    /// Creates a cache with `size` rasterizers made by `make`.
    pub fn with_pool(config: Config, size: NonZeroUsize, make: impl FnMut() -> R) -> Self {
        let rasterizers = std::iter::repeat_with(make).take(size.get()).collect();
        Self::from_rasterizers(config, rasterizers)
    }

    fn from_rasterizers(config: Config, rasterizers: Vec<R>) -> Self {
        let renderers = rasterizers
            .into_iter()
            .map(|rasterizer| Mutex::new(TextRenderer::new(rasterizer, &config)))
            .collect();
        Self {
            image_root: config.image_root(),
            renderers,
            next_renderer: AtomicUsize::new(0),
            config,
            locks: KeyLocks::default(),
            tmp_counter: AtomicU64::new(0),
        }
    }

    /// The configuration this cache was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of rasterizers that can render at the same time.
    pub fn pool_size(&self) -> usize {
        self.renderers.len()
    }

    /// Runs `f` with every rasterizer in the pool, e.g. to inspect test
    /// doubles. Waits for renders in progress.
    pub fn for_each_rasterizer(&self, mut f: impl FnMut(&R)) {
        for renderer in &self.renderers {
            f(renderer.lock().backend());
        }
    }

    /// Returns the image for `text` in `style`, rendering it if needed.
    ///
    /// Blank text is rendered as a single space.
    pub fn render(&self, text: &str, style: &StyleDescriptor) -> Result<ImageHandle> {
        let text = normalize_text(text);
        let style = style.resolve();
        style.validate()?;

        let key = fingerprint(text, &style);
        let handle = self.handle_for(text, &key, &style);
        if handle.file_path().is_file() {
            log::debug!("cache hit for {key} at {}", handle.path());
            return Ok(handle);
        }

        let key_guard = self.config.single_flight.then(|| self.locks.lock(key));
        if key_guard.is_some() && handle.file_path().is_file() {
            log::debug!("{key} was rendered while waiting for its lock");
            return Ok(handle);
        }

        log::debug!("cache miss for {key}, rendering {text:?}");
        let image = self.renderer().render(text, &style)?;
        let bytes = encode(&image, style.format())?;
        self.persist(handle.file_path(), &bytes)?;
        log::info!(
            "rendered {}x{} image to {}",
            image.width(),
            image.height(),
            handle.file_path().display()
        );
        drop(key_guard);
        Ok(handle)
    }

    /// Like [`render`](Self::render), with the style given as overrides on
    /// top of the defaults.
    pub fn render_with(&self, text: &str, overrides: Option<&StyleOverrides>) -> Result<ImageHandle> {
        let style = overrides
            .map(|o| StyleDescriptor::new(o.clone()))
            .unwrap_or_default();
        self.render(text, &style)
    }

    /// Returns the image for `text` in `style` only if it is already stored.
    pub fn lookup(&self, text: &str, style: &StyleDescriptor) -> Option<ImageHandle> {
        let text = normalize_text(text);
        let style = style.resolve();
        let key = fingerprint(text, &style);
        let handle = self.handle_for(text, &key, &style);
        handle.file_path().is_file().then_some(handle)
    }

    /// An idle renderer if there is one, otherwise the next one in turn.
    fn renderer(&self) -> MutexGuard<'_, TextRenderer<R>> {
        if let Some(idle) = self.renderers.iter().find_map(Mutex::try_lock) {
            return idle;
        }
        let next = self.next_renderer.fetch_add(1, Ordering::Relaxed) % self.renderers.len();
        self.renderers[next].lock()
    }

    fn handle_for(&self, text: &str, key: &CacheKey, style: &ResolvedStyle) -> ImageHandle {
        let relative = CachePath::new(key, style.format());
        let url_path = format!("/{}/{}", self.config.image_dir(), relative);
        ImageHandle::new(
            text.to_owned(),
            url_path,
            relative.under(&self.image_root),
            style.layer_count(),
        )
    }

    fn persist(&self, destination: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(dir) = destination.parent() {
            // Succeeds if another worker created the directory first.
            fs::create_dir_all(dir).map_err(|source| Error::Persist {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let tmp = self.tmp_path(destination);
        let written = write_fully(&tmp, bytes).and_then(|()| fs::rename(&tmp, destination));
        if let Err(source) = written {
            if let Err(err) = fs::remove_file(&tmp) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("could not remove {}: {err}", tmp.display());
                }
            }
            return Err(Error::Persist {
                path: destination.to_path_buf(),
                source,
            });
        }
        Ok(())
    }

    fn tmp_path(&self, destination: &Path) -> PathBuf {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let mut name = destination.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".{}.{n}.tmp", std::process::id()));
        destination.with_file_name(name)
    }
}

fn write_fully(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Blank input renders as a single space rather than an empty image.
pub(crate) fn normalize_text(text: &str) -> &str {
    if text.trim().is_empty() {
        " "
    } else {
        text
    }
}

type KeySlot = Arc<Mutex<()>>;

/// In-process mutexes keyed by [`CacheKey`].
///
/// Slots are created on demand and dropped once no request holds or waits
/// for them.
#[derive(Debug, Default)]
struct KeyLocks {
    slots: Mutex<HashMap<CacheKey, KeySlot>>,
}

impl KeyLocks {
    fn lock(&self, key: CacheKey) -> KeyGuard<'_> {
        let slot = Arc::clone(self.slots.lock().entry(key).or_default());
        let guard = slot.lock_arc();
        KeyGuard {
            locks: self,
            key,
            slot,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: CacheKey,
    slot: KeySlot,
    guard: Option<parking_lot::lock_api::ArcMutexGuard<RawMutex, ()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self.locks.slots.lock();
        // One reference in the map and ours: nobody else is waiting.
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_becomes_a_space() {
        assert_eq!(normalize_text(""), " ");
        assert_eq!(normalize_text(" \t\n"), " ");
        assert_eq!(normalize_text(" a "), " a ");
    }

    #[test]
    fn key_slots_are_released() {
        let locks = KeyLocks::default();
        let key = fingerprint("a", &ResolvedStyle::DEFAULT);
        {
            let _first = locks.lock(key);
            assert_eq!(locks.len(), 1);
        }
        assert_eq!(locks.len(), 0);
    }
}
