// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel post-processing and encoding.
//!
//! Filtering happens on premultiplied pixels so transparent areas do not
//! bleed black into antialiased edges.

use std::io::Cursor;

use image::{imageops, ImageFormat as EncodedFormat, Rgba, RgbaImage};
use tiny_skia::Pixmap;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::style::ImageFormat;

/// Takes the pixmap's premultiplied RGBA bytes as an image buffer.
pub(crate) fn premultiplied_image(canvas: Pixmap) -> Result<RgbaImage> {
    let (width, height) = (canvas.width(), canvas.height());
    RgbaImage::from_raw(width, height, canvas.take())
        .ok_or_else(|| Error::Render(format!("canvas data does not match {width}x{height}")))
}

/// Scales a supersampled image down by `factor`.
///
/// A non-zero `scale_support` first blurs with a sigma of that many output
/// pixels, which widens the effective resampling kernel.
pub(crate) fn downsample(image: &RgbaImage, factor: u32, config: &Config) -> RgbaImage {
    let width = (image.width() / factor).max(1);
    let height = (image.height() / factor).max(1);
    let filter = config.scale_filter.filter_type();
    if config.scale_support > 0.0 {
        let blurred = imageops::blur(image, config.scale_support * factor as f32);
        imageops::resize(&blurred, width, height, filter)
    } else {
        imageops::resize(image, width, height, filter)
    }
}

/// Counteracts the softening introduced by [`downsample`].
pub(crate) fn sharpen(image: &RgbaImage, config: &Config) -> RgbaImage {
    if config.sharpen_sigma <= 0.0 {
        return image.clone();
    }
    imageops::unsharpen(image, config.sharpen_sigma, config.sharpen_threshold)
}

/// Converts premultiplied pixels to straight alpha in place.
pub(crate) fn demultiply(image: &mut RgbaImage) {
    for Rgba([r, g, b, a]) in image.pixels_mut() {
        match *a {
            0 => {
                *r = 0;
                *g = 0;
                *b = 0;
            }
            255 => {}
            alpha => {
                let alpha = u16::from(alpha);
                let scale = |c: u8| {
                    let c = (u16::from(c) * 255 + alpha / 2) / alpha;
                    u8::try_from(c).unwrap_or(u8::MAX)
                };
                *r = scale(*r);
                *g = scale(*g);
                *b = scale(*b);
            }
        }
    }
}

/// Makes every pixel identical to the one at (0, 0) fully transparent.
///
/// GIF has no partial alpha, so text is rendered against an opaque
/// background and that background is cut out afterwards.
pub(crate) fn key_out_background(image: &mut RgbaImage) {
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    let key = *image.get_pixel(0, 0);
    for pixel in image.pixels_mut() {
        if *pixel == key {
            *pixel = Rgba([key[0], key[1], key[2], 0]);
        }
    }
}

/// Encodes `image` in `format`.
pub fn encode(image: &RgbaImage, format: ImageFormat) -> Result<Vec<u8>> {
    let encoded_format = match format {
        ImageFormat::Png => EncodedFormat::Png,
        ImageFormat::Gif => EncodedFormat::Gif,
    };
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, encoded_format)
        .map_err(|err| Error::Render(format!("encoding {format}: {err}")))?;
    Ok(bytes.into_inner())
}
