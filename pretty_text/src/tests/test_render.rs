// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use image::Rgba;

use super::utils::{block_extent, test_config, BlockRasterizer};
use crate::{
    CaseTransform, Color, Config, Error, Extent, ImageFormat, ResolvedStyle, StyleDescriptor,
    StyleOverrides, TextRenderer, SCALE_FACTOR,
};

fn style(f: impl FnOnce(&mut StyleOverrides)) -> ResolvedStyle {
    let mut o = StyleOverrides::default();
    f(&mut o);
    StyleDescriptor::new(o).resolve()
}

fn renderer(config: &Config) -> TextRenderer<BlockRasterizer> {
    TextRenderer::new(BlockRasterizer::default(), config)
}

#[test]
fn small_sizes_are_supersampled() {
    let mut r = renderer(&Config::default());
    let small = style(|o| {
        o.size = Some(10.0);
        o.upscale = Some(true);
    });

    let image = r.render("Hi", &small).unwrap();

    let big = block_extent("Hi", 50.0);
    assert_eq!(r.backend().sizes, [50.0]);
    assert_eq!(image.width(), big.width.div_ceil(SCALE_FACTOR));
    assert_eq!(image.height(), big.height.div_ceil(SCALE_FACTOR));
}

#[test]
fn upscale_threshold_is_inclusive() {
    let r = renderer(&Config::default());
    let at = |size: f32, upscale: bool| {
        r.scale_factor(&style(|o| {
            o.size = Some(size);
            o.upscale = Some(upscale);
        }))
    };
    assert_eq!(at(12.0, true), SCALE_FACTOR);
    assert_eq!(at(6.0, true), SCALE_FACTOR);
    assert_eq!(at(14.0, true), 1);
    assert_eq!(at(10.0, false), 1);

    let lower = renderer(&Config {
        scale_threshold: 8.0,
        ..Config::default()
    });
    assert_eq!(lower.scale_factor(&style(|o| {
        o.size = Some(10.0);
        o.upscale = Some(true);
    })), 1);
}

#[test]
fn large_sizes_render_at_their_own_size() {
    let mut r = renderer(&Config::default());
    let large = style(|o| {
        o.size = Some(14.0);
        o.upscale = Some(true);
    });
    let image = r.render("Hi", &large).unwrap();
    let extent = block_extent("Hi", 14.0);
    assert_eq!(r.backend().sizes, [14.0]);
    assert_eq!((image.width(), image.height()), (extent.width, extent.height));
}

#[test]
fn layers_are_stacked_with_extra_height() {
    let mut r = renderer(&Config::default());
    let layered = style(|o| {
        o.additional_colors = Some(vec![Color::WHITE, Color::rgb(255, 0, 0)]);
        o.extra_width = Some(4);
        o.extra_height = Some(3);
    });

    let image = r.render("Stack", &layered).unwrap();

    let extent = block_extent("Stack", 12.0);
    let layer = Extent {
        width: extent.width + 4,
        height: extent.height + 3,
    };
    assert_eq!(r.backend().draws, 3);
    assert_eq!(image.width(), layer.width);
    assert_eq!(image.height(), 3 * layer.height);
    assert_eq!(image.height() / layered.layer_count(), layer.height);

    // Each layer is painted in its own color, primary first.
    assert_eq!(*image.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
    assert_eq!(*image.get_pixel(1, layer.height + 1), Rgba([255, 255, 255, 255]));
    assert_eq!(*image.get_pixel(1, 2 * layer.height + 1), Rgba([255, 0, 0, 255]));
}

#[test]
fn measure_reports_a_single_layer() {
    let mut r = renderer(&Config::default());
    let layered = style(|o| {
        o.additional_colors = Some(vec![Color::WHITE]);
        o.extra_width = Some(2);
    });
    let extent = block_extent("Two\nlines", 12.0);
    assert_eq!(
        r.measure("Two\nlines", &layered).unwrap(),
        Extent {
            width: extent.width + 2,
            height: extent.height,
        }
    );
}

#[test]
fn case_is_transformed_before_measuring() {
    let mut r = renderer(&Config::default());
    let upper = style(|o| o.case_transform = Some(CaseTransform::Upper));
    r.render("quiet", &upper).unwrap();
    assert_eq!(r.backend().texts, ["QUIET"]);
}

#[test]
fn fonts_resolve_against_the_font_root() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.font_root).unwrap();
    std::fs::write(config.font_root.join("Present.ttf"), b"not really a font").unwrap();
    let mut r = renderer(&config);

    let present = style(|o| o.font = Some("Present.ttf".into()));
    assert!(r.render("ok", &present).is_ok());

    let missing = style(|o| o.font = Some("Missing.ttf".into()));
    match r.render("ok", &missing) {
        Err(Error::FontResolution { path }) => {
            assert_eq!(path, config.font_root.join("Missing.ttf"));
        }
        other => panic!("expected a font error, got {other:?}"),
    }
}

#[test]
fn gif_background_is_keyed_out() {
    let mut r = renderer(&Config::default());
    let gif = style(|o| {
        o.format = Some(ImageFormat::Gif);
        o.background_color = Some(Color::rgb(255, 0, 0));
        o.x_offset = Some(2);
        o.y_offset = Some(2);
    });

    let image = r.render("Keyed", &gif).unwrap();

    assert_eq!(image.get_pixel(0, 0)[3], 0);
    assert_eq!(*image.get_pixel(3, 3), Rgba([0, 0, 0, 255]));
}

#[test]
fn png_ignores_the_background() {
    let mut r = renderer(&Config::default());
    let png = style(|o| {
        o.background_color = Some(Color::rgb(255, 0, 0));
        o.x_offset = Some(2);
        o.y_offset = Some(2);
    });

    let image = r.render("Clear", &png).unwrap();

    assert_eq!(image.get_pixel(0, 0)[3], 0);
    assert_eq!(*image.get_pixel(3, 3), Rgba([0, 0, 0, 255]));
}

#[test]
fn backend_errors_propagate() {
    let mut r = TextRenderer::new(BlockRasterizer::failing(), &Config::default());
    assert!(matches!(
        r.render("x", &ResolvedStyle::DEFAULT),
        Err(Error::Render(_))
    ));
}

#[test]
fn oversized_padding_is_a_render_error() {
    let mut r = renderer(&Config::default());
    let supersampled = style(|o| {
        o.size = Some(10.0);
        o.upscale = Some(true);
        o.extra_width = Some(1_000_000_000);
    });
    let tall = style(|o| o.extra_height = Some(u32::MAX));

    let wide = r.render("Hi", &supersampled);
    assert!(matches!(wide, Err(Error::Render(_))), "{wide:?}");
    let measured = r.measure("Hi", &supersampled);
    assert!(matches!(measured, Err(Error::Render(_))), "{measured:?}");
    let tall = r.render("Hi", &tall);
    assert!(matches!(tall, Err(Error::Render(_))), "{tall:?}");
    assert_eq!(r.backend().draws, 0);
}
