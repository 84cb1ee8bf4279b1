// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::borrow::Cow;

use crate::{
    CaseTransform, Color, ImageFormat, ResolvedStyle, StyleDescriptor, StyleOverrides,
};

fn overrides(f: impl FnOnce(&mut StyleOverrides)) -> StyleOverrides {
    let mut o = StyleOverrides::default();
    f(&mut o);
    o
}

#[test]
fn empty_style_reads_through_to_defaults() {
    let resolved = StyleDescriptor::default().resolve();
    assert_eq!(resolved, ResolvedStyle::DEFAULT);
    assert_eq!(resolved.format(), ImageFormat::Png);
    assert_eq!(resolved.color(), Color::BLACK);
    assert_eq!(resolved.size(), 12.0);
    assert!(resolved.font().is_none());
    assert!(!resolved.upscale());
}

#[test]
fn with_leaves_the_original_alone() {
    let base = StyleDescriptor::new(overrides(|o| {
        o.size = Some(30.0);
        o.color = Some(Color::rgb(0x66, 0x66, 0x66));
    }));
    let before = base.clone();

    let derived = base.with(&overrides(|o| o.size = Some(12.0)));

    assert_eq!(base, before);
    assert_eq!(base.resolve().size(), 30.0);
    assert_eq!(derived.resolve().size(), 12.0);
    assert_eq!(derived.resolve().color(), Color::rgb(0x66, 0x66, 0x66));
}

#[test]
fn derived_style_stores_every_effective_attribute() {
    let derived = StyleDescriptor::default().with(&StyleOverrides::default());
    let stored = derived.overrides();
    assert_eq!(stored.format, Some(ImageFormat::Png));
    assert_eq!(stored.background_color, Some(Color::WHITE));
    assert_eq!(stored.upscale, Some(false));
    assert_eq!(derived.resolve(), ResolvedStyle::DEFAULT);
}

#[test]
fn derived_and_explicit_styles_resolve_identically() {
    let derived = StyleDescriptor::default().with(&overrides(|o| o.size = Some(12.0)));
    let explicit = StyleDescriptor::new(overrides(|o| o.size = Some(12.0)));
    assert_eq!(derived.resolve(), explicit.resolve());
}

#[test]
fn png_background_is_always_transparent() {
    let png = StyleDescriptor::new(overrides(|o| o.background_color = Some(Color::rgb(255, 0, 0))));
    assert_eq!(png.resolve().background_color(), Color::TRANSPARENT);

    let gif = png.with(&overrides(|o| o.format = Some(ImageFormat::Gif)));
    assert_eq!(gif.resolve().background_color(), Color::rgb(255, 0, 0));
}

#[test]
fn case_transforms() {
    let upper = StyleDescriptor::new(overrides(|o| o.case_transform = Some(CaseTransform::Upper)));
    let once = upper.process_text("Grüße, world");
    assert_eq!(once, "GRÜSSE, WORLD");
    assert_eq!(upper.process_text(&once), once);

    let lower = upper.with(&overrides(|o| o.case_transform = Some(CaseTransform::Lower)));
    assert_eq!(lower.process_text("MiXeD"), "mixed");

    let none = StyleDescriptor::default();
    assert!(matches!(none.process_text("As Is"), Cow::Borrowed("As Is")));
}

#[test]
fn merge_prefers_the_top_layer() {
    let bottom = overrides(|o| {
        o.size = Some(20.0);
        o.kerning = Some(1.0);
    });
    let top = overrides(|o| o.size = Some(8.0));
    let merged = bottom.merge(&top);
    assert_eq!(merged.size, Some(8.0));
    assert_eq!(merged.kerning, Some(1.0));
    assert_eq!(merged.color, None);
}

#[test]
fn overrides_from_toml() {
    let parsed: StyleOverrides = toml::from_str(
        r##"
        format = "gif"
        bg_color = "#fff"
        additional_colors = ["#f00", "blue"]
        size = 10.0
        upcase_everything = true
        xextra = 4
        "##,
    )
    .unwrap();
    assert_eq!(parsed.format, Some(ImageFormat::Gif));
    assert_eq!(parsed.background_color, Some(Color::WHITE));
    assert_eq!(
        parsed.additional_colors,
        Some(vec![Color::rgb(255, 0, 0), Color::rgb(0, 0, 255)])
    );
    assert_eq!(parsed.size, Some(10.0));
    assert_eq!(parsed.extra_width, Some(4));
    assert_eq!(parsed.case_transform, None);
}

#[test]
fn invalid_enum_values_fail_to_parse() {
    assert!(toml::from_str::<StyleOverrides>("format = \"bmp\"").is_err());
    assert!(toml::from_str::<StyleOverrides>("color = \"#zzz\"").is_err());
    assert!(toml::from_str::<StyleOverrides>("case_transform = \"title\"").is_err());
}
