// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text styling for rendered images.
//!
//! A [`StyleDescriptor`] stores only the attributes that were explicitly set.
//! Everything else reads through to [`ResolvedStyle::DEFAULT`]; the merged
//! view is obtained with [`StyleDescriptor::resolve`].

mod color;

use alloc::borrow::Cow;
use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use color::Color;

/// Errors raised while interpreting style attributes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StyleError {
    /// The image format is neither `png` nor `gif`.
    #[error("unknown image format `{0}` (expected `png` or `gif`)")]
    UnknownFormat(String),
    /// The case transform is not one of `none`, `upper` or `lower`.
    #[error("unknown case transform `{0}` (expected `none`, `upper` or `lower`)")]
    UnknownCaseTransform(String),
    /// A color could not be parsed.
    #[error("invalid color `{0}`")]
    InvalidColor(String),
    /// The point size is zero, negative or not finite.
    #[error("font size must be a positive number, got {0}")]
    InvalidSize(f32),
    /// A numeric attribute is NaN or infinite.
    #[error("`{0}` must be a finite number")]
    NonFinite(&'static str),
}

/// Output file format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG with a real alpha channel.
    #[default]
    Png,
    /// GIF; transparency is emulated by color-keying the background.
    Gif,
}

impl ImageFormat {
    /// The file extension, without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            _ => Err(StyleError::UnknownFormat(s.to_owned())),
        }
    }
}

/// Case transformation applied before measuring and rendering.
///
/// Upper and lower casing are mutually exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseTransform {
    /// Render the text as given.
    #[default]
    None,
    /// Convert to uppercase.
    Upper,
    /// Convert to lowercase.
    Lower,
}

impl CaseTransform {
    /// Applies the transform to `text`.
    pub fn apply(self, text: &str) -> Cow<'_, str> {
        match self {
            Self::None => Cow::Borrowed(text),
            Self::Upper => Cow::Owned(text.to_uppercase()),
            Self::Lower => Cow::Owned(text.to_lowercase()),
        }
    }
}

impl fmt::Display for CaseTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Upper => "upper",
            Self::Lower => "lower",
        })
    }
}

impl FromStr for CaseTransform {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "upper" | "upcase" => Ok(Self::Upper),
            "lower" | "downcase" => Ok(Self::Lower),
            _ => Err(StyleError::UnknownCaseTransform(s.to_owned())),
        }
    }
}

/// A sparse set of style attributes.
///
/// `None` means "not set here"; the value falls through to whatever this is
/// merged onto. Unknown keys are ignored when deserializing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOverrides {
    /// Output file format.
    pub format: Option<ImageFormat>,
    /// Primary text color.
    #[serde(alias = "primary_color")]
    pub color: Option<Color>,
    /// Further colors, each rendered as its own layer below the primary one.
    pub additional_colors: Option<Vec<Color>>,
    /// Background fill. Ignored for PNG, which is always transparent.
    #[serde(alias = "bg_color")]
    pub background_color: Option<Color>,
    /// Font size in points.
    #[serde(alias = "size_points")]
    pub size: Option<f32>,
    /// Font file relative to the configured font root.
    #[serde(alias = "font_ref")]
    pub font: Option<String>,
    /// Cosmetic font label for markup. Never affects the rendered image.
    pub html_font: Option<String>,
    /// Case transformation.
    pub case_transform: Option<CaseTransform>,
    /// Extra pixels added to the width of every layer.
    #[serde(alias = "xextra")]
    pub extra_width: Option<u32>,
    /// Extra pixels added to the height of every layer.
    #[serde(alias = "yextra")]
    pub extra_height: Option<u32>,
    /// Horizontal offset of the text inside its layer.
    #[serde(alias = "xoffset")]
    pub x_offset: Option<i32>,
    /// Vertical offset of the text inside its layer.
    #[serde(alias = "yoffset")]
    pub y_offset: Option<i32>,
    /// Additional spacing between letters, in pixels.
    pub kerning: Option<f32>,
    /// Additional spacing between lines, in pixels.
    pub interline_spacing: Option<f32>,
    /// Supersample small sizes and scale the result down.
    #[serde(alias = "upscale_small_fonts")]
    pub upscale: Option<bool>,
}

macro_rules! merge_fields {
    ($base:expr, $top:expr; $($field:ident),* $(,)?) => {
        StyleOverrides {
            $($field: $top.$field.clone().or_else(|| $base.$field.clone()),)*
        }
    };
}

impl StyleOverrides {
    /// Returns a new set where every attribute set in `top` wins over `self`.
    pub fn merge(&self, top: &Self) -> Self {
        merge_fields!(self, top;
            format,
            color,
            additional_colors,
            background_color,
            size,
            font,
            html_font,
            case_transform,
            extra_width,
            extra_height,
            x_offset,
            y_offset,
            kerning,
            interline_spacing,
            upscale,
        )
    }
}

/// A fully populated style: defaults merged with overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStyle {
    format: ImageFormat,
    color: Color,
    additional_colors: Vec<Color>,
    background_color: Color,
    size: f32,
    font: Option<String>,
    html_font: Option<String>,
    case_transform: CaseTransform,
    extra_width: u32,
    extra_height: u32,
    x_offset: i32,
    y_offset: i32,
    kerning: f32,
    interline_spacing: f32,
    upscale: bool,
}

impl ResolvedStyle {
    /// The global defaults every attribute reads through to.
    pub const DEFAULT: Self = Self {
        format: ImageFormat::Png,
        color: Color::BLACK,
        additional_colors: Vec::new(),
        background_color: Color::WHITE,
        size: 12.0,
        font: None,
        html_font: None,
        case_transform: CaseTransform::None,
        extra_width: 0,
        extra_height: 0,
        x_offset: 0,
        y_offset: 0,
        kerning: 0.0,
        interline_spacing: 0.0,
        upscale: false,
    };

    fn from_overrides(o: &StyleOverrides) -> Self {
        let d = Self::DEFAULT;
        Self {
            format: o.format.unwrap_or(d.format),
            color: o.color.unwrap_or(d.color),
            additional_colors: o.additional_colors.clone().unwrap_or(d.additional_colors),
            background_color: o.background_color.unwrap_or(d.background_color),
            size: o.size.unwrap_or(d.size),
            font: o.font.clone().or(d.font),
            html_font: o.html_font.clone().or(d.html_font),
            case_transform: o.case_transform.unwrap_or(d.case_transform),
            extra_width: o.extra_width.unwrap_or(d.extra_width),
            extra_height: o.extra_height.unwrap_or(d.extra_height),
            x_offset: o.x_offset.unwrap_or(d.x_offset),
            y_offset: o.y_offset.unwrap_or(d.y_offset),
            kerning: o.kerning.unwrap_or(d.kerning),
            interline_spacing: o.interline_spacing.unwrap_or(d.interline_spacing),
            upscale: o.upscale.unwrap_or(d.upscale),
        }
    }

    /// Checks the numeric attributes.
    pub fn validate(&self) -> Result<(), StyleError> {
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(StyleError::InvalidSize(self.size));
        }
        if !self.kerning.is_finite() {
            return Err(StyleError::NonFinite("kerning"));
        }
        if !self.interline_spacing.is_finite() {
            return Err(StyleError::NonFinite("interline_spacing"));
        }
        Ok(())
    }

    /// Output file format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Primary text color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Colors of the layers below the primary one, in render order.
    pub fn additional_colors(&self) -> &[Color] {
        &self.additional_colors
    }

    /// All layer colors: the primary color followed by the additional ones.
    pub fn layer_colors(&self) -> impl Iterator<Item = Color> + '_ {
        core::iter::once(self.color).chain(self.additional_colors.iter().copied())
    }

    /// Number of stacked layers in the stored image.
    pub fn layer_count(&self) -> u32 {
        u32::try_from(self.additional_colors.len() + 1).unwrap_or(u32::MAX)
    }

    /// The background fill.
    ///
    /// Always transparent for PNG; the stored value only applies to GIF.
    pub fn background_color(&self) -> Color {
        match self.format {
            ImageFormat::Png => Color::TRANSPARENT,
            ImageFormat::Gif => self.background_color,
        }
    }

    /// Font size in points.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Font file relative to the font root, if any.
    pub fn font(&self) -> Option<&str> {
        self.font.as_deref()
    }

    /// Cosmetic font label.
    pub fn html_font(&self) -> Option<&str> {
        self.html_font.as_deref()
    }

    /// Case transformation.
    pub fn case_transform(&self) -> CaseTransform {
        self.case_transform
    }

    /// Extra layer width in pixels.
    pub fn extra_width(&self) -> u32 {
        self.extra_width
    }

    /// Extra layer height in pixels, also the gap between layers.
    pub fn extra_height(&self) -> u32 {
        self.extra_height
    }

    /// Horizontal text offset in pixels.
    pub fn x_offset(&self) -> i32 {
        self.x_offset
    }

    /// Vertical text offset in pixels.
    pub fn y_offset(&self) -> i32 {
        self.y_offset
    }

    /// Letter spacing in pixels.
    pub fn kerning(&self) -> f32 {
        self.kerning
    }

    /// Line spacing in pixels.
    pub fn interline_spacing(&self) -> f32 {
        self.interline_spacing
    }

    /// Whether small sizes are supersampled.
    pub fn upscale(&self) -> bool {
        self.upscale
    }

    /// Applies the case transform to `text`.
    pub fn process_text<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.case_transform.apply(text)
    }
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<&ResolvedStyle> for StyleOverrides {
    fn from(style: &ResolvedStyle) -> Self {
        Self {
            format: Some(style.format),
            color: Some(style.color),
            additional_colors: Some(style.additional_colors.clone()),
            // The stored value, not the PNG-forced one, so a later switch to GIF keeps it.
            background_color: Some(style.background_color),
            size: Some(style.size),
            font: style.font.clone(),
            html_font: style.html_font.clone(),
            case_transform: Some(style.case_transform),
            extra_width: Some(style.extra_width),
            extra_height: Some(style.extra_height),
            x_offset: Some(style.x_offset),
            y_offset: Some(style.y_offset),
            kerning: Some(style.kerning),
            interline_spacing: Some(style.interline_spacing),
            upscale: Some(style.upscale),
        }
    }
}

/// An immutable style: a set of overrides on top of the global defaults.
///
/// ```
/// use pretty_text::{StyleDescriptor, StyleOverrides};
///
/// let headline = StyleDescriptor::new(StyleOverrides {
///     size: Some(30.0),
///     ..StyleOverrides::default()
/// });
/// let body = headline.with(&StyleOverrides {
///     size: Some(12.0),
///     ..StyleOverrides::default()
/// });
/// assert_eq!(headline.resolve().size(), 30.0);
/// assert_eq!(body.resolve().size(), 12.0);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleDescriptor {
    overrides: StyleOverrides,
}

impl StyleDescriptor {
    /// Creates a style from a set of overrides.
    pub fn new(overrides: StyleOverrides) -> Self {
        Self { overrides }
    }

    /// The attributes explicitly stored on this style.
    pub fn overrides(&self) -> &StyleOverrides {
        &self.overrides
    }

    /// Merges the overrides onto the defaults.
    pub fn resolve(&self) -> ResolvedStyle {
        ResolvedStyle::from_overrides(&self.overrides)
    }

    /// Derives a new style from the effective attributes of this one with
    /// `overrides` applied on top. `self` is left untouched.
    pub fn with(&self, overrides: &StyleOverrides) -> Self {
        let effective = StyleOverrides::from(&self.resolve());
        Self::new(effective.merge(overrides))
    }

    /// Applies the case transform to `text`.
    pub fn process_text<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.resolve().process_text(text)
    }
}

impl From<StyleOverrides> for StyleDescriptor {
    fn from(overrides: StyleOverrides) -> Self {
        Self::new(overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_enum_values_are_rejected() {
        assert_eq!(
            "tiff".parse::<ImageFormat>(),
            Err(StyleError::UnknownFormat("tiff".into()))
        );
        assert!(matches!(
            "title".parse::<CaseTransform>(),
            Err(StyleError::UnknownCaseTransform(_))
        ));
        assert_eq!("GIF".parse::<ImageFormat>(), Ok(ImageFormat::Gif));
    }

    #[test]
    fn validate_rejects_bad_sizes() {
        for size in [0.0, -3.0, f32::NAN, f32::INFINITY] {
            let style = StyleDescriptor::new(StyleOverrides {
                size: Some(size),
                ..StyleOverrides::default()
            });
            assert!(style.resolve().validate().is_err(), "size {size} accepted");
        }
    }

    #[test]
    fn layer_count_counts_primary() {
        let style = StyleDescriptor::new(StyleOverrides {
            additional_colors: Some(vec![Color::WHITE, Color::BLACK]),
            ..StyleOverrides::default()
        });
        let resolved = style.resolve();
        assert_eq!(resolved.layer_count(), 3);
        assert_eq!(
            resolved.layer_colors().collect::<Vec<_>>(),
            [Color::BLACK, Color::WHITE, Color::BLACK]
        );
    }
}
