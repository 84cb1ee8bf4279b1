// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renders a string through a Pretty Text cache and prints where the image
//! landed.
//!
//! ```text
//! render_text "A headline" --size 30 --color "#666" --shadow "#ccc" --yextra 2
//! ```
//!
//! Running the same command twice finds the stored file the second time.

use std::path::PathBuf;

use clap::Parser;
use pretty_text::{
    CaseTransform, Color, Config, ImageFormat, RenderCache, StyleDescriptor, StyleOverrides,
};

#[derive(Parser, Debug)]
#[command(name = "render_text", about = "Render text into a cached image")]
struct Args {
    /// The text to render
    text: String,

    /// Config file; defaults are used if it does not exist
    #[arg(long, default_value = "pretty_text.toml")]
    config: PathBuf,

    /// Override the storage root from the config
    #[arg(long)]
    storage_root: Option<PathBuf>,

    /// Output format, png or gif
    #[arg(long)]
    format: Option<ImageFormat>,

    /// Text color
    #[arg(long)]
    color: Option<Color>,

    /// Extra layer colors, rendered below the primary one
    #[arg(long = "shadow")]
    additional_colors: Vec<Color>,

    /// Background color (GIF only)
    #[arg(long)]
    background: Option<Color>,

    /// Size in points
    #[arg(long)]
    size: Option<f32>,

    /// Font file relative to the font root
    #[arg(long)]
    font: Option<String>,

    /// Case transform: none, upper or lower
    #[arg(long = "case")]
    case_transform: Option<CaseTransform>,

    /// Extra width in pixels
    #[arg(long)]
    xextra: Option<u32>,

    /// Extra height in pixels, also the gap between layers
    #[arg(long)]
    yextra: Option<u32>,

    /// Supersample small sizes
    #[arg(long)]
    upscale: bool,
}

impl Args {
    fn style(&self) -> StyleDescriptor {
        StyleDescriptor::new(StyleOverrides {
            format: self.format,
            color: self.color,
            additional_colors: (!self.additional_colors.is_empty())
                .then(|| self.additional_colors.clone()),
            background_color: self.background,
            size: self.size,
            font: self.font.clone(),
            case_transform: self.case_transform,
            extra_width: self.xextra,
            extra_height: self.yextra,
            upscale: self.upscale.then_some(true),
            ..StyleOverrides::default()
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::load_from(&args.config)?;
    if let Some(root) = &args.storage_root {
        config.storage_root.clone_from(root);
    }

    let cache = RenderCache::with_parley(config);
    let image = cache.render(&args.text, &args.style())?;
    log::debug!("stored at {}", image.file_path().display());

    println!("{}", image.path());
    println!("{}x{}", image.width()?, image.height()?);
    Ok(())
}
