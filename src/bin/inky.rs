//! Show an image on an AC073TC1 panel attached to a Linux board

use std::fs;
use std::path::{Path, PathBuf};

use ac073tc1::config::{
    DEFAULT_DATA_LINE, DEFAULT_GPIO_CHIP_PATH, DEFAULT_RESET_LINE, DEFAULT_SPI_PATH,
};
use ac073tc1::{Builder, Dimensions, DisplayDriver, PreparedFrame, SourceImage, dither, resample};
use anyhow::{Context, bail};
use clap::Parser;
use log::info;
use rand::seq::IndexedRandom;
use simplelog::{Config, LevelFilter, SimpleLogger};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

#[derive(Parser, Debug)]
#[command(version, about = "Show an image on an AC073TC1 seven-color e-paper panel")]
struct Args {
    /// Image file, or a directory to pick a random image from
    #[arg(required_unless_present = "demo")]
    path: Option<PathBuf>,

    /// Write the dithered frame to this image file instead of the panel
    #[arg(long, value_name = "OUT")]
    save: Option<PathBuf>,

    /// Show the built-in test pattern
    #[arg(long)]
    demo: bool,

    /// Log every command step
    #[arg(short, long)]
    verbose: bool,

    /// SPI device node
    #[arg(long, default_value = DEFAULT_SPI_PATH)]
    spi: String,

    /// GPIO controller device node
    #[arg(long, default_value = DEFAULT_GPIO_CHIP_PATH)]
    gpio_chip: String,

    /// Reset line offset
    #[arg(long, default_value_t = DEFAULT_RESET_LINE)]
    reset_line: u32,

    /// Data/command select line offset
    #[arg(long, default_value_t = DEFAULT_DATA_LINE)]
    data_line: u32,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Resolve a directory to one of its images, chosen at random
fn pick_image(path: &Path) -> anyhow::Result<PathBuf> {
    if !path.is_dir() {
        return Ok(path.to_path_buf());
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(path).with_context(|| format!("reading {}", path.display()))? {
        let entry = entry.with_context(|| format!("reading {}", path.display()))?;
        let candidate = entry.path();
        if candidate.is_file() && is_image(&candidate) {
            candidates.push(candidate);
        }
    }

    match candidates.choose(&mut rand::rng()) {
        Some(chosen) => Ok(chosen.clone()),
        None => bail!("no images in {}", path.display()),
    }
}

fn load_frame(path: &Path) -> anyhow::Result<PreparedFrame> {
    let path = pick_image(path)?;
    info!("loading {}", path.display());

    let image = image::open(&path)
        .with_context(|| format!("decoding {}", path.display()))?
        .into_rgba8();
    let source = SourceImage::rgba(image.width(), image.height(), image.as_raw())?;

    Ok(dither(&resample(&source, Dimensions::PANEL)))
}

fn save_frame(frame: &PreparedFrame, path: &Path) -> anyhow::Result<()> {
    let dims = frame.dimensions();
    image::save_buffer(
        path,
        &frame.to_rgb(),
        dims.width,
        dims.height,
        image::ExtendedColorType::Rgb8,
    )
    .with_context(|| format!("writing {}", path.display()))?;
    info!("saved {}", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::init(level, Config::default())?;

    let frame = match &args.path {
        Some(path) if !args.demo => load_frame(path)?,
        _ => PreparedFrame::demo(Dimensions::PANEL),
    };

    if let Some(out) = &args.save {
        return save_frame(&frame, out);
    }

    let config = Builder::new()
        .spi_path(&args.spi)
        .gpio_chip_path(&args.gpio_chip)
        .reset_line(args.reset_line)
        .data_line(args.data_line)
        .build();

    DisplayDriver::new(config)
        .render_frame(&frame.pack())
        .context("painting panel")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extensions() {
        assert!(is_image(Path::new("a/b/photo.JPG")));
        assert!(is_image(Path::new("photo.jpeg")));
        assert!(is_image(Path::new("anim.gif")));
        assert!(!is_image(Path::new("notes.txt")));
        assert!(!is_image(Path::new("png")));
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["inky", "photo.png"]);
        assert_eq!(args.path.as_deref(), Some(Path::new("photo.png")));
        assert_eq!(args.spi, "/dev/spidev0.0");
        assert_eq!(args.reset_line, 27);
        assert_eq!(args.data_line, 22);
        assert!(!args.demo);
    }

    #[test]
    fn test_path_optional_with_demo() {
        assert!(Args::try_parse_from(["inky"]).is_err());
        assert!(Args::try_parse_from(["inky", "--demo"]).is_ok());
    }
}
