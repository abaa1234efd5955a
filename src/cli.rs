use crate::bounds::BoundsEngine;
use crate::config::load_config;
use crate::crop::{CropOptions, CropOutcome, crop_file};
use crate::error::SvgError;
use crate::strip::strip_file;
use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "svgcrop", version, about = "Crop SVG files to their visible content")]
pub struct CropArgs {
    /// SVG file, or a directory whose .svg files are all cropped
    pub path: PathBuf,

    /// Space added around the content on every side (user units)
    #[arg(short = 'p', long = "padding", allow_negative_numbers = true)]
    pub padding: Option<f64>,

    /// Load system fonts so <text> can be measured
    #[arg(long = "system-fonts")]
    pub system_fonts: bool,

    /// Config JSON file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(
    name = "svgrmpath",
    version,
    about = "Remove <path> elements with a given fill color; the result goes to output.svg"
)]
pub struct StripArgs {
    /// Input SVG file
    pub input: PathBuf,

    /// Fill color to remove, compared case-insensitively (e.g. "#ff0000")
    pub fill: String,

    /// Config JSON file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
}

pub fn run_crop() -> Result<()> {
    let args: CropArgs = parse_args();
    init_logging();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(padding) = args.padding {
        config.crop.padding = padding;
    }
    if args.system_fonts {
        config.crop.system_fonts = true;
    }

    let engine = if config.crop.system_fonts {
        BoundsEngine::with_system_fonts()
    } else {
        BoundsEngine::new()
    };
    let options = CropOptions {
        padding: config.crop.padding,
    };

    let metadata = std::fs::metadata(&args.path)
        .with_context(|| format!("Cannot access {}", args.path.display()))?;

    if metadata.is_dir() {
        let files = collect_svg_files(&args.path)?;
        if files.is_empty() {
            log::warn!("No .svg files found in {}", args.path.display());
        }
        for file in files {
            if let Err(err) = crop_and_report(&file, &engine, &options) {
                log::error!("{err:#}");
            }
        }
        return Ok(());
    }

    if !has_svg_extension(&args.path) {
        anyhow::bail!(
            "{} is not an SVG file or a directory containing SVG files",
            args.path.display()
        );
    }

    match crop_and_report(&args.path, &engine, &options) {
        Err(err) if err.downcast_ref::<SvgError>().is_some() => {
            log::error!("{err:#}");
            Ok(())
        }
        other => other,
    }
}

pub fn run_strip() -> Result<()> {
    let args: StripArgs = parse_args();
    init_logging();

    let config = load_config(args.config.as_deref())?;
    let output = config.strip.output;

    let report = strip_file(&args.input, &args.fill, &output)?;
    println!(
        "Removed {} paths with fill color \"{}\".",
        report.removed, report.fill
    );
    println!("Modified SVG saved to {}", output.display());
    Ok(())
}

fn crop_and_report(path: &Path, engine: &BoundsEngine, options: &CropOptions) -> Result<()> {
    match crop_file(path, engine, options)? {
        CropOutcome::Cropped(view) => {
            println!(
                "Cropped {} to content. New viewBox: {}",
                path.display(),
                view.to_viewbox()
            );
        }
        CropOutcome::NoContent => {
            log::warn!(
                "No visible content found or content has no dimensions in {}. Skipping crop.",
                path.display()
            );
        }
    }
    Ok(())
}

/// Regular files directly inside `dir` with an `.svg` extension (any case),
/// sorted by path. Entries that cannot be read are logged and skipped.
pub fn collect_svg_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
    Ok(svg_paths(
        dir,
        entries.map(|entry| entry.map(|entry| entry.path())),
    ))
}

fn svg_paths(dir: &Path, entries: impl IntoIterator<Item = io::Result<PathBuf>>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                log::error!("Skipping unreadable entry in {}: {err}", dir.display());
                continue;
            }
        };
        if path.is_file() && has_svg_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    files
}

fn has_svg_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("svg"))
        .unwrap_or(false)
}

/// Usage errors exit with status 1; `--help` and `--version` exit normally.
fn parse_args<T: Parser>() -> T {
    match T::try_parse() {
        Ok(args) => args,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            std::process::exit(1);
        }
        Err(err) => err.exit(),
    }
}

fn init_logging() {
    // usvg warns about every element it cannot convert while measuring
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module("usvg", log::LevelFilter::Error)
        .format_timestamp(None)
        .parse_default_env()
        .try_init();
}
