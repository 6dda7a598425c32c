//! Locate bands in images of layered samples
//!
//! Reads one or more images, optionally crops each to the sample region,
//! and prints the bands found along the vertical axis.
//!
//! Usage:
//! ```bash
//! cargo run --release --bin locate_bands -- vial.png
//! cargo run --release --bin locate_bands -- --rows 120..980 --cols 410..470 --json vial_*.png
//! cargo run --release --bin locate_bands -- --config tuned.json --superscale 2 vial.png
//! ```
//!
//! Set `RUST_LOG=debug` (or pass `--verbose`) to see the step lists of every
//! pipeline stage.

use anyhow::{bail, Context, Result};
use bandscan::{
    locate_bands_batch, Band, BandScan, LocateConfig, ReduceMode, Region, ThresholdStepDetector,
};
use clap::Parser;
use ndarray::{s, Array3};
use serde::Serialize;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Parse a half-open pixel range in format "start..end"
fn parse_range(s: &str) -> Result<Range<usize>, String> {
    let (start, end) = s
        .split_once("..")
        .ok_or_else(|| "Range must be in format 'start..end'".to_string())?;

    let start = start
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid range start: {start}"))?;
    let end = end
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid range end: {end}"))?;

    if start >= end {
        return Err(format!("Empty range {start}..{end}"));
    }

    Ok(start..end)
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Locate horizontal bands in layered sample images",
    long_about = None
)]
struct Args {
    /// Images to analyse
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Step threshold on rising edges
    #[arg(long)]
    sensitivity: Option<f64>,

    /// Analyse a single channel instead of the channel average
    #[arg(long)]
    channel: Option<usize>,

    /// Upsampling factor applied before analysis
    #[arg(long)]
    superscale: Option<f64>,

    /// Minimum spacing for double-detection checks
    #[arg(long)]
    min_resolvable: Option<usize>,

    /// Row range of the sample region (format: "start..end")
    #[arg(long, value_parser = parse_range)]
    rows: Option<Range<usize>>,

    /// Column range of the sample region (format: "start..end")
    #[arg(long, value_parser = parse_range)]
    cols: Option<Range<usize>>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Write the effective configuration to this file and continue
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Debug logging and intermediate step lists
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct ImageReport<'a> {
    path: &'a Path,
    profile_len: usize,
    bands: &'a [Band],
    top_spacings: Vec<usize>,
}

fn build_config(args: &Args) -> Result<LocateConfig> {
    let mut config = match &args.config {
        Some(path) => LocateConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LocateConfig::default(),
    };

    if let Some(sensitivity) = args.sensitivity {
        config.sensitivity = sensitivity;
    }
    if let Some(channel) = args.channel {
        config.mode = ReduceMode::Channel(channel);
    }
    if let Some(superscale) = args.superscale {
        config.superscale = superscale;
    }
    if let Some(min_resolvable) = args.min_resolvable {
        config.min_resolvable = min_resolvable;
    }
    config.verbose |= args.verbose;

    config.validate()?;
    Ok(config)
}

/// Load an image as a (rows, cols, channels) region, cropped if requested
fn load_region(
    path: &Path,
    rows: Option<&Range<usize>>,
    cols: Option<&Range<usize>>,
) -> Result<Region> {
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let data = if img.color().channel_count() <= 2 {
        let luma = img.to_luma32f();
        let (w, h) = luma.dimensions();
        let raw: Vec<f64> = luma.into_raw().into_iter().map(f64::from).collect();
        Array3::from_shape_vec((h as usize, w as usize, 1), raw)?
    } else {
        let rgb = img.to_rgb32f();
        let (w, h) = rgb.dimensions();
        let raw: Vec<f64> = rgb.into_raw().into_iter().map(f64::from).collect();
        Array3::from_shape_vec((h as usize, w as usize, 3), raw)?
    };

    let (height, width, _) = data.dim();
    let rows = rows.cloned().unwrap_or(0..height);
    let cols = cols.cloned().unwrap_or(0..width);
    if rows.end > height || cols.end > width {
        bail!(
            "Crop {:?} x {:?} exceeds {} image of {}x{}",
            rows,
            cols,
            path.display(),
            width,
            height
        );
    }

    let cropped = data.slice(s![rows, cols, ..]);
    Ok(Region::from_channels(cropped)?)
}

fn print_table(path: &Path, scan: &BandScan) {
    println!("{} ({} samples)", path.display(), scan.profile_len);
    println!("  {:>6} {:>6} {:>6} {:>6}", "band", "top", "bottom", "width");
    for (i, band) in scan.bands.iter().enumerate() {
        println!(
            "  {:>6} {:>6} {:>6} {:>6}",
            i, band.top, band.bottom, band.width
        );
    }

    if let Some(diagnostics) = &scan.diagnostics {
        println!("  raw rising:    {:?}", diagnostics.raw_positive);
        println!("  raw falling:   {:?}", diagnostics.raw_negative);
        println!("  after doubles: {:?}", diagnostics.positive_filtered);
        println!("  after trim:    {:?}", diagnostics.positive_trimmed);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = build_config(&args)?;
    if let Some(path) = &args.save_config {
        config
            .save_to_file(path)
            .with_context(|| format!("Failed to save config {}", path.display()))?;
        log::info!("Saved configuration to {}", path.display());
    }

    let regions = args
        .images
        .iter()
        .map(|path| load_region(path, args.rows.as_ref(), args.cols.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let results = locate_bands_batch(&regions, &config, &ThresholdStepDetector);

    let mut reports = Vec::new();
    let mut failures = 0;
    for (path, result) in args.images.iter().zip(&results) {
        match result {
            Ok(scan) if args.json => reports.push(ImageReport {
                path,
                profile_len: scan.profile_len,
                bands: &scan.bands,
                top_spacings: scan.top_spacings(),
            }),
            Ok(scan) => print_table(path, scan),
            Err(e) => {
                failures += 1;
                log::error!("{}: {e}", path.display());
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    if failures > 0 {
        bail!("{failures} of {} image(s) failed", args.images.len());
    }
    Ok(())
}
