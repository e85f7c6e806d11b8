// src/main.rs

//! `fusion-veil` demo: renders paragraphs as fused text blocks on the
//! headless host, drives them with a simulated display, and optionally writes
//! every frame to PNG so single captures can be inspected.

use anyhow::{bail, Context, Result};
use fusion_veil::platform::{FrameClock, HeadlessHost, SimulatedClock};
use fusion_veil::rasterizer::font_driver::FontDriver;
use fusion_veil::rasterizer::fontdue_font_driver::FontdueFontDriver;
use fusion_veil::rasterizer::headless_font_driver::HeadlessFontDriver;
use fusion_veil::{render_batch, Activation, FusionConfig};
use log::{error, info, warn};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

const DEFAULT_WIDTH_PX: u32 = 480;
const DEFAULT_REFRESH_HZ: f64 = 60.0;
const DEFAULT_FRAMES: u64 = 120;

const USAGE: &str = "Usage: fusion-veil [--config FILE] [--width PX] [--refresh HZ] [--frames N] \
[--reduced-motion] [--font-file TTF] [--capture DIR] [TEXT...]";

#[derive(Debug)]
struct Options {
    config: Option<PathBuf>,
    width: u32,
    refresh_hz: f64,
    frames: u64,
    reduced_motion: bool,
    font_file: Option<PathBuf>,
    capture_dir: Option<PathBuf>,
    text: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            config: None,
            width: DEFAULT_WIDTH_PX,
            refresh_hz: DEFAULT_REFRESH_HZ,
            frames: DEFAULT_FRAMES,
            reduced_motion: false,
            font_file: None,
            capture_dir: None,
            text: Vec::new(),
        }
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options> {
    let mut opts = Options::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .with_context(|| format!("{} needs a value\n{}", flag, USAGE))
        };
        match arg.as_str() {
            "--config" => opts.config = Some(PathBuf::from(value("--config")?)),
            "--width" => {
                opts.width = value("--width")?
                    .parse()
                    .context("--width must be a whole number of pixels")?
            }
            "--refresh" => {
                opts.refresh_hz = value("--refresh")?
                    .parse()
                    .context("--refresh must be a number")?
            }
            "--frames" => {
                opts.frames = value("--frames")?
                    .parse()
                    .context("--frames must be a whole number")?
            }
            "--reduced-motion" => opts.reduced_motion = true,
            "--font-file" => opts.font_file = Some(PathBuf::from(value("--font-file")?)),
            "--capture" => opts.capture_dir = Some(PathBuf::from(value("--capture")?)),
            "-h" | "--help" => bail!("{}", USAGE),
            flag if flag.starts_with("--") => bail!("Unknown option: {}\n{}", flag, USAGE),
            _ => opts.text.push(arg),
        }
    }
    Ok(opts)
}

/// Splits text into paragraphs at blank lines. Lines within a paragraph stay
/// separated by `\n`.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }
    paragraphs
}

fn main() -> anyhow::Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let opts = parse_args(env::args().skip(1))?;

    let mut config = match &opts.config {
        Some(path) => FusionConfig::load(path)?,
        None => FusionConfig::default(),
    };
    if let Some(font_file) = &opts.font_file {
        config.font.path = Some(font_file.clone());
    }

    let input = if opts.text.is_empty() {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read text from stdin")?;
        buf
    } else {
        opts.text.join(" ")
    };
    let paragraphs = split_paragraphs(&input);
    if paragraphs.is_empty() {
        bail!("No text to render\n{}", USAGE);
    }
    info!(
        "Rendering {} paragraph(s) at {} px wide, simulated {} Hz display",
        paragraphs.len(),
        opts.width,
        opts.refresh_hz
    );

    if opts.font_file.is_some() {
        run(FontdueFontDriver::new(), &opts, &config, &paragraphs)
    } else {
        run(HeadlessFontDriver::new(), &opts, &config, &paragraphs)
    }
}

fn run<D: FontDriver>(
    driver: D,
    opts: &Options,
    config: &FusionConfig,
    paragraphs: &[String],
) -> Result<()> {
    let mut host = HeadlessHost::from_env(driver);
    if opts.reduced_motion {
        host = host.with_reduced_motion(true);
    }
    let mut clock = SimulatedClock::new(opts.refresh_hz);

    let mut batch = render_batch(&mut host, &mut clock, opts.width, paragraphs, config)
        .context("Failed to activate text blocks")?;

    for (i, block) in batch.blocks().iter().enumerate() {
        let decision = block.decision();
        match decision.reason {
            None => println!(
                "block {}: fusing at {} Hz refresh ({} Hz swaps)",
                i,
                decision.refresh_hz,
                decision.refresh_hz * 2
            ),
            Some(reason) => println!("block {}: static ({})", i, reason),
        }
    }
    if batch.any_static() {
        warn!("Some blocks are rendered statically and can be captured in full");
    }

    if let Some(dir) = &opts.capture_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create capture directory {}", dir.display()))?;
    }

    for frame in 0..opts.frames {
        let now = clock.next_frame()?;
        batch.tick(now);
        if let Some(dir) = &opts.capture_dir {
            for (i, block) in batch.blocks().iter().enumerate() {
                // A static block never changes; one capture is enough.
                if frame > 0 && matches!(block, Activation::Static(_)) {
                    continue;
                }
                let path = dir.join(format!("block-{}-frame-{}.png", i, frame));
                if let Err(e) = block.output().save_png(&path) {
                    error!("Capture failed: {:#}", e);
                    return Err(e);
                }
            }
        }
    }

    batch.stop_all();
    let swaps: Vec<u64> = batch
        .blocks()
        .iter()
        .map(|b| match b {
            Activation::Fusing(h) => h.swap_count(),
            Activation::Static(_) => 0,
        })
        .collect();
    info!("Finished {} frames, swaps per block: {:?}", opts.frames, swaps);
    Ok(())
}
