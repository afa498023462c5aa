use anyhow::{Context, Result};
use clap::Parser;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use walkdir::WalkDir;

use std::path::{Path, PathBuf};

use pixload::loader::has_png_extension;
use pixload::{Bitmap, DecodeOptions, LoaderRegistry, MemBitmap, PngDecoder, ShortRead};

#[derive(Parser)]
#[command(name = "pixload-cli")]
#[command(about = "Decode PNG files into 32-bit RGBA bitmaps", long_about = None)]
#[command(version)]
struct Args {
    /// Input PNG files or directories to scan
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Decode into bottom-up bitmaps
    #[arg(long, default_value_t)]
    flipped: bool,

    /// Read each file into memory and decode from the buffer
    #[arg(long, default_value_t)]
    memory: bool,

    /// Pad truncated in-memory input with zero bytes instead of failing
    #[arg(long, default_value_t)]
    zero_fill: bool,

    /// Decoder memory limit in MiB
    #[arg(long, value_name = "MIB")]
    max_memory: Option<usize>,

    /// Skip CRC and Adler-32 verification
    #[arg(long, default_value_t)]
    ignore_checksums: bool,

    /// Store the effective decode options as the user defaults
    #[arg(long, default_value_t)]
    save_config: bool,

    /// Try decoding files whose extension isn't .png
    #[arg(long, default_value_t)]
    ignore_extension: bool,

    /// Write each decoded image as raw top-down RGBA bytes into this directory
    #[arg(long, value_name = "DIR")]
    raw_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, default_value_t)]
    verbose: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, default_value_t)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(args.verbose, args.quiet);

    if let Some(dir) = &args.raw_dir {
        std::fs::create_dir_all(dir).context("Failed to create raw output directory")?;
    }

    let options = build_options(&args);
    if args.save_config {
        let path = options.save().context("Failed to save config")?;
        log::info!("Saved decode options to {}", path.display());
    }
    let registry = LoaderRegistry::with_png(options.clone());
    let decoder = PngDecoder::new(options);

    let files = collect_inputs(&args.inputs, args.ignore_extension)?;
    if files.is_empty() {
        anyhow::bail!("No PNG files found");
    }
    log::info!("Decoding {} files", files.len());

    let failures = files
        .par_iter()
        .filter(|path| {
            match decode_file(path, &args, &registry, &decoder) {
                Ok(bitmap) => {
                    log::info!(
                        "{}: {}x{}",
                        path.display(),
                        bitmap.width(),
                        bitmap.height()
                    );
                    false
                }
                Err(e) => {
                    log::error!("{}: {e:#}", path.display());
                    true
                }
            }
        })
        .count();

    if failures > 0 {
        anyhow::bail!("{failures} of {} files failed to decode", files.len());
    }

    Ok(())
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn build_options(args: &Args) -> DecodeOptions {
    let mut options = DecodeOptions::load().unwrap_or_default();

    if args.zero_fill {
        options.short_read = ShortRead::ZeroFill;
    }
    if args.ignore_checksums {
        options.ignore_checksums = true;
    }
    if let Some(mib) = args.max_memory {
        options.max_bytes = mib.saturating_mul(1024 * 1024);
    }

    log::debug!("Decode options: {options:?}");
    options
}

/// Expand directories into the PNG files below them; explicit files are kept
/// as given
fn collect_inputs(inputs: &[PathBuf], ignore_extension: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.exists() {
            anyhow::bail!("Input does not exist: {}", input.display());
        }

        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry.with_context(|| format!("Failed to scan {}", input.display()))?;
                if entry.file_type().is_file()
                    && (ignore_extension || has_png_extension(entry.path()))
                {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(input.clone());
        }
    }

    Ok(files)
}

fn decode_file(
    path: &Path,
    args: &Args,
    registry: &LoaderRegistry,
    decoder: &PngDecoder,
) -> Result<MemBitmap> {
    let mut bitmap = if args.flipped {
        MemBitmap::new_flipped(0, 0)
    } else {
        MemBitmap::default()
    };

    if args.memory {
        let data = std::fs::read(path).context("Failed to read file")?;
        decoder
            .load_from_memory_into(&data, &mut bitmap)
            .context("Failed to decode buffer")?;
    } else {
        registry
            .load_into(path, args.ignore_extension, &mut bitmap)
            .context("Failed to decode file")?;
    }

    if let Some(dir) = &args.raw_dir {
        write_raw(dir, path, &bitmap)?;
    }

    Ok(bitmap)
}

fn write_raw(dir: &Path, input: &Path, bitmap: &MemBitmap) -> Result<()> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let output = dir.join(format!("{stem}.rgba"));

    std::fs::write(&output, bitmap.to_rgba_bytes())
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::debug!("Wrote {}", output.display());
    Ok(())
}
