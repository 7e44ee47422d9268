use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use log::warn;

use seatstate::{FullPipeline, ImageInput, ModelPaths, NoEyePipeline, SeatPipeline};

#[derive(Parser)]
#[command(name = "seatstate")]
#[command(about = "Classify airplane seat photos as awake, sleeping, or seat-empty")]
struct Cli {
    /// Path to an image file, or a folder of images to classify in batch
    #[arg(value_name = "IMAGE_OR_DIR")]
    input: PathBuf,

    /// Pipeline variant to run
    #[arg(long, value_enum, default_value_t = Variant::Full)]
    variant: Variant,

    /// Directory holding the model artifacts
    #[arg(long, value_name = "DIR", default_value = "models")]
    models: PathBuf,

    /// Confidence floor for eye detection (full variant)
    #[arg(long, default_value_t = 0.25)]
    eye_confidence: f32,

    /// Confidence floor for hand detection (full variant)
    #[arg(long, default_value_t = 0.40)]
    hand_confidence: f32,

    /// Write annotated diagnostic composites (single-image mode only)
    #[arg(long)]
    viz: bool,

    /// Output directory for diagnostic composites
    #[arg(long, value_name = "DIR", default_value = seatstate::DEFAULT_VIZ_DIR)]
    viz_out: PathBuf,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Variant {
    Full,
    NoEye,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let paths = ModelPaths::from_dir(&args.models);
    let pipeline: Box<dyn SeatPipeline> = match args.variant {
        Variant::Full => Box::new(
            FullPipeline::new(&paths, args.eye_confidence, args.hand_confidence)?
                .with_viz_dir(args.viz_out.clone()),
        ),
        Variant::NoEye => Box::new(NoEyePipeline::new(&paths)?.with_viz_dir(args.viz_out.clone())),
    };

    if args.input.is_dir() {
        classify_folder(pipeline.as_ref(), &args.input)
    } else {
        let state = pipeline.classify(ImageInput::Path(&args.input), args.viz)?;
        println!("{}: {}", args.input.display(), state);
        Ok(())
    }
}

/// Batch driver: classifies every file in the folder with diagnostics off,
/// tallies per label, and reports progress. Failed files are skipped.
fn classify_folder(pipeline: &dyn SeatPipeline, folder: &Path) -> anyhow::Result<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    entries.sort();

    let mut awake = 0usize;
    let mut sleeping = 0usize;
    let mut empty = 0usize;
    let mut total = 0usize;

    for (i, path) in entries.iter().enumerate() {
        if i > 0 && i % 5 == 0 {
            println!("{i} images classified.");
        }
        match pipeline.classify(ImageInput::Path(path), false) {
            Ok(state) => {
                match state {
                    seatstate::PassengerState::Awake => awake += 1,
                    seatstate::PassengerState::Sleeping => sleeping += 1,
                    seatstate::PassengerState::NotThere => empty += 1,
                }
                total += 1;
            }
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
            }
        }
    }

    println!("Awake:    {awake} of {total} images.");
    println!("Sleeping: {sleeping} of {total} images.");
    println!("Empty:    {empty} of {total} images.");
    Ok(())
}
