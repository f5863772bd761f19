use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use log::{info, warn};

use lib::storage::{
    descriptor_path, load_descriptor, load_or_analyze, matches_config, save_descriptor,
};
use lib::{compare_prints, fingerprint_file, Config, DescriptorBank, PhashMode, ScoreProfile};

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "tif", "webp"];

#[derive(Parser, Debug)]
#[command(
    name = "tile-fingerprint",
    version,
    about = "Fingerprint images and find the closest match in a bank"
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Canonical canvas side in pixels
    #[arg(long = "size", global = true)]
    size: Option<u32>,
    /// Tiles per row and column
    #[arg(long = "tiles", global = true)]
    tiles: Option<u32>,
    /// Histogram bins per channel
    #[arg(long = "bins", global = true)]
    bins: Option<usize>,
    /// Which bits the perceptual hash keeps
    #[arg(long = "phash-mode", value_enum, global = true)]
    phash_mode: Option<PhashModeArg>,
    /// Score hashes the way older banks did
    #[arg(long = "legacy-score", global = true)]
    legacy_score: bool,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum PhashModeArg {
    /// Keep the DC bit
    Compatible,
    /// Always clear the DC bit
    ClearDc,
}

impl From<PhashModeArg> for PhashMode {
    fn from(arg: PhashModeArg) -> Self {
        match arg {
            PhashModeArg::Compatible => PhashMode::Compatible,
            PhashModeArg::ClearDc => PhashMode::ClearDc,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fingerprint every image of a directory into the bank
    Index {
        #[arg(value_hint = ValueHint::DirPath)]
        images: PathBuf,
        #[arg(long, value_hint = ValueHint::DirPath)]
        bank: PathBuf,
        /// Re-analyse images that already have a descriptor
        #[arg(long)]
        force: bool,
    },
    /// Print the similarity of two images
    Compare {
        #[arg(value_hint = ValueHint::FilePath)]
        first: PathBuf,
        #[arg(value_hint = ValueHint::FilePath)]
        second: PathBuf,
    },
    /// Rank the bank against a query image
    Match {
        #[arg(value_hint = ValueHint::FilePath)]
        query: PathBuf,
        #[arg(long, value_hint = ValueHint::DirPath)]
        bank: PathBuf,
        /// Number of matches to print
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

fn build_config(args: &ConfigArgs) -> Result<Config> {
    let mut cfg = Config::default();
    if let Some(v) = args.size {
        cfg.standard_size = v;
    }
    if let Some(v) = args.tiles {
        cfg.tiles_per_row = v;
    }
    if let Some(v) = args.bins {
        cfg.bins = v;
    }
    if let Some(mode) = args.phash_mode {
        cfg.phash_mode = mode.into();
    }
    if args.legacy_score {
        cfg.score_profile = ScoreProfile::Legacy;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn index(images: &Path, bank: &Path, force: bool, cfg: &Config) -> Result<()> {
    std::fs::create_dir_all(bank).with_context(|| format!("creating {}", bank.display()))?;
    let mut paths: Vec<PathBuf> = std::fs::read_dir(images)
        .with_context(|| format!("reading {}", images.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    paths.sort();

    let mut indexed = 0;
    for path in paths {
        let target = descriptor_path(bank, &path);
        let current = !force
            && target.exists()
            && load_descriptor(&target).map_or(false, |d| matches_config(&d, cfg));
        if current {
            continue;
        }
        match fingerprint_file(&path, cfg) {
            Ok(desc) => {
                save_descriptor(&desc, &target)
                    .with_context(|| format!("writing {}", target.display()))?;
                indexed += 1;
            }
            Err(e) => warn!("skipping {}: {}", path.display(), e),
        }
    }
    info!("indexed {} images into {}", indexed, bank.display());
    println!("Indexed {} image(s)", indexed);
    Ok(())
}

fn compare(first: &Path, second: &Path, cfg: &Config) -> Result<()> {
    let a = fingerprint_file(first, cfg)
        .with_context(|| format!("analysing {}", first.display()))?;
    let b = fingerprint_file(second, cfg)
        .with_context(|| format!("analysing {}", second.display()))?;
    let s = compare_prints(&a, &b, cfg)?;
    println!(
        "{} vs {}: {:.2}% (global {:.4}, tiles {:.4})",
        a.image_name, b.image_name, s.score, s.global, s.tiles
    );
    Ok(())
}

fn find_match(query: &Path, bank_dir: &Path, top: usize, cfg: &Config) -> Result<()> {
    std::fs::create_dir_all(bank_dir)
        .with_context(|| format!("creating {}", bank_dir.display()))?;
    let desc = load_or_analyze(query, bank_dir, cfg)
        .with_context(|| format!("analysing {}", query.display()))?;
    let bank = DescriptorBank::from_dir(bank_dir)?;
    let ranked = bank.rank(&desc, top, cfg)?;

    for m in ranked.iter() {
        println!("{} : {:.2}% similarity", m.name, m.score);
    }
    match ranked.first() {
        Some(best) => println!("\nBest match: {} with {:.2}%", best.name, best.score),
        None => println!("No match found."),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = build_config(&cli.config)?;
    match cli.command {
        Command::Index { images, bank, force } => index(&images, &bank, force, &cfg),
        Command::Compare { first, second } => compare(&first, &second, &cfg),
        Command::Match { query, bank, top } => find_match(&query, &bank, top, &cfg),
    }
}
