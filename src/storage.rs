use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::color::Histogram;
use crate::config::Config;
use crate::error::Result;
use crate::fingerprint::{fingerprint_file, FullImageDescriptor};

/// Writes `desc` as pretty-printed JSON.
pub fn save_descriptor<P: AsRef<Path>>(desc: &FullImageDescriptor, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, desc)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn load_descriptor<P: AsRef<Path>>(path: P) -> Result<FullImageDescriptor> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// `<bank_dir>/<image stem>.json`
pub fn descriptor_path<P: AsRef<Path>, Q: AsRef<Path>>(bank_dir: P, image_path: Q) -> PathBuf {
    let stem = image_path
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    bank_dir.as_ref().join(format!("{}.json", stem))
}

/// Whether `desc` has the tile grid and histogram resolution `config` produces.
pub fn matches_config(desc: &FullImageDescriptor, config: &Config) -> bool {
    desc.tiles.len() == config.tile_count()
        && desc.global_rgb.bins() == config.bins
        && desc.global_hsv.bins() == config.bins
        && desc.tiles.iter().all(|t| t.histogram_rgb.bins() == config.bins)
}

/// Reuses the descriptor stored for `image_path` in `bank_dir`, or fingerprints the
/// image and stores the result there. A stored descriptor built under another grid
/// or bin count is replaced.
pub fn load_or_analyze<P: AsRef<Path>, Q: AsRef<Path>>(
    image_path: P,
    bank_dir: Q,
    config: &Config,
) -> Result<FullImageDescriptor> {
    let target = descriptor_path(&bank_dir, &image_path);
    if target.exists() {
        let stored = load_descriptor(&target)?;
        if matches_config(&stored, config) {
            debug!("reusing descriptor {}", target.display());
            return Ok(stored);
        }
        warn!(
            "{} is stale ({} tiles, {} bins), re-analysing",
            target.display(),
            stored.tiles.len(),
            stored.global_rgb.bins()
        );
    }
    let desc = fingerprint_file(&image_path, config)?;
    save_descriptor(&desc, &target)?;
    info!("stored descriptor {}", target.display());
    Ok(desc)
}
