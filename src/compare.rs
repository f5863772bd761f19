use log::debug;
use serde::Serialize;

use crate::color::Histogram;
use crate::config::{Config, ScoreProfile};
use crate::error::{MatchError, Result};
use crate::fingerprint::{Features, FullImageDescriptor};
use crate::linalg::euclidean;

const WEIGHT_RGB: f64 = 0.10;
const WEIGHT_HSV: f64 = 0.10;
const WEIGHT_COLOR: f64 = 0.15;
const WEIGHT_TEXTURE: f64 = 0.15;
const WEIGHT_SHAPE: f64 = 0.25;
const WEIGHT_HASH: f64 = 0.25;

const GLOBAL_TEXTURE_SCALE: f64 = 500.;
const TILE_TEXTURE_SCALE: f64 = 1000.;

/// Tiles scoring at least this much count as a perfect match.
pub const TILE_SNAP_THRESHOLD: f64 = 0.85;

const GLOBAL_SHARE: f64 = 0.65;
const TILE_SHARE: f64 = 0.35;

/// Sub-scores of one comparison. `global` and `tiles` are in `[0, 1]` under the
/// standard profile; `score` is the final percentage.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Similarity {
    pub global: f64,
    pub tiles: f64,
    pub score: f64,
}

/// L1 distance summed over the three channels.
pub fn histogram_distance<H: Histogram>(first: &H, second: &H) -> Result<f64> {
    let bins = first.bins();
    let mut total = 0_u64;
    for (a, b) in first.channels().iter().zip(second.channels().iter()) {
        if a.len() != bins || b.len() != bins {
            return Err(MatchError::DescriptorMismatch(format!(
                "histogram channels of {} and {} bins",
                a.len(),
                b.len()
            )));
        }
        total += a
            .iter()
            .zip(b.iter())
            .map(|(p, q)| p.abs_diff(*q) as u64)
            .sum::<u64>();
    }
    Ok(total as f64)
}

fn normalized_histogram_distance<H: Histogram>(first: &H, second: &H) -> Result<f64> {
    let bins = first.bins();
    if bins == 0 {
        return Err(MatchError::DescriptorMismatch(String::from("histogram without bins")));
    }
    Ok(histogram_distance(first, second)? / (bins * 3 * 255) as f64)
}

/// Weighted score of one pair of signal sets, before any snapping.
fn weighted_score(
    first: &Features<'_>,
    second: &Features<'_>,
    texture_scale: f64,
    profile: ScoreProfile,
) -> Result<f64> {
    let norm_rgb = normalized_histogram_distance(first.rgb, second.rgb)?;
    let norm_hsv = normalized_histogram_distance(first.hsv, second.hsv)?;
    let norm_color = euclidean(first.mean_color, second.mean_color) / (255. * 3_f64.sqrt());
    let norm_texture = (first.texture - second.texture).abs() / texture_scale;
    let norm_shape = (first.shape - second.shape).abs();
    let norm_hash = first.phash.distance(&second.phash) as f64 / 64.;

    let hash_term = match profile {
        ScoreProfile::Standard => norm_hash,
        ScoreProfile::Legacy => 1. - norm_hash,
    };

    Ok(1. - WEIGHT_RGB * norm_rgb
        - WEIGHT_HSV * norm_hsv
        - WEIGHT_COLOR * norm_color
        - WEIGHT_TEXTURE * norm_texture
        - WEIGHT_SHAPE * norm_shape
        - WEIGHT_HASH * hash_term)
}

pub fn global_score(
    first: &FullImageDescriptor,
    second: &FullImageDescriptor,
    config: &Config,
) -> Result<f64> {
    weighted_score(
        &first.global(),
        &second.global(),
        GLOBAL_TEXTURE_SCALE,
        config.score_profile,
    )
}

/// Per-tile score with the snap-to-one rule applied.
pub fn tile_score(first: &Features<'_>, second: &Features<'_>, config: &Config) -> Result<f64> {
    let raw = weighted_score(first, second, TILE_TEXTURE_SCALE, config.score_profile)?;
    Ok(if raw >= TILE_SNAP_THRESHOLD { 1. } else { raw })
}

/// Mean tile score, pairing tiles by grid position.
pub fn average_tile_score(
    first: &FullImageDescriptor,
    second: &FullImageDescriptor,
    config: &Config,
) -> Result<f64> {
    if first.tiles.len() != second.tiles.len() {
        return Err(MatchError::DescriptorMismatch(format!(
            "{} has {} tiles, {} has {}",
            first.image_name,
            first.tiles.len(),
            second.image_name,
            second.tiles.len()
        )));
    }
    if first.tiles.is_empty() {
        return Err(MatchError::DescriptorMismatch(String::from("descriptors without tiles")));
    }
    let mut sum = 0.;
    for (a, b) in first.tiles.iter().zip(second.tiles.iter()) {
        sum += tile_score(&a.features(), &b.features(), config)?;
    }
    Ok(sum / first.tiles.len() as f64)
}

/// Compares two descriptors. The score is a percentage in `[0, 100]`, 100 meaning the
/// signals are identical.
pub fn compare_prints(
    first: &FullImageDescriptor,
    second: &FullImageDescriptor,
    config: &Config,
) -> Result<Similarity> {
    let global = global_score(first, second, config)?;
    let tiles = average_tile_score(first, second, config)?;
    let score = ((global * GLOBAL_SHARE + tiles * TILE_SHARE) * 100.).clamp(0., 100.);
    debug!(
        "{} vs {}: global {:.4}, tiles {:.4}, score {:.2}",
        first.image_name, second.image_name, global, tiles, score
    );
    Ok(Similarity { global, tiles, score })
}

pub fn similarity(
    first: &FullImageDescriptor,
    second: &FullImageDescriptor,
    config: &Config,
) -> Result<f64> {
    compare_prints(first, second, config).map(|s| s.score)
}
