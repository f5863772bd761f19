use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};

pub const STANDARD_SIZE: u32 = 256;
pub const TILES_PER_ROW: u32 = 9;
pub const BINS: usize = 64;

/// Which bits the perceptual hash keeps.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhashMode {
    /// The DC coefficient is left out of the threshold but still produces bit 0.
    Compatible,
    /// Bit 0 (the DC coefficient) is always cleared.
    ClearDc,
}

/// How the hash term enters the weighted score.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreProfile {
    /// Hash distance is penalised like every other distance.
    Standard,
    /// Penalises hash *similarity*, reproducing scores recorded by older banks.
    /// Identical images top out at 75 under this profile.
    Legacy,
}

/// Extraction and scoring parameters. Two descriptors are only comparable when they
/// were produced with the same `standard_size`, `tiles_per_row` and `bins`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub standard_size: u32,
    pub tiles_per_row: u32,
    pub bins: usize,
    pub phash_mode: PhashMode,
    pub score_profile: ScoreProfile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            standard_size: STANDARD_SIZE,
            tiles_per_row: TILES_PER_ROW,
            bins: BINS,
            phash_mode: PhashMode::Compatible,
            score_profile: ScoreProfile::Standard,
        }
    }
}

impl Config {
    pub fn tile_size(&self) -> u32 {
        self.standard_size / self.tiles_per_row
    }

    pub fn tile_count(&self) -> usize {
        (self.tiles_per_row * self.tiles_per_row) as usize
    }

    pub fn validate(&self) -> Result<&Self> {
        if self.bins == 0 || self.bins > 256 {
            return Err(MatchError::InvalidConfig(format!(
                "bins must be in 1..=256, got {}",
                self.bins
            )));
        }
        if self.tiles_per_row == 0 {
            return Err(MatchError::InvalidConfig(String::from(
                "tiles_per_row must be at least 1",
            )));
        }
        // shape and texture need a 3x3 neighbourhood inside every tile
        if self.tile_size() < 3 {
            return Err(MatchError::InvalidConfig(format!(
                "{}px canvas split {} ways leaves tiles smaller than 3px",
                self.standard_size, self.tiles_per_row
            )));
        }
        Ok(self)
    }
}
