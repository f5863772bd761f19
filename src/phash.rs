use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{GenericImageView, Rgba};
use serde::{Deserialize, Serialize};

use crate::config::PhashMode;
use crate::error::{MatchError, Result};
use crate::linalg::{dct2d, DCT_SIZE};
use crate::preprocess::{ensure_nonempty, luma};

/// Side of the low-frequency block that becomes the hash.
const BLOCK: usize = 8;

/// 64-bit DCT perceptual hash. Bit `i` is coefficient `i` of the top-left 8x8 block,
/// row-major. Stored as 16 lowercase hex digits.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PerceptualHash(pub u64);

impl PerceptualHash {
    /// Hamming distance, in `0..=64`.
    pub fn distance(&self, other: &PerceptualHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for PerceptualHash {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 16 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MatchError::InvalidHash(s.to_string()));
        }
        u64::from_str_radix(s, 16)
            .map(PerceptualHash)
            .map_err(|_| MatchError::InvalidHash(s.to_string()))
    }
}

impl TryFrom<String> for PerceptualHash {
    type Error = MatchError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<PerceptualHash> for String {
    fn from(hash: PerceptualHash) -> String {
        hash.to_string()
    }
}

pub fn phash<I>(region: &I, mode: PhashMode) -> Result<PerceptualHash>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    ensure_nonempty(region)?;
    let side = DCT_SIZE as u32;
    let small = imageops::resize(region, side, side, FilterType::Triangle);

    let mut grid = [[0.; DCT_SIZE]; DCT_SIZE];
    for (x, y, pixel) in small.enumerate_pixels() {
        grid[x as usize][y as usize] = luma(pixel) as f64;
    }
    let coeffs = dct2d(&grid);

    // the DC term is left out of the threshold but still gets a bit
    let mut total = 0.;
    for row in coeffs.iter().take(BLOCK) {
        total += row[..BLOCK].iter().sum::<f64>();
    }
    let threshold = (total - coeffs[0][0]) / (BLOCK * BLOCK - 1) as f64;

    let mut hash = 0_u64;
    for (u, row) in coeffs.iter().take(BLOCK).enumerate() {
        for (v, coeff) in row[..BLOCK].iter().enumerate() {
            if *coeff > threshold {
                hash |= 1_u64 << (u * BLOCK + v);
            }
        }
    }
    if mode == PhashMode::ClearDc {
        hash &= !1;
    }
    Ok(PerceptualHash(hash))
}
