use std::path::Path;

use image::{DynamicImage, GenericImageView, Rgba};
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::color::{histogram_hsv, histogram_rgb, mean_color, HsvHistogram, MeanColor, RgbHistogram};
use crate::config::Config;
use crate::edges::shape_signature;
use crate::error::Result;
use crate::phash::{phash, PerceptualHash};
use crate::preprocess::normalize;
use crate::texture::texture_signature;

/// Signals of one grid cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileDescriptor {
    pub histogram_rgb: RgbHistogram,
    pub histogram_hsv: HsvHistogram,
    pub phash: PerceptualHash,
    pub mean_color: MeanColor,
    pub texture_signature: f64,
    pub shape_signature: f64,
}

/// Everything extracted from one image: the whole-canvas signals plus one
/// [`TileDescriptor`] per grid cell in row-major order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FullImageDescriptor {
    pub image_name: String,
    pub global_rgb: RgbHistogram,
    pub global_hsv: HsvHistogram,
    pub global_phash: PerceptualHash,
    pub global_mean_color: MeanColor,
    pub global_texture: f64,
    pub global_shape: f64,
    pub tiles: Vec<TileDescriptor>,
}

/// Borrowed view over the six signals, shared by global and tile scoring.
#[derive(Copy, Clone, Debug)]
pub struct Features<'a> {
    pub rgb: &'a RgbHistogram,
    pub hsv: &'a HsvHistogram,
    pub phash: PerceptualHash,
    pub mean_color: &'a MeanColor,
    pub texture: f64,
    pub shape: f64,
}

impl TileDescriptor {
    pub fn features(&self) -> Features<'_> {
        Features {
            rgb: &self.histogram_rgb,
            hsv: &self.histogram_hsv,
            phash: self.phash,
            mean_color: &self.mean_color,
            texture: self.texture_signature,
            shape: self.shape_signature,
        }
    }
}

impl FullImageDescriptor {
    pub fn global(&self) -> Features<'_> {
        Features {
            rgb: &self.global_rgb,
            hsv: &self.global_hsv,
            phash: self.global_phash,
            mean_color: &self.global_mean_color,
            texture: self.global_texture,
            shape: self.global_shape,
        }
    }

    fn assemble(image_name: String, global: TileDescriptor, tiles: Vec<TileDescriptor>) -> Self {
        Self {
            image_name,
            global_rgb: global.histogram_rgb,
            global_hsv: global.histogram_hsv,
            global_phash: global.phash,
            global_mean_color: global.mean_color,
            global_texture: global.texture_signature,
            global_shape: global.shape_signature,
            tiles,
        }
    }
}

/// Runs both analyzers over one region.
pub fn analyze_region<I>(region: &I, config: &Config) -> Result<TileDescriptor>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    Ok(TileDescriptor {
        histogram_rgb: histogram_rgb(region, config.bins)?,
        histogram_hsv: histogram_hsv(region, config.bins)?,
        phash: phash(region, config.phash_mode)?,
        mean_color: mean_color(region)?,
        texture_signature: texture_signature(region)?,
        shape_signature: shape_signature(region)?,
    })
}

/// Normalizes `image` to the canonical canvas and extracts its full descriptor.
///
/// Tiles are `standard_size / tiles_per_row` pixels wide; when the division leaves a
/// remainder, the strip along the right and bottom edges belongs to no tile.
pub fn fingerprint(
    name: &str,
    image: &DynamicImage,
    config: &Config,
) -> Result<FullImageDescriptor> {
    config.validate()?;
    let canvas = normalize(image, config)?;
    let global = analyze_region(&canvas, config)?;

    let per_row = config.tiles_per_row;
    let size = config.tile_size();
    let tiles = (0..per_row * per_row)
        .into_par_iter()
        .map(|i| {
            let (tx, ty) = (i % per_row, i / per_row);
            analyze_region(&canvas.view(tx * size, ty * size, size, size), config)
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "fingerprinted {} ({} tiles, phash {})",
        name,
        tiles.len(),
        global.phash
    );
    Ok(FullImageDescriptor::assemble(name.to_string(), global, tiles))
}

/// Decodes the file at `path` and fingerprints it under its file name.
pub fn fingerprint_file<P: AsRef<Path>>(path: P, config: &Config) -> Result<FullImageDescriptor> {
    let path = path.as_ref();
    let image = image::open(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    fingerprint(&name, &image, config)
}
