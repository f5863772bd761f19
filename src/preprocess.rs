use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage, ImageBuffer, Luma, Rgba, RgbaImage};

use crate::config::Config;
use crate::error::{MatchError, Result};

/// Resamples any image onto the canonical `standard_size` square so that histogram
/// populations and tile boundaries line up between images.
pub fn normalize(image: &DynamicImage, config: &Config) -> Result<RgbaImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(MatchError::EmptyRegion { width, height });
    }
    let size = config.standard_size;
    let mut canvas = image
        .resize_exact(size, size, FilterType::Triangle)
        .to_rgba8();
    for pixel in canvas.pixels_mut() {
        *pixel = flatten(*pixel);
    }
    Ok(canvas)
}

/// Composites a pixel over black, leaving it opaque.
fn flatten(pixel: Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    if a == u8::MAX {
        return pixel;
    }
    let scale = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u8;
    Rgba([scale(r), scale(g), scale(b), u8::MAX])
}

/// BT.601 luma in 16.16 fixed point.
pub fn luma(pixel: &Rgba<u8>) -> u8 {
    let [r, g, b, _] = pixel.0;
    ((19595 * r as u32 + 38470 * g as u32 + 7471 * b as u32 + (1 << 15)) >> 16) as u8
}

pub fn grayscale<I>(region: &I) -> GrayImage
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    let (width, height) = region.dimensions();
    ImageBuffer::from_fn(width, height, |x, y| Luma([luma(&region.get_pixel(x, y))]))
}

/// Fails unless the region has at least one pixel.
pub fn ensure_nonempty<I: GenericImageView>(region: &I) -> Result<u32> {
    let (width, height) = region.dimensions();
    match width * height {
        0 => Err(MatchError::EmptyRegion { width, height }),
        n => Ok(n),
    }
}

/// Fails unless the region has a non-empty interior once its 1px border is dropped.
pub fn ensure_interior<I: GenericImageView>(region: &I) -> Result<u32> {
    let (width, height) = region.dimensions();
    if width < 3 || height < 3 {
        return Err(MatchError::EmptyRegion { width, height });
    }
    Ok((width - 2) * (height - 2))
}
