use image::{GenericImageView, Rgba};

use crate::error::Result;
use crate::preprocess::{ensure_interior, grayscale};

/// Mean absolute intensity step to the right and bottom neighbours over the interior
/// pixels. Zero for flat regions; an alternating 0/255 pattern reaches the 510 ceiling.
pub fn texture_signature<I>(region: &I) -> Result<f64>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    let interior = ensure_interior(region)?;
    let gray = grayscale(region);
    let (width, height) = gray.dimensions();

    let mut variation = 0_u64;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let c = gray.get_pixel(x, y).0[0];
            let right = gray.get_pixel(x + 1, y).0[0];
            let bottom = gray.get_pixel(x, y + 1).0[0];
            variation += c.abs_diff(right) as u64 + c.abs_diff(bottom) as u64;
        }
    }
    Ok(variation as f64 / interior as f64)
}
