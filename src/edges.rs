use image::{GenericImageView, GrayImage, Rgba};

use crate::error::Result;
use crate::preprocess::{ensure_interior, grayscale};

const SOBEL_KERNEL_X: [i32; 9] = [-1, 0, 1, -2, 0, 2, -1, 0, 1];
const SOBEL_KERNEL_Y: [i32; 9] = [-1, -2, -1, 0, 0, 0, 1, 2, 1];

/// Gradient magnitude above which a pixel counts as an edge.
pub const EDGE_THRESHOLD: f64 = 100.;

/// Sobel response at an interior pixel.
fn gradient(gray: &GrayImage, x: u32, y: u32) -> (i32, i32) {
    let mut gx = 0;
    let mut gy = 0;
    let mut k_i = 0;
    for w_row in (y - 1)..=(y + 1) {
        for p in (x - 1)..=(x + 1) {
            let value = gray.get_pixel(p, w_row).0[0] as i32;
            gx += SOBEL_KERNEL_X[k_i] * value;
            gy += SOBEL_KERNEL_Y[k_i] * value;
            k_i += 1;
        }
    }
    (gx, gy)
}

/// Fraction of interior pixels whose Sobel gradient magnitude exceeds
/// [`EDGE_THRESHOLD`]. In `[0, 1]`.
pub fn shape_signature<I>(region: &I) -> Result<f64>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    let interior = ensure_interior(region)?;
    let gray = grayscale(region);
    let (width, height) = gray.dimensions();

    let mut edges = 0_u32;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let (gx, gy) = gradient(&gray, x, y);
            if ((gx * gx + gy * gy) as f64).sqrt() > EDGE_THRESHOLD {
                edges += 1;
            }
        }
    }
    Ok(edges as f64 / interior as f64)
}
