use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Side of the square the perceptual hash transforms.
pub const DCT_SIZE: usize = 32;

pub type DctMatrix = [[f64; DCT_SIZE]; DCT_SIZE];

/// `table[k][n] = cos((2n + 1) k π / 2N)`
fn cosine_table() -> DctMatrix {
    let mut table = [[0.; DCT_SIZE]; DCT_SIZE];
    for (k, row) in table.iter_mut().enumerate() {
        for (n, cell) in row.iter_mut().enumerate() {
            *cell = ((2 * n + 1) as f64 * k as f64 * PI / (2 * DCT_SIZE) as f64).cos();
        }
    }
    table
}

/// Full 2D DCT-II of a 32x32 grid indexed `input[x][y]`.
///
/// `out[u][v] = 0.25 c(u) c(v) Σx Σy input[x][y] cos((2x+1)uπ/64) cos((2y+1)vπ/64)`
/// with `c(0) = 1/√2` and `c(k) = 1` otherwise.
pub fn dct2d(input: &DctMatrix) -> DctMatrix {
    let cos = cosine_table();
    let c = |k: usize| if k == 0 { FRAC_1_SQRT_2 } else { 1. };

    let mut out = [[0.; DCT_SIZE]; DCT_SIZE];
    for u in 0..DCT_SIZE {
        for v in 0..DCT_SIZE {
            let mut sum = 0.;
            for x in 0..DCT_SIZE {
                for y in 0..DCT_SIZE {
                    sum += input[x][y] * cos[u][x] * cos[v][y];
                }
            }
            out[u][v] = 0.25 * c(u) * c(v) * sum;
        }
    }
    out
}

pub fn euclidean(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(p, q)| (p - q) * (p - q))
        .sum::<f64>()
        .sqrt()
}
