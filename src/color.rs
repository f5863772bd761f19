use std::ops::{Index, IndexMut};

use image::{GenericImageView, Rgba};
use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};
use crate::preprocess::ensure_nonempty;

pub type MeanColor = [f64; 3];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RgbChannel {
    Red,
    Green,
    Blue,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HsvChannel {
    Hue,
    Saturation,
    Value,
}

/// Three fixed channels of bin counts.
pub trait Histogram {
    fn channels(&self) -> [&[u32]; 3];

    fn bins(&self) -> usize {
        self.channels()[0].len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbHistogram {
    pub r: Vec<u32>,
    pub g: Vec<u32>,
    pub b: Vec<u32>,
}

impl RgbHistogram {
    pub fn new(bins: usize) -> Self {
        Self {
            r: vec![0; bins],
            g: vec![0; bins],
            b: vec![0; bins],
        }
    }
}

impl Histogram for RgbHistogram {
    fn channels(&self) -> [&[u32]; 3] {
        [&self.r, &self.g, &self.b]
    }
}

impl Index<RgbChannel> for RgbHistogram {
    type Output = Vec<u32>;

    fn index(&self, channel: RgbChannel) -> &Vec<u32> {
        match channel {
            RgbChannel::Red => &self.r,
            RgbChannel::Green => &self.g,
            RgbChannel::Blue => &self.b,
        }
    }
}

impl IndexMut<RgbChannel> for RgbHistogram {
    fn index_mut(&mut self, channel: RgbChannel) -> &mut Vec<u32> {
        match channel {
            RgbChannel::Red => &mut self.r,
            RgbChannel::Green => &mut self.g,
            RgbChannel::Blue => &mut self.b,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvHistogram {
    pub h: Vec<u32>,
    pub s: Vec<u32>,
    pub v: Vec<u32>,
}

impl HsvHistogram {
    pub fn new(bins: usize) -> Self {
        Self {
            h: vec![0; bins],
            s: vec![0; bins],
            v: vec![0; bins],
        }
    }
}

impl Histogram for HsvHistogram {
    fn channels(&self) -> [&[u32]; 3] {
        [&self.h, &self.s, &self.v]
    }
}

impl Index<HsvChannel> for HsvHistogram {
    type Output = Vec<u32>;

    fn index(&self, channel: HsvChannel) -> &Vec<u32> {
        match channel {
            HsvChannel::Hue => &self.h,
            HsvChannel::Saturation => &self.s,
            HsvChannel::Value => &self.v,
        }
    }
}

impl IndexMut<HsvChannel> for HsvHistogram {
    fn index_mut(&mut self, channel: HsvChannel) -> &mut Vec<u32> {
        match channel {
            HsvChannel::Hue => &mut self.h,
            HsvChannel::Saturation => &mut self.s,
            HsvChannel::Value => &mut self.v,
        }
    }
}

pub fn mean_color<I>(region: &I) -> Result<MeanColor>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    let total = ensure_nonempty(region)? as f64;
    let mut sums = [0_f64; 3];
    for (_, _, pixel) in region.pixels() {
        for (sum, channel) in sums.iter_mut().zip(pixel.0.iter()) {
            *sum += *channel as f64;
        }
    }
    Ok([sums[0] / total, sums[1] / total, sums[2] / total])
}

fn ensure_bins(bins: usize) -> Result<()> {
    if bins == 0 {
        return Err(MatchError::InvalidConfig(String::from(
            "histograms need at least one bin",
        )));
    }
    Ok(())
}

pub fn histogram_rgb<I>(region: &I, bins: usize) -> Result<RgbHistogram>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    ensure_bins(bins)?;
    ensure_nonempty(region)?;
    let mut hist = RgbHistogram::new(bins);
    let index = |c: u8| c as usize * bins / 256;
    for (_, _, pixel) in region.pixels() {
        let [r, g, b, _] = pixel.0;
        hist[RgbChannel::Red][index(r)] += 1;
        hist[RgbChannel::Green][index(g)] += 1;
        hist[RgbChannel::Blue][index(b)] += 1;
    }
    Ok(hist)
}

pub fn histogram_hsv<I>(region: &I, bins: usize) -> Result<HsvHistogram>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    ensure_bins(bins)?;
    ensure_nonempty(region)?;
    let mut hist = HsvHistogram::new(bins);
    // H reaches 360 and S, V reach 1.0, so the top value needs clamping
    let index = |scaled: f64| (scaled as usize).min(bins - 1);
    let n = bins as f64;
    for (_, _, pixel) in region.pixels() {
        let [r, g, b, _] = pixel.0;
        let (h, s, v) = rgb_to_hsv(r, g, b);
        hist[HsvChannel::Hue][index(h * n / 360.)] += 1;
        hist[HsvChannel::Saturation][index(s * n)] += 1;
        hist[HsvChannel::Value][index(v * n)] += 1;
    }
    Ok(hist)
}

/// Returns hue in degrees [0, 360), saturation and value in [0, 1].
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let rf = r as f64 / 255.;
    let gf = g as f64 / 255.;
    let bf = b as f64 / 255.;

    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let mut h = 0.;
    if delta != 0. {
        h = if max == rf {
            ((gf - bf) / delta) % 6.
        } else if max == gf {
            (bf - rf) / delta + 2.
        } else {
            (rf - gf) / delta + 4.
        };
        h *= 60.;
        if h < 0. {
            h += 360.;
        }
    }
    let s = if max != 0. { delta / max } else { 0. };
    (h, s, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, RgbaImage};

    fn noisy(width: u32, height: u32) -> RgbaImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([
                (x * 37 + y * 11) as u8,
                (x * y) as u8,
                (255 - x * 3) as u8,
                255,
            ])
        })
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(rgb_to_hsv(255, 0, 0), (0., 1., 1.));
        assert_eq!(rgb_to_hsv(0, 255, 0), (120., 1., 1.));
        assert_eq!(rgb_to_hsv(0, 0, 255), (240., 1., 1.));
        assert_eq!(rgb_to_hsv(0, 0, 0), (0., 0., 0.));
    }

    #[test]
    fn hsv_gray_is_achromatic() {
        let (h, s, v) = rgb_to_hsv(128, 128, 128);
        assert_eq!(h, 0.);
        assert_eq!(s, 0.);
        assert!((v - 128. / 255.).abs() < 1e-12);
    }

    #[test]
    fn hsv_wraps_negative_hue() {
        // magenta-ish red: max is red and g < b
        let (h, _, _) = rgb_to_hsv(255, 0, 128);
        assert!(h > 300. && h < 360.);
    }

    #[test]
    fn histograms_count_every_pixel() {
        let img = noisy(31, 17);
        let rgb = histogram_rgb(&img, 64).unwrap();
        let hsv = histogram_hsv(&img, 64).unwrap();
        for channel in rgb.channels().iter().chain(hsv.channels().iter()) {
            assert_eq!(channel.len(), 64);
            assert_eq!(channel.iter().sum::<u32>(), 31 * 17);
        }
    }

    #[test]
    fn histograms_count_every_pixel_of_a_view() {
        let img = noisy(40, 40);
        let tile = img.view(12, 4, 9, 7);
        let rgb = histogram_rgb(&tile, 16).unwrap();
        assert!(rgb.channels().iter().all(|c| c.iter().sum::<u32>() == 63));
    }

    #[test]
    fn hsv_top_values_land_in_last_bin() {
        let white = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let hsv = histogram_hsv(&white, 8).unwrap();
        assert_eq!(hsv[HsvChannel::Value][7], 4);
        assert_eq!(hsv[HsvChannel::Saturation][0], 4);

        let rgb = histogram_rgb(&white, 8).unwrap();
        assert_eq!(rgb[RgbChannel::Red][7], 4);
    }

    #[test]
    fn mean_of_solid_region() {
        let img = RgbaImage::from_pixel(5, 3, Rgba([12, 200, 99, 255]));
        assert_eq!(mean_color(&img).unwrap(), [12., 200., 99.]);
    }

    #[test]
    fn empty_region_errors() {
        let img = RgbaImage::new(0, 0);
        assert!(mean_color(&img).is_err());
        assert!(histogram_rgb(&img, 64).is_err());
        assert!(histogram_hsv(&img, 64).is_err());
    }

    #[test]
    fn zero_bins_is_rejected() {
        let img = noisy(4, 4);
        assert!(matches!(histogram_rgb(&img, 0), Err(MatchError::InvalidConfig(_))));
        assert!(matches!(histogram_hsv(&img, 0), Err(MatchError::InvalidConfig(_))));
    }
}
