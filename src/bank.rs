use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::path::Path;

use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::compare::similarity;
use crate::config::Config;
use crate::error::Result;
use crate::fingerprint::FullImageDescriptor;
use crate::storage::load_descriptor;

/// One bank entry scored against a query.
#[derive(Clone, Debug, Serialize)]
pub struct Match {
    pub name: String,
    pub score: f64,
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Match {}

impl PartialOrd for Match {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Match {
    // ties pop in name order
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.name.cmp(&self.name))
    }
}

/// Descriptors compared brute force against a query.
#[derive(Default)]
pub struct DescriptorBank {
    descriptors: Vec<FullImageDescriptor>,
}

impl DescriptorBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.json` descriptor in `dir`. Files that fail to load are logged and
    /// skipped.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().map_or(false, |e| e == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut bank = Self::new();
        for path in paths {
            match load_descriptor(&path) {
                Ok(desc) => bank.add(desc),
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }
        info!("loaded {} descriptors from {}", bank.len(), dir.display());
        Ok(bank)
    }

    pub fn add(&mut self, desc: FullImageDescriptor) {
        self.descriptors.push(desc)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FullImageDescriptor> {
        self.descriptors.iter()
    }

    /// Scores every descriptor except the query's own entry and returns the best
    /// `size`, highest score first.
    pub fn rank(
        &self,
        query: &FullImageDescriptor,
        size: usize,
        config: &Config,
    ) -> Result<Vec<Match>> {
        let scored = self
            .descriptors
            .par_iter()
            .filter(|d| d.image_name != query.image_name)
            .map(|d| {
                similarity(query, d, config).map(|score| Match {
                    name: d.image_name.clone(),
                    score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut heap: BinaryHeap<Match> = scored.into_iter().collect();
        let mut result = Vec::with_capacity(size.min(heap.len()));
        for _ in 0..size {
            match heap.pop() {
                Some(m) => result.push(m),
                None => break,
            }
        }
        Ok(result)
    }

    pub fn best_match(
        &self,
        query: &FullImageDescriptor,
        config: &Config,
    ) -> Result<Option<Match>> {
        Ok(self.rank(query, 1, config)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;
    use crate::phash::PerceptualHash;
    use crate::storage::save_descriptor;
    use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};

    fn config() -> Config {
        Config {
            standard_size: 36,
            tiles_per_row: 3,
            ..Config::default()
        }
    }

    /// Solid canvas. The hashes of flat regions only encode rounding noise in the DCT,
    /// so they are pinned to keep the ranking about colour.
    fn solid(name: &str, color: [u8; 3]) -> FullImageDescriptor {
        let [r, g, b] = color;
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(36, 36, Rgba([r, g, b, 255])));
        let mut desc = fingerprint(name, &image, &config()).unwrap();
        desc.global_phash = PerceptualHash(1);
        for tile in desc.tiles.iter_mut() {
            tile.phash = PerceptualHash(1);
        }
        desc
    }

    fn bank() -> DescriptorBank {
        let mut bank = DescriptorBank::new();
        bank.add(solid("blue", [0, 0, 255]));
        bank.add(solid("red", [255, 0, 0]));
        bank.add(solid("green", [0, 255, 0]));
        bank
    }

    #[test]
    fn ranks_closest_first() {
        let query = solid("query", [250, 0, 0]);
        let ranked = bank().rank(&query, 10, &config()).unwrap();
        let names: Vec<&str> = ranked.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(names[0], "red");
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn rank_respects_size_and_skips_self() {
        let query = solid("red", [255, 0, 0]);
        let ranked = bank().rank(&query, 1, &config()).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_ne!(ranked[0].name, "red");

        let best = bank().best_match(&query, &config()).unwrap().unwrap();
        assert_eq!(best, ranked[0]);
        assert!(DescriptorBank::new().best_match(&query, &config()).unwrap().is_none());
    }

    #[test]
    fn equal_scores_pop_in_name_order() {
        let mut heap = BinaryHeap::new();
        heap.push(Match { name: "b".into(), score: 50. });
        heap.push(Match { name: "a".into(), score: 50. });
        heap.push(Match { name: "c".into(), score: 70. });
        let order: Vec<String> = std::iter::from_fn(|| heap.pop()).map(|m| m.name).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn equality_agrees_with_ordering() {
        let m = |score: f64| Match { name: "a".into(), score };
        assert_ne!(m(0.), m(-0.));
        assert_eq!(m(0.).cmp(&m(-0.)), Ordering::Greater);
        assert_eq!(m(f64::NAN), m(f64::NAN));
        assert_eq!(m(f64::NAN).cmp(&m(f64::NAN)), Ordering::Equal);
        assert_eq!(m(42.5), m(42.5));
    }

    #[test]
    fn from_dir_skips_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        save_descriptor(&solid("red", [255, 0, 0]), dir.path().join("red.json")).unwrap();
        std::fs::write(dir.path().join("broken.json"), "not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let bank = DescriptorBank::from_dir(dir.path()).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.iter().next().unwrap().image_name, "red");
    }

    #[test]
    fn mismatched_bank_entry_fails() {
        let mut bank = bank();
        let other_grid = Config {
            standard_size: 36,
            tiles_per_row: 2,
            ..Config::default()
        };
        let image =
            DynamicImage::ImageRgba8(ImageBuffer::from_pixel(36, 36, Rgba([1, 2, 3, 255])));
        bank.add(fingerprint("coarse", &image, &other_grid).unwrap());
        let query = solid("query", [250, 0, 0]);
        assert!(bank.rank(&query, 10, &config()).is_err());
    }
}
