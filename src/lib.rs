//! Image fingerprints built from colour, perceptual hash, texture and edge signals, at
//! whole-image and tile granularity, plus a weighted similarity score between two of
//! them.
//!
//! ```no_run
//! use lib::{compare_prints, fingerprint_file, Config};
//!
//! # fn main() -> lib::Result<()> {
//! let config = Config::default();
//! let a = fingerprint_file("a.jpg", &config)?;
//! let b = fingerprint_file("b.jpg", &config)?;
//! println!("{:.2}%", compare_prints(&a, &b, &config)?.score);
//! # Ok(())
//! # }
//! ```

pub mod bank;
pub mod color;
pub mod compare;
pub mod config;
pub mod edges;
pub mod error;
pub mod fingerprint;
pub mod linalg;
pub mod phash;
pub mod preprocess;
pub mod storage;
pub mod texture;

pub use bank::{DescriptorBank, Match};
pub use compare::{compare_prints, similarity, Similarity};
pub use config::{Config, PhashMode, ScoreProfile};
pub use error::{MatchError, Result};
pub use fingerprint::{fingerprint, fingerprint_file, FullImageDescriptor, TileDescriptor};
pub use phash::PerceptualHash;
