//! hsl-color: HSL color math for photo mosaics
//!
//! This library provides the small amount of color science a photo mosaic
//! needs: converting 8-bit RGB pixels to hue/saturation/lightness, measuring
//! how far apart two HSL colors are, and summarizing a whole photo as a
//! single dominant color plus a homogeneity score.
//!
//! # Quick Start
//!
//! ```
//! use hsl_color::Hsl;
//!
//! let red = Hsl::from_rgb(255, 0, 0);
//! assert_eq!(red.h, 0.0);
//! assert_eq!(red.s, 1.0);
//! assert_eq!(red.l, 0.5);
//!
//! let dark_red = Hsl::from_rgb(128, 0, 0);
//! assert!(red.distance(&dark_red) > 0.0);
//! ```
//!
//! # Photo Statistics
//!
//! [`PhotoStats`] reduces a photo to per-channel medians and a combined
//! standard deviation. A low `std_dev` means the photo is close to a single
//! flat color and therefore works well as a mosaic tile.
//!
//! ```
//! use hsl_color::{Hsl, PhotoStats};
//!
//! let pixels = vec![Hsl::from_rgb(0, 0, 255); 16];
//! let stats = PhotoStats::from_pixels(&pixels).unwrap();
//! assert_eq!(stats.std_dev, 0.0);
//! ```
//!
//! # Distance
//!
//! Distances are plain Euclidean distances in (h, s, l) with every channel
//! in `0.0..=1.0`. Hue is not treated as circular: a hue of 0.99 is far from
//! a hue of 0.01. Mosaic corpora are indexed by raw hue, so the distance
//! has to agree with that ordering.

mod hsl;
mod stats;

pub use hsl::{round_to, Hsl, SAMPLE_PRECISION};
pub use stats::{median, sample_variance, PhotoStats};
