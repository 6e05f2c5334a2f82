//! Per-photo color statistics
//!
//! A corpus photo is summarized by the median of each HSL channel and a
//! combined spread `sqrt(var(h) + var(s) + var(l))`.

use crate::hsl::Hsl;

/// Dominant color and homogeneity of a photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoStats {
    /// Median hue
    pub med_h: f64,
    /// Median saturation
    pub med_s: f64,
    /// Median lightness
    pub med_l: f64,
    /// Combined standard deviation of all three channels
    pub std_dev: f64,
}

impl PhotoStats {
    /// Compute statistics over a set of pixels.
    ///
    /// Returns `None` for an empty pixel set.
    pub fn from_pixels(pixels: &[Hsl]) -> Option<Self> {
        if pixels.is_empty() {
            return None;
        }

        let hs: Vec<f64> = pixels.iter().map(|p| p.h).collect();
        let ss: Vec<f64> = pixels.iter().map(|p| p.s).collect();
        let ls: Vec<f64> = pixels.iter().map(|p| p.l).collect();

        Some(Self {
            med_h: median(&hs)?,
            med_s: median(&ss)?,
            med_l: median(&ls)?,
            std_dev: (sample_variance(&hs) + sample_variance(&ss) + sample_variance(&ls)).sqrt(),
        })
    }

    /// The dominant color as an [`Hsl`] value.
    pub fn dominant(&self) -> Hsl {
        Hsl::new(self.med_h, self.med_s, self.med_l)
    }
}

/// Median of a set of values; the mean of the two middle values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Unbiased (n - 1) variance. Zero for fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0)
}
