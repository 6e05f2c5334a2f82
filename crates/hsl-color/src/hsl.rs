//! HSL color type
//!
//! Hue, saturation and lightness, each normalized to `0.0..=1.0`.

/// Number of decimal places color samples are stored with.
pub const SAMPLE_PRECISION: u32 = 5;

/// A color in HSL space.
///
/// All three channels are in the range `0.0..=1.0`. Hue is the fraction of
/// a full turn around the color wheel (0.0 = red, 1/3 = green, 2/3 = blue).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    /// Hue (0.0..=1.0)
    pub h: f64,
    /// Saturation (0.0..=1.0)
    pub s: f64,
    /// Lightness (0.0..=1.0)
    pub l: f64,
}

impl Hsl {
    #[inline]
    pub fn new(h: f64, s: f64, l: f64) -> Self {
        Self { h, s, l }
    }

    /// Convert an 8-bit RGB pixel to HSL.
    ///
    /// Achromatic pixels (r == g == b) get hue and saturation 0.
    ///
    /// # Example
    /// ```
    /// use hsl_color::Hsl;
    /// let white = Hsl::from_rgb(255, 255, 255);
    /// assert_eq!(white.l, 1.0);
    /// assert_eq!(white.s, 0.0);
    /// ```
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let r = r as f64 / 255.0;
        let g = g as f64 / 255.0;
        let b = b as f64 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return Self { h: 0.0, s: 0.0, l };
        }

        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };

        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        Self { h: h / 6.0, s, l }
    }

    /// Round every channel to `places` decimal places.
    ///
    /// # Example
    /// ```
    /// use hsl_color::Hsl;
    /// let c = Hsl::new(0.123456789, 0.5, 0.987654321).rounded(5);
    /// assert_eq!(c.h, 0.12346);
    /// assert_eq!(c.l, 0.98765);
    /// ```
    pub fn rounded(self, places: u32) -> Self {
        Self {
            h: round_to(self.h, places),
            s: round_to(self.s, places),
            l: round_to(self.l, places),
        }
    }

    /// Euclidean distance in (h, s, l).
    #[inline]
    pub fn distance(&self, other: &Hsl) -> f64 {
        let dh = self.h - other.h;
        let ds = self.s - other.s;
        let dl = self.l - other.l;
        (dh * dh + ds * ds + dl * dl).sqrt()
    }

    /// True when every channel is a finite number in `0.0..=1.0`.
    pub fn is_normalized(&self) -> bool {
        [self.h, self.s, self.l]
            .iter()
            .all(|v| v.is_finite() && (0.0..=1.0).contains(v))
    }
}

/// Round `value` to `places` decimal places (half away from zero).
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
