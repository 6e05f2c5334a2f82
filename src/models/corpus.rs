use hsl_color::{Hsl, PhotoStats};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default homogeneity threshold: photos noisier than this are never used as tiles
pub const DEFAULT_HOMOGENEITY_THRESHOLD: f64 = 0.2;

/// A candidate tile photo with its precomputed dominant color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CorpusPhotoEntry {
    pub id: String,
    /// Median hue
    pub med_h: f64,
    /// Median saturation
    pub med_s: f64,
    /// Median lightness
    pub med_l: f64,
    /// Combined HSL spread across the photo's own pixels
    pub std_dev: f64,
    pub thumbnail_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl CorpusPhotoEntry {
    pub fn new(id: impl Into<String>, stats: PhotoStats, thumbnail_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            med_h: stats.med_h,
            med_s: stats.med_s,
            med_l: stats.med_l,
            std_dev: stats.std_dev,
            thumbnail_ref: thumbnail_ref.into(),
            preview_ref: None,
            original_url: None,
            user_name: None,
        }
    }

    pub fn color(&self) -> Hsl {
        Hsl::new(self.med_h, self.med_s, self.med_l)
    }

    pub fn is_homogeneous(&self, threshold: f64) -> bool {
        self.std_dev <= threshold
    }

    /// Usable entries have normalized colors and a finite, non-negative spread
    pub fn is_valid(&self) -> bool {
        self.color().is_normalized() && self.std_dev.is_finite() && self.std_dev >= 0.0
    }
}
