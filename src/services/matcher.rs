use std::sync::Arc;
use thiserror::Error;

use super::corpus_index::{CorpusIndex, HueOrder, HuePredicate, HueQuery};
use crate::error::StoreError;
use crate::models::{ColorSample, CorpusPhotoEntry, HueWindow, MatcherConfig};

/// The corpus entry chosen for one cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellMatch {
    pub row: u32,
    pub column: u32,
    pub entry: CorpusPhotoEntry,
    pub distance: f64,
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("No homogeneous corpus photo near hue {hue} for cell ({row}, {column})")]
    NoCandidate { row: u32, column: u32, hue: f64 },

    #[error("Corpus query failed: {0}")]
    Store(#[from] StoreError),
}

/// Resolves a color sample to the closest corpus photo.
///
/// Instead of scanning the whole corpus, two hue-ordered windows of
/// `window_limit` homogeneous entries are fetched and only those are
/// compared, so the cost per cell does not grow with the corpus.
pub struct NearestColorMatcher {
    corpus: Arc<dyn CorpusIndex>,
    config: MatcherConfig,
}

impl NearestColorMatcher {
    pub fn new(corpus: Arc<dyn CorpusIndex>, config: MatcherConfig) -> Self {
        Self { corpus, config }
    }

    fn below_window(&self, hue: f64) -> HueQuery {
        HueQuery {
            hue,
            predicate: HuePredicate::AtMost,
            order: HueOrder::Descending,
            max_std_dev: self.config.homogeneity_threshold,
            limit: self.config.window_limit,
        }
    }

    fn above_window(&self, hue: f64) -> HueQuery {
        // Reference mode keeps the historical "<= hue" bound on this window too,
        // so it yields the lowest hues rather than the ones above the query.
        let predicate = match self.config.hue_window {
            HueWindow::Reference => HuePredicate::AtMost,
            HueWindow::Symmetric => HuePredicate::AtLeast,
        };
        HueQuery {
            hue,
            predicate,
            order: HueOrder::Ascending,
            max_std_dev: self.config.homogeneity_threshold,
            limit: self.config.window_limit,
        }
    }

    /// Find the closest homogeneous corpus photo for `sample`.
    ///
    /// Candidates are scanned below-window first, then above-window, each in
    /// index order; on equal distance the first one scanned wins.
    pub async fn find_closest(&self, sample: &ColorSample) -> Result<CellMatch, MatchError> {
        let below = self.corpus.query_hue(&self.below_window(sample.h)).await?;
        let above = self.corpus.query_hue(&self.above_window(sample.h)).await?;

        let query = sample.color();
        let mut best: Option<(f64, &CorpusPhotoEntry)> = None;
        for entry in below.iter().chain(above.iter()) {
            let distance = query.distance(&entry.color());
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, entry));
            }
        }

        match best {
            Some((distance, entry)) => Ok(CellMatch {
                row: sample.row,
                column: sample.column,
                entry: entry.clone(),
                distance,
            }),
            None => {
                tracing::warn!(
                    row = sample.row,
                    column = sample.column,
                    hue = sample.h,
                    "No corpus candidate in either hue window"
                );
                Err(MatchError::NoCandidate {
                    row: sample.row,
                    column: sample.column,
                    hue: sample.h,
                })
            }
        }
    }
}
