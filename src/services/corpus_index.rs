use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::error::StoreError;
use crate::models::CorpusPhotoEntry;

/// Hue bound of a window query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuePredicate {
    /// `medH <= hue`
    AtMost,
    /// `medH >= hue`
    AtLeast,
}

/// Ordering of a window query by `medH`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HueOrder {
    Descending,
    Ascending,
}

/// A bounded, hue-ordered corpus query restricted to homogeneous photos
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueQuery {
    pub hue: f64,
    pub predicate: HuePredicate,
    pub order: HueOrder,
    /// Only entries with `stdDev <= max_std_dev`
    pub max_std_dev: f64,
    pub limit: usize,
}

/// Read-only access to the photo corpus
#[async_trait]
pub trait CorpusIndex: Send + Sync {
    /// Entries matching `query`, in the requested order, at most `query.limit`
    async fn query_hue(&self, query: &HueQuery) -> Result<Vec<CorpusPhotoEntry>, StoreError>;

    /// Entries with the given ids, in the order requested; unknown ids are skipped
    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<CorpusPhotoEntry>, StoreError>;

    async fn len(&self) -> Result<usize, StoreError>;

    /// Nearest homogeneous hues at or below `hue`, closest first
    async fn query_below_or_equal_hue(
        &self,
        hue: f64,
        max_std_dev: f64,
        limit: usize,
    ) -> Result<Vec<CorpusPhotoEntry>, StoreError> {
        self.query_hue(&HueQuery {
            hue,
            predicate: HuePredicate::AtMost,
            order: HueOrder::Descending,
            max_std_dev,
            limit,
        })
        .await
    }

    /// Nearest homogeneous hues at or above `hue`, closest first
    async fn query_above_or_equal_hue(
        &self,
        hue: f64,
        max_std_dev: f64,
        limit: usize,
    ) -> Result<Vec<CorpusPhotoEntry>, StoreError> {
        self.query_hue(&HueQuery {
            hue,
            predicate: HuePredicate::AtLeast,
            order: HueOrder::Ascending,
            max_std_dev,
            limit,
        })
        .await
    }
}

/// Corpus held in memory, pre-sorted by hue in both directions.
///
/// Entries with equal hue keep their load order in either direction, so
/// query results are fully deterministic.
pub struct InMemoryCorpus {
    ascending: Arc<Vec<CorpusPhotoEntry>>,
    descending: Arc<Vec<CorpusPhotoEntry>>,
}

impl InMemoryCorpus {
    /// Build an index; entries with non-normalized colors are dropped
    pub fn new(entries: Vec<CorpusPhotoEntry>) -> Self {
        let total = entries.len();
        let mut ascending: Vec<CorpusPhotoEntry> =
            entries.into_iter().filter(|e| e.is_valid()).collect();
        if ascending.len() != total {
            tracing::warn!(
                dropped = total - ascending.len(),
                "Dropped corpus entries with invalid colors"
            );
        }

        let mut descending = ascending.clone();
        // stable sorts: ties stay in load order
        ascending.sort_by(|a, b| a.med_h.total_cmp(&b.med_h));
        descending.sort_by(|a, b| b.med_h.total_cmp(&a.med_h));

        Self {
            ascending: Arc::new(ascending),
            descending: Arc::new(descending),
        }
    }

    /// Load a JSON array of entries
    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let bytes = std::fs::read(path)?;
        let entries: Vec<CorpusPhotoEntry> = serde_json::from_slice(&bytes)?;
        tracing::info!(
            path = %path.display(),
            entries = entries.len(),
            "Loaded corpus"
        );
        Ok(Self::new(entries))
    }

    fn window(&self, query: &HueQuery) -> &[CorpusPhotoEntry] {
        let hue = query.hue;
        match (query.predicate, query.order) {
            (HuePredicate::AtMost, HueOrder::Ascending) => {
                let end = self.ascending.partition_point(|e| e.med_h <= hue);
                &self.ascending[..end]
            }
            (HuePredicate::AtLeast, HueOrder::Ascending) => {
                let start = self.ascending.partition_point(|e| e.med_h < hue);
                &self.ascending[start..]
            }
            (HuePredicate::AtMost, HueOrder::Descending) => {
                let start = self.descending.partition_point(|e| e.med_h > hue);
                &self.descending[start..]
            }
            (HuePredicate::AtLeast, HueOrder::Descending) => {
                let end = self.descending.partition_point(|e| e.med_h >= hue);
                &self.descending[..end]
            }
        }
    }
}

impl Default for InMemoryCorpus {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl CorpusIndex for InMemoryCorpus {
    async fn query_hue(&self, query: &HueQuery) -> Result<Vec<CorpusPhotoEntry>, StoreError> {
        Ok(self
            .window(query)
            .iter()
            .filter(|e| e.is_homogeneous(query.max_std_dev))
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<CorpusPhotoEntry>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.ascending.iter().find(|e| &e.id == id))
            .cloned()
            .collect())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.ascending.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsl_color::PhotoStats;

    fn entry(id: &str, h: f64, std_dev: f64) -> CorpusPhotoEntry {
        CorpusPhotoEntry::new(
            id,
            PhotoStats {
                med_h: h,
                med_s: 0.5,
                med_l: 0.5,
                std_dev,
            },
            format!("{id}.jpg"),
        )
    }

    fn ids(entries: &[CorpusPhotoEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    fn corpus() -> InMemoryCorpus {
        InMemoryCorpus::new(vec![
            entry("c", 0.3, 0.1),
            entry("a", 0.1, 0.1),
            entry("noisy", 0.2, 0.3),
            entry("b", 0.2, 0.05),
            entry("d", 0.4, 0.0),
            entry("b2", 0.2, 0.1),
        ])
    }

    #[tokio::test]
    async fn test_below_or_equal_descending() {
        let result = corpus().query_below_or_equal_hue(0.25, 0.2, 10).await.unwrap();
        assert_eq!(ids(&result), vec!["b", "b2", "a"]);
    }

    #[tokio::test]
    async fn test_above_or_equal_ascending() {
        let result = corpus().query_above_or_equal_hue(0.2, 0.2, 10).await.unwrap();
        assert_eq!(ids(&result), vec!["b", "b2", "c", "d"]);
    }

    #[tokio::test]
    async fn test_at_most_ascending_starts_from_lowest_hue() {
        let query = HueQuery {
            hue: 0.3,
            predicate: HuePredicate::AtMost,
            order: HueOrder::Ascending,
            max_std_dev: 0.2,
            limit: 2,
        };
        let result = corpus().query_hue(&query).await.unwrap();
        assert_eq!(ids(&result), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_at_least_descending() {
        let query = HueQuery {
            hue: 0.3,
            predicate: HuePredicate::AtLeast,
            order: HueOrder::Descending,
            max_std_dev: 0.2,
            limit: 10,
        };
        let result = corpus().query_hue(&query).await.unwrap();
        assert_eq!(ids(&result), vec!["d", "c"]);
    }

    #[tokio::test]
    async fn test_limit_and_homogeneity_filter() {
        let result = corpus().query_below_or_equal_hue(1.0, 0.2, 2).await.unwrap();
        assert_eq!(ids(&result), vec!["d", "c"]);

        let all = corpus().query_below_or_equal_hue(1.0, 1.0, 10).await.unwrap();
        assert!(ids(&all).contains(&"noisy"));
        let strict = corpus().query_below_or_equal_hue(1.0, 0.2, 10).await.unwrap();
        assert!(!ids(&strict).contains(&"noisy"));
    }

    #[tokio::test]
    async fn test_empty_window() {
        let result = corpus().query_below_or_equal_hue(0.05, 0.2, 10).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_get_by_ids_keeps_request_order() {
        let result = corpus()
            .get_by_ids(&["d".to_string(), "missing".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(ids(&result), vec!["d", "a"]);
    }

    #[tokio::test]
    async fn test_invalid_entries_dropped() {
        let corpus = InMemoryCorpus::new(vec![entry("ok", 0.5, 0.1), entry("bad", 1.5, 0.1)]);
        assert_eq!(corpus.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        let entries = vec![entry("x", 0.5, 0.1)];
        std::fs::write(&path, serde_json::to_vec(&entries).unwrap()).unwrap();

        let corpus = InMemoryCorpus::from_json_file(&path).unwrap();
        assert_eq!(corpus.len().await.unwrap(), 1);
    }
}
