use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

use super::CorpusPhotoEntry;

/// The corpus photo resolved for one mosaic cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileAssignment {
    pub photo_id: String,
    pub thumbnail_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl From<&CorpusPhotoEntry> for TileAssignment {
    fn from(entry: &CorpusPhotoEntry) -> Self {
        Self {
            photo_id: entry.id.clone(),
            thumbnail_ref: entry.thumbnail_ref.clone(),
            preview_ref: entry.preview_ref.clone(),
            original_url: entry.original_url.clone(),
            user_name: entry.user_name.clone(),
        }
    }
}

/// Column -> assignment for a single committed row
pub type TileRow = BTreeMap<u32, TileAssignment>;

/// Row-keyed mosaic matrix, grown one committed row at a time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileMatrix(BTreeMap<u32, TileRow>);

impl TileMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(&self, row: u32) -> Option<&TileRow> {
        self.0.get(&row)
    }

    /// Replace a whole row
    pub fn insert_row(&mut self, row: u32, tiles: TileRow) {
        self.0.insert(row, tiles);
    }

    pub fn row_count(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (u32, &TileRow)> {
        self.0.iter().map(|(r, tiles)| (*r, tiles))
    }

    /// Copy of the committed rows within `range`
    pub fn slice(&self, range: Range<u32>) -> TileMatrix {
        if range.start >= range.end {
            return TileMatrix::new();
        }
        TileMatrix(
            self.0
                .range(range)
                .map(|(r, tiles)| (*r, tiles.clone()))
                .collect(),
        )
    }

    /// Number of rows committed without a gap starting from row 0
    pub fn committed_prefix(&self) -> u32 {
        let mut next = 0;
        for row in self.0.keys() {
            if *row != next {
                break;
            }
            next += 1;
        }
        next
    }
}
