//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use photomosaic::models::{MosaicJob, TileMatrix};

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status,
        expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert an error response carries the HTTP status in its JSON body
pub fn assert_error(response: &TestResponse, expected: StatusCode) {
    assert_status(response, expected);
    let json: serde_json::Value = response.json();
    assert_eq!(json["status"].as_u64(), Some(expected.as_u16() as u64));
    assert!(json["error"].is_string(), "Expected error message: {json}");
}

/// Assert every committed cell references `photo_id`
pub fn assert_all_tiles(matrix: &TileMatrix, photo_id: &str) {
    for (row, tiles) in matrix.rows() {
        for (column, tile) in tiles {
            assert_eq!(
                tile.photo_id, photo_id,
                "cell ({row}, {column}) matched {}",
                tile.photo_id
            );
        }
    }
}

/// Assert a job finished with every row committed
pub fn assert_complete(job: &MosaicJob) {
    assert_eq!(job.status.to_string(), "complete");
    assert_eq!(job.progress, 100.0);
    assert!(job.timestamp_finished.is_some(), "finished timestamp missing");
    assert_eq!(job.mosaic_matrix.row_count(), job.resized_height);
}
