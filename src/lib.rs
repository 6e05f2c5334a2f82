//! Photomosaic - chunked photo mosaic assembly
//!
//! Samples a source image into a grid of HSL colors and replaces every
//! cell with the nearest-colored photo of a corpus, a bounded range of
//! rows at a time. This library exposes modules for integration testing.

pub mod api;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
