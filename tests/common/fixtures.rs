//! Test fixtures and constants.

use hsl_color::{Hsl, PhotoStats};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use photomosaic::models::{ColorSampleGrid, CorpusPhotoEntry, NewJob};

/// Pure RGB colors and the HSL a sampler produces for them
pub mod colors {
    pub const RED: (u8, u8, u8) = (255, 0, 0);
    pub const GREEN: (u8, u8, u8) = (0, 255, 0);
    pub const BLUE: (u8, u8, u8) = (0, 0, 255);
    pub const BLACK: (u8, u8, u8) = (0, 0, 0);
}

/// Corpus entry with an explicit dominant color and spread
pub fn entry(id: &str, h: f64, s: f64, l: f64, std_dev: f64) -> CorpusPhotoEntry {
    CorpusPhotoEntry::new(
        id,
        PhotoStats {
            med_h: h,
            med_s: s,
            med_l: l,
            std_dev,
        },
        format!("thumbs/{id}.jpg"),
    )
}

/// Small corpus covering the primary hues.
///
/// Every entry sits at or just below the hue of the pure color it is meant
/// to match, so the default (reference) hue window finds it.
pub fn palette_corpus() -> Vec<CorpusPhotoEntry> {
    vec![
        entry("red", 0.0, 1.0, 0.5, 0.05),
        entry("gray", 0.0, 0.0, 0.5, 0.01),
        entry("black", 0.0, 0.0, 0.0, 0.0),
        entry("green", 0.33, 1.0, 0.5, 0.1),
        entry("blue", 0.66, 1.0, 0.5, 0.1),
        // closer to pure blue than "blue", but far too noisy to use
        entry("noisy-blue", 0.666, 1.0, 0.5, 0.9),
    ]
}

/// Grid from explicit (h, s, l) rows
pub fn grid(rows: &[&[(f64, f64, f64)]]) -> ColorSampleGrid {
    ColorSampleGrid::new(
        rows.iter()
            .map(|row| row.iter().map(|&(h, s, l)| Hsl::new(h, s, l)).collect())
            .collect(),
    )
    .expect("valid grid")
}

/// Grid where every cell has the same color
pub fn uniform_grid(width: usize, height: usize, color: (f64, f64, f64)) -> ColorSampleGrid {
    let row = vec![color; width];
    let rows: Vec<&[(f64, f64, f64)]> = (0..height).map(|_| row.as_slice()).collect();
    grid(&rows)
}

/// A new job whose grid is already sampled
pub fn new_job(input_url: &str, grid: ColorSampleGrid) -> NewJob {
    NewJob {
        input_img: format!("{input_url}/image.jpg"),
        input_url: input_url.to_string(),
        original_width: grid.width(),
        original_height: grid.height(),
        grid,
    }
}

/// Encode pixel rows as a PNG
pub fn png_bytes(rows: &[&[(u8, u8, u8)]]) -> Vec<u8> {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |r| r.len()) as u32;
    let image = RgbImage::from_fn(width, height, |x, y| {
        let (r, g, b) = rows[y as usize][x as usize];
        Rgb([r, g, b])
    });

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// Write a PNG into `dir` and return its path
pub fn write_png(dir: &Path, name: &str, rows: &[&[(u8, u8, u8)]]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, png_bytes(rows)).expect("write png");
    path
}
