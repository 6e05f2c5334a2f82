use hsl_color::{Hsl, PhotoStats, SAMPLE_PRECISION};
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use thiserror::Error;

use crate::models::{ColorSampleGrid, GridError};

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Failed to fetch image: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Target size must be positive")]
    InvalidTargetSize,

    #[error("Invalid color grid: {0}")]
    Grid(#[from] GridError),

    #[error("Sampling task failed: {0}")]
    Task(String),
}

impl SampleError {
    /// Errors caused by the submitted image rather than by the server or upstream
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SampleError::Io(_)
                | SampleError::Decode(_)
                | SampleError::EmptyImage
                | SampleError::InvalidTargetSize
                | SampleError::Grid(_)
        )
    }
}

/// A decoded, downsized source image
#[derive(Debug, Clone)]
pub struct SampledImage {
    pub original_width: u32,
    pub original_height: u32,
    pub grid: ColorSampleGrid,
}

/// Dimensions after scaling the shorter side to `target`, keeping aspect ratio
pub fn resized_dimensions(width: u32, height: u32, target: u32) -> (u32, u32) {
    let scale = |long: u32, short: u32| -> u32 {
        ((long as f64 * target as f64 / short as f64).round() as u32).max(1)
    };
    if width < height {
        (target, scale(height, width))
    } else {
        (scale(width, height), target)
    }
}

/// Downsize an image and convert every pixel to rounded HSL
pub fn sample_image(bytes: &[u8], target_size: u32) -> Result<SampledImage, SampleError> {
    if target_size == 0 {
        return Err(SampleError::InvalidTargetSize);
    }
    let image = image::load_from_memory(bytes)?;
    let (original_width, original_height) = image.dimensions();
    if original_width == 0 || original_height == 0 {
        return Err(SampleError::EmptyImage);
    }

    let (width, height) = resized_dimensions(original_width, original_height, target_size);
    let grid = grid_from_image(&image.resize_exact(width, height, FilterType::Triangle))?;

    tracing::debug!(
        original_width,
        original_height,
        width,
        height,
        "Sampled source image"
    );

    Ok(SampledImage {
        original_width,
        original_height,
        grid,
    })
}

fn grid_from_image(image: &DynamicImage) -> Result<ColorSampleGrid, SampleError> {
    let rgb = image.to_rgb8();
    let rows = (0..rgb.height())
        .map(|y| {
            (0..rgb.width())
                .map(|x| {
                    let [r, g, b] = rgb.get_pixel(x, y).0;
                    Hsl::from_rgb(r, g, b).rounded(SAMPLE_PRECISION)
                })
                .collect()
        })
        .collect();
    Ok(ColorSampleGrid::new(rows)?)
}

/// Dominant color and homogeneity of a corpus photo
pub fn analyze_image(bytes: &[u8], target_size: u32) -> Result<PhotoStats, SampleError> {
    let sampled = sample_image(bytes, target_size)?;
    let grid = &sampled.grid;
    let pixels: Vec<Hsl> = grid
        .samples_in_rows(0..grid.height())
        .map(|s| s.color())
        .collect();
    PhotoStats::from_pixels(&pixels).ok_or(SampleError::EmptyImage)
}

/// Whether `source` names an http(s) URL rather than a local path
pub fn is_remote_source(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Loads source images from disk or over HTTP and samples them
#[derive(Clone)]
pub struct ColorSampler {
    target_size: u32,
    client: reqwest::Client,
}

impl ColorSampler {
    pub fn new(target_size: u32) -> Self {
        Self {
            target_size,
            client: reqwest::Client::new(),
        }
    }

    /// Read image bytes from an http(s) URL or a local path
    pub async fn load(&self, source: &str) -> Result<Vec<u8>, SampleError> {
        if is_remote_source(source) {
            let response = self.client.get(source).send().await?.error_for_status()?;
            Ok(response.bytes().await?.to_vec())
        } else {
            Ok(tokio::fs::read(source).await?)
        }
    }

    /// Load and sample a source image off the async runtime
    pub async fn sample_source(&self, source: &str) -> Result<SampledImage, SampleError> {
        let bytes = self.load(source).await?;
        let target = self.target_size;
        tokio::task::spawn_blocking(move || sample_image(&bytes, target))
            .await
            .map_err(|e| SampleError::Task(e.to_string()))?
    }
}
