use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::corpus::DEFAULT_HOMOGENEITY_THRESHOLD;

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub matcher: MatcherConfig,

    #[serde(default)]
    pub assembly: AssemblyConfig,

    #[serde(default)]
    pub sampling: SamplingConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Which predicate the "above" hue window uses
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HueWindow {
    /// Both windows select hues at or below the query (historical behavior)
    #[default]
    Reference,
    /// The second window selects hues at or above the query
    Symmetric,
}

/// Tile matching parameters
#[derive(Debug, Deserialize, Clone)]
pub struct MatcherConfig {
    /// Candidates fetched per hue window
    #[serde(default = "default_window_limit")]
    pub window_limit: usize,

    /// Maximum stdDev of a usable corpus photo
    #[serde(default = "default_homogeneity_threshold")]
    pub homogeneity_threshold: f64,

    #[serde(default)]
    pub hue_window: HueWindow,
}

fn default_window_limit() -> usize {
    50
}

fn default_homogeneity_threshold() -> f64 {
    DEFAULT_HOMOGENEITY_THRESHOLD
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            window_limit: default_window_limit(),
            homogeneity_threshold: default_homogeneity_threshold(),
            hue_window: HueWindow::default(),
        }
    }
}

/// Chunking and dispatch parameters
#[derive(Debug, Deserialize, Clone)]
pub struct AssemblyConfig {
    /// Rows per chunk invocation
    #[serde(default = "default_row_step")]
    pub row_step: u32,

    /// Cells matched concurrently within one chunk
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Jobs allowed in `pending` at once
    #[serde(default = "default_max_pending_jobs")]
    pub max_pending_jobs: usize,
}

fn default_row_step() -> u32 {
    10
}

fn default_max_concurrency() -> usize {
    64
}

fn default_max_pending_jobs() -> usize {
    10
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            row_step: default_row_step(),
            max_concurrency: default_max_concurrency(),
            max_pending_jobs: default_max_pending_jobs(),
        }
    }
}

/// Source image downsizing
#[derive(Debug, Deserialize, Clone)]
pub struct SamplingConfig {
    /// Length of the shorter side after resizing
    #[serde(default = "default_target_size")]
    pub target_size: u32,
}

fn default_target_size() -> u32 {
    125
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            target_size: default_target_size(),
        }
    }
}

/// Where jobs and the corpus live
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// Directory of job documents; jobs are kept in memory when unset
    #[serde(default)]
    pub jobs_dir: Option<PathBuf>,

    /// JSON array of corpus entries
    #[serde(default)]
    pub corpus_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from a YAML file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<Self>(&content) {
                Ok(config) => {
                    tracing::info!(
                        path = %path.display(),
                        window_limit = config.matcher.window_limit,
                        hue_window = ?config.matcher.hue_window,
                        row_step = config.assembly.row_step,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, path = %path.display(), "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `CONFIG_FILE`, or `config.yaml` in the working directory
    pub fn load_from_env() -> Self {
        let path = std::env::var("CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.yaml"));
        Self::load(&path)
    }
}
