/// `load_config` module: loads a YAML run description, injects secrets from the
/// environment and validates everything the sweep takes for granted.
///
/// This is the only place where untrusted YAML is parsed. The core crate receives
/// a [`SweepConfig`] whose values are already checked: non-empty seed and CLIP skip
/// lists, CLIP skips within `0..=12`, a positive resolution and a model identifier.
///
/// # Errors
/// All errors use `anyhow::Error` and name the offending field; they surface at
/// the CLI boundary.
use anyhow::{bail, Context, Result};
use grid_sweep_core::config::SweepConfig;
use grid_sweep_core::output::DEFAULT_OUTPUT_ROOT;
use grid_sweep_core::prompt_set::FRAGMENT_EXTENSION;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const MAX_CLIP_SKIP: u32 = 12;
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
/// Optional bearer token for WebUIs started with API auth.
pub const API_KEY_ENV: &str = "GRID_SWEEP_API_KEY";

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    pub url: String,
    pub model_path: PathBuf,
    pub training_set_dir: PathBuf,
    pub resolution: u32,
    pub seeds: Vec<i64>,
    pub clip_skips: Vec<u32>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_ROOT)
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl CliConfig {
    /// Checkpoint identifier sent to the service: the model path's final component.
    pub fn model_name(&self) -> Result<String> {
        self.model_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("model_path {:?} has no file name", self.model_path))
    }

    pub fn sweep_config(&self) -> Result<SweepConfig> {
        Ok(SweepConfig {
            model: self.model_name()?,
            resolution: self.resolution,
            seeds: self.seeds.clone(),
            clip_skips: self.clip_skips.clone(),
            output_root: self.output_dir.clone(),
            fail_fast: self.fail_fast,
        })
    }
}

/// Loads a YAML config file, injects the optional API key from the environment
/// and validates the result.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    config.api_key = std::env::var(API_KEY_ENV)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty());
    if config.api_key.is_some() {
        info!("{API_KEY_ENV} found in env");
    }

    validate(&config)?;

    info!(
        url = %config.url,
        training_set_dir = %config.training_set_dir.display(),
        seeds = config.seeds.len(),
        clip_skips = config.clip_skips.len(),
        "Config loaded and validated successfully"
    );
    Ok(config)
}

fn validate(config: &CliConfig) -> Result<()> {
    if config.url.trim().is_empty() {
        bail!("url must not be empty");
    }
    if !config.model_path.exists() {
        bail!("model_path does not exist: {}", config.model_path.display());
    }
    config.model_name()?;
    if !config.training_set_dir.is_dir() {
        bail!(
            "training_set_dir does not exist: {}",
            config.training_set_dir.display()
        );
    }
    if !contains_fragments(&config.training_set_dir) {
        warn!(
            dir = %config.training_set_dir.display(),
            "No .{FRAGMENT_EXTENSION} files found in training_set_dir, nothing will be generated"
        );
    }
    if config.resolution == 0 {
        bail!("resolution must be a positive integer");
    }
    if config.seeds.is_empty() {
        bail!("seeds must list at least one seed");
    }
    if config.clip_skips.is_empty() {
        bail!("clip_skips must list at least one value");
    }
    if let Some(bad) = config.clip_skips.iter().find(|&&c| c > MAX_CLIP_SKIP) {
        bail!("clip_skips must be integers between 0 and {MAX_CLIP_SKIP}, got {bad}");
    }
    Ok(())
}

/// True if any fragment file exists anywhere beneath `dir`.
fn contains_fragments(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        let path = entry.path();
        if path.is_dir() {
            contains_fragments(&path)
        } else {
            path.extension().and_then(|e| e.to_str()) == Some(FRAGMENT_EXTENSION)
        }
    })
}
