use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::output::DEFAULT_OUTPUT_ROOT;

/// Validated parameters of one sweep run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Checkpoint identifier sent as `sd_model_checkpoint`.
    pub model: String,
    /// Width and height of every generated image, in pixels.
    pub resolution: u32,
    pub seeds: Vec<i64>,
    pub clip_skips: Vec<u32>,
    pub output_root: PathBuf,
    /// Abort on the first failed generation call instead of skipping the job.
    pub fail_fast: bool,
}

impl SweepConfig {
    pub fn new(model: impl Into<String>, resolution: u32, seeds: Vec<i64>, clip_skips: Vec<u32>) -> Self {
        Self {
            model: model.into(),
            resolution,
            seeds,
            clip_skips,
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            fail_fast: false,
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            model = %self.model,
            resolution = self.resolution,
            seeds = self.seeds.len(),
            clip_skips = self.clip_skips.len(),
            output_root = %self.output_root.display(),
            fail_fast = self.fail_fast,
            "Loaded SweepConfig"
        );
        debug!(?self, "SweepConfig loaded (full debug)");
    }
}
