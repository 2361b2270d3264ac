//! Builds the txt2img payload for one job.
//!
//! Sampling parameters are fixed. The prompt sweep itself rides on the service's
//! x/y/z plot script, whose arguments are positional; [`GridPlotArgs`] gives those
//! positions names and serializes them back to the exact array the script expects.

use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::jobs::Job;

pub const SAMPLER_NAME: &str = "DDIM";
pub const STEPS: u32 = 30;
pub const CFG_SCALE: u32 = 7;
pub const GRID_PLOT_SCRIPT: &str = "x/y/z plot";

/// Axis type selecting prompt search/replace.
pub const PROMPT_AXIS: u32 = 7;
/// Axis type meaning "nothing".
pub const NO_AXIS: u32 = 0;

pub const GRID_PLOT_FLAG_COUNT: usize = 8;
/// Trailing boolean switches of the plot script, in wire order.
pub const GRID_PLOT_FLAGS: [bool; GRID_PLOT_FLAG_COUNT] =
    [false, false, false, false, true, false, false, false];
pub const GRID_PLOT_MARGIN: u32 = 0;

/// Number of positional values in `script_args`: three (type, values) axis
/// pairs, the flags, and the margin.
pub const GRID_PLOT_ARITY: usize = 3 * 2 + GRID_PLOT_FLAG_COUNT + 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotAxis {
    pub kind: u32,
    pub values: String,
}

impl PlotAxis {
    pub fn prompt(values: impl Into<String>) -> Self {
        Self {
            kind: PROMPT_AXIS,
            values: values.into(),
        }
    }

    pub fn unused() -> Self {
        Self {
            kind: NO_AXIS,
            values: String::new(),
        }
    }
}

/// The plot script's argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridPlotArgs {
    pub x_axis: PlotAxis,
    pub y_axis: PlotAxis,
    pub z_axis: PlotAxis,
    pub flags: [bool; GRID_PLOT_FLAG_COUNT],
    pub margin_size: u32,
}

impl GridPlotArgs {
    /// Sweeps the prompt axis over `wire`; every other position takes its fixed value.
    pub fn prompt_sweep(wire: impl Into<String>) -> Self {
        Self {
            x_axis: PlotAxis::prompt(wire),
            y_axis: PlotAxis::unused(),
            z_axis: PlotAxis::unused(),
            flags: GRID_PLOT_FLAGS,
            margin_size: GRID_PLOT_MARGIN,
        }
    }
}

impl Serialize for GridPlotArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(GRID_PLOT_ARITY)?;
        for axis in [&self.x_axis, &self.y_axis, &self.z_axis] {
            tuple.serialize_element(&axis.kind)?;
            tuple.serialize_element(&axis.values)?;
        }
        for flag in &self.flags {
            tuple.serialize_element(flag)?;
        }
        tuple.serialize_element(&self.margin_size)?;
        tuple.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct OverrideSettings {
    pub sd_model_checkpoint: String,
    #[serde(rename = "CLIP_stop_at_last_layers")]
    pub clip_stop_at_last_layers: u32,
}

/// Complete txt2img request body.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub seed: i64,
    pub sampler_name: String,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub cfg_scale: u32,
    pub n_iter: u32,
    pub batch_size: u32,
    pub override_settings: OverrideSettings,
    pub script_name: String,
    pub script_args: GridPlotArgs,
}

/// Builds the payload for `job` rendering square images of `resolution` pixels
/// with the checkpoint named `model`.
pub fn build_request(job: &Job<'_>, model: &str, resolution: u32) -> GenerationRequest {
    GenerationRequest {
        prompt: job.prompt_set.anchor_prompt.clone(),
        negative_prompt: String::new(),
        seed: job.seed,
        sampler_name: SAMPLER_NAME.to_string(),
        steps: STEPS,
        width: resolution,
        height: resolution,
        cfg_scale: CFG_SCALE,
        n_iter: 1,
        batch_size: 1,
        override_settings: OverrideSettings {
            sd_model_checkpoint: model.to_string(),
            clip_stop_at_last_layers: job.clip_skip,
        },
        script_name: GRID_PLOT_SCRIPT.to_string(),
        script_args: GridPlotArgs::prompt_sweep(job.prompt_set.wire.clone()),
    }
}
