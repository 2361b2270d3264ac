#![doc = "grid-sweep-core: core batch logic for grid-sweep."]

//! This crate contains the data models and the sequential pipeline that drives an
//! image-generation service through a sweep of prompt sets, seeds and CLIP skips.
//! Transport to the actual service is not included here; it is injected through
//! the [`contract::Generator`] trait.
//!
//! # Usage
//! Add this as a dependency for prompt-set compilation, job planning, request
//! building, output writing and progress tracking.

pub mod config;
pub mod contract;
pub mod jobs;
pub mod output;
pub mod progress;
pub mod prompt_set;
pub mod request;
pub mod sweep;
