//! High-level pipeline: drives the generation service through every job of a sweep.
//!
//! For each job, in [`JobPlan`] order, the loop:
//!   - builds the txt2img payload ([`build_request`])
//!   - submits it through a [`Generator`] and times the call
//!   - writes the correlated images ([`write_job_output`]) and times that
//!   - folds both timings into the run's [`ProgressState`] and prints the progress line
//!
//! # Error Handling
//! A failed generation call or an undecodable image skips that job: it is logged,
//! recorded in [`SweepReport::failed_jobs`] and the loop moves on. With
//! [`SweepConfig::fail_fast`] set, either one aborts the run instead. Filesystem
//! write failures always abort, since a silently missing image breaks the output
//! layout.
//!
//! # Concurrency
//! Strictly sequential: one outstanding call at a time.

use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::config::SweepConfig;
use crate::contract::{GenerateError, Generator};
use crate::jobs::{Job, JobPlan};
use crate::output::{write_job_output, OutputError};
use crate::progress::{format_elapsed, ProgressState};
use crate::prompt_set::PromptSet;
use crate::request::build_request;

/// Outcome of a whole sweep.
#[derive(Debug)]
pub struct SweepReport {
    pub jobs_total: usize,
    pub jobs_completed: usize,
    pub images_saved: usize,
    pub total_images: usize,
    pub failed_jobs: Vec<FailedJob>,
    pub elapsed: Duration,
}

impl SweepReport {
    pub fn summary(&self) -> String {
        format!("Generation process completed in {}.", format_elapsed(self.elapsed))
    }
}

/// A job that was skipped after a recoverable failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedJob {
    pub folder: String,
    pub seed: i64,
    pub clip_skip: u32,
    pub reason: String,
}

impl FailedJob {
    fn new(job: &Job<'_>, reason: impl ToString) -> Self {
        Self {
            folder: job.folder().to_string(),
            seed: job.seed,
            clip_skip: job.clip_skip,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("generation failed for \"{folder}\" (seed {seed}, CLIP skip {clip_skip}): {source}")]
    Generation {
        folder: String,
        seed: i64,
        clip_skip: u32,
        #[source]
        source: GenerateError,
    },

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Runs every job of the sweep described by `config` over `prompt_sets`.
pub async fn sweep<G>(
    config: &SweepConfig,
    prompt_sets: &[PromptSet],
    generator: &G,
) -> Result<SweepReport, SweepError>
where
    G: Generator + ?Sized,
{
    let started = Instant::now();
    let plan = JobPlan::new(&config.clip_skips, &config.seeds, prompt_sets);
    let mut progress = ProgressState::new(plan.total_images());
    let mut failed_jobs = Vec::new();
    let mut jobs_completed = 0;

    info!(
        jobs = plan.total_jobs(),
        images = plan.total_images(),
        "[SWEEP] Starting sweep"
    );
    if plan.total_images() == 0 {
        warn!("[SWEEP] No prompt fragments found, nothing to generate");
    }

    for job in plan.jobs() {
        println!(
            "Starting work on \"{}\" ({} images to generate), using seed {} and CLIP skip of {}",
            job.folder(),
            job.expected_images(),
            job.seed,
            job.clip_skip
        );

        let request = build_request(&job, &config.model, config.resolution);
        let generation_started = Instant::now();
        let result = generator.generate(&request).await;
        let generation_time = generation_started.elapsed();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                error!(
                    folder = job.folder(),
                    seed = job.seed,
                    clip_skip = job.clip_skip,
                    error = %e,
                    "[SWEEP][ERROR] Generation call failed"
                );
                if config.fail_fast {
                    return Err(SweepError::Generation {
                        folder: job.folder().to_string(),
                        seed: job.seed,
                        clip_skip: job.clip_skip,
                        source: e,
                    });
                }
                failed_jobs.push(FailedJob::new(&job, &e));
                continue;
            }
        };
        info!(
            folder = job.folder(),
            seed = job.seed,
            clip_skip = job.clip_skip,
            returned = response.images.len(),
            "[SWEEP] Generation call returned"
        );

        let processing_started = Instant::now();
        let saved = match write_job_output(&config.output_root, &job, &response) {
            Ok(paths) => Some(paths.len()),
            Err(e @ OutputError::Decode { .. }) if !config.fail_fast => {
                error!(folder = job.folder(), error = %e, "[SWEEP][ERROR] Skipping job with undecodable image");
                failed_jobs.push(FailedJob::new(&job, &e));
                None
            }
            Err(e) => {
                error!(error = %e, "[SWEEP][ERROR] Writing output failed, aborting");
                return Err(e.into());
            }
        };
        let processing_time = processing_started.elapsed();

        if saved.is_some() {
            jobs_completed += 1;
        }
        if let Some(report) = progress.record(saved.unwrap_or(0), generation_time, processing_time) {
            println!("{report}");
            info!(
                done = report.images_done,
                total = report.total_images,
                percent = report.percent,
                eta_secs = report.eta.as_secs(),
                "[SWEEP] Progress"
            );
        }
    }

    let report = SweepReport {
        jobs_total: plan.total_jobs(),
        jobs_completed,
        images_saved: progress.images_done(),
        total_images: progress.total_images(),
        failed_jobs,
        elapsed: started.elapsed(),
    };
    info!(
        completed = report.jobs_completed,
        failed = report.failed_jobs.len(),
        images = report.images_saved,
        "[SWEEP] Sweep finished"
    );
    Ok(report)
}
