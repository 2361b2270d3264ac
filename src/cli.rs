//! # grid-sweep CLI interface
//!
//! Command parsing and orchestration glue. All batch logic (prompt-set compilation,
//! job planning, request building, output writing, progress) lives in
//! `grid-sweep-core`; this module wires it to the config file and the HTTP client.
//!
//! - [`Cli`] defines the user-facing subcommands.
//! - [`run`] is the async entrypoint shared by `main` and integration tests.
use crate::client::WebUiClient;
use crate::load_config::load_config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use grid_sweep_core::jobs::JobPlan;
use grid_sweep_core::prompt_set::compile_prompt_sets;
use grid_sweep_core::sweep::sweep;
use std::path::PathBuf;
use std::time::Duration;

/// CLI for grid-sweep: render prompt sets across seeds and CLIP skips.
#[derive(Parser)]
#[clap(
    name = "grid-sweep",
    version,
    about = "Drive a Stable Diffusion WebUI through x/y/z prompt grids across seeds and CLIP skips"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate every image of the sweep described by the config file
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Show the prompt sets and job counts without contacting the WebUI
    Plan {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Run { config } => {
            let config = load_config(config)?;
            let sweep_config = config.sweep_config()?;
            sweep_config.trace_loaded();

            println!("Training Set Directory: {}", config.training_set_dir.display());
            let prompt_sets = compile_prompt_sets(&config.training_set_dir);

            let client = WebUiClient::new(
                &config.url,
                config.api_key.as_deref(),
                Duration::from_secs(config.timeout_secs),
            )
            .map_err(|e| anyhow::anyhow!("Failed to construct WebUI client: {e}"))?;

            tracing::info!(command = "run", endpoint = client.endpoint(), "Starting sweep");
            match sweep(&sweep_config, &prompt_sets, &client).await {
                Ok(report) => {
                    println!("\n{}", report.summary());
                    if !report.failed_jobs.is_empty() {
                        println!("{} job(s) failed and were skipped.", report.failed_jobs.len());
                        for failed in &report.failed_jobs {
                            println!(
                                "  \"{}\" seed {} CLIP skip {}: {}",
                                failed.folder, failed.seed, failed.clip_skip, failed.reason
                            );
                        }
                    }
                    tracing::info!(command = "run", ?report, "Sweep complete");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "run", error = %e, "Sweep aborted");
                    Err(anyhow::Error::new(e).context("Sweep aborted"))
                }
            }
        }
        Commands::Plan { config } => {
            let config = load_config(config)?;
            let sweep_config = config.sweep_config()?;
            let prompt_sets = compile_prompt_sets(&config.training_set_dir);
            let plan = JobPlan::new(&sweep_config.clip_skips, &sweep_config.seeds, &prompt_sets);

            for set in &prompt_sets {
                println!("\"{}\": {} prompts", set.folder, set.fragment_count());
            }
            println!(
                "{} jobs, {} images to generate",
                plan.total_jobs(),
                plan.total_images()
            );
            tracing::info!(command = "plan", jobs = plan.total_jobs(), images = plan.total_images(), "Plan complete");
            Ok(())
        }
    }
}
