//! Application entry point and dispatch.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use bonetexture_cli::output::{format_suggestion, write_csv_file};
use bonetexture_cli::presenter::CliResultConsumer;
use bonetexture_cli::progress::JobSpinners;
use bonetexture_cli::ui::print_warning;
use bonetexture_core::constants::exit_codes;
use bonetexture_core::features::FilterKind;
use bonetexture_core::params::ParameterSets;
use bonetexture_core::statistics::VoxelStatistics;
use bonetexture_core::suggestion::ParameterSuggestionEngine;
use bonetexture_core::volume::{ImageVolume, RegionMask};
use bonetexture_orchestration::filter_selection::parse_selection;
use bonetexture_orchestration::orchestrator::{Completion, JobOrchestrator};
use bonetexture_orchestration::process_runtime::ProcessRuntime;

use crate::config::AppConfig;

/// Run the application, returning the process exit code.
///
/// # Errors
///
/// Returns an error when inputs cannot be loaded or the launch is rejected.
/// Job failures and timeouts are reported through the exit code instead.
pub fn run(config: &AppConfig) -> Result<i32> {
    // Handle shell completion
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        bonetexture_cli::completion::generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(exit_codes::SUCCESS);
    }

    let scan = config
        .scan
        .as_deref()
        .map(ImageVolume::load)
        .transpose()
        .context("cannot load scan")?;
    let mask = config
        .mask
        .as_deref()
        .map(RegionMask::load)
        .transpose()
        .context("cannot load mask")?;
    let mut params = match &config.params {
        Some(path) => ParameterSets::load(path)
            .with_context(|| format!("cannot load parameters from {}", path.display()))?,
        None => ParameterSets::default(),
    };

    if config.suggest || config.suggest_only {
        let engine = ParameterSuggestionEngine::new(VoxelStatistics::new());
        let suggestion = engine.suggest(scan.as_ref(), mask.as_ref())?;
        if config.suggest_only {
            println!("{}", format_suggestion(&suggestion));
            return Ok(exit_codes::SUCCESS);
        }
        if suggestion.is_degenerate() {
            print_warning(
                "region has a single intensity value; keeping the configured bins and range",
            );
        } else {
            if !config.quiet {
                println!("{}", format_suggestion(&suggestion));
            }
            suggestion.apply_to(&mut params);
        }
    }

    let kinds = parse_selection(&config.features)?;
    run_jobs(config, &kinds, scan.as_ref(), mask.as_ref(), &params)
}

fn run_jobs(
    config: &AppConfig,
    kinds: &BTreeSet<FilterKind>,
    scan: Option<&ImageVolume>,
    mask: Option<&RegionMask>,
    params: &ParameterSets,
) -> Result<i32> {
    let runtime = Arc::new(ProcessRuntime::new(config.filter_dir.clone()));
    let spinners = Arc::new(JobSpinners::new(!config.quiet));
    let consumer = Arc::new(CliResultConsumer::new(
        config.verbose,
        config.quiet,
        Arc::clone(&spinners),
    ));
    let orchestrator = JobOrchestrator::new(runtime, consumer.clone());

    // Spinners first: a fast job may report before launch returns.
    for &kind in kinds {
        spinners.start(kind, "running");
    }
    let launched = match &config.feature_maps {
        Some(dir) => create_output_dir(dir).and_then(|()| {
            Ok(orchestrator.launch_feature_maps(kinds, scan, mask, params, dir)?)
        }),
        None => Ok(orchestrator.launch(kinds, scan, mask, params)?),
    };
    let ticket = match launched {
        Ok(ticket) => ticket,
        Err(err) => {
            spinners.abandon_all("not started");
            return Err(err);
        }
    };
    info!(kinds = ?ticket.kinds(), "Waiting for filter jobs");

    let completion = ticket.wait(config.wait_limit());
    if !completion.pending.is_empty() {
        spinners.abandon_all("still running");
    }

    let results = orchestrator.results();
    if config.feature_maps.is_none() {
        consumer.present_results(&results);
    }
    if let Some(path) = &config.output {
        write_csv_file(path, &results)
            .with_context(|| format!("cannot write {}", path.display()))?;
    }
    consumer.present_summary(&completion);

    Ok(exit_code_for(&completion))
}

fn create_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create feature map directory {}", dir.display()))
}

fn exit_code_for(completion: &Completion) -> i32 {
    if !completion.pending.is_empty() {
        exit_codes::ERROR_TIMEOUT
    } else if completion.outcomes.iter().any(|o| o.outcome.is_err()) {
        exit_codes::ERROR_JOB_FAILED
    } else {
        exit_codes::SUCCESS
    }
}
