//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::path::PathBuf;

use crate::config::{self, ConfigLayer, PipelineConfig};
use crate::pipeline::{DryRunExecutor, Mode, Pipeline, PipelineOutcome, Stage, StageExecutor, SystemExecutor};

use super::{CliResult, ExitCode, GlobalOptions};

/// Source directory plus the merged layers, before a toolchain is required.
fn load_layers(options: &GlobalOptions) -> CliResult<(PathBuf, ConfigLayer)> {
    let source_dir = config::resolve_source_dir(options.source_dir.clone())?;
    let merged = config::merge_layers(
        &source_dir,
        options.config.as_deref(),
        options.to_layer(),
        |name| std::env::var(name).ok(),
    )?;
    Ok((source_dir, merged))
}

/// Resolve the full pipeline configuration from flags, environment and config file.
pub fn resolve_config(options: &GlobalOptions) -> CliResult<PipelineConfig> {
    let (source_dir, merged) = load_layers(options)?;
    Ok(PipelineConfig::from_layer(&source_dir, merged)?)
}

/// Run the pipeline in `mode`, for real or as a dry run.
pub fn run_pipeline(options: &GlobalOptions, mode: Mode) -> CliResult<ExitCode> {
    let config = resolve_config(options)?;
    let pipeline = Pipeline::new(&config, mode);

    if options.dry_run {
        let mut executor = DryRunExecutor::stdout();
        pipeline.run(&mut executor)?;
        return Ok(ExitCode::SUCCESS);
    }

    let outcome = pipeline.run(&mut SystemExecutor)?;
    print_summary(&outcome);
    Ok(ExitCode::SUCCESS)
}

fn print_summary(outcome: &PipelineOutcome) {
    if outcome.has_report_index() {
        println!("✓ Coverage report: {}", outcome.report_index.display());
    } else {
        tracing::warn!(
            "llvm-cov exited successfully but {} was not written",
            outcome.report_index.display()
        );
        println!("✓ Coverage report directory: {}", outcome.report_dir.display());
    }
    println!(
        "  {} stage(s) in {:.1}s",
        outcome.stages.len(),
        outcome.total_duration().as_secs_f64()
    );
}

/// Remove the build directory. Needs no toolchain.
pub fn clean(options: &GlobalOptions) -> CliResult<ExitCode> {
    let (source_dir, merged) = load_layers(options)?;
    let build_dir = config::build_dir_for(&source_dir, &merged);

    if options.dry_run {
        DryRunExecutor::stdout().remove_dir(Stage::Clean, &build_dir)?;
        return Ok(ExitCode::SUCCESS);
    }

    SystemExecutor.remove_dir(Stage::Clean, &build_dir)?;
    println!("✓ Removed {}", build_dir.display());
    Ok(ExitCode::SUCCESS)
}

/// Print the resolved configuration and every derived path.
pub fn show_config(options: &GlobalOptions) -> CliResult<ExitCode> {
    let config = resolve_config(options)?;
    print!("{}", format_config(&config));
    Ok(ExitCode::SUCCESS)
}

/// Aligned `key  value` lines describing a resolved configuration.
pub fn format_config(config: &PipelineConfig) -> String {
    let paths = config.paths();
    let gtest = config
        .gtest_dir
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string());

    let rows: [(&str, String); 13] = [
        ("source_dir", paths.source_dir.display().to_string()),
        ("build_dir", paths.build_dir.display().to_string()),
        ("toolchain_root", config.toolchain_root.display().to_string()),
        ("gtest_dir", gtest),
        ("cmake", config.cmake.display().to_string()),
        ("generator", config.generator.clone()),
        ("cxx_standard", config.cxx_standard.clone()),
        ("project_prefix", config.project_prefix.clone()),
        ("test_executable", paths.executable.display().to_string()),
        ("profraw", paths.profraw.display().to_string()),
        ("profdata", paths.profdata.display().to_string()),
        ("report_dir", paths.report_dir.display().to_string()),
        ("report_index", paths.report_index.display().to_string()),
    ];

    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (key, value) in &rows {
        out.push_str(&format!("{key:<width$}  {value}\n"));
    }
    out
}
