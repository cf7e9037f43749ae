//! The coverage pipeline
//!
//! A run is a fixed, linear sequence of stages:
//!
//! ```text
//! [clean → configure →] build → test → merge → report
//! ```
//!
//! The bracketed prefix only runs in [`Mode::Fresh`]. Stages run one at a time and the first failure ends the run:
//! later stages are not attempted and nothing is rolled back.
//!
//! ## Modules
//!
//! - `stages` - command lines and filesystem helpers for each stage
//! - `executor` - the `StageExecutor` boundary (real, dry-run)
//! - `invocation` - the `Invocation` command value
//! - `error` - `PipelineError`

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod error;
pub mod executor;
pub mod invocation;
pub mod stages;

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use covreport_core::tools;

pub use error::PipelineError;
pub use executor::{DryRunExecutor, StageExecutor, SystemExecutor};
pub use invocation::Invocation;

use crate::config::{PipelineConfig, PipelinePaths};

/// One step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Clean,
    Configure,
    Build,
    Test,
    Merge,
    Report,
}

impl Stage {
    pub const fn name(self) -> &'static str {
        match self {
            Stage::Clean => "clean",
            Stage::Configure => "configure",
            Stage::Build => "build",
            Stage::Test => "test",
            Stage::Merge => "merge",
            Stage::Report => "report",
        }
    }

    /// Short human description for progress output.
    pub const fn description(self) -> &'static str {
        match self {
            Stage::Clean => "removing build directory",
            Stage::Configure => "configuring instrumented Debug build",
            Stage::Build => "building",
            Stage::Test => "running tests",
            Stage::Merge => "merging raw profile",
            Stage::Report => "rendering HTML report",
        }
    }

    /// Process exit code used when this stage fails.
    pub const fn exit_code(self) -> i32 {
        match self {
            Stage::Clean => 10,
            Stage::Configure => 11,
            Stage::Build => 12,
            Stage::Test => 13,
            Stage::Merge => 14,
            Stage::Report => 15,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which workflow to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Reuse the existing build tree: build, test, merge, report.
    Incremental,
    /// Wipe and re-configure the build tree first.
    Fresh,
}

impl Mode {
    /// Stages in execution order.
    pub const fn stages(self) -> &'static [Stage] {
        match self {
            Mode::Incremental => &[Stage::Build, Stage::Test, Stage::Merge, Stage::Report],
            Mode::Fresh => &[
                Stage::Clean,
                Stage::Configure,
                Stage::Build,
                Stage::Test,
                Stage::Merge,
                Stage::Report,
            ],
        }
    }
}

/// A stage that completed, with its wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub stage: Stage,
    pub duration: Duration,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub stages: Vec<StageRecord>,
    pub report_dir: PathBuf,
    pub report_index: PathBuf,
}

impl PipelineOutcome {
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|r| r.duration).sum()
    }

    /// Whether `llvm-cov` left an `index.html` behind.
    pub fn has_report_index(&self) -> bool {
        self.report_index.is_file()
    }
}

/// A configured pipeline, ready to run against an executor.
#[derive(Debug)]
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    mode: Mode,
    paths: PipelinePaths,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig, mode: Mode) -> Self {
        Self {
            config,
            mode,
            paths: config.paths(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn paths(&self) -> &PipelinePaths {
        &self.paths
    }

    /// Run every stage of the mode in order, stopping at the first failure.
    #[tracing::instrument(skip_all, fields(mode = ?self.mode, build_dir = %self.paths.build_dir.display()))]
    pub fn run(&self, executor: &mut dyn StageExecutor) -> Result<PipelineOutcome, PipelineError> {
        let plan = self.mode.stages();
        let mut completed = Vec::with_capacity(plan.len());

        for (index, &stage) in plan.iter().enumerate() {
            tracing::info!("[{}/{}] {}: {}", index + 1, plan.len(), stage, stage.description());
            let start = Instant::now();

            if let Err(err) = self.run_stage(stage, executor) {
                tracing::debug!(%stage, error = %err, "stage failed; skipping remaining stages");
                return Err(err);
            }

            let duration = start.elapsed();
            tracing::info!(%stage, elapsed_ms = elapsed_ms(duration), "stage finished");
            completed.push(StageRecord { stage, duration });
        }

        Ok(PipelineOutcome {
            stages: completed,
            report_dir: self.paths.report_dir.clone(),
            report_index: self.paths.report_index.clone(),
        })
    }

    fn run_stage(&self, stage: Stage, executor: &mut dyn StageExecutor) -> Result<(), PipelineError> {
        let paths = &self.paths;
        match stage {
            Stage::Clean => executor.remove_dir(stage, &paths.build_dir),
            Stage::Configure => executor.run(stage, &stages::configure(self.config)),
            Stage::Build => executor.run(stage, &stages::build(&self.config.cmake, &paths.build_dir)),
            Stage::Test => executor.run(stage, &stages::run_tests(&paths.executable, &paths.profraw)),
            Stage::Merge => executor.run(
                stage,
                &stages::merge_profile(&self.config.tool(tools::LLVM_PROFDATA), &paths.profraw, &paths.profdata),
            ),
            Stage::Report => {
                // Stale pages from an earlier run must not survive into this report.
                executor.remove_dir(stage, &paths.report_dir)?;
                executor.run(
                    stage,
                    &stages::generate_report(
                        &self.config.tool(tools::LLVM_COV),
                        &paths.executable,
                        &paths.profdata,
                        &paths.report_dir,
                    ),
                )
            }
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn elapsed_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Records every step and fails the first `run` of `fail_at`.
    #[derive(Default)]
    struct RecordingExecutor {
        steps: Vec<(Stage, String)>,
        fail_at: Option<Stage>,
    }

    impl StageExecutor for RecordingExecutor {
        fn run(&mut self, stage: Stage, invocation: &Invocation) -> Result<(), PipelineError> {
            self.steps.push((stage, invocation.to_string()));
            if self.fail_at == Some(stage) {
                return Err(PipelineError::CommandFailed {
                    stage,
                    program: invocation.program().to_path_buf(),
                    code: 1,
                });
            }
            Ok(())
        }

        fn remove_dir(&mut self, stage: Stage, dir: &Path) -> Result<(), PipelineError> {
            self.steps.push((stage, format!("rm -rf {}", dir.display())));
            Ok(())
        }
    }

    impl RecordingExecutor {
        fn stages(&self) -> Vec<Stage> {
            let mut seen: Vec<Stage> = Vec::new();
            for (stage, _) in &self.steps {
                if seen.last() != Some(stage) {
                    seen.push(*stage);
                }
            }
            seen
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig::new("/src/proj", "/opt/llvm")
    }

    #[test]
    fn test_incremental_skips_clean_and_configure() {
        let config = config();
        let mut exec = RecordingExecutor::default();
        let outcome = Pipeline::new(&config, Mode::Incremental).run(&mut exec).unwrap();

        assert_eq!(exec.stages(), vec![Stage::Build, Stage::Test, Stage::Merge, Stage::Report]);
        assert_eq!(outcome.stages.len(), 4);
        assert_eq!(outcome.report_dir, PathBuf::from("/src/proj/build/report"));
    }

    #[test]
    fn test_fresh_runs_every_stage_in_order() {
        let config = config();
        let mut exec = RecordingExecutor::default();
        Pipeline::new(&config, Mode::Fresh).run(&mut exec).unwrap();

        assert_eq!(
            exec.stages(),
            vec![
                Stage::Clean,
                Stage::Configure,
                Stage::Build,
                Stage::Test,
                Stage::Merge,
                Stage::Report
            ]
        );
        assert_eq!(exec.steps[0].1, "rm -rf /src/proj/build");
    }

    #[test]
    fn test_failing_tests_stop_before_merge_and_report() {
        let config = config();
        let mut exec = RecordingExecutor {
            fail_at: Some(Stage::Test),
            ..Default::default()
        };
        let err = Pipeline::new(&config, Mode::Incremental).run(&mut exec).unwrap_err();

        assert_eq!(err.stage(), Stage::Test);
        assert_eq!(exec.stages(), vec![Stage::Build, Stage::Test]);
    }

    #[test]
    fn test_configure_failure_stops_before_build() {
        let config = config();
        let mut exec = RecordingExecutor {
            fail_at: Some(Stage::Configure),
            ..Default::default()
        };
        let err = Pipeline::new(&config, Mode::Fresh).run(&mut exec).unwrap_err();

        assert_eq!(err.stage(), Stage::Configure);
        assert_eq!(exec.stages(), vec![Stage::Clean, Stage::Configure]);
    }

    #[test]
    fn test_report_clears_stale_output_first() {
        let config = config();
        let mut exec = RecordingExecutor::default();
        Pipeline::new(&config, Mode::Incremental).run(&mut exec).unwrap();

        let report_steps: Vec<&String> =
            exec.steps.iter().filter(|(s, _)| *s == Stage::Report).map(|(_, cmd)| cmd).collect();
        assert_eq!(report_steps.len(), 2);
        assert_eq!(report_steps[0], "rm -rf /src/proj/build/report");
        assert!(report_steps[1].starts_with("/opt/llvm/bin/llvm-cov show "));
    }

    #[test]
    fn test_test_stage_sets_profile_file() {
        let config = config();
        let mut exec = RecordingExecutor::default();
        Pipeline::new(&config, Mode::Incremental).run(&mut exec).unwrap();

        let (_, test_cmd) = exec.steps.iter().find(|(s, _)| *s == Stage::Test).unwrap();
        assert_eq!(
            test_cmd,
            "LLVM_PROFILE_FILE=/src/proj/build/profile.profraw /src/proj/build/tests/ass_tests"
        );
    }

    #[test]
    fn test_pipeline_follows_custom_build_dir() {
        let config = config().with_build_dir("/tmp/cov");
        let pipeline = Pipeline::new(&config, Mode::Fresh);
        assert_eq!(pipeline.mode(), Mode::Fresh);
        assert_eq!(pipeline.paths().report_dir, PathBuf::from("/tmp/cov/report"));

        let mut exec = RecordingExecutor::default();
        pipeline.run(&mut exec).unwrap();
        assert_eq!(exec.steps[0].1, "rm -rf /tmp/cov");
        assert!(exec.steps.iter().any(|(_, cmd)| cmd == "cmake --build /tmp/cov"));
    }

    #[test]
    fn test_elapsed_ms_saturates() {
        assert_eq!(elapsed_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(elapsed_ms(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let mut codes: Vec<i32> = Mode::Fresh.stages().iter().map(|s| s.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 6);
        assert!(codes.iter().all(|&c| c != 0 && c != 1 && c != 2));
    }
}
