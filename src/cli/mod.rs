//! CLI module for covreport
//!
//! ## Commands
//!
//! - `report` - build, run tests, merge profile, render HTML (incremental)
//! - `fresh` - wipe the build directory and configure first, then everything `report` does
//! - `clean` - remove the build directory
//! - `config` - print the resolved configuration
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::config::{ConfigError, ConfigLayer};
use crate::pipeline::{Mode, PipelineError};
use crate::version::COVREPORT_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// Configuration could not be resolved; no stage ran.
    pub const CONFIG: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Render a diagnostic with miette's report handler (help text, error chain).
fn render_diagnostic(diagnostic: impl miette::Diagnostic + Send + Sync + 'static) -> String {
    format!("{:?}", miette::Report::new(diagnostic))
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::new(render_diagnostic(err), ExitCode::CONFIG)
    }
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        let code = ExitCode(err.stage().exit_code());
        CliError::new(render_diagnostic(err), code)
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Build, test and report LLVM source-based coverage for a CMake C++ project
#[derive(Parser, Debug)]
#[command(name = "covreport")]
#[command(version = COVREPORT_VERSION)]
#[command(about = "Build, test and report LLVM source-based coverage for a CMake C++ project", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub options: GlobalOptions,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalOptions {
    /// Project source directory (default: current directory)
    #[arg(long, value_name = "DIR", global = true)]
    pub source_dir: Option<PathBuf>,

    /// Build directory (default: <SOURCE_DIR>/build)
    #[arg(long, value_name = "DIR", global = true)]
    pub build_dir: Option<PathBuf>,

    /// LLVM install prefix containing bin/llvm-cov [env: COVREPORT_LLVM_ROOT]
    #[arg(long, value_name = "DIR", global = true)]
    pub llvm_root: Option<PathBuf>,

    /// GoogleTest package config directory (GTest_DIR) [env: COVREPORT_GTEST_DIR]
    #[arg(long, value_name = "DIR", global = true)]
    pub gtest_dir: Option<PathBuf>,

    /// Test executable relative to the build directory (default: tests/ass_tests)
    #[arg(long, value_name = "PATH", global = true)]
    pub test_executable: Option<PathBuf>,

    /// CMake generator (default: Ninja)
    #[arg(long, value_name = "NAME", global = true)]
    pub generator: Option<String>,

    /// cmake program [env: COVREPORT_CMAKE]
    #[arg(long, value_name = "PROGRAM", global = true)]
    pub cmake: Option<PathBuf>,

    /// JSON config file (default: <SOURCE_DIR>/covreport.json if present)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Print the commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,
}

impl GlobalOptions {
    /// The settings given on the command line, as the highest-precedence config layer.
    pub fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            llvm_root: self.llvm_root.clone(),
            build_dir: self.build_dir.clone(),
            gtest_dir: self.gtest_dir.clone(),
            test_executable: self.test_executable.clone(),
            generator: self.generator.clone(),
            cmake: self.cmake.clone(),
            ..ConfigLayer::default()
        }
    }
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Build, run the tests, merge the profile and render the HTML report
    Report,
    /// Remove and re-configure the build directory, then do everything `report` does
    Fresh,
    /// Remove the build directory
    Clean,
    /// Print the resolved configuration and derived paths
    Config,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Report => commands::run_pipeline(&cli.options, Mode::Incremental),
        Command::Fresh => commands::run_pipeline(&cli.options, Mode::Fresh),
        Command::Clean => commands::clean(&cli.options),
        Command::Config => commands::show_config(&cli.options),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pipeline::Stage;
    use std::io;

    #[test]
    fn test_cli_parse_report() {
        let cli = Cli::try_parse_from(["covreport", "report"]).unwrap();
        assert_eq!(cli.command, Command::Report);
        assert!(!cli.options.dry_run);
    }

    #[test]
    fn test_cli_parse_fresh_with_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "covreport",
            "fresh",
            "--llvm-root",
            "/opt/llvm",
            "--gtest-dir",
            "/opt/gtest",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.command, Command::Fresh);
        assert_eq!(cli.options.llvm_root, Some(PathBuf::from("/opt/llvm")));
        assert_eq!(cli.options.gtest_dir, Some(PathBuf::from("/opt/gtest")));
        assert!(cli.options.dry_run);
    }

    #[test]
    fn test_cli_parse_global_flags_before_subcommand() {
        let cli = Cli::try_parse_from(["covreport", "--build-dir", "out", "clean"]).unwrap();
        assert_eq!(cli.command, Command::Clean);
        assert_eq!(cli.options.build_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["covreport"]).is_err());
    }

    #[test]
    fn test_options_to_layer() {
        let options = GlobalOptions {
            llvm_root: Some(PathBuf::from("/opt/llvm")),
            generator: Some("Unix Makefiles".to_string()),
            ..GlobalOptions::default()
        };
        let layer = options.to_layer();
        assert_eq!(layer.llvm_root, Some(PathBuf::from("/opt/llvm")));
        assert_eq!(layer.generator.as_deref(), Some("Unix Makefiles"));
        assert!(layer.cxx_standard.is_none());
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: CliError = ConfigError::MissingToolchainRoot.into();
        assert_eq!(err.exit_code, ExitCode::CONFIG);
        assert!(err.message.contains("no LLVM toolchain root configured"));
    }

    #[test]
    fn test_pipeline_error_exit_code_follows_stage() {
        let err: CliError = PipelineError::CommandFailed {
            stage: Stage::Merge,
            program: PathBuf::from("llvm-profdata"),
            code: 1,
        }
        .into();
        assert_eq!(err.exit_code, ExitCode(14));
        assert!(err.message.contains("merge stage"));

        let err: CliError = PipelineError::RemoveDir {
            stage: Stage::Clean,
            path: PathBuf::from("build"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        }
        .into();
        assert_eq!(err.exit_code, ExitCode(10));
    }
}
