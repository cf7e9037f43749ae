//! Stage failures
//!
//! There is one variant per way a stage can fail. Each carries the [`Stage`] so the CLI can say which stage
//! stopped the run and pick that stage's exit code.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use super::Stage;

/// Errors that abort a pipeline run.
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error("{stage} stage: '{}' not found", .program.display())]
    #[diagnostic(
        code(covreport::pipeline::tool_not_found),
        help("check --llvm-root / COVREPORT_LLVM_ROOT for LLVM tools, --cmake for cmake, and that the build produced the test executable")
    )]
    ToolNotFound { stage: Stage, program: PathBuf },

    #[error("{stage} stage: failed to start '{}'", .program.display())]
    #[diagnostic(code(covreport::pipeline::spawn))]
    Spawn {
        stage: Stage,
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{stage} stage: '{}' exited with status {code}", .program.display())]
    #[diagnostic(code(covreport::pipeline::command_failed), help("see the tool output above"))]
    CommandFailed { stage: Stage, program: PathBuf, code: i32 },

    #[error("{stage} stage: '{}' was terminated by a signal", .program.display())]
    #[diagnostic(code(covreport::pipeline::terminated))]
    Terminated { stage: Stage, program: PathBuf },

    #[error("{stage} stage: failed to remove '{}'", .path.display())]
    #[diagnostic(code(covreport::pipeline::remove_dir))]
    RemoveDir {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::ToolNotFound { stage, .. }
            | PipelineError::Spawn { stage, .. }
            | PipelineError::CommandFailed { stage, .. }
            | PipelineError::Terminated { stage, .. }
            | PipelineError::RemoveDir { stage, .. } => *stage,
        }
    }

    /// Classify a spawn error for `program`.
    pub(crate) fn from_spawn(stage: Stage, program: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            PipelineError::ToolNotFound { stage, program }
        } else {
            PipelineError::Spawn { stage, program, source }
        }
    }
}
