//! Stage execution boundary
//!
//! The pipeline never spawns processes or touches the filesystem directly. It hands each step to a
//! [`StageExecutor`]:
//! - [`SystemExecutor`] spawns the command with inherited stdio and waits for it
//! - [`DryRunExecutor`] prints what would run and succeeds
//!
//! Tests plug in their own executor to record or fail specific stages.

use std::io::{self, Write};
use std::path::Path;
use std::process::ExitStatus;

use super::{Invocation, PipelineError, Stage, stages};

/// Runs commands and directory removals on behalf of the pipeline.
pub trait StageExecutor {
    /// Run `invocation` to completion. A non-zero exit is an error.
    fn run(&mut self, stage: Stage, invocation: &Invocation) -> Result<(), PipelineError>;

    /// Remove a directory tree. A missing directory is not an error.
    fn remove_dir(&mut self, stage: Stage, dir: &Path) -> Result<(), PipelineError>;
}

/// Executes for real: child processes inherit stdin/stdout/stderr, so tool output streams to the terminal.
#[derive(Debug, Default)]
pub struct SystemExecutor;

impl StageExecutor for SystemExecutor {
    fn run(&mut self, stage: Stage, invocation: &Invocation) -> Result<(), PipelineError> {
        tracing::debug!(%stage, command = %invocation, "spawning");
        let status = invocation
            .to_command()
            .status()
            .map_err(|e| PipelineError::from_spawn(stage, invocation.program().to_path_buf(), e))?;
        check_status(stage, invocation.program(), status)
    }

    fn remove_dir(&mut self, stage: Stage, dir: &Path) -> Result<(), PipelineError> {
        let removed = stages::clean_build_dir(dir).map_err(|source| PipelineError::RemoveDir {
            stage,
            path: dir.to_path_buf(),
            source,
        })?;
        if removed {
            tracing::debug!(%stage, "removed {}", dir.display());
        }
        Ok(())
    }
}

/// Map an exit status to the pipeline's failure policy.
fn check_status(stage: Stage, program: &Path, status: ExitStatus) -> Result<(), PipelineError> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(PipelineError::CommandFailed {
            stage,
            program: program.to_path_buf(),
            code,
        }),
        None => Err(PipelineError::Terminated {
            stage,
            program: program.to_path_buf(),
        }),
    }
}

/// Prints every step as a shell command instead of running it.
pub struct DryRunExecutor<W: Write> {
    out: W,
}

impl DryRunExecutor<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> DryRunExecutor<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> std::fmt::Debug for DryRunExecutor<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DryRunExecutor").finish_non_exhaustive()
    }
}

impl<W: Write> StageExecutor for DryRunExecutor<W> {
    fn run(&mut self, stage: Stage, invocation: &Invocation) -> Result<(), PipelineError> {
        // Dry-run output is best effort.
        let _ = writeln!(self.out, "# {stage}\n{invocation}");
        Ok(())
    }

    fn remove_dir(&mut self, stage: Stage, dir: &Path) -> Result<(), PipelineError> {
        let _ = writeln!(self.out, "# {stage}\n{}", Invocation::new("rm").arg("-rf").arg(dir));
        Ok(())
    }
}
