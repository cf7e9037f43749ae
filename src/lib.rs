#![forbid(unsafe_code)]
//! covreport: LLVM source-based coverage for CMake C++ test suites
//!
//! The crate drives external tools in a fixed order: CMake configures and builds an instrumented Debug tree, the
//! test binary runs once with `LLVM_PROFILE_FILE` set, `llvm-profdata` merges the raw profile and `llvm-cov`
//! renders an HTML report. It implements none of those tools itself.
//!
//! ## Layout
//!
//! - [`config`] - layered configuration (defaults, `covreport.json`, `COVREPORT_*`, flags)
//! - [`pipeline`] - stages, command lines, the executor boundary and stage errors
//! - [`cli`] - clap front-end and exit-code policy
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `pipeline` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod version;

pub use config::{ConfigError, ConfigLayer, PipelineConfig, PipelinePaths};
pub use pipeline::{Mode, Pipeline, PipelineError, PipelineOutcome, Stage};
