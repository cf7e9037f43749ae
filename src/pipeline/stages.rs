//! Command lines for each stage, plus the filesystem helpers the stages need.
//!
//! The builders only assemble [`Invocation`]s; running them is the executor's job. The argument order and
//! spelling here is what CMake and the LLVM tools see.

use std::fs;
use std::io;
use std::path::Path;

use covreport_core::{flags, tools};

use super::Invocation;
use crate::config::PipelineConfig;

/// Remove `dir` and everything under it.
///
/// Returns `Ok(false)` when there was nothing to remove.
pub fn clean_build_dir(dir: &Path) -> io::Result<bool> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// `cmake -G ... -S <source> -B <build>` with the instrumented Debug settings.
pub fn configure(config: &PipelineConfig) -> Invocation {
    let (enable_testing, fetch_gtest, find_gtest) = flags::project_option_names(&config.project_prefix);

    let invocation = Invocation::new(&config.cmake)
        .arg(flags::CMAKE_GENERATOR)
        .arg(&config.generator)
        .arg(flags::CMAKE_SOURCE_DIR)
        .arg(&config.source_dir)
        .arg(flags::CMAKE_BUILD_DIR)
        .arg(&config.build_dir)
        .arg(flags::define(flags::BUILD_TYPE_VAR, flags::BUILD_TYPE_DEBUG))
        .arg(flags::define_bool(flags::EXPORT_COMPILE_COMMANDS_VAR, true))
        .arg_with_prefix(&define_prefix(flags::C_COMPILER_VAR), &config.tool(tools::CLANG))
        .arg_with_prefix(&define_prefix(flags::CXX_COMPILER_VAR), &config.tool(tools::CLANGXX))
        .arg(flags::define(flags::CXX_FLAGS_VAR, &flags::cxx_flags(&config.cxx_standard)))
        .arg(flags::define_bool(&enable_testing, true))
        .arg(flags::define_bool(&fetch_gtest, false))
        .arg(flags::define_bool(&find_gtest, true));

    match &config.gtest_dir {
        Some(dir) => invocation.arg_with_prefix(&define_prefix(flags::GTEST_DIR_VAR), dir),
        None => invocation,
    }
}

/// `cmake --build <build>`
pub fn build(cmake: &Path, build_dir: &Path) -> Invocation {
    Invocation::new(cmake).arg(flags::CMAKE_BUILD).arg(build_dir)
}

/// Run the test executable with no arguments, sending its raw profile to `profraw`.
pub fn run_tests(executable: &Path, profraw: &Path) -> Invocation {
    Invocation::new(executable).env(tools::PROFILE_FILE_ENV, profraw)
}

/// `llvm-profdata merge -sparse <profraw> -o <profdata>`
pub fn merge_profile(profdata_tool: &Path, profraw: &Path, profdata: &Path) -> Invocation {
    Invocation::new(profdata_tool)
        .arg(flags::PROFDATA_MERGE)
        .arg(flags::PROFDATA_SPARSE)
        .arg(profraw)
        .arg(flags::PROFDATA_OUTPUT)
        .arg(profdata)
}

/// `llvm-cov show <exe> -instr-profile=<profdata> -output-dir=<dir> -format=html --show-*-summary`
pub fn generate_report(cov_tool: &Path, executable: &Path, profdata: &Path, output_dir: &Path) -> Invocation {
    Invocation::new(cov_tool)
        .arg(flags::COV_SHOW)
        .arg(executable)
        .arg_with_prefix(flags::COV_INSTR_PROFILE_PREFIX, profdata)
        .arg_with_prefix(flags::COV_OUTPUT_DIR_PREFIX, output_dir)
        .arg(flags::COV_FORMAT_HTML)
        .args(flags::COV_SUMMARY_FLAGS)
}

fn define_prefix(name: &str) -> String {
    format!("-D{name}=")
}
