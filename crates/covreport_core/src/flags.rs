//! Flag spellings for CMake, `llvm-profdata` and `llvm-cov`.

// =====================================================================
// CMake
// =====================================================================

/// Generator selection flag (`-G <generator>`).
pub const CMAKE_GENERATOR: &str = "-G";

/// Source directory flag (`-S <dir>`).
pub const CMAKE_SOURCE_DIR: &str = "-S";

/// Binary (build) directory flag (`-B <dir>`).
pub const CMAKE_BUILD_DIR: &str = "-B";

/// Build-mode flag (`--build <dir>`).
pub const CMAKE_BUILD: &str = "--build";

/// Build type cache variable and the value the pipeline always uses.
pub const BUILD_TYPE_VAR: &str = "CMAKE_BUILD_TYPE";
pub const BUILD_TYPE_DEBUG: &str = "Debug";

/// Emits `compile_commands.json` into the build directory.
pub const EXPORT_COMPILE_COMMANDS_VAR: &str = "CMAKE_EXPORT_COMPILE_COMMANDS";

pub const C_COMPILER_VAR: &str = "CMAKE_C_COMPILER";
pub const CXX_COMPILER_VAR: &str = "CMAKE_CXX_COMPILER";
pub const CXX_FLAGS_VAR: &str = "CMAKE_CXX_FLAGS";

/// Generator used when none is configured.
pub const DEFAULT_GENERATOR: &str = "Ninja";

/// Language standard passed to the compiler when none is configured.
pub const DEFAULT_CXX_STANDARD: &str = "c++20";

/// Project prefix for the project-specific cache options when none is configured.
pub const DEFAULT_PROJECT_PREFIX: &str = "ASS";

/// Compiler flags that turn on source-based coverage with MC/DC.
pub const COVERAGE_COMPILE_FLAGS: [&str; 3] = ["-fprofile-instr-generate", "-fcoverage-mapping", "-fcoverage-mcdc"];

/// Cache variable naming the test-framework package config directory.
pub const GTEST_DIR_VAR: &str = "GTest_DIR";

/// Format a cache definition: `-D<name>=<value>`.
///
/// ## Examples
/// ```rust
/// assert_eq!(covreport_core::flags::define("CMAKE_BUILD_TYPE", "Debug"), "-DCMAKE_BUILD_TYPE=Debug");
/// ```
pub fn define(name: &str, value: &str) -> String {
    format!("-D{name}={value}")
}

/// Format a boolean cache definition as `ON`/`OFF`.
pub fn define_bool(name: &str, value: bool) -> String {
    define(name, if value { "ON" } else { "OFF" })
}

/// The combined `CMAKE_CXX_FLAGS` value: the language standard followed by the coverage flags.
///
/// ## Examples
/// ```rust
/// assert_eq!(
///     covreport_core::flags::cxx_flags("c++20"),
///     "-std=c++20 -fprofile-instr-generate -fcoverage-mapping -fcoverage-mcdc"
/// );
/// ```
pub fn cxx_flags(standard: &str) -> String {
    let mut flags = format!("-std={standard}");
    for flag in COVERAGE_COMPILE_FLAGS {
        flags.push(' ');
        flags.push_str(flag);
    }
    flags
}

/// Names of the three project-specific switches for a given prefix.
///
/// Returns `(enable_testing, fetch_google_test, find_google_test_package)`.
pub fn project_option_names(prefix: &str) -> (String, String, String) {
    (
        format!("{prefix}_ENABLE_TESTING"),
        format!("{prefix}_FETCH_GOOGLE_TEST"),
        format!("{prefix}_FIND_GOOGLE_TEST_PACKAGE"),
    )
}

// =====================================================================
// llvm-profdata
// =====================================================================

/// `llvm-profdata` subcommand.
pub const PROFDATA_MERGE: &str = "merge";

/// Merge mode that skips zero counters.
pub const PROFDATA_SPARSE: &str = "-sparse";

/// Output flag for the merged profile.
pub const PROFDATA_OUTPUT: &str = "-o";

// =====================================================================
// llvm-cov
// =====================================================================

/// `llvm-cov` subcommand.
pub const COV_SHOW: &str = "show";

/// Prefix for the indexed profile argument (`-instr-profile=<file>`).
pub const COV_INSTR_PROFILE_PREFIX: &str = "-instr-profile=";

/// Prefix for the output directory argument (`-output-dir=<dir>`).
pub const COV_OUTPUT_DIR_PREFIX: &str = "-output-dir=";

/// Report format selection.
pub const COV_FORMAT_HTML: &str = "-format=html";

/// Summary sections enabled in the HTML report, in the order they are passed.
pub const COV_SUMMARY_FLAGS: [&str; 4] = [
    "--show-branch-summary",
    "--show-instantiation-summary",
    "--show-mcdc-summary",
    "--show-region-summary",
];
