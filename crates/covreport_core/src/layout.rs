//! File and directory names inside a source tree and its build directory.

/// Build directory name relative to the source directory.
pub const BUILD_DIR: &str = "build";

/// Test executable path relative to the build directory.
pub const TEST_EXECUTABLE: &str = "tests/ass_tests";

/// Raw profile written by the instrumented test run.
pub const PROFRAW_FILE: &str = "profile.profraw";

/// Indexed profile produced by the merge stage.
pub const PROFDATA_FILE: &str = "profile.profdata";

/// HTML report directory.
pub const REPORT_DIR: &str = "report";

/// Entry page `llvm-cov show -format=html` writes into the report directory.
pub const REPORT_INDEX: &str = "index.html";

/// Optional per-project config file, looked up in the source directory.
pub const CONFIG_FILE: &str = "covreport.json";

/// Sibling-directory convention for a pre-installed GoogleTest package, relative to the source directory.
pub const GTEST_SIBLING_DIR: [&str; 6] = ["..", "googletest", "install", "lib", "cmake", "GTest"];
