//! Names of the external programs the pipeline drives.

/// Build-system front-end, looked up on `PATH` unless configured otherwise.
pub const CMAKE: &str = "cmake";

/// C compiler inside the toolchain `bin/` directory.
pub const CLANG: &str = "clang";

/// C++ compiler inside the toolchain `bin/` directory.
pub const CLANGXX: &str = "clang++";

/// Profile-data merge tool inside the toolchain `bin/` directory.
pub const LLVM_PROFDATA: &str = "llvm-profdata";

/// Coverage report tool inside the toolchain `bin/` directory.
pub const LLVM_COV: &str = "llvm-cov";

/// Directory under the toolchain root that holds the executables.
pub const TOOLCHAIN_BIN_DIR: &str = "bin";

/// Environment variable an instrumented binary reads to decide where to write its raw profile.
pub const PROFILE_FILE_ENV: &str = "LLVM_PROFILE_FILE";
