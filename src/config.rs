//! Pipeline configuration
//!
//! Settings come from four layers, lowest precedence first:
//!
//! 1. built-in defaults (see `covreport_core::layout` and `covreport_core::flags`)
//! 2. the JSON config file (`covreport.json` in the source directory, or `--config <FILE>`)
//! 3. `COVREPORT_*` environment variables
//! 4. command-line flags
//!
//! Each non-default layer is a [`ConfigLayer`]; [`PipelineConfig::resolve`] folds them together. Paths are not
//! checked for existence here: a wrong path surfaces later as a failure of the tool that reads it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use covreport_core::{flags, layout, tools};
use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the LLVM install prefix.
pub const LLVM_ROOT_ENV: &str = "COVREPORT_LLVM_ROOT";

/// Environment variable naming the GoogleTest package config directory.
pub const GTEST_DIR_ENV: &str = "COVREPORT_GTEST_DIR";

/// Environment variable naming the `cmake` program.
pub const CMAKE_ENV: &str = "COVREPORT_CMAKE";

/// Errors produced while resolving configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("no LLVM toolchain root configured")]
    #[diagnostic(
        code(covreport::config::missing_toolchain_root),
        help("pass --llvm-root <DIR>, set COVREPORT_LLVM_ROOT, or add \"llvm_root\" to covreport.json")
    )]
    MissingToolchainRoot,

    #[error("config file '{}' does not exist", .path.display())]
    #[diagnostic(code(covreport::config::not_found))]
    ConfigFileNotFound { path: PathBuf },

    #[error("failed to read config file '{}'", .path.display())]
    #[diagnostic(code(covreport::config::read))]
    ConfigFileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file '{}'", .path.display())]
    #[diagnostic(
        code(covreport::config::parse),
        help("keys: llvm_root, build_dir, gtest_dir, test_executable, generator, cmake, cxx_standard, project_prefix")
    )]
    ConfigFileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot determine the current directory")]
    #[diagnostic(code(covreport::config::cwd), help("pass --source-dir <DIR>"))]
    NoWorkingDirectory(#[source] io::Error),
}

/// One layer of optional settings.
///
/// The same shape is deserialized from `covreport.json`, read from the environment and filled in from CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    /// LLVM install prefix (the directory containing `bin/llvm-cov`)
    pub llvm_root: Option<PathBuf>,
    /// Build directory
    pub build_dir: Option<PathBuf>,
    /// GoogleTest package config directory (`GTest_DIR`)
    pub gtest_dir: Option<PathBuf>,
    /// Test executable, relative to the build directory
    pub test_executable: Option<PathBuf>,
    /// CMake generator name
    pub generator: Option<String>,
    /// `cmake` program
    pub cmake: Option<PathBuf>,
    /// C++ language standard passed as `-std=`
    pub cxx_standard: Option<String>,
    /// Prefix of the project's own CMake options
    pub project_prefix: Option<String>,
}

impl ConfigLayer {
    /// Parse a layer from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load a layer from a config file. Relative paths inside it are taken relative to `base`.
    pub fn load(path: &Path, base: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::ConfigFileNotFound { path: path.to_path_buf() }
            } else {
                ConfigError::ConfigFileRead {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let layer = Self::from_json_str(&text).map_err(|source| ConfigError::ConfigFileParse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(layer.rebased(base))
    }

    /// Read the `COVREPORT_*` variables through `lookup`.
    ///
    /// Empty values count as unset.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty()).map(PathBuf::from);
        Self {
            llvm_root: get(LLVM_ROOT_ENV),
            gtest_dir: get(GTEST_DIR_ENV),
            cmake: get(CMAKE_ENV),
            ..Self::default()
        }
    }

    /// Fill every unset field of `self` from `lower`.
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            llvm_root: self.llvm_root.or(lower.llvm_root),
            build_dir: self.build_dir.or(lower.build_dir),
            gtest_dir: self.gtest_dir.or(lower.gtest_dir),
            test_executable: self.test_executable.or(lower.test_executable),
            generator: self.generator.or(lower.generator),
            cmake: self.cmake.or(lower.cmake),
            cxx_standard: self.cxx_standard.or(lower.cxx_standard),
            project_prefix: self.project_prefix.or(lower.project_prefix),
        }
    }

    /// Resolve the directory-valued paths against `base`.
    ///
    /// `test_executable` stays relative to the build directory. `cmake` is only rebased when it names a path
    /// rather than a bare program to look up on `PATH`.
    fn rebased(self, base: &Path) -> Self {
        let rebase = |p: Option<PathBuf>| p.map(|p| if p.is_absolute() { p } else { base.join(p) });
        let cmake = self.cmake.map(|p| {
            if p.is_absolute() || p.components().count() == 1 {
                p
            } else {
                base.join(p)
            }
        });
        Self {
            llvm_root: rebase(self.llvm_root),
            build_dir: rebase(self.build_dir),
            gtest_dir: rebase(self.gtest_dir),
            cmake,
            ..self
        }
    }
}

/// Fully resolved pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Project source directory (CMake `-S`)
    pub source_dir: PathBuf,
    /// Build directory (CMake `-B`)
    pub build_dir: PathBuf,
    /// LLVM install prefix
    pub toolchain_root: PathBuf,
    /// GoogleTest package config directory, if one is known
    pub gtest_dir: Option<PathBuf>,
    /// Test executable relative to `build_dir`
    pub test_executable: PathBuf,
    pub generator: String,
    pub cmake: PathBuf,
    pub cxx_standard: String,
    pub project_prefix: String,
}

impl PipelineConfig {
    /// Create a config with defaults for everything but the two roots.
    pub fn new(source_dir: impl Into<PathBuf>, toolchain_root: impl Into<PathBuf>) -> Self {
        let source_dir = source_dir.into();
        Self {
            build_dir: source_dir.join(layout::BUILD_DIR),
            source_dir,
            toolchain_root: toolchain_root.into(),
            gtest_dir: None,
            test_executable: PathBuf::from(layout::TEST_EXECUTABLE),
            generator: flags::DEFAULT_GENERATOR.to_string(),
            cmake: PathBuf::from(tools::CMAKE),
            cxx_standard: flags::DEFAULT_CXX_STANDARD.to_string(),
            project_prefix: flags::DEFAULT_PROJECT_PREFIX.to_string(),
        }
    }

    /// Set the build directory
    pub fn with_build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = dir.into();
        self
    }

    /// Set the GoogleTest package directory
    pub fn with_gtest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.gtest_dir = Some(dir.into());
        self
    }

    /// Set the test executable (relative to the build directory)
    pub fn with_test_executable(mut self, exe: impl Into<PathBuf>) -> Self {
        self.test_executable = exe.into();
        self
    }

    /// Set the `cmake` program
    pub fn with_cmake(mut self, cmake: impl Into<PathBuf>) -> Self {
        self.cmake = cmake.into();
        self
    }

    /// Resolve the final configuration for `source_dir`.
    ///
    /// `config_file` is an explicitly requested file, which must exist. Without one, `covreport.json` in the source
    /// directory is used when present.
    pub fn resolve(
        source_dir: &Path,
        config_file: Option<&Path>,
        cli: ConfigLayer,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let merged = merge_layers(source_dir, config_file, cli, env)?;
        Self::from_layer(source_dir, merged)
    }

    /// Apply a merged layer on top of the defaults.
    #[tracing::instrument(skip_all, fields(source_dir = %source_dir.display()))]
    pub fn from_layer(source_dir: &Path, merged: ConfigLayer) -> Result<Self, ConfigError> {
        let Some(toolchain_root) = merged.llvm_root else {
            return Err(ConfigError::MissingToolchainRoot);
        };

        let mut config = PipelineConfig::new(source_dir, toolchain_root);
        if let Some(build_dir) = merged.build_dir {
            config.build_dir = build_dir;
        }
        config.gtest_dir = merged.gtest_dir.or_else(|| sibling_gtest_dir(source_dir));
        if let Some(exe) = merged.test_executable {
            config.test_executable = exe;
        }
        if let Some(generator) = merged.generator {
            config.generator = generator;
        }
        if let Some(cmake) = merged.cmake {
            config.cmake = cmake;
        }
        if let Some(standard) = merged.cxx_standard {
            config.cxx_standard = standard;
        }
        if let Some(prefix) = merged.project_prefix {
            config.project_prefix = prefix;
        }

        tracing::debug!(?config, "resolved configuration");
        Ok(config)
    }

    /// Path of an executable inside the toolchain's `bin/` directory.
    pub fn tool(&self, name: &str) -> PathBuf {
        self.toolchain_root.join(tools::TOOLCHAIN_BIN_DIR).join(name)
    }

    /// Derive every artifact path from the roots.
    pub fn paths(&self) -> PipelinePaths {
        let report_dir = self.build_dir.join(layout::REPORT_DIR);
        PipelinePaths {
            source_dir: self.source_dir.clone(),
            build_dir: self.build_dir.clone(),
            executable: self.build_dir.join(&self.test_executable),
            profraw: self.build_dir.join(layout::PROFRAW_FILE),
            profdata: self.build_dir.join(layout::PROFDATA_FILE),
            report_index: report_dir.join(layout::REPORT_INDEX),
            report_dir,
        }
    }
}

/// Paths every stage reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub executable: PathBuf,
    pub profraw: PathBuf,
    pub profdata: PathBuf,
    pub report_dir: PathBuf,
    pub report_index: PathBuf,
}

/// Fold CLI, environment and config-file layers, highest precedence first.
pub fn merge_layers(
    source_dir: &Path,
    config_file: Option<&Path>,
    cli: ConfigLayer,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ConfigLayer, ConfigError> {
    let file_layer = match config_file {
        Some(path) => {
            ConfigLayer::load(path, config_base(path))?
        }
        None => {
            let default_path = source_dir.join(layout::CONFIG_FILE);
            if default_path.is_file() {
                tracing::debug!("using config file {}", default_path.display());
                ConfigLayer::load(&default_path, source_dir)?
            } else {
                ConfigLayer::default()
            }
        }
    };
    Ok(cli.or(ConfigLayer::from_env(env)).or(file_layer))
}

/// Directory that relative paths inside the config file at `path` resolve against.
///
/// A bare file name has an empty parent, which keeps its paths relative to the working directory the file was
/// read from.
fn config_base(path: &Path) -> &Path {
    path.parent().unwrap_or(Path::new(""))
}

/// The build directory a merged layer selects, without requiring a toolchain.
pub fn build_dir_for(source_dir: &Path, merged: &ConfigLayer) -> PathBuf {
    merged
        .build_dir
        .clone()
        .unwrap_or_else(|| source_dir.join(layout::BUILD_DIR))
}

/// Resolve the source directory: the explicit one, else the current working directory.
pub fn resolve_source_dir(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match explicit {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().map_err(ConfigError::NoWorkingDirectory),
    }
}

/// `<source>/../googletest/install/lib/cmake/GTest`, if that directory exists.
fn sibling_gtest_dir(source_dir: &Path) -> Option<PathBuf> {
    let candidate: PathBuf = layout::GTEST_SIBLING_DIR
        .iter()
        .fold(source_dir.to_path_buf(), |dir, segment| dir.join(segment));
    candidate.is_dir().then_some(candidate)
}
