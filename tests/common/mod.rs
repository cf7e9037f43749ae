//! A fake CMake + LLVM toolchain made of POSIX shell scripts.
//!
//! - `cmake` appends its arguments to `cmake.log`; `-G ... -B <dir>` creates the build dir and `--build <dir>`
//!   installs the test executable from a template
//! - the test executable writes `raw-profile` to `$LLVM_PROFILE_FILE` and exits with the configured status
//! - `llvm-profdata merge -sparse <raw> -o <out>` copies the raw file
//! - `llvm-cov show ... -output-dir=<dir>` writes `<dir>/index.html`

#![allow(dead_code, clippy::unwrap_used)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use covreport::PipelineConfig;
use tempfile::TempDir;

/// Writing an executable while another test thread forks can make exec fail with ETXTBSY.
static SERIAL: Mutex<()> = Mutex::new(());

pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct FakeToolchain {
    pub temp: TempDir,
    pub source_dir: PathBuf,
    pub llvm_root: PathBuf,
    pub cmake: PathBuf,
    pub cmake_log: PathBuf,
    test_template: PathBuf,
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

impl FakeToolchain {
    /// Toolchain whose test executable exits with `test_exit`.
    pub fn new(test_exit: i32) -> Self {
        let temp = TempDir::new().unwrap();
        let source_dir = temp.path().join("project");
        let llvm_root = temp.path().join("llvm");
        let tools_dir = temp.path().join("tools");
        fs::create_dir_all(&source_dir).unwrap();
        fs::create_dir_all(llvm_root.join("bin")).unwrap();
        fs::create_dir_all(&tools_dir).unwrap();

        let test_template = tools_dir.join("ass_tests.template");
        write_script(
            &test_template,
            &format!("printf 'raw-profile' > \"$LLVM_PROFILE_FILE\"\nexit {test_exit}\n"),
        );

        let cmake_log = temp.path().join("cmake.log");
        let cmake = tools_dir.join("cmake");
        write_script(
            &cmake,
            &format!(
                r#"echo "$*" >> '{log}'
if [ "$1" = "-G" ]; then
  mkdir -p "$6"
elif [ "$1" = "--build" ]; then
  mkdir -p "$2/tests"
  cp '{template}' "$2/tests/ass_tests"
  chmod 755 "$2/tests/ass_tests"
fi
"#,
                log = cmake_log.display(),
                template = test_template.display(),
            ),
        );

        write_script(
            &llvm_root.join("bin/llvm-profdata"),
            r#"[ "$1" = "merge" ] && [ "$2" = "-sparse" ] && [ "$4" = "-o" ] || exit 64
[ -f "$3" ] || { echo "llvm-profdata: $3: No such file" >&2; exit 1; }
cp "$3" "$5"
"#,
        );

        write_script(
            &llvm_root.join("bin/llvm-cov"),
            r#"[ "$1" = "show" ] || exit 64
out=""
for a in "$@"; do
  case "$a" in
    -instr-profile=*) [ -f "${a#-instr-profile=}" ] || exit 1 ;;
    -output-dir=*) out="${a#-output-dir=}" ;;
  esac
done
[ -n "$out" ] || exit 64
mkdir -p "$out"
echo "<html><body>$2</body></html>" > "$out/index.html"
"#,
        );

        Self {
            temp,
            source_dir,
            llvm_root,
            cmake,
            cmake_log,
            test_template,
        }
    }

    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::new(&self.source_dir, &self.llvm_root).with_cmake(&self.cmake)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.source_dir.join("build")
    }

    /// Pretend an earlier configure+build already happened.
    pub fn prebuild(&self) {
        let tests = self.build_dir().join("tests");
        fs::create_dir_all(&tests).unwrap();
        fs::copy(&self.test_template, tests.join("ass_tests")).unwrap();
        fs::set_permissions(tests.join("ass_tests"), fs::Permissions::from_mode(0o755)).unwrap();
        fs::write(self.build_dir().join("CMakeCache.txt"), "cache").unwrap();
    }

    pub fn remove_tool(&self, name: &str) {
        fs::remove_file(self.llvm_root.join("bin").join(name)).unwrap();
    }

    pub fn cmake_calls(&self) -> Vec<String> {
        fs::read_to_string(&self.cmake_log)
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
