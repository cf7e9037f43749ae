//! A single external command: program, ordered arguments and environment overrides.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// An external command ready to be executed, printed or inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append `<prefix><path>` as a single argument (e.g. `-instr-profile=<file>`).
    pub fn arg_with_prefix(self, prefix: &str, path: &Path) -> Self {
        let mut joined = OsString::from(prefix);
        joined.push(path.as_os_str());
        self.arg(joined)
    }

    /// Add an environment variable on top of the inherited environment.
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_envs(&self) -> &[(OsString, OsString)] {
        &self.envs
    }

    /// Lossy string view of the arguments, for assertions and logs.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    /// Build a `std::process::Command`. Stdio is left at its inherited default.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        command
    }
}

/// Renders as a shell-like line: `KEY=value program arg...`, quoting words that need it.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words: Vec<String> = Vec::with_capacity(self.envs.len() + self.args.len() + 1);
        for (key, value) in &self.envs {
            words.push(format!("{}={}", key.to_string_lossy(), quote(value)));
        }
        words.push(quote(self.program.as_os_str()));
        words.extend(self.args.iter().map(|a| quote(a)));
        write!(f, "{}", words.join(" "))
    }
}

/// Single-quote a word if it is empty or contains shell-significant characters.
fn quote(word: &OsStr) -> String {
    let text = word.to_string_lossy();
    let plain = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '=' | '+' | ':' | ',' | '@'));
    if plain {
        text.into_owned()
    } else {
        format!("'{}'", text.replace('\'', r"'\''"))
    }
}
