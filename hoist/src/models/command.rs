//! External command models

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::shell_quote;

/// Where a command runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// On the target host, through the configured execution policy
    #[default]
    Host,

    /// On the machine running hoist, never elevated
    Controller,
}

/// Describes a failure that is really an "already done" outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRule {
    /// Exit codes that mean the desired state already exists
    pub exit_codes: Vec<i32>,

    /// Substrings of stderr that mean the desired state already exists
    pub stderr_patterns: Vec<String>,
}

impl ConflictRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_codes.push(code);
        self
    }

    pub fn stderr_contains(mut self, pattern: impl Into<String>) -> Self {
        self.stderr_patterns.push(pattern.into());
        self
    }

    /// Check whether a failed result is an idempotent conflict
    pub fn matches(&self, result: &CommandResult) -> bool {
        if result.success() {
            return false;
        }

        let code_match = result
            .code
            .map(|code| self.exit_codes.contains(&code))
            .unwrap_or(false);

        code_match
            || self
                .stderr_patterns
                .iter()
                .any(|pattern| result.stderr.contains(pattern.as_str()))
    }
}

/// A single external command invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to run
    pub program: String,

    /// Arguments, passed without a shell
    pub args: Vec<String>,

    /// Payload written to the process stdin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,

    /// Whether a non-zero exit aborts the caller
    pub fatal: bool,

    /// Failures that count as success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ConflictRule>,

    /// Where the command runs
    #[serde(default)]
    pub scope: Scope,

    /// Failure means a generated configuration was rejected
    #[serde(default)]
    pub validator: bool,
}

impl CommandSpec {
    /// Create a fatal, host-scoped command with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            fatal: true,
            conflict: None,
            scope: Scope::Host,
            validator: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feed `payload` to the process stdin
    pub fn stdin(mut self, payload: impl Into<String>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    /// Return the result on non-zero exit instead of failing
    pub fn non_fatal(mut self) -> Self {
        self.fatal = false;
        self
    }

    /// Treat failures matching `rule` as success
    pub fn tolerate(mut self, rule: ConflictRule) -> Self {
        self.conflict = Some(rule);
        self
    }

    /// Mark as a configuration check; failures become validation errors
    pub fn validator(mut self) -> Self {
        self.validator = true;
        self
    }

    /// Run on the controller instead of the target host
    pub fn on_controller(mut self) -> Self {
        self.scope = Scope::Controller;
        self
    }

    /// Program followed by its arguments
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Shell-quoted rendering, used for logs and for remote transports
    pub fn command_line(&self) -> String {
        self.argv()
            .iter()
            .map(|part| shell_quote(part))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Outcome of one command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}
