//! In-memory executor that records commands instead of running them

use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::DeployError;
use crate::exec::executor::CommandExecutor;
use crate::models::command::{CommandResult, CommandSpec};

/// Records every command and answers from scripted responses
///
/// A response is chosen by the first registered pattern contained in the
/// rendered command line. Unmatched commands succeed with empty output.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<CommandSpec>>,
    responses: Mutex<Vec<(String, CommandResult)>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands containing `pattern` with `result`
    pub fn respond(&self, pattern: impl Into<String>, result: CommandResult) -> &Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push((pattern.into(), result));
        }
        self
    }

    /// Every command executed so far
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Rendered command lines executed so far
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::command_line).collect()
    }

    /// Whether any executed command line contains `pattern`
    pub fn ran(&self, pattern: &str) -> bool {
        self.command_lines().iter().any(|line| line.contains(pattern))
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandResult, DeployError> {
        let line = spec.command_line();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(spec.clone());
        }

        let response = self.responses.lock().ok().and_then(|responses| {
            responses
                .iter()
                .find(|(pattern, _)| line.contains(pattern.as_str()))
                .map(|(_, result)| result.clone())
        });

        Ok(response.unwrap_or_else(|| CommandResult::ok("")))
    }
}
