//! Logging command wrapper
//!
//! Logs each invocation and its output, then maps the exit status to a
//! result according to the command's fatal flag and conflict rule.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::errors::DeployError;
use crate::exec::executor::CommandExecutor;
use crate::models::command::{CommandResult, CommandSpec};

/// Sole boundary between the orchestrator and the host
#[derive(Clone)]
pub struct CommandRunner {
    executor: Arc<dyn CommandExecutor>,
}

impl CommandRunner {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Run one command
    pub async fn run(&self, spec: &CommandSpec) -> Result<CommandResult, DeployError> {
        info!("Executing: {}", spec);
        let result = self.executor.execute(spec).await?;

        let stdout = result.stdout.trim_end();
        if !stdout.is_empty() {
            info!("Output: {}", stdout);
        }

        if result.success() {
            return Ok(result);
        }

        if let Some(rule) = &spec.conflict {
            if rule.matches(&result) {
                info!(
                    "Already in place, continuing: {} ({})",
                    spec,
                    result.stderr.trim()
                );
                return Ok(result);
            }
        }

        if !spec.fatal {
            warn!("Command exited with {:?}: {}", result.code, spec);
            return Ok(result);
        }

        error!("Command failed: {}", spec);
        error!("Error output: {}", result.stderr.trim_end());

        if spec.validator {
            return Err(DeployError::ConfigValidation {
                command: spec.command_line(),
                stderr: result.stderr,
            });
        }

        Err(DeployError::CommandFailed {
            command: spec.command_line(),
            code: result.code,
            stderr: result.stderr,
        })
    }

    /// Run commands in order, stopping at the first error
    pub async fn run_all(&self, specs: &[CommandSpec]) -> Result<(), DeployError> {
        for spec in specs {
            self.run(spec).await?;
        }
        Ok(())
    }
}
