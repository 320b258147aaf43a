//! Process-backed command executor

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::errors::DeployError;
use crate::exec::policy::ExecutionPolicy;
use crate::models::command::{CommandResult, CommandSpec};

/// Runs a command and captures its outcome
///
/// Implementations never interpret the exit status; that is the job of
/// [`crate::exec::runner::CommandRunner`].
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandResult, DeployError>;
}

/// Executor spawning real processes under an [`ExecutionPolicy`]
#[derive(Debug, Clone, Default)]
pub struct HostExecutor {
    policy: ExecutionPolicy,
}

impl HostExecutor {
    pub fn new(policy: ExecutionPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl CommandExecutor for HostExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandResult, DeployError> {
        let argv = self.policy.wrap(spec);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| DeployError::InvalidSpec("empty command".to_string()))?;
        debug!("Spawning: {:?}", argv);

        let mut child = Command::new(program)
            .args(args)
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DeployError::Spawn {
                command: spec.command_line(),
                source,
            })?;

        let pipe = child.stdin.take();
        let payload = spec.stdin.as_deref();
        let feed = async move {
            if let (Some(mut pipe), Some(payload)) = (pipe, payload) {
                pipe.write_all(payload.as_bytes()).await?;
                pipe.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        if let Err(e) = fed {
            debug!("Writing stdin of `{}` failed: {}", spec, e);
        }

        Ok(CommandResult {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
