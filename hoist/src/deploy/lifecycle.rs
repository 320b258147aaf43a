//! Service lifecycle operations

use tracing::{error, info};

use crate::app::options::LifecycleOptions;
use crate::errors::DeployError;
use crate::exec::runner::CommandRunner;
use crate::models::command::{CommandResult, CommandSpec};

/// Thin layer over systemd for one unit
#[derive(Clone)]
pub struct ServiceManager {
    runner: CommandRunner,
    service: String,
    options: LifecycleOptions,
}

impl ServiceManager {
    pub fn new(runner: CommandRunner, service: impl Into<String>, options: LifecycleOptions) -> Self {
        Self {
            runner,
            service: service.into(),
            options,
        }
    }

    fn systemctl(&self, verb: &str) -> CommandSpec {
        CommandSpec::new("systemctl").args([verb, self.service.as_str()])
    }

    pub fn enable_command(&self) -> CommandSpec {
        self.systemctl("enable")
    }

    pub fn start_command(&self) -> CommandSpec {
        self.systemctl("start")
    }

    pub fn stop_command(&self) -> CommandSpec {
        self.systemctl("stop")
    }

    pub fn restart_command(&self) -> CommandSpec {
        self.systemctl("restart")
    }

    /// `systemctl status` exits non-zero for stopped units, which is still an answer
    pub fn status_command(&self) -> CommandSpec {
        self.systemctl("status").non_fatal()
    }

    pub fn is_active_command(&self) -> CommandSpec {
        self.systemctl("is-active").non_fatal()
    }

    pub fn journal_command(&self) -> CommandSpec {
        CommandSpec::new("journalctl").args([
            "-u".to_string(),
            self.service.clone(),
            "--no-pager".to_string(),
            "-n".to_string(),
            self.options.log_lines.to_string(),
        ])
    }

    pub async fn start(&self) -> Result<CommandResult, DeployError> {
        info!("Starting {}...", self.service);
        self.runner.run(&self.start_command()).await
    }

    pub async fn stop(&self) -> Result<CommandResult, DeployError> {
        info!("Stopping {}...", self.service);
        self.runner.run(&self.stop_command()).await
    }

    pub async fn restart(&self) -> Result<CommandResult, DeployError> {
        info!("Restarting {}...", self.service);
        self.runner.run(&self.restart_command()).await
    }

    pub async fn status(&self) -> Result<CommandResult, DeployError> {
        info!("Status of {}:", self.service);
        self.runner.run(&self.status_command()).await
    }

    pub async fn logs(&self) -> Result<CommandResult, DeployError> {
        info!("Showing logs of {}...", self.service);
        self.runner.run(&self.journal_command()).await
    }

    /// Query the service manager, returning the reported state
    pub async fn active_state(&self) -> Result<String, DeployError> {
        let result = self.runner.run(&self.is_active_command()).await?;
        Ok(result.stdout.trim().to_string())
    }

    /// Enable and start the service, wait for it to settle, then confirm it is active
    ///
    /// On failure the recent journal is logged before the error is returned.
    pub async fn enable_and_verify(&self) -> Result<(), DeployError> {
        info!("Starting application {}...", self.service);
        self.runner.run(&self.enable_command()).await?;
        self.runner.run(&self.start_command()).await?;

        info!(
            "Waiting {:?} for {} to settle",
            self.options.settle_interval, self.service
        );
        tokio::time::sleep(self.options.settle_interval).await;

        let state = self.active_state().await?;
        if state == "active" {
            info!("Application started successfully");
            return Ok(());
        }

        error!("Application failed to start (state: {:?})", state);
        self.runner.run(&self.journal_command().non_fatal()).await?;

        Err(DeployError::StartupVerification {
            service: self.service.clone(),
            status: if state.is_empty() {
                "unknown".to_string()
            } else {
                state
            },
        })
    }
}
