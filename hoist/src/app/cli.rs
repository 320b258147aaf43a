//! Command line interface

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser};

use crate::errors::DeployError;
use crate::exec::policy::{Privilege, SshTarget};
use crate::logs::LogLevel;
use crate::models::deployment::{DeploymentSpec, DEFAULT_PORT, DEFAULT_PROFILE};
use crate::storage::settings::Settings;

#[derive(Debug, Parser)]
#[command(
    name = "hoist",
    version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("GIT_HASH"),
        ", built ",
        env!("BUILD_TIME"),
        ")"
    )
)]
#[command(about = "Deploy a Spring Boot application to an Ubuntu host", long_about = None)]
#[command(group(
    ArgGroup::new("action")
        .args(["deploy", "start", "stop", "restart", "status", "logs", "health", "exec"])
        .multiple(false)
))]
pub struct Cli {
    /// Application name
    #[arg(long)]
    pub app_name: String,

    /// Path to JAR file
    #[arg(long)]
    pub jar_file: PathBuf,

    /// Application port
    #[arg(long, default_value_t = DEFAULT_PORT, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Spring profile
    #[arg(long, default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Deploy application
    #[arg(long)]
    pub deploy: bool,

    /// Start application
    #[arg(long)]
    pub start: bool,

    /// Stop application
    #[arg(long)]
    pub stop: bool,

    /// Restart application
    #[arg(long)]
    pub restart: bool,

    /// Show application status
    #[arg(long)]
    pub status: bool,

    /// Show application logs
    #[arg(long)]
    pub logs: bool,

    /// Perform health check
    #[arg(long)]
    pub health: bool,

    /// Run a command on the target host (repeatable)
    #[arg(long, value_name = "COMMAND")]
    pub exec: Vec<String>,

    /// JSON settings file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<LogLevel>,

    /// Directory for the log file
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Emit JSON logs on the console
    #[arg(long)]
    pub json_logs: bool,

    /// Do not prefix host commands with sudo
    #[arg(long)]
    pub no_sudo: bool,

    /// Run host commands over ssh on this host
    #[arg(long)]
    pub ssh_host: Option<String>,

    /// ssh login user
    #[arg(long, requires = "ssh_host")]
    pub ssh_user: Option<String>,

    /// ssh port
    #[arg(long, requires = "ssh_host")]
    pub ssh_port: Option<u16>,

    /// ssh private key
    #[arg(long, value_name = "FILE", requires = "ssh_host")]
    pub ssh_key: Option<PathBuf>,

    /// Journal lines shown by --logs and on failed start
    #[arg(long)]
    pub log_lines: Option<u32>,

    /// Seconds to wait after start before checking the service
    #[arg(long)]
    pub settle_secs: Option<u64>,

    /// Print the deployment plan without running it (with --deploy)
    #[arg(long)]
    pub dry_run: bool,

    /// Write the deployment report as JSON (with --deploy)
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

/// The single operation requested on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Deploy,
    Start,
    Stop,
    Restart,
    Status,
    Logs,
    Health,
    Exec(Vec<String>),
}

impl Cli {
    /// Selected action, `None` when no action flag was given
    pub fn action(&self) -> Option<Action> {
        if self.deploy {
            Some(Action::Deploy)
        } else if self.start {
            Some(Action::Start)
        } else if self.stop {
            Some(Action::Stop)
        } else if self.restart {
            Some(Action::Restart)
        } else if self.status {
            Some(Action::Status)
        } else if self.logs {
            Some(Action::Logs)
        } else if self.health {
            Some(Action::Health)
        } else if !self.exec.is_empty() {
            Some(Action::Exec(self.exec.clone()))
        } else {
            None
        }
    }

    /// Reject deploy-only options given with any other action
    ///
    /// clap counts the default of a boolean flag as present, so `requires`
    /// cannot express this.
    pub fn check(&self) -> Result<(), clap::Error> {
        if self.deploy {
            return Ok(());
        }

        let flag = if self.dry_run {
            "--dry-run"
        } else if self.report.is_some() {
            "--report"
        } else {
            return Ok(());
        };

        Err(Self::command().error(
            ErrorKind::ArgumentConflict,
            format!("{} can only be used with --deploy", flag),
        ))
    }

    /// Apply command line overrides on top of file settings
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
        if let Some(dir) = &self.log_dir {
            settings.log_dir = dir.clone();
        }
        if self.json_logs {
            settings.json_logs = true;
        }
        if self.no_sudo {
            settings.privilege = Privilege::None;
        }
        if let Some(host) = &self.ssh_host {
            let mut target = match settings.ssh.take() {
                Some(existing) if existing.host == *host => existing,
                _ => SshTarget::new(host.clone()),
            };
            if let Some(user) = &self.ssh_user {
                target.user = Some(user.clone());
            }
            if let Some(port) = self.ssh_port {
                target.port = port;
            }
            if let Some(key) = &self.ssh_key {
                target.identity_file = Some(key.clone());
            }
            settings.ssh = Some(target);
        }
        if let Some(lines) = self.log_lines {
            settings.service.log_lines = lines;
        }
        if let Some(secs) = self.settle_secs {
            settings.service.settle_secs = secs;
        }
    }

    /// Build the deployment spec from the arguments and settings
    pub fn deployment_spec(&self, settings: &Settings) -> Result<DeploymentSpec, DeployError> {
        DeploymentSpec::new(self.app_name.as_str(), self.jar_file.as_path())?
            .with_port(self.port)?
            .with_profile(self.profile.as_str())?
            .with_service_user(settings.service_user.as_str())
            .map(|spec| spec.with_install_root(settings.install_root.as_path()))
    }
}
