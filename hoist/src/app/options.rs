//! Resolved deployment options

use std::time::Duration;

use crate::exec::policy::SshTarget;
use crate::models::deployment::DeploymentSpec;
use crate::storage::layout::HostLayout;
use crate::storage::settings::{ProxySettings, RuntimeSettings, Settings};

/// Everything the orchestrator needs for one application
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// What is being deployed
    pub spec: DeploymentSpec,

    /// Runtime installation
    pub runtime: RuntimeSettings,

    /// Host paths
    pub layout: HostLayout,

    /// Reverse proxy and firewall
    pub proxy: ProxySettings,

    /// Service lifecycle timings
    pub lifecycle: LifecycleOptions,

    /// Health probe
    pub health: HealthOptions,

    /// Remote host the artifact must be uploaded to
    pub remote: Option<SshTarget>,
}

impl DeployOptions {
    /// Combine a spec with loaded settings
    pub fn new(spec: DeploymentSpec, settings: &Settings) -> Self {
        let health_host = settings
            .health
            .host
            .clone()
            .or_else(|| settings.ssh.as_ref().map(|ssh| ssh.host.clone()))
            .unwrap_or_else(|| "localhost".to_string());

        Self {
            runtime: settings.runtime.clone(),
            layout: settings.layout.clone(),
            proxy: settings.proxy.clone(),
            lifecycle: LifecycleOptions {
                settle_interval: Duration::from_secs(settings.service.settle_secs),
                restart_delay: Duration::from_secs(settings.service.restart_secs),
                log_lines: settings.service.log_lines,
            },
            health: HealthOptions {
                host: health_host,
                path: settings.health.path.clone(),
                timeout: Duration::from_secs(settings.health.timeout_secs),
            },
            remote: settings.ssh.clone(),
            spec,
        }
    }

    /// URL of the application port
    pub fn direct_url(&self) -> String {
        format!("http://{}:{}", self.health.host, self.spec.port())
    }

    /// URL served through nginx
    pub fn public_url(&self) -> String {
        match self.proxy.listen_port {
            80 => format!("http://{}", self.health.host),
            port => format!("http://{}:{}", self.health.host, port),
        }
    }

    /// Full URL of the health endpoint
    pub fn health_url(&self) -> String {
        format!("{}{}", self.direct_url(), self.health.path)
    }
}

/// Service lifecycle timings
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Pause between start and the status query
    pub settle_interval: Duration,

    /// `RestartSec=` of the unit
    pub restart_delay: Duration,

    /// Journal lines fetched for diagnostics
    pub log_lines: u32,
}

/// Health probe options
#[derive(Debug, Clone)]
pub struct HealthOptions {
    /// Host the probe connects to
    pub host: String,

    /// Path probed on the application port
    pub path: String,

    /// Request timeout
    pub timeout: Duration,
}
