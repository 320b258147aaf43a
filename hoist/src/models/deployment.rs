//! Deployment models

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deploy::fsm::DeploymentState;
use crate::errors::DeployError;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PROFILE: &str = "prod";
pub const DEFAULT_INSTALL_ROOT: &str = "/opt";
pub const DEFAULT_SERVICE_USER: &str = "springboot";

/// Immutable description of one deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    /// Application name, drives every derived path
    app_name: String,

    /// Artifact on the controller
    artifact: PathBuf,

    /// Port the application listens on
    port: u16,

    /// Environment profile passed to the application
    profile: String,

    /// Parent of the installation directory
    install_root: PathBuf,

    /// Account the service runs as
    service_user: String,
}

impl DeploymentSpec {
    /// Create a spec with the default port, profile, root and account
    pub fn new(
        app_name: impl Into<String>,
        artifact: impl Into<PathBuf>,
    ) -> Result<Self, DeployError> {
        let app_name = app_name.into();
        validate_identifier("application name", &app_name)?;

        Ok(Self {
            app_name,
            artifact: artifact.into(),
            port: DEFAULT_PORT,
            profile: DEFAULT_PROFILE.to_string(),
            install_root: PathBuf::from(DEFAULT_INSTALL_ROOT),
            service_user: DEFAULT_SERVICE_USER.to_string(),
        })
    }

    pub fn with_port(mut self, port: u16) -> Result<Self, DeployError> {
        if port == 0 {
            return Err(DeployError::InvalidSpec(
                "port must be a positive integer".to_string(),
            ));
        }
        self.port = port;
        Ok(self)
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Result<Self, DeployError> {
        let profile = profile.into();
        if profile.trim().is_empty() || profile.chars().any(char::is_whitespace) {
            return Err(DeployError::InvalidSpec(format!(
                "profile must be a non-empty label without whitespace: {:?}",
                profile
            )));
        }
        self.profile = profile;
        Ok(self)
    }

    pub fn with_install_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.install_root = root.into();
        self
    }

    pub fn with_service_user(mut self, user: impl Into<String>) -> Result<Self, DeployError> {
        let user = user.into();
        validate_identifier("service user", &user)?;
        self.service_user = user;
        Ok(self)
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn service_user(&self) -> &str {
        &self.service_user
    }

    /// `<install root>/<app name>`
    pub fn install_dir(&self) -> PathBuf {
        self.install_root.join(&self.app_name)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.install_dir().join("logs")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.install_dir().join("config")
    }

    /// Systemd unit name
    pub fn service_name(&self) -> String {
        format!("{}.service", self.app_name)
    }

    /// File name of the deployed artifact
    pub fn artifact_name(&self) -> String {
        format!("{}.jar", self.app_name)
    }

    /// Where the artifact lives once deployed
    pub fn deployed_artifact(&self) -> PathBuf {
        self.install_dir().join(self.artifact_name())
    }

    /// `user:group` pair for chown
    pub fn owner(&self) -> String {
        format!("{0}:{0}", self.service_user)
    }
}

fn validate_identifier(what: &str, value: &str) -> Result<(), DeployError> {
    if value.is_empty() {
        return Err(DeployError::InvalidSpec(format!("{} must not be empty", what)));
    }
    if value.starts_with('.') || value.starts_with('-') {
        return Err(DeployError::InvalidSpec(format!(
            "{} must not start with '.' or '-': {}",
            what, value
        )));
    }
    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !valid {
        return Err(DeployError::InvalidSpec(format!(
            "{} may only contain letters, digits, '.', '_' and '-': {}",
            what, value
        )));
    }
    Ok(())
}

/// Summary of a deployment run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub run_id: Uuid,
    pub app_name: String,
    pub state: DeploymentState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// SHA-256 of the deployed artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_sha256: Option<String>,

    /// URL served through the reverse proxy
    pub public_url: String,

    /// URL of the application port
    pub direct_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeploymentReport {
    /// Whether the process should exit successfully
    pub fn succeeded(&self) -> bool {
        matches!(
            self.state,
            DeploymentState::Healthy | DeploymentState::Degraded
        )
    }
}
