//! Settings file management

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::DeployError;
use crate::exec::policy::{Privilege, SshTarget};
use crate::filesys::file::File;
use crate::logs::LogLevel;
use crate::models::deployment::{DEFAULT_INSTALL_ROOT, DEFAULT_SERVICE_USER};
use crate::storage::layout::HostLayout;

/// hoist settings, loaded from an optional JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory for the rotated log file
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Emit JSON on the console
    #[serde(default)]
    pub json_logs: bool,

    /// Parent of every installation directory
    #[serde(default = "default_install_root")]
    pub install_root: PathBuf,

    /// Account the application runs as
    #[serde(default = "default_service_user")]
    pub service_user: String,

    /// Privilege elevation for host commands
    #[serde(default)]
    pub privilege: Privilege,

    /// Remote host, commands run locally when absent
    #[serde(default)]
    pub ssh: Option<SshTarget>,

    /// Runtime installation
    #[serde(default)]
    pub runtime: RuntimeSettings,

    /// Host paths
    #[serde(default)]
    pub layout: HostLayout,

    /// Reverse proxy and firewall
    #[serde(default)]
    pub proxy: ProxySettings,

    /// Service manager behaviour
    #[serde(default)]
    pub service: ServiceSettings,

    /// Post-deploy health probe
    #[serde(default)]
    pub health: HealthSettings,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_install_root() -> PathBuf {
    PathBuf::from(DEFAULT_INSTALL_ROOT)
}

fn default_service_user() -> String {
    DEFAULT_SERVICE_USER.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_dir: default_log_dir(),
            json_logs: false,
            install_root: default_install_root(),
            service_user: default_service_user(),
            privilege: Privilege::Sudo,
            ssh: None,
            runtime: RuntimeSettings::default(),
            layout: HostLayout::default(),
            proxy: ProxySettings::default(),
            service: ServiceSettings::default(),
            health: HealthSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given
    pub async fn load(path: Option<&Path>) -> Result<Self, DeployError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let file = File::new(path);
        file.require("settings file").await?;
        file.read_json::<Settings>().await.map_err(|e| {
            DeployError::ConfigError(format!("{}: {}", path.display(), e))
        })
    }
}

/// Runtime (JDK) installation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Package installed with apt
    pub package: String,

    /// JAVA_HOME of the installed package
    pub java_home: PathBuf,

    /// Priority passed to update-alternatives
    pub alternatives_priority: u32,
}

impl RuntimeSettings {
    pub fn java_bin(&self) -> PathBuf {
        self.java_home.join("bin").join("java")
    }

    pub fn javac_bin(&self) -> PathBuf {
        self.java_home.join("bin").join("javac")
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            package: "openjdk-17-jdk".to_string(),
            java_home: PathBuf::from("/usr/lib/jvm/java-17-openjdk-amd64"),
            alternatives_priority: 1,
        }
    }
}

/// nginx and ufw settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Port nginx listens on
    pub listen_port: u16,

    /// `server_name` of the virtual host
    pub server_name: String,

    /// connect/send/read timeout in seconds
    pub timeout_secs: u64,

    /// ufw application profile opened for nginx
    pub firewall_profile: String,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            listen_port: 80,
            server_name: "localhost".to_string(),
            timeout_secs: 60,
            firewall_profile: "Nginx Full".to_string(),
        }
    }
}

/// systemd behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Pause between start and the status query
    pub settle_secs: u64,

    /// `RestartSec=` of the unit
    pub restart_secs: u64,

    /// Journal lines shown by `logs` and on failed start
    pub log_lines: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            settle_secs: 10,
            restart_secs: 10,
            log_lines: 50,
        }
    }
}

/// Health probe settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    /// Path probed on the application port
    pub path: String,

    /// Host the probe connects to, the ssh host is used when unset
    pub host: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            path: "/actuator/health".to_string(),
            host: None,
            timeout_secs: 10,
        }
    }
}
