//! Host filesystem layout

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Well-known locations on the target host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostLayout {
    /// Root-only directory where rendered files are written before relocation
    pub staging_dir: PathBuf,

    /// systemd unit directory
    pub systemd_dir: PathBuf,

    /// nginx `sites-available`
    pub nginx_available_dir: PathBuf,

    /// nginx `sites-enabled`
    pub nginx_enabled_dir: PathBuf,

    /// nginx log directory
    pub nginx_log_dir: PathBuf,
}

impl HostLayout {
    /// Staging path for a rendered file
    pub fn staging_file(&self, name: &str) -> PathBuf {
        self.staging_dir.join(name)
    }

    /// Installed unit path
    pub fn unit_file(&self, service_name: &str) -> PathBuf {
        self.systemd_dir.join(service_name)
    }

    /// Site definition in `sites-available`
    pub fn site_file(&self, app_name: &str) -> PathBuf {
        self.nginx_available_dir.join(app_name)
    }

    /// Symlink in `sites-enabled`
    pub fn enabled_site_link(&self, app_name: &str) -> PathBuf {
        self.nginx_enabled_dir.join(app_name)
    }

    pub fn access_log(&self, app_name: &str) -> PathBuf {
        self.nginx_log_dir.join(format!("{}.access.log", app_name))
    }

    pub fn error_log(&self, app_name: &str) -> PathBuf {
        self.nginx_log_dir.join(format!("{}.error.log", app_name))
    }
}

impl Default for HostLayout {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("/var/lib/hoist/staging"),
            systemd_dir: PathBuf::from("/etc/systemd/system"),
            nginx_available_dir: PathBuf::from("/etc/nginx/sites-available"),
            nginx_enabled_dir: PathBuf::from("/etc/nginx/sites-enabled"),
            nginx_log_dir: PathBuf::from("/var/log/nginx"),
        }
    }
}
