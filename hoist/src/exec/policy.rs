//! Privilege elevation and transport policy

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::command::{CommandSpec, Scope};

/// How host commands are elevated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privilege {
    /// Run as the invoking user
    None,

    /// Prefix host commands with `sudo`
    #[default]
    Sudo,
}

/// Remote host reached over ssh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshTarget {
    /// Host name or address
    pub host: String,

    /// Login user, ssh defaults apply when absent
    #[serde(default)]
    pub user: Option<String>,

    /// ssh port
    #[serde(default = "default_ssh_port")]
    pub port: u16,

    /// Private key passed with `-i`
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
}

fn default_ssh_port() -> u16 {
    22
}

impl SshTarget {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            port: default_ssh_port(),
            identity_file: None,
        }
    }

    /// `user@host`, or just `host`
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }

    fn common_options(&self, port_flag: &str) -> Vec<String> {
        let mut options = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            port_flag.to_string(),
            self.port.to_string(),
        ];
        if let Some(key) = &self.identity_file {
            options.push("-i".to_string());
            options.push(key.display().to_string());
        }
        options
    }

    /// argv running `remote_command` on the target
    pub fn ssh_argv(&self, remote_command: String) -> Vec<String> {
        let mut argv = vec!["ssh".to_string()];
        argv.extend(self.common_options("-p"));
        argv.push(self.destination());
        argv.push(remote_command);
        argv
    }

    /// Controller-side upload of `local` to `remote` on the target
    pub fn upload(&self, local: &std::path::Path, remote: &str) -> CommandSpec {
        CommandSpec::new("scp")
            .args(self.common_options("-P"))
            .arg(local.display().to_string())
            .arg(format!("{}:{}", self.destination(), remote))
            .on_controller()
    }
}

/// Where host commands run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Transport {
    #[default]
    Local,
    Ssh(SshTarget),
}

/// Policy applied to every host-scoped command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPolicy {
    pub privilege: Privilege,
    pub transport: Transport,
}

impl ExecutionPolicy {
    pub fn new(privilege: Privilege, transport: Transport) -> Self {
        Self {
            privilege,
            transport,
        }
    }

    /// Final argv for `spec` once elevation and transport are applied
    pub fn wrap(&self, spec: &CommandSpec) -> Vec<String> {
        if spec.scope == Scope::Controller {
            return spec.argv();
        }

        let elevated = match self.privilege {
            Privilege::None => spec.clone(),
            Privilege::Sudo => CommandSpec::new("sudo").args(spec.argv()),
        };

        match &self.transport {
            Transport::Local => elevated.argv(),
            Transport::Ssh(target) => target.ssh_argv(elevated.command_line()),
        }
    }
}
