//! Error types for hoist

use thiserror::Error;

/// Main error type for deployment operations
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// A precondition on the local machine does not hold (e.g. missing artifact)
    #[error("Not found: {0}")]
    NotFound(String),

    /// An external command exited with a non-zero status
    #[error("Command failed ({}): {command}: {stderr}", code_label(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The program could not be started at all
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A generated configuration was rejected by its validator
    #[error("Configuration validation failed: {command}: {stderr}")]
    ConfigValidation { command: String, stderr: String },

    /// The service did not report an active state after start
    #[error("Service {service} failed to start (status: {status})")]
    StartupVerification { service: String, status: String },

    #[error("Invalid deployment spec: {0}")]
    InvalidSpec(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

fn code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl DeployError {
    /// Exit code reported by the failing command, if any
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            DeployError::CommandFailed { code, .. } => *code,
            _ => None,
        }
    }
}
