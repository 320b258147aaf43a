//! HTTP health probe

use std::time::Duration;

use reqwest::Client;
use tracing::{error, info};

use crate::errors::DeployError;

/// Probes the application's health endpoint
#[derive(Debug, Clone)]
pub struct HealthProbe {
    client: Client,
    url: String,
}

impl HealthProbe {
    /// Create a probe for `url`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DeployError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Perform the health check
    ///
    /// Never fails: any transport error or non-2xx status is logged and
    /// reported as `false`.
    pub async fn check(&self) -> bool {
        info!("Performing health check: GET {}", self.url);

        match self.client.get(&self.url).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Health check passed ({})", response.status());
                true
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                error!("Health check failed: {} - {}", status, body.trim());
                false
            }
            Err(e) => {
                error!("Health check failed: {}", e);
                false
            }
        }
    }
}
