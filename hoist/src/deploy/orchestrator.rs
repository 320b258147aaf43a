//! Deployment orchestrator

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::app::options::DeployOptions;
use crate::deploy::fsm::{DeploymentEvent, DeploymentFsm, DeploymentState};
use crate::deploy::health::HealthProbe;
use crate::deploy::lifecycle::ServiceManager;
use crate::deploy::pipeline::{provisioning_steps, Step};
use crate::errors::DeployError;
use crate::exec::executor::CommandExecutor;
use crate::exec::runner::CommandRunner;
use crate::filesys::file::File;
use crate::models::deployment::DeploymentReport;

/// Drives one application through provisioning and start-up
pub struct Deployer {
    options: DeployOptions,
    runner: CommandRunner,
    services: ServiceManager,
    probe: HealthProbe,
    fsm: DeploymentFsm,
    run_id: Uuid,
}

impl Deployer {
    /// Create a deployer issuing commands through `executor`
    pub fn new(
        options: DeployOptions,
        executor: Arc<dyn CommandExecutor>,
    ) -> Result<Self, DeployError> {
        let runner = CommandRunner::new(executor);
        let services = ServiceManager::new(
            runner.clone(),
            options.spec.service_name(),
            options.lifecycle.clone(),
        );
        let probe = HealthProbe::new(options.health_url(), options.health.timeout)?;

        Ok(Self {
            options,
            runner,
            services,
            probe,
            fsm: DeploymentFsm::new(),
            run_id: Uuid::new_v4(),
        })
    }

    /// Lifecycle operations on the application's unit
    pub fn services(&self) -> &ServiceManager {
        &self.services
    }

    pub fn runner(&self) -> &CommandRunner {
        &self.runner
    }

    pub fn state(&self) -> DeploymentState {
        self.fsm.state()
    }

    pub fn fsm(&self) -> &DeploymentFsm {
        &self.fsm
    }

    /// Every command a deployment would run, grouped by step
    pub fn plan(&self) -> Vec<Step> {
        let mut steps = provisioning_steps(&self.options);
        steps.push(Step {
            name: "start application",
            rollback: Vec::new(),
            commands: vec![
                self.services.enable_command(),
                self.services.start_command(),
                self.services.is_active_command(),
            ],
        });
        steps
    }

    /// Probe the health endpoint
    pub async fn health_check(&self) -> bool {
        self.probe.check().await
    }

    /// Run the full deployment
    ///
    /// Errors never escape: they move the state machine to `Failed` and are
    /// recorded in the returned report.
    pub async fn deploy(&mut self) -> DeploymentReport {
        let span = info_span!(
            "deploy",
            run_id = %self.run_id,
            app = %self.options.spec.app_name()
        );
        self.deploy_inner().instrument(span).await
    }

    async fn deploy_inner(&mut self) -> DeploymentReport {
        let started_at = Utc::now();
        info!("Starting deployment of {}", self.options.spec.app_name());

        let mut digest = None;
        let outcome = self.drive(&mut digest).await;

        if let Err(e) = &outcome {
            error!("Deployment failed: {}", e);
            if let Err(transition) = self.fsm.process(DeploymentEvent::Fail(e.to_string())) {
                debug!("Not recording failure: {}", transition);
            }
        }

        match self.fsm.state() {
            DeploymentState::Healthy => {
                info!("Deployment completed successfully!");
                info!("Application is available at: {}", self.options.public_url());
                info!("Direct access: {}", self.options.direct_url());
            }
            DeploymentState::Degraded => {
                warn!("Deployment completed but health check failed");
            }
            _ => {}
        }

        DeploymentReport {
            run_id: self.run_id,
            app_name: self.options.spec.app_name().to_string(),
            state: self.fsm.state(),
            started_at,
            finished_at: Utc::now(),
            artifact_sha256: digest,
            public_url: self.options.public_url(),
            direct_url: self.options.direct_url(),
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    async fn run_step(&self, step: &Step) -> Result<(), DeployError> {
        let outcome = self.runner.run_all(&step.commands).await;

        if let Err(DeployError::ConfigValidation { .. }) = &outcome {
            if !step.rollback.is_empty() {
                warn!("Rolling back {}", step.name);
                self.runner.run_all(&step.rollback).await?;
            }
        }
        outcome
    }

    async fn drive(&mut self, digest: &mut Option<String>) -> Result<(), DeployError> {
        self.fsm.process(DeploymentEvent::Provision)?;

        // Nothing may touch the host before the artifact is known to exist
        let artifact = File::new(self.options.spec.artifact());
        artifact.require("JAR file").await?;
        let sha256 = artifact.sha256().await?;
        info!("Artifact {} (sha256 {})", artifact.path().display(), sha256);
        *digest = Some(sha256);

        let steps = provisioning_steps(&self.options);
        let total = steps.len() + 1;
        for (index, step) in steps.iter().enumerate() {
            info!("[{}/{}] {}", index + 1, total, step.name);
            self.run_step(step).await?;
        }
        self.fsm.process(DeploymentEvent::Provisioned)?;

        info!("[{}/{}] start application", total, total);
        self.services.enable_and_verify().await?;
        self.fsm.process(DeploymentEvent::StartVerified)?;

        let event = if self.probe.check().await {
            DeploymentEvent::ProbeSucceeded
        } else {
            DeploymentEvent::ProbeFailed
        };
        self.fsm.process(event)?;

        Ok(())
    }
}
