//! Command dispatch

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::CommandFactory;
use colored::Colorize;
use tracing::{error, info};

use crate::app::cli::{Action, Cli};
use crate::app::options::DeployOptions;
use crate::deploy::fsm::DeploymentState;
use crate::deploy::orchestrator::Deployer;
use crate::deploy::pipeline::Step;
use crate::exec::executor::HostExecutor;
use crate::exec::policy::{ExecutionPolicy, Transport};
use crate::exec::script::run_script;
use crate::filesys::file::File;
use crate::logs::{init_logging, LogOptions, Logger};
use crate::models::deployment::DeploymentReport;
use crate::storage::settings::Settings;
use crate::utils::version_info;

/// Run the action selected on the command line
pub async fn run(cli: Cli) -> ExitCode {
    if let Err(e) = cli.check() {
        if let Err(print) = e.print() {
            eprintln!("{e}: {print}");
        }
        return ExitCode::from(2);
    }

    let Some(action) = cli.action() else {
        if let Err(e) = Cli::command().print_help() {
            eprintln!("Failed to print help: {e}");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    };

    let mut settings = match Settings::load(cli.config.as_deref()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut settings);

    // Keep the logger alive until dispatch returns
    let _logger = start_logging(&settings);
    let version = version_info();
    info!(
        "hoist {} ({}, built {})",
        version.version, version.git_hash, version.build_time
    );

    match dispatch(action, &cli, &settings).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn start_logging(settings: &Settings) -> Option<Logger> {
    let options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: Some(settings.log_dir.clone()),
        json_format: settings.json_logs,
        ..Default::default()
    };

    match init_logging(options) {
        Ok(logger) => Some(logger),
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    }
}

async fn dispatch(action: Action, cli: &Cli, settings: &Settings) -> anyhow::Result<ExitCode> {
    let spec = cli
        .deployment_spec(settings)
        .context("invalid deployment arguments")?;
    let options = DeployOptions::new(spec, settings);

    let transport = match &settings.ssh {
        Some(target) => {
            match &target.identity_file {
                Some(key) => info!("Connecting to {} using {}", target.destination(), key.display()),
                None => info!("Connecting to {}", target.destination()),
            }
            Transport::Ssh(target.clone())
        }
        None => Transport::Local,
    };
    let policy = ExecutionPolicy::new(settings.privilege, transport);
    let mut deployer = Deployer::new(options, Arc::new(HostExecutor::new(policy)))?;

    execute(action, cli, &mut deployer).await
}

async fn execute(action: Action, cli: &Cli, deployer: &mut Deployer) -> anyhow::Result<ExitCode> {
    match action {
        Action::Deploy if cli.dry_run => {
            print_plan(&deployer.plan());
            Ok(ExitCode::SUCCESS)
        }
        Action::Deploy => {
            let report = deployer.deploy().await;
            print_report(&report);
            if let Some(path) = &cli.report {
                let json = serde_json::to_string_pretty(&report)?;
                File::new(path)
                    .write_string(&json)
                    .await
                    .with_context(|| format!("writing report to {}", path.display()))?;
                info!("Report written to {}", path.display());
            }
            Ok(exit_code(report.succeeded()))
        }
        Action::Start => {
            deployer.services().start().await?;
            Ok(ExitCode::SUCCESS)
        }
        Action::Stop => {
            deployer.services().stop().await?;
            Ok(ExitCode::SUCCESS)
        }
        Action::Restart => {
            deployer.services().restart().await?;
            Ok(ExitCode::SUCCESS)
        }
        Action::Status => {
            let result = deployer.services().status().await?;
            println!("{}", result.stdout.trim_end());
            Ok(ExitCode::SUCCESS)
        }
        Action::Logs => {
            let result = deployer.services().logs().await?;
            println!("{}", result.stdout.trim_end());
            Ok(ExitCode::SUCCESS)
        }
        Action::Health => Ok(exit_code(deployer.health_check().await)),
        Action::Exec(lines) => {
            for result in run_script(deployer.runner(), &lines).await? {
                if !result.stdout.is_empty() {
                    println!("{}", result.stdout.trim_end());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_plan(steps: &[Step]) {
    for (index, step) in steps.iter().enumerate() {
        println!("{}", format!("[{}/{}] {}", index + 1, steps.len(), step.name).bold());
        for command in &step.commands {
            println!("    {}", command);
            if let Some(stdin) = &command.stdin {
                for line in stdin.lines() {
                    println!("        | {}", line);
                }
            }
        }
        for command in &step.rollback {
            println!("    on rejection: {}", command);
        }
    }
}

fn print_report(report: &DeploymentReport) {
    match report.state {
        DeploymentState::Healthy => {
            println!("{} {} is healthy", "[SUCCESS]".green().bold(), report.app_name);
            println!("  public: {}", report.public_url);
            println!("  direct: {}", report.direct_url);
        }
        DeploymentState::Degraded => {
            println!(
                "{} {} is running but the health check failed",
                "[WARNING]".yellow().bold(),
                report.app_name
            );
        }
        state => {
            println!(
                "{} {} ended in state {:?}",
                "[FAILED]".red().bold(),
                report.app_name,
                state
            );
            if let Some(error) = &report.error {
                println!("  {}", error);
            }
        }
    }
}
