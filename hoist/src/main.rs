//! Hoist - Entry Point
//!
//! Provisions an Ubuntu host for a Spring Boot jar and manages the
//! resulting systemd service.

use std::process::ExitCode;

use clap::Parser;

use hoist::app::cli::Cli;
use hoist::app::run::run;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    run(Cli::parse()).await
}
