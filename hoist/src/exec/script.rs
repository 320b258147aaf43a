//! Ad-hoc command runner
//!
//! Runs operator-supplied command lines on the target host, one after the
//! other, through the same runner as the pipeline.

use tracing::info;

use crate::errors::DeployError;
use crate::exec::runner::CommandRunner;
use crate::models::command::{CommandResult, CommandSpec};

/// Wrap a command line for `sh -c`
pub fn shell_command(line: &str) -> CommandSpec {
    CommandSpec::new("sh").args(["-c", line])
}

/// Run each line in order, stopping at the first failure
pub async fn run_script(
    runner: &CommandRunner,
    lines: &[String],
) -> Result<Vec<CommandResult>, DeployError> {
    let mut results = Vec::with_capacity(lines.len());
    for line in lines {
        results.push(runner.run(&shell_command(line)).await?);
    }
    info!("Ran {} command(s)", results.len());
    Ok(results)
}
