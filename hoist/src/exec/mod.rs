//! Command execution against the target host
//!
//! Every interaction with the host goes through [`runner::CommandRunner`],
//! which delegates to a [`executor::CommandExecutor`]. The executor applies
//! the [`policy::ExecutionPolicy`] (privilege elevation and transport).

pub mod executor;
pub mod policy;
pub mod recording;
pub mod runner;
pub mod script;
