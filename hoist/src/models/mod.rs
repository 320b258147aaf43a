//! Data models

pub mod command;
pub mod deployment;
