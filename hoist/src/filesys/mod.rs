//! Filesystem helpers for the controller side

pub mod file;
