//! Hoist Library
//!
//! Core modules for provisioning and running a Spring Boot service on a
//! single Ubuntu host.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod exec;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod storage;
pub mod utils;
