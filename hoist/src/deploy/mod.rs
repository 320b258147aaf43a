//! Deployment module

pub mod fsm;
pub mod health;
pub mod lifecycle;
pub mod orchestrator;
pub mod pipeline;
pub mod render;
