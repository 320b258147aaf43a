//! Integration tests for hoist

mod test_fsm;
mod test_orchestrator;
mod test_settings;
