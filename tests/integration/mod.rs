//! Integration tests for the briefsmith batch generation system

mod batch_runner;
mod state_events;
mod test_utils;
mod topics_import;

pub use test_utils::with_xdg_env;
