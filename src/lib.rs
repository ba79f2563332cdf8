//! Briefsmith: Batch Content Brief Generation
//!
//! Generates structured content briefs for the topics of a topical map by
//! calling an LLM provider once per topic, persisting each result, and
//! reflecting outcomes into shared application state through ordered
//! events.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod images;
pub mod import;
pub mod logging;
pub mod provider;
pub mod sanitize;
pub mod state;
pub mod store;
pub mod types;
