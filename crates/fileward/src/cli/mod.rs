//! CLI module for fileward
//!
//! Each command is a synchronous `run` that resolves configuration, builds a
//! single-threaded runtime and blocks on the async pass.

pub mod config;
pub mod context;
pub mod error;
pub mod output;
pub mod run;
pub mod status;
