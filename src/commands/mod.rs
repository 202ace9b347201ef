// src/commands/mod.rs
//! Command handlers for the vitrine CLI

mod build;
mod query;

pub use build::cmd_build;
pub use query::{cmd_list, cmd_maintainers, cmd_search, cmd_show};
