//! Subcommand implementations.

pub mod create;
pub mod list;
pub mod port;
pub mod update;
