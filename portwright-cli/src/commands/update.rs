//! `portwright update <port>` — move a port to a new upstream ref or version.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use portwright_sync::PortRequest;

use super::port::{execute, SourceArgs};

/// Arguments for `portwright update`.
///
/// Without `--version` the manifest's current version is kept and the
/// port-version is bumped. Without `--repo` the recipe's `REPO` is reused.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Port name.
    pub port: String,

    #[command(flatten)]
    pub source: SourceArgs,
}

impl UpdateArgs {
    pub fn run(self, registry: &Path) -> Result<()> {
        execute(registry, PortRequest::update(self.port.as_str()), &self.source)
    }
}
