//! `portwright create <port>` — add a new port to the registry.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use portwright_core::VersionScheme;
use portwright_sync::PortRequest;

use super::port::{execute, SourceArgs};

/// Arguments for `portwright create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Port name (lowercase).
    pub port: String,

    /// One-line description for the manifest.
    #[arg(long)]
    pub description: Option<String>,

    /// Record the version under `version-semver` instead of `version`.
    #[arg(long)]
    pub semver: bool,

    #[command(flatten)]
    pub source: SourceArgs,
}

impl CreateArgs {
    pub fn run(self, registry: &Path) -> Result<()> {
        let mut request = PortRequest::create(self.port.as_str());
        request.description = self.description;
        if self.semver {
            request.scheme = VersionScheme::Semver;
        }
        execute(registry, request, &self.source)
    }
}
