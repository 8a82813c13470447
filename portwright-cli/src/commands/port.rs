//! Flags and flow shared by `create` and `update`.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::json;

use portwright_core::config;
use portwright_sync::{
    diff::plan_diffs,
    orchestrator::{self, FileAction},
    source::resolve_local_source,
    Amended, ArchiveHasher, ArtifactPlan, GitCli, HttpArchiveHasher, KnownDigest, PortRequest,
    RegistryContext,
};

/// Upstream source and run options common to `create` and `update`.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Upstream commit (or tag) to pin.
    #[arg(long = "ref", value_name = "REF", conflicts_with = "source_dir")]
    pub git_ref: Option<String>,

    /// Pin the `HEAD` of a local checkout instead of naming a ref.
    #[arg(long, value_name = "PATH")]
    pub source_dir: Option<PathBuf>,

    /// Upstream repository as `owner/name`.
    #[arg(long, value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// Port version.
    #[arg(long)]
    pub version: Option<String>,

    /// Upstream branch recorded as the recipe's `HEAD_REF`.
    #[arg(long)]
    pub branch: Option<String>,

    /// Token for the archive download (default: the configured env variable).
    #[arg(long)]
    pub token: Option<String>,

    /// SHA-512 of the source archive, skipping the download.
    #[arg(long, value_name = "HEX")]
    pub sha512: Option<String>,

    /// Bypass the name-casing and artifact-presence checks.
    #[arg(long)]
    pub force: bool,

    /// Show the files that would change without writing or committing.
    #[arg(long)]
    pub dry_run: bool,
}

impl SourceArgs {
    fn apply(&self, request: &mut PortRequest) {
        request.upstream_repo.clone_from(&self.repo);
        request.git_ref.clone_from(&self.git_ref);
        request.version.clone_from(&self.version);
        request.branch.clone_from(&self.branch);
        request.token.clone_from(&self.token);
        request.force = self.force;
    }
}

/// Run `request` against the registry at `registry` and print the outcome.
pub fn execute(registry: &Path, mut request: PortRequest, source: &SourceArgs) -> Result<()> {
    let registry = std::fs::canonicalize(registry)
        .with_context(|| format!("registry directory {} not found", registry.display()))?;
    let config = config::load(&registry).context("failed to load registry configuration")?;
    source.apply(&mut request);

    if let Some(dir) = &source.source_dir {
        let local = resolve_local_source(&GitCli::new(dir), &config.remote)
            .with_context(|| format!("failed to read local checkout {}", dir.display()))?;
        request.git_ref = Some(local.git_ref);
        if request.upstream_repo.is_none() {
            request.upstream_repo = local.upstream_repo;
        }
    }

    let archive: Box<dyn ArchiveHasher> = match &source.sha512 {
        Some(digest) => {
            ensure!(
                digest.trim().len() == 128 && digest.trim().chars().all(|c| c.is_ascii_hexdigit()),
                "--sha512 must be 128 hexadecimal digits"
            );
            Box::new(KnownDigest::new(digest))
        }
        None => Box::new(HttpArchiveHasher::new(&config.host)),
    };
    let ctx = RegistryContext::new(registry.clone(), config, GitCli::new(&registry), archive);

    let operation = request.operation;
    let port = request.port.clone();
    if source.dry_run {
        let plan = orchestrator::preview(&ctx, request)
            .with_context(|| format!("{operation} dry run failed for '{port}'"))?;
        print_plan(&plan, &registry);
        return Ok(());
    }

    let report = orchestrator::run(&ctx, request)
        .with_context(|| format!("{operation} failed for '{port}'"))?;
    print_report(&report)
}

fn print_plan(plan: &ArtifactPlan, registry: &Path) {
    let v = &plan.validated;
    println!(
        "[dry-run] {} '{}' {} (port-version {})",
        v.request.operation, v.request.port, v.version, v.port_revision
    );
    println!("  sha512  {}", plan.fetch.sha512);

    let diffs = plan_diffs(plan, registry);
    if diffs.is_empty() {
        println!("No differences.");
        return;
    }
    for diff in diffs {
        let marker = match diff.action {
            FileAction::Create => "+",
            _ => "~",
        };
        println!("  {marker}  {}", diff.path.display());
        print!("{}", diff.unified_diff);
        if !diff.unified_diff.ends_with('\n') {
            println!();
        }
    }
}

fn print_report(report: &Amended) -> Result<()> {
    println!("{} {}", "✓".green().bold(), report.message);
    println!("  version       {}", report.port.version);
    println!("  port-version  {}", report.port.port_revision);
    println!("  git-tree      {}", report.git_tree);
    println!("  commit        {}", report.commit);
    for path in &report.files {
        println!("  ✎  {}", path.display());
    }

    let snippet = json!({
        "registries": [{
            "kind": "git",
            "baseline": report.commit,
            "repository": report.registry_url,
            "packages": [report.port.name.as_str()],
        }]
    });
    println!();
    println!("Update your project's vcpkg-configuration.json to include:");
    println!(
        "{}",
        serde_json::to_string_pretty(&snippet).context("failed to serialize registry snippet")?
    );
    Ok(())
}
