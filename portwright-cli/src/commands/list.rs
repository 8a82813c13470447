//! `portwright list` — ports recorded in the baseline.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use portwright_core::{baseline, manifest, paths, PortName, VersionScheme};

/// Arguments for `portwright list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub fn run(self, registry: &Path) -> Result<()> {
        let rows = build_rows(registry)?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize port list")?
            );
            return Ok(());
        }
        print_table(rows);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct PortRow {
    port: String,
    /// Version in the port's manifest; `None` if the manifest is missing.
    version: Option<String>,
    scheme: Option<VersionScheme>,
    #[serde(rename = "port-version")]
    port_version: u32,
    baseline: String,
}

#[derive(Tabled)]
struct PortTableRow {
    #[tabled(rename = "port")]
    port: String,
    #[tabled(rename = "version")]
    version: String,
    #[tabled(rename = "port-version")]
    port_version: u32,
    #[tabled(rename = "git-tree")]
    baseline: String,
}

fn build_rows(registry: &Path) -> Result<Vec<PortRow>> {
    let baseline_path = paths::baseline_path(registry);
    let entries = baseline::load(&baseline_path)
        .with_context(|| format!("failed to read {}", baseline_path.display()))?;

    let mut rows = Vec::with_capacity(entries.len());
    for (port, entry) in entries {
        let summary = manifest_summary(registry, &port)?;
        rows.push(PortRow {
            port: port.to_string(),
            version: summary.as_ref().and_then(|s| s.version.clone()),
            scheme: summary.map(|s| s.scheme),
            port_version: entry.port_version,
            baseline: entry.baseline,
        });
    }
    Ok(rows)
}

fn manifest_summary(registry: &Path, port: &PortName) -> Result<Option<manifest::ManifestSummary>> {
    // Baseline keys written by hand may not be valid port names.
    let Ok(port_paths) = paths::resolve(registry, port) else {
        return Ok(None);
    };
    manifest::read(&port_paths.manifest)
        .with_context(|| format!("failed to read manifest for '{port}'"))
}

fn print_table(rows: Vec<PortRow>) {
    println!(
        "{} v{} | {} ports",
        "Portwright".bold(),
        env!("CARGO_PKG_VERSION"),
        rows.len()
    );
    if rows.is_empty() {
        println!("No ports in the baseline.");
        return;
    }

    let table_rows: Vec<PortTableRow> = rows
        .into_iter()
        .map(|row| PortTableRow {
            port: row.port,
            version: row.version.unwrap_or_else(|| "(no manifest)".to_string()),
            port_version: row.port_version,
            baseline: row.baseline,
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");
}
