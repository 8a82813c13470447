//! Port create/update state machine.
//!
//! ```text
//! Validating → Writing → Committing → HashResolved → LedgerUpdated → Amending → Done
//! ```
//!
//! The ledger records the git-tree of `ports/<name>`, which only exists once
//! the recipe and manifest are committed. So the port directory is committed
//! first, its tree hash resolved, and the ledger and baseline folded into
//! that same commit with an amend.
//!
//! Each phase is a function consuming the previous phase's value, so a run
//! can be stopped (or fail) at any boundary with a known on-disk state.
//! [`run`] chains them; [`preview`] stops after planning and writes nothing.
//!
//! Runs are strictly sequential and assume exclusive use of the registry
//! working tree. Two runs against one checkout race on the git index.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use portwright_core::manifest::{self, ManifestSeed, HOST_DEPENDENCIES};
use portwright_core::{
    baseline, json_store, ledger, paths, BaselineEntry, Dependency, LedgerEntry, Port, PortName,
    PortPaths, RegistryConfig, RegistryError, VersionScheme,
};
use portwright_recipe::directive::{HEAD_REF_KEY, REPO_KEY};
use portwright_recipe::{
    patch, read_fetch_arguments, writer, FetchSpec, RecipeContext, RecipeEngine,
};

use crate::archive::ArchiveHasher;
use crate::error::{io_err, SyncError, ValidationIssue};
use crate::remote::registry_url;
use crate::vcs::VersionControl;

/// Version used by `create` when the request names none.
pub const DEFAULT_VERSION: &str = "1.0.0";

// ---------------------------------------------------------------------------
// Context and request
// ---------------------------------------------------------------------------

/// Everything a run needs besides the request itself.
pub struct RegistryContext<V, A> {
    /// Registry working tree (the directory holding `ports/` and `versions/`).
    pub root: PathBuf,
    pub config: RegistryConfig,
    pub vcs: V,
    pub archive: A,
}

impl<V, A> RegistryContext<V, A> {
    pub fn new(root: impl Into<PathBuf>, config: RegistryConfig, vcs: V, archive: A) -> Self {
        Self {
            root: root.into(),
            config,
            vcs,
            archive,
        }
    }

    /// `path` relative to the registry root.
    pub fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRequest {
    pub operation: Operation,
    pub port: PortName,
    /// `owner/name`; an update falls back to the recipe's `REPO`.
    pub upstream_repo: Option<String>,
    pub git_ref: Option<String>,
    /// An update falls back to the manifest's current version.
    pub version: Option<String>,
    /// Version key for a manifest generated from scratch. Existing manifests
    /// keep theirs.
    pub scheme: VersionScheme,
    pub description: Option<String>,
    /// Recipe `HEAD_REF`; defaults to the recipe's current value, then the
    /// configured default branch.
    pub branch: Option<String>,
    /// Archive download token; defaults to the configured environment variable.
    pub token: Option<String>,
    /// Skip the casing and artifact-presence checks.
    pub force: bool,
}

impl PortRequest {
    pub fn new(operation: Operation, port: impl Into<PortName>) -> Self {
        Self {
            operation,
            port: port.into(),
            upstream_repo: None,
            git_ref: None,
            version: None,
            scheme: VersionScheme::Plain,
            description: None,
            branch: None,
            token: None,
            force: false,
        }
    }

    pub fn create(port: impl Into<PortName>) -> Self {
        Self::new(Operation::Create, port)
    }

    pub fn update(port: impl Into<PortName>) -> Self {
        Self::new(Operation::Update, port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    Writing,
    Committing,
    HashResolved,
    LedgerUpdated,
    Amending,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validating => "validating",
            Self::Writing => "writing",
            Self::Committing => "committing",
            Self::HashResolved => "hash resolved",
            Self::LedgerUpdated => "ledger updated",
            Self::Amending => "amending",
            Self::Done => "done",
        })
    }
}

// ---------------------------------------------------------------------------
// Phase values
// ---------------------------------------------------------------------------

/// A request whose preconditions hold, with every derived input filled in.
#[derive(Debug, Clone)]
pub struct Validated {
    pub request: PortRequest,
    pub paths: PortPaths,
    pub upstream_repo: String,
    pub git_ref: String,
    pub head_ref: String,
    pub version: String,
    pub port_revision: u32,
}

/// Whether a planned file differs from what is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Create,
    Modify,
    Unchanged,
}

/// One artifact's current and intended contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub path: PathBuf,
    pub before: Option<String>,
    pub after: String,
}

impl PlannedFile {
    pub fn action(&self) -> FileAction {
        match &self.before {
            None => FileAction::Create,
            Some(before) if *before == self.after => FileAction::Unchanged,
            Some(_) => FileAction::Modify,
        }
    }
}

/// The recipe and manifest a run would write. Nothing is on disk yet.
#[derive(Debug, Clone)]
pub struct ArtifactPlan {
    pub validated: Validated,
    pub fetch: FetchSpec,
    /// Version key of the planned manifest.
    pub scheme: VersionScheme,
    pub recipe: PlannedFile,
    pub manifest: PlannedFile,
}

impl ArtifactPlan {
    /// The port as it will be recorded.
    pub fn port(&self) -> Port {
        let v = &self.validated;
        Port {
            name: v.request.port.clone(),
            version: v.version.clone(),
            scheme: self.scheme,
            port_revision: v.port_revision,
            description: v.request.description.clone(),
            dependencies: HOST_DEPENDENCIES
                .iter()
                .map(|name| Dependency::host(name))
                .collect(),
            upstream_repo: v.upstream_repo.clone(),
            git_ref: v.git_ref.clone(),
            branch: v.head_ref.clone(),
            content_digest: self.fetch.sha512.clone(),
        }
    }
}

/// Recipe and manifest are on disk.
#[derive(Debug, Clone)]
pub struct Written {
    pub plan: ArtifactPlan,
}

/// The port directory is committed.
#[derive(Debug, Clone)]
pub struct Committed {
    pub plan: ArtifactPlan,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct TreeResolved {
    pub plan: ArtifactPlan,
    pub message: String,
    /// Object id of `ports/<name>` in the new commit.
    pub git_tree: String,
}

/// Ledger and baseline are on disk, not yet committed.
#[derive(Debug, Clone)]
pub struct VersionRecorded {
    pub plan: ArtifactPlan,
    pub message: String,
    pub git_tree: String,
    pub entry: LedgerEntry,
    pub baseline: BaselineEntry,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct Amended {
    pub operation: Operation,
    pub port: Port,
    pub message: String,
    pub git_tree: String,
    pub entry: LedgerEntry,
    pub baseline: BaselineEntry,
    /// Id of the final (amended) commit.
    pub commit: String,
    pub registry_url: String,
    /// Registry-relative paths of the four artifacts.
    pub files: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Check every precondition and derive version, port-version, and fetch
/// inputs. All failures are reported together.
pub fn validate<V, A>(
    ctx: &RegistryContext<V, A>,
    request: PortRequest,
) -> Result<Validated, SyncError> {
    tracing::info!("{}: {}", request.port, Phase::Validating);
    let paths = match paths::resolve(&ctx.root, &request.port) {
        Ok(paths) => paths,
        Err(RegistryError::InvalidPortName { name, reason }) => {
            return Err(SyncError::Validation(vec![ValidationIssue::InvalidName {
                name,
                reason: reason.to_string(),
            }]));
        }
        Err(err) => return Err(err.into()),
    };

    let mut issues = Vec::new();
    if !request.force {
        if !request.port.is_lowercase() {
            issues.push(ValidationIssue::NameNotLowercase {
                name: request.port.to_string(),
            });
        }
        match request.operation {
            Operation::Create => {
                for path in [&paths.recipe, &paths.manifest, &paths.ledger] {
                    if path.exists() {
                        issues.push(ValidationIssue::ArtifactExists {
                            path: ctx.relative(path),
                        });
                    }
                }
            }
            Operation::Update => {
                if !paths.ledger.exists() {
                    issues.push(ValidationIssue::LedgerMissing {
                        path: ctx.relative(&paths.ledger),
                    });
                }
            }
        }
    }

    let recipe_args = match request.operation {
        Operation::Update => writer::read(&paths.recipe)?
            .and_then(|text| read_fetch_arguments(&text).ok())
            .unwrap_or_default(),
        Operation::Create => Default::default(),
    };

    let upstream_repo = non_empty(request.upstream_repo.clone())
        .or_else(|| recipe_args.get(REPO_KEY).cloned());
    if upstream_repo.is_none() {
        issues.push(ValidationIssue::MissingRepo);
    }
    let git_ref = non_empty(request.git_ref.clone());
    if git_ref.is_none() {
        issues.push(ValidationIssue::MissingRef);
    }
    let version = match (non_empty(request.version.clone()), request.operation) {
        (Some(version), _) => Some(version),
        (None, Operation::Create) => Some(DEFAULT_VERSION.to_owned()),
        (None, Operation::Update) => {
            non_empty(manifest::read(&paths.manifest)?.and_then(|summary| summary.version))
        }
    };
    if version.is_none() {
        issues.push(ValidationIssue::MissingVersion);
    }

    let (Some(upstream_repo), Some(git_ref), Some(version)) = (upstream_repo, git_ref, version)
    else {
        return Err(SyncError::Validation(issues));
    };
    if !issues.is_empty() {
        return Err(SyncError::Validation(issues));
    }

    let head_ref = non_empty(request.branch.clone())
        .or_else(|| recipe_args.get(HEAD_REF_KEY).cloned())
        .unwrap_or_else(|| ctx.config.default_branch.clone());
    let port_revision = ledger::next_port_revision(&paths.ledger, &version)?;
    tracing::info!(
        "{}: {} {version} port-version {port_revision}",
        request.port,
        request.operation
    );

    Ok(Validated {
        request,
        paths,
        upstream_repo,
        git_ref,
        head_ref,
        version,
        port_revision,
    })
}

/// Fetch the archive digest and compute the recipe and manifest contents.
pub fn plan<V, A: ArchiveHasher>(
    ctx: &RegistryContext<V, A>,
    validated: Validated,
) -> Result<ArtifactPlan, SyncError> {
    let token = non_empty(validated.request.token.clone()).or_else(|| ctx.config.env_token());
    let sha512 = ctx.archive.fetch_and_hash(
        &validated.upstream_repo,
        &validated.git_ref,
        token.as_deref(),
    )?;
    let fetch = FetchSpec {
        repo: validated.upstream_repo.clone(),
        git_ref: validated.git_ref.clone(),
        sha512,
        head_ref: validated.head_ref.clone(),
    };
    let operation = validated.request.operation;
    let paths = &validated.paths;

    let recipe_before = writer::read(&paths.recipe)?;
    let recipe_after = match (&recipe_before, operation) {
        (Some(text), Operation::Update) => patch(text, &fetch)?,
        _ => recipe_engine(ctx)?
            .render(&RecipeContext::new(validated.request.port.as_str(), &fetch))?,
    };

    // A manifest rebuilt during an update keeps the version key of the
    // port's ledger history.
    let seed_scheme = match operation {
        Operation::Create => validated.request.scheme,
        Operation::Update => ledger::head(&paths.ledger)?
            .map_or(validated.request.scheme, |head| head.scheme()),
    };
    let manifest_before = read_optional(&paths.manifest)?;
    let manifest_doc = match (&manifest_before, operation) {
        (Some(_), Operation::Update) => {
            let mut doc = manifest::load(&paths.manifest)?;
            manifest::apply_update(&mut doc, &validated.version, validated.port_revision);
            doc
        }
        _ => manifest::render_new(&manifest_seed(ctx, &validated, seed_scheme)),
    };
    let scheme = VersionScheme::detect(&manifest_doc);
    let manifest_after = json_store::to_pretty(&paths.manifest, &manifest_doc)?;

    Ok(ArtifactPlan {
        recipe: PlannedFile {
            path: paths.recipe.clone(),
            before: recipe_before,
            after: recipe_after,
        },
        manifest: PlannedFile {
            path: paths.manifest.clone(),
            before: manifest_before,
            after: manifest_after,
        },
        validated,
        fetch,
        scheme,
    })
}

/// Write the planned recipe and manifest.
///
/// An update patches files that already exist; anything else is written
/// from scratch. Unchanged files are left alone.
pub fn write_artifacts<V, A>(
    ctx: &RegistryContext<V, A>,
    plan: ArtifactPlan,
) -> Result<Written, SyncError> {
    let v = &plan.validated;
    let patching = v.request.operation == Operation::Update;
    tracing::info!("{}: {}", v.request.port, Phase::Writing);

    match plan.recipe.action() {
        FileAction::Unchanged => tracing::debug!("unchanged: {}", plan.recipe.path.display()),
        FileAction::Modify if patching => {
            writer::update(&plan.recipe.path, &plan.fetch)?;
        }
        _ => {
            let engine = recipe_engine(ctx)?;
            writer::create(&engine, &plan.recipe.path, v.request.port.as_str(), &plan.fetch)?;
        }
    }

    match plan.manifest.action() {
        FileAction::Unchanged => tracing::debug!("unchanged: {}", plan.manifest.path.display()),
        FileAction::Modify if patching => {
            manifest::update(&plan.manifest.path, &v.version, v.port_revision)?;
        }
        _ => manifest::create(&plan.manifest.path, &manifest_seed(ctx, v, plan.scheme))?,
    }
    Ok(Written { plan })
}

/// Stage and commit the port directory.
pub fn commit_artifacts<V: VersionControl, A>(
    ctx: &RegistryContext<V, A>,
    written: Written,
) -> Result<Committed, SyncError> {
    let plan = written.plan;
    let v = &plan.validated;
    tracing::info!("{}: {}", v.request.port, Phase::Committing);
    let message = commit_message(v.request.operation, &v.request.port, &v.version, v.port_revision);
    ctx.vcs.stage(&[ctx.relative(&v.paths.port_dir)])?;
    ctx.vcs.commit(&message)?;
    Ok(Committed { plan, message })
}

/// Resolve the tree object of `ports/<name>` in the new commit.
pub fn resolve_tree<V: VersionControl, A>(
    ctx: &RegistryContext<V, A>,
    committed: Committed,
) -> Result<TreeResolved, SyncError> {
    let port = &committed.plan.validated.request.port;
    let git_tree = ctx
        .vcs
        .resolve_tree_hash(&format!("HEAD:{}", paths::port_tree_spec(port)))?;
    tracing::info!("{port}: {} ({git_tree})", Phase::HashResolved);
    Ok(TreeResolved {
        plan: committed.plan,
        message: committed.message,
        git_tree,
    })
}

/// Insert the ledger head entry and point the baseline at it.
pub fn record_version(resolved: TreeResolved) -> Result<VersionRecorded, SyncError> {
    let v = &resolved.plan.validated;
    let scheme = if ledger::uses_semver(&v.paths.manifest)? {
        VersionScheme::Semver
    } else {
        VersionScheme::Plain
    };
    let entry = ledger::record(
        &v.paths.ledger,
        &resolved.git_tree,
        &v.version,
        v.port_revision,
        scheme,
    )?;
    let mirrored = BaselineEntry::from(&entry);
    baseline::set_baseline(&v.paths.baseline, &v.request.port, &mirrored)?;
    tracing::info!("{}: {}", v.request.port, Phase::LedgerUpdated);
    Ok(VersionRecorded {
        plan: resolved.plan,
        message: resolved.message,
        git_tree: resolved.git_tree,
        entry,
        baseline: mirrored,
    })
}

/// Fold the ledger and baseline into the commit and report the result.
pub fn amend<V: VersionControl, A>(
    ctx: &RegistryContext<V, A>,
    recorded: VersionRecorded,
) -> Result<Amended, SyncError> {
    let v = &recorded.plan.validated;
    tracing::info!("{}: {}", v.request.port, Phase::Amending);
    let ledger_file = ctx.relative(&v.paths.ledger);
    let baseline_file = ctx.relative(&v.paths.baseline);
    ctx.vcs.stage(&[ledger_file.clone(), baseline_file.clone()])?;
    ctx.vcs.amend_last_commit()?;

    let commit = ctx.vcs.resolve_tree_hash("HEAD")?;
    let remote = ctx.vcs.remote_url(&ctx.config.remote)?;
    let registry_url = registry_url(remote.as_deref(), &ctx.config.placeholder_url);
    tracing::info!("{}: {} ({commit})", v.request.port, Phase::Done);

    Ok(Amended {
        operation: v.request.operation,
        port: recorded.plan.port(),
        files: vec![
            ctx.relative(&v.paths.recipe),
            ctx.relative(&v.paths.manifest),
            ledger_file,
            baseline_file,
        ],
        message: recorded.message,
        git_tree: recorded.git_tree,
        entry: recorded.entry,
        baseline: recorded.baseline,
        commit,
        registry_url,
    })
}

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

/// Run every phase in order.
pub fn run<V: VersionControl, A: ArchiveHasher>(
    ctx: &RegistryContext<V, A>,
    request: PortRequest,
) -> Result<Amended, SyncError> {
    let validated = validate(ctx, request)?;
    let planned = plan(ctx, validated)?;
    let written = write_artifacts(ctx, planned)?;
    let committed = commit_artifacts(ctx, written)?;
    let resolved = resolve_tree(ctx, committed)?;
    let recorded = record_version(resolved)?;
    amend(ctx, recorded)
}

/// Validate and plan without writing anything.
pub fn preview<V, A: ArchiveHasher>(
    ctx: &RegistryContext<V, A>,
    request: PortRequest,
) -> Result<ArtifactPlan, SyncError> {
    plan(ctx, validate(ctx, request)?)
}

/// `[<name>] new port` or `[<name>] update to <version>[ (port-version n)]`.
pub fn commit_message(
    operation: Operation,
    port: &PortName,
    version: &str,
    port_revision: u32,
) -> String {
    match operation {
        Operation::Create => format!("[{port}] new port"),
        Operation::Update if port_revision > 0 => {
            format!("[{port}] update to {version} (port-version {port_revision})")
        }
        Operation::Update => format!("[{port}] update to {version}"),
    }
}

fn recipe_engine<V, A>(ctx: &RegistryContext<V, A>) -> Result<RecipeEngine, SyncError> {
    Ok(RecipeEngine::with_overrides(
        ctx.config.template_dir_in(&ctx.root).as_deref(),
    )?)
}

fn manifest_seed<'a, V, A>(
    ctx: &'a RegistryContext<V, A>,
    v: &'a Validated,
    scheme: VersionScheme,
) -> ManifestSeed<'a> {
    ManifestSeed {
        name: &v.request.port,
        version: &v.version,
        scheme,
        description: v.request.description.as_deref(),
        upstream_repo: &v.upstream_repo,
        host: &ctx.config.host,
        port_revision: v.port_revision,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn read_optional(path: &Path) -> Result<Option<String>, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
