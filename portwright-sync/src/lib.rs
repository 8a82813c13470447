//! # portwright-sync
//!
//! Two-phase commit orchestration for port create/update.
//!
//! Build a [`RegistryContext`] around a [`VersionControl`] and an
//! [`ArchiveHasher`], then call [`orchestrator::run`] with a
//! [`PortRequest`]. [`orchestrator::preview`] plus [`diff::plan_diffs`] show
//! what a run would write without touching disk or git.

pub mod archive;
pub mod diff;
pub mod error;
pub mod orchestrator;
pub mod remote;
pub mod source;
pub mod vcs;

pub use archive::{ArchiveHasher, HttpArchiveHasher, KnownDigest};
pub use error::{SyncError, ValidationIssue};
pub use orchestrator::{
    Amended, ArtifactPlan, Operation, Phase, PortRequest, RegistryContext, Validated,
};
pub use vcs::{GitCli, VersionControl};
