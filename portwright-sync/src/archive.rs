//! Upstream source archive digests.
//!
//! A recipe pins the SHA-512 of the tarball the source host serves for a
//! ref. [`HttpArchiveHasher`] downloads that tarball and hashes it as it
//! streams; [`KnownDigest`] returns a digest the caller already has.

use std::io::Read;
use std::time::Duration;

use sha2::{Digest, Sha512};

use crate::error::SyncError;

pub trait ArchiveHasher {
    /// Hex SHA-512 of the source archive of `repo` (`owner/name`) at `git_ref`.
    fn fetch_and_hash(
        &self,
        repo: &str,
        git_ref: &str,
        token: Option<&str>,
    ) -> Result<String, SyncError>;
}

impl<T: ArchiveHasher + ?Sized> ArchiveHasher for Box<T> {
    fn fetch_and_hash(
        &self,
        repo: &str,
        git_ref: &str,
        token: Option<&str>,
    ) -> Result<String, SyncError> {
        (**self).fetch_and_hash(repo, git_ref, token)
    }
}

/// Lowercase hex SHA-512 of everything `reader` yields.
pub fn sha512_hex(mut reader: impl Read) -> std::io::Result<String> {
    let mut hasher = Sha512::new();
    std::io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Downloads `https://<host>/<repo>/archive/<ref>.tar.gz`.
pub struct HttpArchiveHasher {
    host: String,
    agent: ureq::Agent,
}

impl HttpArchiveHasher {
    pub fn new(host: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(30))
            .user_agent(concat!("portwright/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            host: host.trim_end_matches('/').to_owned(),
            agent,
        }
    }

    pub fn archive_url(&self, repo: &str, git_ref: &str) -> String {
        format!("https://{}/{}/archive/{}.tar.gz", self.host, repo, git_ref)
    }
}

impl ArchiveHasher for HttpArchiveHasher {
    fn fetch_and_hash(
        &self,
        repo: &str,
        git_ref: &str,
        token: Option<&str>,
    ) -> Result<String, SyncError> {
        let url = self.archive_url(repo, git_ref);
        tracing::info!("downloading {url}");
        let mut request = self.agent.get(&url);
        if let Some(token) = token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        let response = request.call().map_err(|err| match err {
            ureq::Error::Status(status, _) => SyncError::Http {
                url: url.clone(),
                status,
            },
            ureq::Error::Transport(transport) => SyncError::Network {
                url: url.clone(),
                message: transport.to_string(),
            },
        })?;
        let digest = sha512_hex(response.into_reader()).map_err(|err| SyncError::Network {
            url: url.clone(),
            message: err.to_string(),
        })?;
        tracing::debug!("sha512 of {url}: {digest}");
        Ok(digest)
    }
}

/// A digest supplied up front; no download happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownDigest(String);

impl KnownDigest {
    pub fn new(digest: &str) -> Self {
        Self(digest.trim().to_ascii_lowercase())
    }
}

impl ArchiveHasher for KnownDigest {
    fn fetch_and_hash(
        &self,
        repo: &str,
        git_ref: &str,
        _token: Option<&str>,
    ) -> Result<String, SyncError> {
        tracing::debug!("using supplied sha512 for {repo}@{git_ref}");
        Ok(self.0.clone())
    }
}
