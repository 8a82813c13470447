//! Git remote URL handling.

/// Browser URL of the registry, derived from its remote's fetch URL.
///
/// HTTPS URLs pass through unchanged; `git@host:owner/repo(.git)` and
/// `ssh://git@host/owner/repo(.git)` become `https://host/owner/repo`. With
/// no remote the `placeholder` is returned.
pub fn registry_url(remote: Option<&str>, placeholder: &str) -> String {
    let Some(remote) = remote.map(str::trim).filter(|r| !r.is_empty()) else {
        return placeholder.to_owned();
    };
    match split_ssh(remote) {
        Some((host, path)) => format!("https://{host}/{}", strip_git_suffix(path)),
        None => remote.to_owned(),
    }
}

/// `owner/name` of a repository URL in any of the HTTPS or SSH forms.
pub fn repo_slug(url: &str) -> Option<String> {
    let url = url.trim();
    let path = match split_ssh(url) {
        Some((_, path)) => path,
        None => {
            let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
            rest.split_once('/').map(|(_, path)| path)?
        }
    };
    let path = strip_git_suffix(path.trim_end_matches('/'));
    let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
    let name = segments.next()?;
    let owner = segments.next()?;
    Some(format!("{owner}/{name}"))
}

/// `(host, path)` of an scp-like or `ssh://` URL.
fn split_ssh(url: &str) -> Option<(&str, &str)> {
    if let Some(rest) = url.strip_prefix("ssh://") {
        let (authority, path) = rest.split_once('/')?;
        let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        let host = host.split_once(':').map_or(host, |(h, _)| h);
        return Some((host, path));
    }
    if url.contains("://") {
        return None;
    }
    let (user_host, path) = url.split_once(':')?;
    let (_, host) = user_host.split_once('@')?;
    Some((host, path))
}

fn strip_git_suffix(path: &str) -> &str {
    path.strip_suffix(".git").unwrap_or(path)
}
