//! Version-controlled fetch.
//!
//! The VCS client runs as an external process through the command runner, so
//! its progress lands in the same log as buildpack commands. Git revisions are
//! resolved with `gix` before checkout so a missing revision is reported as
//! such rather than as an opaque client failure.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::FetchError;
use crate::consts::{DEFAULT_GIT_REVISION, DEFAULT_HG_REVISION};
use crate::runner::{CommandOutput, run_program};

/// Version control system implied by a repository URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
  Git,
  Mercurial,
}

impl VcsKind {
  /// Infer the VCS from a URL or local path.
  ///
  /// `hg+` prefixes and local directories holding `.hg` select Mercurial.
  /// Everything else is treated as Git.
  pub fn detect(url: &str) -> Self {
    if url.starts_with("hg+") || Path::new(url).join(".hg").is_dir() {
      VcsKind::Mercurial
    } else {
      VcsKind::Git
    }
  }

  /// Revision checked out when the caller does not name one.
  pub fn default_revision(self) -> &'static str {
    match self {
      VcsKind::Git => DEFAULT_GIT_REVISION,
      VcsKind::Mercurial => DEFAULT_HG_REVISION,
    }
  }

  fn client(self) -> &'static str {
    match self {
      VcsKind::Git => "git",
      VcsKind::Mercurial => "hg",
    }
  }

  fn metadata_dir(self) -> &'static str {
    match self {
      VcsKind::Git => ".git",
      VcsKind::Mercurial => ".hg",
    }
  }
}

impl fmt::Display for VcsKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.client())
  }
}

/// A checked-out repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedRepo {
  pub path: PathBuf,
  pub kind: VcsKind,
  /// The revision that was requested (after defaulting).
  pub rev: String,
  /// The commit the working tree now points at.
  pub commit: String,
}

/// Clone `url` into `dest` (or update an existing checkout there) and move the
/// working tree to `rev`.
///
/// When `rev` is `None` the kind's default revision is used (`master` for Git).
/// Nothing is cleaned up on failure.
pub async fn fetch_vcs(dest: &Path, url: &str, rev: Option<&str>) -> Result<FetchedRepo, FetchError> {
  let kind = VcsKind::detect(url);
  let client_url = strip_scheme_prefix(url);
  let rev = rev.unwrap_or(kind.default_revision());

  let dest = std::path::absolute(dest).map_err(|e| FetchError::ResolvePath {
    path: dest.to_path_buf(),
    source: e,
  })?;

  if dest.join(kind.metadata_dir()).exists() {
    debug!(%kind, path = %dest.display(), "updating existing checkout");
    match kind {
      VcsKind::Git => client(kind, client_url, &dest, &["fetch", "--tags", "origin"]).await?,
      VcsKind::Mercurial => client(kind, client_url, &dest, &["pull"]).await?,
    };
  } else {
    fs::create_dir_all(&dest).map_err(|e| FetchError::CreateDir {
      path: dest.clone(),
      source: e,
    })?;
    info!(%kind, url = client_url, path = %dest.display(), "cloning repository");
    let dest_arg = dest.to_string_lossy();
    client(kind, client_url, &dest, &["clone", client_url, &*dest_arg]).await?;
  }

  let commit = match kind {
    VcsKind::Git => checkout_git(&dest, client_url, rev).await?,
    VcsKind::Mercurial => update_hg(&dest, client_url, rev).await?,
  };

  info!(%kind, rev, commit = %commit, "checked out revision");
  Ok(FetchedRepo {
    path: dest,
    kind,
    rev: rev.to_string(),
    commit,
  })
}

async fn checkout_git(dest: &Path, url: &str, rev: &str) -> Result<String, FetchError> {
  let repo = gix::open(dest).map_err(|e| FetchError::Open {
    path: dest.to_path_buf(),
    source: Box::new(e),
  })?;

  let commit = resolve_revision(&repo, url, rev)?;
  client(VcsKind::Git, url, dest, &["checkout", "--quiet", "--detach", commit.as_str()]).await?;
  Ok(commit)
}

/// Resolve a revision (branch, tag, or commit) to a commit hash.
///
/// Remote-tracking branches win over local names so an updated checkout moves
/// to the fetched tip rather than a stale local branch.
fn resolve_revision(repo: &gix::Repository, url: &str, rev: &str) -> Result<String, FetchError> {
  let remote_branch = format!("origin/{}", rev);

  for candidate in [remote_branch.as_str(), rev] {
    let spec = format!("{}^{{commit}}", candidate);
    if let Ok(id) = repo.rev_parse_single(spec.as_str()) {
      debug!(rev, candidate, "resolved revision");
      return Ok(id.detach().to_string());
    }
  }

  Err(FetchError::RevisionNotFound {
    url: url.to_string(),
    rev: rev.to_string(),
  })
}

async fn update_hg(dest: &Path, url: &str, rev: &str) -> Result<String, FetchError> {
  client(VcsKind::Mercurial, url, dest, &["update", "-r", rev]).await?;
  let output = client(VcsKind::Mercurial, url, dest, &["id", "-i"]).await?;
  Ok(output.stdout.first().map(|s| s.trim().to_string()).unwrap_or_default())
}

async fn client(kind: VcsKind, url: &str, dest: &Path, args: &[&str]) -> Result<CommandOutput, FetchError> {
  run_program(kind.client(), args, dest).await.map_err(|e| FetchError::Vcs {
    kind,
    url: url.to_string(),
    source: e,
  })
}

fn strip_scheme_prefix(url: &str) -> &str {
  url
    .strip_prefix("hg+")
    .or_else(|| url.strip_prefix("git+"))
    .unwrap_or(url)
}

/// Derive a directory name from a repository URL.
///
/// Takes the last path segment and drops a `.git` suffix:
/// `https://host/org/python.git` becomes `python`.
pub fn repo_name_from_url(url: &str) -> Option<String> {
  let trimmed = strip_scheme_prefix(url).trim_end_matches('/');
  let last = trimmed.rsplit(['/', ':']).next()?;
  let name = last.strip_suffix(".git").unwrap_or(last);

  if name.is_empty() || name == "." || name == ".." {
    None
  } else {
    Some(name.to_string())
  }
}
