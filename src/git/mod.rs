//! Repository access using libgit2
//!
//! The tracking pipeline sees repositories only through the
//! [`RepositoryAccess`] trait: commit resolution, parent-version
//! enumeration for one file (rename-aware), and blob retrieval.
//! [`GitRepository`] is the git2-backed implementation.

use crate::error::TrackError;
use crate::models::CommitMeta;
use chrono::{DateTime, TimeZone, Utc};
use git2::{Commit, Delta, DiffFindOptions, Oid, Repository};
use std::path::Path;
use tracing::debug;

/// One parent commit that still contains the tracked file.
#[derive(Debug, Clone)]
pub struct ParentVersion {
    pub commit: CommitMeta,
    /// Path of the file in the parent (differs from the child's path
    /// across a VCS-level rename)
    pub path: String,
    /// The parent's blob is byte-identical to the child's; the step can
    /// skip parsing and matching entirely
    pub blob_unchanged: bool,
}

/// Read-only view of the commit graph consumed by the history builder.
pub trait RepositoryAccess {
    /// Resolve a commit-ish spec (`HEAD`, branch, full or short hash).
    fn resolve_commit(&self, spec: &str) -> Result<CommitMeta, TrackError>;

    /// Every parent of `commit_id` that still contains `path`, with the
    /// file's path in that parent. Parents lacking the file are omitted
    /// (the element originates here). Merge commits yield one entry per
    /// containing parent.
    fn parent_versions(&self, commit_id: &str, path: &str)
        -> Result<Vec<ParentVersion>, TrackError>;

    /// File contents at one commit.
    fn read_blob(&self, commit_id: &str, path: &str) -> Result<Vec<u8>, TrackError>;
}

/// git2-backed repository access.
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Open the repository containing `path` (or any subdirectory).
    pub fn discover(path: &Path) -> Result<Self, TrackError> {
        let repo = Repository::discover(path)?;
        debug!("opened git repository at {:?}", repo.path());
        Ok(Self { repo })
    }

    fn find_commit(&self, commit_id: &str) -> Result<Commit<'_>, TrackError> {
        let oid = Oid::from_str(commit_id)?;
        Ok(self.repo.find_commit(oid)?)
    }

    fn blob_oid(&self, commit: &Commit, path: &str) -> Result<Oid, TrackError> {
        let entry = commit.tree()?.get_path(Path::new(path))?;
        Ok(entry.id())
    }
}

fn timestamp(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).single().unwrap_or_default())
}

/// Convert a git2 commit into the immutable metadata the pipeline carries.
pub fn commit_meta(commit: &Commit) -> CommitMeta {
    let id = commit.id().to_string();
    let author = commit.author();
    CommitMeta {
        short_id: id.chars().take(12).collect(),
        id,
        parent_ids: commit.parent_ids().map(|p| p.to_string()).collect(),
        author: author.name().unwrap_or("<unknown>").to_string(),
        author_email: author.email().unwrap_or("").to_string(),
        authored: timestamp(author.when().seconds()),
        committed: timestamp(commit.time().seconds()),
        summary: commit.summary().unwrap_or("").to_string(),
    }
}

impl RepositoryAccess for GitRepository {
    fn resolve_commit(&self, spec: &str) -> Result<CommitMeta, TrackError> {
        let object = self.repo.revparse_single(spec)?;
        let commit = object.peel_to_commit()?;
        Ok(commit_meta(&commit))
    }

    fn parent_versions(
        &self,
        commit_id: &str,
        path: &str,
    ) -> Result<Vec<ParentVersion>, TrackError> {
        let commit = self.find_commit(commit_id)?;
        let current_blob = self.blob_oid(&commit, path)?;
        let tree = commit.tree()?;

        let mut versions = Vec::new();
        for parent in commit.parents() {
            let parent_tree = parent.tree()?;

            // Fast path: the file exists at the same path in the parent.
            if let Ok(entry) = parent_tree.get_path(Path::new(path)) {
                versions.push(ParentVersion {
                    commit: commit_meta(&parent),
                    path: path.to_string(),
                    blob_unchanged: entry.id() == current_blob,
                });
                continue;
            }

            // The path is absent: look for a VCS-level rename.
            let mut diff =
                self.repo
                    .diff_tree_to_tree(Some(&parent_tree), Some(&tree), None)?;
            let mut find_opts = DiffFindOptions::new();
            find_opts.renames(true);
            diff.find_similar(Some(&mut find_opts))?;

            let renamed_from = diff.deltas().find_map(|delta| {
                if delta.status() != Delta::Renamed {
                    return None;
                }
                let new_path = delta.new_file().path()?;
                if new_path != Path::new(path) {
                    return None;
                }
                let old_path = delta.old_file().path()?.to_string_lossy().into_owned();
                Some((old_path, delta.old_file().id()))
            });

            if let Some((old_path, old_blob)) = renamed_from {
                debug!(
                    parent = %parent.id(),
                    from = %old_path,
                    to = %path,
                    "followed file rename"
                );
                versions.push(ParentVersion {
                    commit: commit_meta(&parent),
                    path: old_path,
                    blob_unchanged: old_blob == current_blob,
                });
            }
            // No entry and no rename: this parent never had the file.
        }
        Ok(versions)
    }

    fn read_blob(&self, commit_id: &str, path: &str) -> Result<Vec<u8>, TrackError> {
        let commit = self.find_commit(commit_id)?;
        let oid = self.blob_oid(&commit, path)?;
        let blob = self.repo.find_blob(oid)?;
        Ok(blob.content().to_vec())
    }
}
