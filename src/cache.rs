//! Revision model cache
//!
//! Memoizes the structural model extracted for each (commit, path) so
//! repeated visits and concurrent `track()` calls never parse the same
//! revision twice. Parse failures are cached as a sentinel and never
//! retried; the history builder treats them as a hard branch stop.
//!
//! The cache is an explicitly owned, injected component tied to a
//! repository session, not a hidden global, so tests can use isolated
//! caches.

use crate::error::TrackError;
use crate::git::RepositoryAccess;
use crate::models::StructuralModel;
use crate::parsers::ModelBuilder;
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

#[derive(Clone)]
enum ModelOutcome {
    Parsed(Arc<StructuralModel>),
    Unparseable(String),
}

/// Thread-safe, compute-once-per-key model cache.
///
/// Entries hold an `Arc<OnceLock>` in-flight marker: concurrent misses for
/// the same key block on the first parser instead of duplicating work.
pub struct RevisionModelCache {
    entries: DashMap<(String, String), Arc<OnceLock<ModelOutcome>>>,
    builder: Box<dyn ModelBuilder>,
}

impl RevisionModelCache {
    pub fn new(builder: Box<dyn ModelBuilder>) -> Self {
        Self {
            entries: DashMap::new(),
            builder,
        }
    }

    /// Structural model of `path` at `commit_id`.
    ///
    /// Blob-read failures propagate as [`TrackError::Repository`] and are
    /// not cached; parse failures come back as [`TrackError::Unparseable`]
    /// from the cached sentinel on every subsequent call.
    pub fn model_of(
        &self,
        repo: &dyn RepositoryAccess,
        commit_id: &str,
        path: &str,
    ) -> Result<Arc<StructuralModel>, TrackError> {
        let key = (commit_id.to_string(), path.to_string());
        let slot = self
            .entries
            .entry(key)
            .or_insert_with(|| Arc::new(OnceLock::new()))
            .clone();

        if let Some(outcome) = slot.get() {
            return outcome_result(outcome.clone(), commit_id, path);
        }

        let bytes = repo.read_blob(commit_id, path)?;
        let outcome = slot
            .get_or_init(|| match self.builder.build_model(&bytes, path) {
                Ok(model) => ModelOutcome::Parsed(Arc::new(model)),
                Err(e) => {
                    debug!(commit = commit_id, path, "caching unparseable sentinel");
                    ModelOutcome::Unparseable(e.message)
                }
            })
            .clone();
        outcome_result(outcome, commit_id, path)
    }

    /// Number of memoized (commit, path) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn outcome_result(
    outcome: ModelOutcome,
    commit_id: &str,
    path: &str,
) -> Result<Arc<StructuralModel>, TrackError> {
    match outcome {
        ModelOutcome::Parsed(model) => Ok(model),
        ModelOutcome::Unparseable(message) => Err(TrackError::Unparseable {
            commit: commit_id.to_string(),
            path: path.to_string(),
            message,
        }),
    }
}
