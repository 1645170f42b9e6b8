//! Error taxonomy for history tracking
//!
//! Branch-local failures (`Repository`, `Unparseable`) are converted into
//! terminal states inside the history builder; only `InvalidSeed` and
//! `Config` escape a `track()` call.

use thiserror::Error;

/// Errors raised by tracker construction and the tracking pipeline.
#[derive(Error, Debug)]
pub enum TrackError {
    /// The repository or one of its objects could not be read.
    #[error("repository error: {0}")]
    Repository(#[from] git2::Error),

    /// A revision could not be turned into a structural model.
    ///
    /// Fatal to the affected branch only; the builder records it as a
    /// terminal reason and never substitutes another commit.
    #[error("unparseable revision {commit}:{path}: {message}")]
    Unparseable {
        commit: String,
        path: String,
        message: String,
    },

    /// The caller's starting element could not be located in the start
    /// commit's structural model. Fatal to the whole call.
    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    /// Missing or invalid tracker configuration, rejected eagerly at
    /// construction time.
    #[error("invalid configuration: {0}")]
    Config(String),
}
