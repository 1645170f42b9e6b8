//! codetrail - code-element history reconstruction
//!
//! Walks a git commit graph backward from one code element (a class,
//! method, attribute, variable, or block) and reconstructs every change it
//! went through: renames, signature changes, body edits, moves,
//! extractions, and inlinings, until the commit that introduced it.
//!
//! # Example
//!
//! ```no_run
//! use codetrail::cache::RevisionModelCache;
//! use codetrail::config::TrackConfig;
//! use codetrail::git::GitRepository;
//! use codetrail::parsers::JavaModelBuilder;
//! use codetrail::track::{MethodOptions, MethodTracker};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let repo = Arc::new(GitRepository::discover(Path::new(".")).unwrap());
//! let cache = Arc::new(RevisionModelCache::new(Box::new(JavaModelBuilder)));
//! let tracker = MethodTracker::new(
//!     repo,
//!     cache,
//!     MethodOptions {
//!         start_commit: "HEAD".into(),
//!         file_path: "src/Calculator.java".into(),
//!         name: "add".into(),
//!         line: 42,
//!     },
//!     TrackConfig::default(),
//! )
//! .unwrap();
//! let history = tracker.track().unwrap();
//! for (_, node) in history.nodes() {
//!     println!("{} {}", node.commit.short_id, node.qualified_name);
//! }
//! ```

pub mod builder;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod history;
pub mod locate;
pub mod matcher;
pub mod models;
pub mod parsers;
pub mod score;
pub mod track;

pub use config::TrackConfig;
pub use error::TrackError;
pub use history::{ChangeEdge, History, HistoryNode};
pub use models::{ChangeKind, ElementKind, TerminationReason};
