//! Tracker facades
//!
//! One facade per element kind. Construction validates every required
//! field eagerly and returns a typed error on missing or invalid input;
//! `track()` itself only fails with `InvalidSeed` (seed not present in the
//! start revision) or an unrecoverable repository failure.

use crate::builder::HistoryBuilder;
use crate::cache::RevisionModelCache;
use crate::config::TrackConfig;
use crate::error::TrackError;
use crate::git::RepositoryAccess;
use crate::history::History;
use crate::locate;
use crate::matcher::GreedyTreeMatcher;
use crate::models::{SeedLocator, TrackedElement};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Shared engine behind the per-kind facades.
struct Tracker {
    repo: Arc<dyn RepositoryAccess>,
    cache: Arc<RevisionModelCache>,
    matcher: GreedyTreeMatcher,
    config: TrackConfig,
    start_commit: String,
    file_path: String,
    locator: SeedLocator,
    cancel: Option<Arc<AtomicBool>>,
}

impl Tracker {
    fn new(
        repo: Arc<dyn RepositoryAccess>,
        cache: Arc<RevisionModelCache>,
        config: TrackConfig,
        start_commit: String,
        file_path: String,
        locator: SeedLocator,
    ) -> Result<Self, TrackError> {
        config.validate()?;
        if start_commit.trim().is_empty() {
            return Err(TrackError::Config("start commit must not be empty".into()));
        }
        if file_path.trim().is_empty() {
            return Err(TrackError::Config("file path must not be empty".into()));
        }
        Ok(Self {
            repo,
            cache,
            matcher: GreedyTreeMatcher::default(),
            config,
            start_commit,
            file_path,
            locator,
            cancel: None,
        })
    }

    fn track(&self) -> Result<History, TrackError> {
        let start = self.repo.resolve_commit(&self.start_commit)?;
        let model = self
            .cache
            .model_of(self.repo.as_ref(), &start.id, &self.file_path)
            .map_err(|e| match e {
                TrackError::Unparseable { .. } => {
                    TrackError::InvalidSeed(format!("start revision cannot be modeled: {e}"))
                }
                other => other,
            })?;

        let element = locate::seed_element(&model, &self.locator).ok_or_else(|| {
            TrackError::InvalidSeed(format!(
                "no {} matching the given locator in {} at {}",
                self.locator.kind(),
                self.file_path,
                start.short_id
            ))
        })?;

        info!(
            element = %model.get(element).qualified_name,
            commit = %start.short_id,
            "tracking history"
        );

        let seed = TrackedElement {
            commit: start,
            path: self.file_path.clone(),
            model,
            element,
        };
        let builder = HistoryBuilder::new(
            self.repo.as_ref(),
            &self.cache,
            &self.matcher,
            &self.config,
        );
        let history = match &self.cancel {
            Some(flag) => builder.with_cancel(flag).run(seed),
            None => builder.run(seed),
        };
        Ok(history)
    }
}

fn require_name(value: &str, what: &str) -> Result<(), TrackError> {
    if value.trim().is_empty() {
        return Err(TrackError::Config(format!("{what} must not be empty")));
    }
    Ok(())
}

fn require_line(value: u32, what: &str) -> Result<(), TrackError> {
    if value == 0 {
        return Err(TrackError::Config(format!("{what} must be 1-based")));
    }
    Ok(())
}

/// Locator fields for a method track call.
#[derive(Debug, Clone)]
pub struct MethodOptions {
    pub start_commit: String,
    pub file_path: String,
    /// Simple method name
    pub name: String,
    /// Declaring line, disambiguating overloads
    pub line: u32,
}

pub struct MethodTracker {
    inner: Tracker,
}

impl MethodTracker {
    pub fn new(
        repo: Arc<dyn RepositoryAccess>,
        cache: Arc<RevisionModelCache>,
        options: MethodOptions,
        config: TrackConfig,
    ) -> Result<Self, TrackError> {
        require_name(&options.name, "method name")?;
        require_line(options.line, "method line")?;
        let inner = Tracker::new(
            repo,
            cache,
            config,
            options.start_commit,
            options.file_path,
            SeedLocator::Method {
                name: options.name,
                line: options.line,
            },
        )?;
        Ok(Self { inner })
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.inner.cancel = Some(flag);
        self
    }

    pub fn track(&self) -> Result<History, TrackError> {
        self.inner.track()
    }
}

/// Locator fields for a class track call.
#[derive(Debug, Clone)]
pub struct ClassOptions {
    pub start_commit: String,
    pub file_path: String,
    /// Simple or dotted (nested) class name
    pub name: String,
}

pub struct ClassTracker {
    inner: Tracker,
}

impl ClassTracker {
    pub fn new(
        repo: Arc<dyn RepositoryAccess>,
        cache: Arc<RevisionModelCache>,
        options: ClassOptions,
        config: TrackConfig,
    ) -> Result<Self, TrackError> {
        require_name(&options.name, "class name")?;
        let inner = Tracker::new(
            repo,
            cache,
            config,
            options.start_commit,
            options.file_path,
            SeedLocator::Class { name: options.name },
        )?;
        Ok(Self { inner })
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.inner.cancel = Some(flag);
        self
    }

    pub fn track(&self) -> Result<History, TrackError> {
        self.inner.track()
    }
}

/// Locator fields for an attribute (field) track call.
#[derive(Debug, Clone)]
pub struct AttributeOptions {
    pub start_commit: String,
    pub file_path: String,
    pub name: String,
    pub line: u32,
}

pub struct AttributeTracker {
    inner: Tracker,
}

impl AttributeTracker {
    pub fn new(
        repo: Arc<dyn RepositoryAccess>,
        cache: Arc<RevisionModelCache>,
        options: AttributeOptions,
        config: TrackConfig,
    ) -> Result<Self, TrackError> {
        require_name(&options.name, "attribute name")?;
        require_line(options.line, "attribute line")?;
        let inner = Tracker::new(
            repo,
            cache,
            config,
            options.start_commit,
            options.file_path,
            SeedLocator::Attribute {
                name: options.name,
                line: options.line,
            },
        )?;
        Ok(Self { inner })
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.inner.cancel = Some(flag);
        self
    }

    pub fn track(&self) -> Result<History, TrackError> {
        self.inner.track()
    }
}

/// Locator fields for a local-variable track call.
#[derive(Debug, Clone)]
pub struct VariableOptions {
    pub start_commit: String,
    pub file_path: String,
    pub name: String,
    /// Simple name of the enclosing method
    pub method_name: String,
    pub line: u32,
}

pub struct VariableTracker {
    inner: Tracker,
}

impl VariableTracker {
    pub fn new(
        repo: Arc<dyn RepositoryAccess>,
        cache: Arc<RevisionModelCache>,
        options: VariableOptions,
        config: TrackConfig,
    ) -> Result<Self, TrackError> {
        require_name(&options.name, "variable name")?;
        require_name(&options.method_name, "enclosing method name")?;
        require_line(options.line, "variable line")?;
        let inner = Tracker::new(
            repo,
            cache,
            config,
            options.start_commit,
            options.file_path,
            SeedLocator::Variable {
                name: options.name,
                method_name: options.method_name,
                line: options.line,
            },
        )?;
        Ok(Self { inner })
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.inner.cancel = Some(flag);
        self
    }

    pub fn track(&self) -> Result<History, TrackError> {
        self.inner.track()
    }
}

/// Locator fields for a block track call.
#[derive(Debug, Clone)]
pub struct BlockOptions {
    pub start_commit: String,
    pub file_path: String,
    /// Simple name of the enclosing method
    pub method_name: String,
    pub start_line: u32,
    pub end_line: u32,
}

pub struct BlockTracker {
    inner: Tracker,
}

impl BlockTracker {
    pub fn new(
        repo: Arc<dyn RepositoryAccess>,
        cache: Arc<RevisionModelCache>,
        options: BlockOptions,
        config: TrackConfig,
    ) -> Result<Self, TrackError> {
        require_name(&options.method_name, "enclosing method name")?;
        require_line(options.start_line, "block start line")?;
        require_line(options.end_line, "block end line")?;
        if options.end_line < options.start_line {
            return Err(TrackError::Config(
                "block end line must not precede its start line".into(),
            ));
        }
        let inner = Tracker::new(
            repo,
            cache,
            config,
            options.start_commit,
            options.file_path,
            SeedLocator::Block {
                method_name: options.method_name,
                start_line: options.start_line,
                end_line: options.end_line,
            },
        )?;
        Ok(Self { inner })
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.inner.cancel = Some(flag);
        self
    }

    pub fn track(&self) -> Result<History, TrackError> {
        self.inner.track()
    }
}
