//! Core data models for codetrail
//!
//! These models are shared across the pipeline: commit metadata from the
//! repository layer, the structural model produced by the language front
//! end, and the taxonomy labels attached to history edges and terminals.

use crate::matcher::AstTree;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Metadata for one commit in the repository DAG. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitMeta {
    /// Full hex object id
    pub id: String,
    /// Short hash (12 characters)
    pub short_id: String,
    /// Parent commit ids, in parent order
    pub parent_ids: Vec<String>,
    /// Author name
    pub author: String,
    /// Author email
    pub author_email: String,
    /// Authored timestamp
    pub authored: DateTime<Utc>,
    /// Committed timestamp
    pub committed: DateTime<Utc>,
    /// Commit message (first line)
    pub summary: String,
}

/// A line range within one file, 1-based and inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub start_line: u32,
    pub end_line: u32,
}

impl SourceRange {
    pub fn new(start_line: u32, end_line: u32) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    /// Whether `other` lies entirely within this range.
    pub fn contains(&self, other: &SourceRange) -> bool {
        self.start_line <= other.start_line && other.end_line <= self.end_line
    }

    /// Distance between two ranges, used as a deterministic tie breaker.
    pub fn delta(&self, other: &SourceRange) -> u32 {
        self.start_line.abs_diff(other.start_line) + self.end_line.abs_diff(other.end_line)
    }

    pub fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

impl std::fmt::Display for SourceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start_line, self.end_line)
    }
}

/// The kind of code element being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Class,
    Method,
    Attribute,
    Variable,
    Block,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::Class => write!(f, "class"),
            ElementKind::Method => write!(f, "method"),
            ElementKind::Attribute => write!(f, "attribute"),
            ElementKind::Variable => write!(f, "variable"),
            ElementKind::Block => write!(f, "block"),
        }
    }
}

/// Declared signature of an element.
///
/// For methods this is parameter types, return type, and modifiers; for
/// attributes and variables the declared type travels in `return_type`;
/// classes and blocks carry modifiers only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub parameters: Vec<String>,
    pub return_type: Option<String>,
    pub modifiers: Vec<String>,
}

impl Signature {
    /// Parenthesized parameter list, e.g. `(int,String)`.
    pub fn parameter_list(&self) -> String {
        format!("({})", self.parameters.join(","))
    }
}

/// Index of an element within its `StructuralModel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub usize);

/// One declared element of a structural model.
#[derive(Debug, Clone)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    /// Simple name (`foo`), or a positional label for blocks (`for[1]`)
    pub name: String,
    /// Qualified name, unique within the file
    pub qualified_name: String,
    /// Declaring container, if any (back-reference, not ownership)
    pub container: Option<ElementId>,
    pub signature: Signature,
    pub range: SourceRange,
    /// Body token stream used for similarity scoring
    pub body_tokens: Vec<String>,
}

/// Immutable set of declared elements for one file at one commit.
///
/// Built once per (commit, path) and owned by its cache entry. Elements
/// live in a flat arena addressed by `ElementId`; container back-references
/// are expressed purely as ids.
#[derive(Debug)]
pub struct StructuralModel {
    /// Path of the file this model was extracted from
    pub path: String,
    elements: Vec<Element>,
    /// File-level AST consumed by the tree matcher
    pub ast: AstTree,
}

impl StructuralModel {
    pub fn new(path: String, elements: Vec<Element>, ast: AstTree) -> Self {
        Self {
            path,
            elements,
            ast,
        }
    }

    pub fn get(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Container chain of an element, outermost first, as simple names.
    pub fn container_path(&self, id: ElementId) -> Vec<&str> {
        let mut path = Vec::new();
        let mut cursor = self.get(id).container;
        while let Some(cid) = cursor {
            let container = self.get(cid);
            path.push(container.name.as_str());
            cursor = container.container;
        }
        path.reverse();
        path
    }

    /// Dotted container chain, e.g. `Outer.Inner.method`.
    pub fn container_path_string(&self, id: ElementId) -> String {
        self.container_path(id).join(".")
    }

    /// Whether any element of the given kind carries this qualified name.
    pub fn has_qualified_name(&self, qualified_name: &str, kind: ElementKind) -> bool {
        self.elements
            .iter()
            .any(|e| e.kind == kind && e.qualified_name == qualified_name)
    }

    /// Whether any element carries this simple name, regardless of kind.
    pub fn has_name(&self, name: &str) -> bool {
        self.elements.iter().any(|e| e.name == name)
    }
}

/// A reference into a structural model plus the commit it belongs to.
///
/// Cross-commit identity is never structural equality; it is established
/// only by the matching pipeline.
#[derive(Debug, Clone)]
pub struct TrackedElement {
    pub commit: CommitMeta,
    pub path: String,
    pub model: Arc<StructuralModel>,
    pub element: ElementId,
}

impl TrackedElement {
    pub fn element(&self) -> &Element {
        self.model.get(self.element)
    }
}

/// Taxonomy label for a classified transition between two element versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Unchanged,
    BodyChange,
    Rename,
    SignatureChange,
    /// Moved between containers or files
    ContainerChange,
    /// A fragment of the prior body was matched into a newly created
    /// sibling element in the same commit
    Extract,
    /// Inverse of `Extract`
    Inline,
    /// Terminal: no earlier version exists
    Introduced,
    /// Kept for taxonomy symmetry; the backward walk never emits it
    Removed,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Unchanged => write!(f, "unchanged"),
            ChangeKind::BodyChange => write!(f, "body change"),
            ChangeKind::Rename => write!(f, "rename"),
            ChangeKind::SignatureChange => write!(f, "signature change"),
            ChangeKind::ContainerChange => write!(f, "container change"),
            ChangeKind::Extract => write!(f, "extract"),
            ChangeKind::Inline => write!(f, "inline"),
            ChangeKind::Introduced => write!(f, "introduced"),
            ChangeKind::Removed => write!(f, "removed"),
        }
    }
}

/// Why a branch of the history walk stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// No earlier version of the element exists
    Introduced,
    /// The revision could not be modeled; the branch stops here
    Unparseable,
    /// A commit or blob on this branch could not be read
    Repository,
    /// The commit-depth budget ran out before the branch finished
    BudgetExceeded,
    /// The caller's cancellation flag was raised
    Cancelled,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::Introduced => write!(f, "introduced"),
            TerminationReason::Unparseable => write!(f, "unparseable"),
            TerminationReason::Repository => write!(f, "repository error"),
            TerminationReason::BudgetExceeded => write!(f, "budget exceeded"),
            TerminationReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Kind-specific fields identifying the starting element of a track call.
///
/// A closed variant rather than an open trait hierarchy, so the locator and
/// classifier rules stay centrally auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SeedLocator {
    Class {
        name: String,
    },
    Method {
        name: String,
        /// Line of the declaration, disambiguating overloads
        line: u32,
    },
    Attribute {
        name: String,
        line: u32,
    },
    Variable {
        name: String,
        method_name: String,
        line: u32,
    },
    Block {
        method_name: String,
        start_line: u32,
        end_line: u32,
    },
}

impl SeedLocator {
    pub fn kind(&self) -> ElementKind {
        match self {
            SeedLocator::Class { .. } => ElementKind::Class,
            SeedLocator::Method { .. } => ElementKind::Method,
            SeedLocator::Attribute { .. } => ElementKind::Attribute,
            SeedLocator::Variable { .. } => ElementKind::Variable,
            SeedLocator::Block { .. } => ElementKind::Block,
        }
    }
}
