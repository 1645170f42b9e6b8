//! AST matching boundary
//!
//! Defines the owned AST representation extracted once per revision, the
//! node correspondence produced by a matcher, and the `TreeMatcher` trait
//! the scorer consumes. The shipped implementation is the greedy
//! anchor-then-propagate matcher in [`greedy`].

mod greedy;

pub use greedy::GreedyTreeMatcher;

use crate::models::SourceRange;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use tree_sitter::Node;

/// One node of an owned, language-agnostic AST.
#[derive(Debug, Clone)]
pub struct AstNode {
    /// tree-sitter grammar symbol id
    pub kind_id: u16,
    /// Token text for leaf nodes, None for interior nodes
    pub label: Option<String>,
    pub range: SourceRange,
    pub children: Vec<usize>,
    pub parent: Option<usize>,
    /// Height of the subtree rooted here (leaf = 0)
    pub height: u32,
    /// Structure hash over kind, label, and child hashes
    pub hash: u64,
    /// Number of strict descendants
    pub descendants: usize,
}

/// Flat-arena AST for one file, built from a tree-sitter parse tree.
///
/// Only named nodes are kept; anonymous punctuation adds noise without
/// improving the mapping.
#[derive(Debug, Default)]
pub struct AstTree {
    nodes: Vec<AstNode>,
}

impl AstTree {
    /// Empty tree, used by tests that build models by hand.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Extract an owned tree from a tree-sitter parse result.
    pub fn from_tree_sitter(root: Node, source: &[u8]) -> Self {
        let mut tree = Self::default();
        tree.build(root, source, None);
        tree
    }

    fn build(&mut self, node: Node, source: &[u8], parent: Option<usize>) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(AstNode {
            kind_id: node.kind_id(),
            label: None,
            range: SourceRange::new(
                node.start_position().row as u32 + 1,
                node.end_position().row as u32 + 1,
            ),
            children: Vec::new(),
            parent,
            height: 0,
            hash: 0,
            descendants: 0,
        });

        let mut children = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            children.push(self.build(child, source, Some(idx)));
        }

        let label = if children.is_empty() {
            node.utf8_text(source).ok().map(|s| s.to_string())
        } else {
            None
        };

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        node.kind_id().hash(&mut hasher);
        label.hash(&mut hasher);
        let mut height = 0;
        let mut descendants = 0;
        for &c in &children {
            let child = &self.nodes[c];
            child.hash.hash(&mut hasher);
            height = height.max(child.height + 1);
            descendants += child.descendants + 1;
        }

        let n = &mut self.nodes[idx];
        n.label = label;
        n.children = children;
        n.height = height;
        n.hash = hasher.finish();
        n.descendants = descendants;
        idx
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &AstNode {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> &[AstNode] {
        &self.nodes
    }

    /// Indices of all nodes that lie entirely within the given line range.
    pub fn nodes_in_range(&self, range: &SourceRange) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| range.contains(&n.range))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Best-effort node correspondence between two ASTs.
#[derive(Debug, Default)]
pub struct NodeMapping {
    a_to_b: HashMap<usize, usize>,
    b_to_a: HashMap<usize, usize>,
}

impl NodeMapping {
    pub fn insert(&mut self, a: usize, b: usize) {
        self.a_to_b.insert(a, b);
        self.b_to_a.insert(b, a);
    }

    pub fn mapped(&self, a: usize) -> Option<usize> {
        self.a_to_b.get(&a).copied()
    }

    pub fn mapped_from(&self, b: usize) -> Option<usize> {
        self.b_to_a.get(&b).copied()
    }

    pub fn contains_a(&self, a: usize) -> bool {
        self.a_to_b.contains_key(&a)
    }

    pub fn contains_b(&self, b: usize) -> bool {
        self.b_to_a.contains_key(&b)
    }

    pub fn len(&self) -> usize {
        self.a_to_b.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a_to_b.is_empty()
    }

    /// Coverage ratio of a subtree: the fraction of `a`-side nodes inside
    /// `a_range` whose image lands inside `b_range` on the `b` side.
    pub fn coverage_into(
        &self,
        a: &AstTree,
        a_range: &SourceRange,
        b: &AstTree,
        b_range: &SourceRange,
    ) -> f64 {
        let subtree = a.nodes_in_range(a_range);
        if subtree.is_empty() {
            return 0.0;
        }
        let matched = subtree
            .iter()
            .filter(|&&i| {
                self.mapped(i)
                    .is_some_and(|j| b_range.contains(&b.node(j).range))
            })
            .count();
        matched as f64 / subtree.len() as f64
    }

    /// Fraction of `a`-side nodes inside `a_range` mapped anywhere in `b`.
    pub fn coverage(&self, a: &AstTree, a_range: &SourceRange) -> f64 {
        let subtree = a.nodes_in_range(a_range);
        if subtree.is_empty() {
            return 0.0;
        }
        let matched = subtree.iter().filter(|&&i| self.contains_a(i)).count();
        matched as f64 / subtree.len() as f64
    }
}

/// Computes a best-effort node correspondence between two ASTs.
pub trait TreeMatcher {
    fn match_trees(&self, a: &AstTree, b: &AstTree) -> NodeMapping;
}
