//! History graph
//!
//! The public result of a track call: a DAG of confirmed element versions
//! rooted at the seed, with classified change edges pointing from later
//! versions to strict ancestors. Nodes live in a petgraph arena addressed
//! by index; a (commit, range) index enforces the no-duplicate-node
//! invariant when branches reconverge.

use crate::models::{ChangeKind, CommitMeta, ElementKind, SourceRange, TerminationReason};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// A confirmed snapshot of the tracked element at one commit.
#[derive(Debug, Clone)]
pub struct HistoryNode {
    pub commit: CommitMeta,
    pub path: String,
    pub kind: ElementKind,
    pub qualified_name: String,
    pub range: SourceRange,
}

/// A classified transition between two history nodes. Immutable once
/// created.
#[derive(Debug, Clone)]
pub struct ChangeEdge {
    pub kind: ChangeKind,
    /// Similarity score in [0, 1]
    pub score: f64,
}

/// The completed history DAG handed to the caller.
#[derive(Debug)]
pub struct History {
    graph: DiGraph<HistoryNode, ChangeEdge>,
    seed: NodeIndex,
    /// Insertion order, which doubles as the deterministic output order
    order: Vec<NodeIndex>,
    node_index: HashMap<(String, SourceRange), NodeIndex>,
    terminals: Vec<(NodeIndex, TerminationReason)>,
    truncated: bool,
}

impl History {
    pub(crate) fn new(seed: HistoryNode) -> Self {
        let key = (seed.commit.id.clone(), seed.range);
        let mut graph = DiGraph::new();
        let seed_idx = graph.add_node(seed);
        let mut node_index = HashMap::new();
        node_index.insert(key, seed_idx);
        Self {
            graph,
            seed: seed_idx,
            order: vec![seed_idx],
            node_index,
            terminals: Vec::new(),
            truncated: false,
        }
    }

    /// Add an earlier version reached from `from`, returning its index and
    /// whether it was newly created. Reconverging branches reuse the
    /// existing node and only contribute the edge.
    pub(crate) fn add_version(
        &mut self,
        from: NodeIndex,
        node: HistoryNode,
        edge: ChangeEdge,
    ) -> (NodeIndex, bool) {
        let key = (node.commit.id.clone(), node.range);
        if let Some(&existing) = self.node_index.get(&key) {
            if self.graph.find_edge(from, existing).is_none() {
                self.graph.add_edge(from, existing, edge);
            }
            return (existing, false);
        }
        let idx = self.graph.add_node(node);
        self.node_index.insert(key, idx);
        self.order.push(idx);
        self.graph.add_edge(from, idx, edge);
        (idx, true)
    }

    /// Add a change edge between two existing nodes, deduplicating
    /// parallel edges from reconverging branches.
    pub(crate) fn connect(&mut self, from: NodeIndex, to: NodeIndex, edge: ChangeEdge) {
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, edge);
        }
    }

    pub(crate) fn mark_terminal(&mut self, node: NodeIndex, reason: TerminationReason) {
        if !self.terminals.iter().any(|(n, r)| *n == node && *r == reason) {
            self.terminals.push((node, reason));
        }
    }

    pub(crate) fn set_truncated(&mut self) {
        self.truncated = true;
    }

    pub fn seed(&self) -> NodeIndex {
        self.seed
    }

    pub fn node(&self, idx: NodeIndex) -> &HistoryNode {
        &self.graph[idx]
    }

    /// Nodes in insertion order: the seed first, ancestors as discovered.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &HistoryNode)> {
        self.order.iter().map(move |&idx| (idx, &self.graph[idx]))
    }

    pub fn edges(&self) -> Vec<(NodeIndex, NodeIndex, &ChangeEdge)> {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight()))
            .collect()
    }

    /// Change edges leaving one node, oldest target last.
    pub fn edges_from(&self, idx: NodeIndex) -> Vec<(NodeIndex, &ChangeEdge)> {
        self.graph
            .edges(idx)
            .map(|e| (e.target(), e.weight()))
            .collect()
    }

    pub fn terminals(&self) -> &[(NodeIndex, TerminationReason)] {
        &self.terminals
    }

    /// Whether the walk stopped early on a budget or cancellation.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Count of edges per change kind.
    pub fn change_summary(&self) -> BTreeMap<ChangeKind, usize> {
        let mut summary = BTreeMap::new();
        for edge in self.graph.edge_references() {
            *summary.entry(edge.weight().kind).or_insert(0) += 1;
        }
        summary
    }

    /// Serializable report with stable node ordinals.
    pub fn to_report(&self) -> HistoryReport {
        let ordinals: HashMap<NodeIndex, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, &idx)| (idx, i))
            .collect();

        let nodes = self
            .order
            .iter()
            .map(|&idx| {
                let node = &self.graph[idx];
                NodeReport {
                    commit: node.commit.id.clone(),
                    short_commit: node.commit.short_id.clone(),
                    author: node.commit.author.clone(),
                    author_email: node.commit.author_email.clone(),
                    authored: node.commit.authored.to_rfc3339(),
                    committed: node.commit.committed.to_rfc3339(),
                    summary: node.commit.summary.clone(),
                    path: node.path.clone(),
                    element: node.qualified_name.clone(),
                    kind: node.kind,
                    start_line: node.range.start_line,
                    end_line: node.range.end_line,
                }
            })
            .collect();

        let mut edges: Vec<EdgeReport> = self
            .graph
            .edge_references()
            .map(|e| EdgeReport {
                from: ordinals[&e.source()],
                to: ordinals[&e.target()],
                change: e.weight().kind,
                score: e.weight().score,
            })
            .collect();
        edges.sort_by_key(|e| (e.from, e.to));

        let terminals = self
            .terminals
            .iter()
            .map(|(idx, reason)| TerminalReport {
                node: ordinals[idx],
                reason: reason.clone(),
            })
            .collect();

        HistoryReport {
            element: self.graph[self.seed].qualified_name.clone(),
            kind: self.graph[self.seed].kind,
            nodes,
            edges,
            terminals,
            truncated: self.truncated,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct HistoryReport {
    pub element: String,
    pub kind: ElementKind,
    pub nodes: Vec<NodeReport>,
    pub edges: Vec<EdgeReport>,
    pub terminals: Vec<TerminalReport>,
    pub truncated: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct NodeReport {
    pub commit: String,
    pub short_commit: String,
    pub author: String,
    pub author_email: String,
    pub authored: String,
    pub committed: String,
    pub summary: String,
    pub path: String,
    pub element: String,
    pub kind: ElementKind,
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EdgeReport {
    pub from: usize,
    pub to: usize,
    pub change: ChangeKind,
    pub score: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TerminalReport {
    pub node: usize,
    pub reason: TerminationReason,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn meta(id: &str) -> CommitMeta {
        CommitMeta {
            id: id.to_string(),
            short_id: id.chars().take(12).collect(),
            parent_ids: Vec::new(),
            author: "a".into(),
            author_email: "a@example.com".into(),
            authored: Utc::now(),
            committed: Utc::now(),
            summary: String::new(),
        }
    }

    fn node(commit: &str, start: u32, end: u32) -> HistoryNode {
        HistoryNode {
            commit: meta(commit),
            path: "A.java".into(),
            kind: ElementKind::Method,
            qualified_name: "A.foo(int)".into(),
            range: SourceRange::new(start, end),
        }
    }

    #[test]
    fn reconverging_branches_share_a_node() {
        let mut history = History::new(node("c3", 5, 10));
        let seed = history.seed();
        let (left, new_left) = history.add_version(
            seed,
            node("c2", 5, 10),
            ChangeEdge {
                kind: ChangeKind::BodyChange,
                score: 0.9,
            },
        );
        assert!(new_left);
        // A second branch reaching the same (commit, range) reuses it.
        let (right, new_right) = history.add_version(
            seed,
            node("c2", 5, 10),
            ChangeEdge {
                kind: ChangeKind::BodyChange,
                score: 0.9,
            },
        );
        assert!(!new_right);
        assert_eq!(left, right);
        assert_eq!(history.node_count(), 2);
        assert_eq!(history.edge_count(), 1);
    }

    #[test]
    fn history_stays_acyclic() {
        let mut history = History::new(node("c3", 5, 10));
        let seed = history.seed();
        let (mid, _) = history.add_version(
            seed,
            node("c2", 5, 10),
            ChangeEdge {
                kind: ChangeKind::Rename,
                score: 0.95,
            },
        );
        history.add_version(
            mid,
            node("c1", 4, 9),
            ChangeEdge {
                kind: ChangeKind::BodyChange,
                score: 0.7,
            },
        );
        assert!(history.is_acyclic());
        assert_eq!(history.change_summary()[&ChangeKind::Rename], 1);
    }

    #[test]
    fn history_is_debug_formattable() {
        let history = History::new(node("c1", 5, 10));
        let rendered = format!("{history:?}");
        assert!(rendered.contains("History"));
    }

    #[test]
    fn connect_deduplicates_parallel_edges() {
        let mut history = History::new(node("c2", 5, 10));
        let seed = history.seed();
        let (earlier, _) = history.add_version(
            seed,
            node("c1", 5, 10),
            ChangeEdge {
                kind: ChangeKind::BodyChange,
                score: 0.8,
            },
        );
        history.connect(
            seed,
            earlier,
            ChangeEdge {
                kind: ChangeKind::BodyChange,
                score: 0.8,
            },
        );
        assert_eq!(history.edge_count(), 1);
    }

    #[test]
    fn report_uses_insertion_ordinals() {
        let mut history = History::new(node("c2", 5, 10));
        let seed = history.seed();
        history.add_version(
            seed,
            node("c1", 5, 10),
            ChangeEdge {
                kind: ChangeKind::BodyChange,
                score: 0.8,
            },
        );
        history.mark_terminal(seed, TerminationReason::Introduced);
        let report = history.to_report();
        assert_eq!(report.nodes.len(), 2);
        assert_eq!(
            report.edges,
            vec![EdgeReport {
                from: 0,
                to: 1,
                change: ChangeKind::BodyChange,
                score: 0.8,
            }]
        );
        assert_eq!(report.terminals.len(), 1);
    }
}
