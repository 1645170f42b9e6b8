//! Greedy anchor-then-propagate tree matcher
//!
//! Two phases, in the GumTree tradition: first anchor large isomorphic
//! subtrees via bottom-up structure hashes, then greedily match the
//! remaining interior nodes whose descendants already agree.

use super::{AstTree, NodeMapping, TreeMatcher};
use std::collections::HashMap;
use tracing::trace;

pub struct GreedyTreeMatcher {
    /// Subtrees shorter than this are not used as anchors
    pub min_anchor_height: u32,
    /// Minimum dice coefficient for phase-two container matches
    pub dice_threshold: f64,
}

impl Default for GreedyTreeMatcher {
    fn default() -> Self {
        Self {
            min_anchor_height: 2,
            dice_threshold: 0.5,
        }
    }
}

impl TreeMatcher for GreedyTreeMatcher {
    fn match_trees(&self, a: &AstTree, b: &AstTree) -> NodeMapping {
        let mut mapping = NodeMapping::default();
        if a.is_empty() || b.is_empty() {
            return mapping;
        }
        self.anchor_isomorphic(a, b, &mut mapping);
        self.propagate_containers(a, b, &mut mapping);
        trace!(
            matched = mapping.len(),
            a_nodes = a.len(),
            b_nodes = b.len(),
            "tree matching complete"
        );
        mapping
    }
}

impl GreedyTreeMatcher {
    /// Phase one: match whole isomorphic subtrees, largest first.
    fn anchor_isomorphic(&self, a: &AstTree, b: &AstTree, mapping: &mut NodeMapping) {
        let mut by_hash: HashMap<u64, Vec<usize>> = HashMap::new();
        for (i, node) in b.nodes().iter().enumerate() {
            by_hash.entry(node.hash).or_default().push(i);
        }

        let mut order: Vec<usize> = (0..a.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(a.node(i).height));

        for i in order {
            let node = a.node(i);
            if node.height < self.min_anchor_height || mapping.contains_a(i) {
                continue;
            }
            let Some(bucket) = by_hash.get(&node.hash) else {
                continue;
            };
            let Some(best) = self.pick_anchor(a, b, i, bucket, mapping) else {
                continue;
            };
            map_subtrees(a, b, i, best, mapping);
        }
    }

    /// Disambiguate equal-hash candidates: prefer the one under the mapped
    /// image of the target's parent, then the smallest line delta.
    fn pick_anchor(
        &self,
        a: &AstTree,
        b: &AstTree,
        a_idx: usize,
        bucket: &[usize],
        mapping: &NodeMapping,
    ) -> Option<usize> {
        let parent_image = a.node(a_idx).parent.and_then(|p| mapping.mapped(p));
        let range = a.node(a_idx).range;
        bucket
            .iter()
            .filter(|&&j| !mapping.contains_b(j))
            .min_by_key(|&&j| {
                let under_parent = match parent_image {
                    Some(p) => b.node(j).parent != Some(p),
                    None => false,
                };
                (under_parent, range.delta(&b.node(j).range), j)
            })
            .copied()
    }

    /// Phase two: bottom-up, match unmapped interior nodes whose mapped
    /// descendants agree on a counterpart of the same kind.
    fn propagate_containers(&self, a: &AstTree, b: &AstTree, mapping: &mut NodeMapping) {
        let mut order: Vec<usize> = (0..a.len()).collect();
        order.sort_by_key(|&i| a.node(i).height);

        for i in order {
            if mapping.contains_a(i) || a.node(i).children.is_empty() {
                continue;
            }
            // Count, per candidate container in b, how many of this
            // subtree's mapped descendants land beneath it.
            let mut votes: HashMap<usize, usize> = HashMap::new();
            let mut mapped_descendants = 0usize;
            for d in descendants(a, i) {
                let Some(image) = mapping.mapped(d) else {
                    continue;
                };
                mapped_descendants += 1;
                let mut ancestor = b.node(image).parent;
                while let Some(p) = ancestor {
                    if !mapping.contains_b(p) && b.node(p).kind_id == a.node(i).kind_id {
                        *votes.entry(p).or_default() += 1;
                    }
                    ancestor = b.node(p).parent;
                }
            }
            if mapped_descendants == 0 {
                continue;
            }
            let best = votes
                .into_iter()
                .max_by_key(|&(j, count)| (count, std::cmp::Reverse(j)))
                .map(|(j, count)| {
                    let dice = 2.0 * count as f64
                        / (a.node(i).descendants + b.node(j).descendants).max(1) as f64;
                    (j, dice)
                });
            if let Some((j, dice)) = best {
                if dice >= self.dice_threshold {
                    mapping.insert(i, j);
                }
            }
        }

        // Roots of the same grammar symbol always correspond.
        if !mapping.contains_a(0) && !mapping.contains_b(0) && a.node(0).kind_id == b.node(0).kind_id
        {
            mapping.insert(0, 0);
        }
    }
}

/// Map two isomorphic subtrees node for node. Equal hashes imply equal
/// shape, so children pair positionally.
fn map_subtrees(a: &AstTree, b: &AstTree, a_idx: usize, b_idx: usize, mapping: &mut NodeMapping) {
    mapping.insert(a_idx, b_idx);
    let a_children = a.node(a_idx).children.clone();
    let b_children = b.node(b_idx).children.clone();
    for (&ca, &cb) in a_children.iter().zip(b_children.iter()) {
        map_subtrees(a, b, ca, cb, mapping);
    }
}

/// Strict descendants of a node, preorder.
fn descendants(tree: &AstTree, idx: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut stack: Vec<usize> = tree.node(idx).children.clone();
    while let Some(n) = stack.pop() {
        out.push(n);
        stack.extend(tree.node(n).children.iter().copied());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse(source: &str) -> AstTree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();
        AstTree::from_tree_sitter(tree.root_node(), source.as_bytes())
    }

    #[test]
    fn identical_sources_map_completely() {
        let src = "class A { int f(int x) { return x + 1; } }";
        let a = parse(src);
        let b = parse(src);
        let mapping = GreedyTreeMatcher::default().match_trees(&a, &b);
        let full = crate::models::SourceRange::new(1, 1);
        assert!((mapping.coverage(&a, &full) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn renamed_method_body_still_covered() {
        let a = parse("class A { int foo(int x) { int y = x * 2; return y + 1; } }");
        let b = parse("class A { int bar(int x) { int y = x * 2; return y + 1; } }");
        let mapping = GreedyTreeMatcher::default().match_trees(&a, &b);
        let full = crate::models::SourceRange::new(1, 1);
        // Everything except the renamed identifier should find an image.
        assert!(mapping.coverage(&a, &full) > 0.8);
    }

    #[test]
    fn unrelated_sources_map_poorly() {
        let a = parse("class A { void f() { while (true) { g(); } } }");
        let b = parse("interface Q { String name(); int size(); }");
        let mapping = GreedyTreeMatcher::default().match_trees(&a, &b);
        let full = crate::models::SourceRange::new(1, 1);
        assert!(mapping.coverage(&a, &full) < 0.5);
    }

    #[test]
    fn empty_trees_produce_empty_mapping() {
        let mapping =
            GreedyTreeMatcher::default().match_trees(&AstTree::empty(), &AstTree::empty());
        assert!(mapping.is_empty());
    }
}
