//! Candidate scoring and change classification
//!
//! Scores each locator candidate by name, signature, AST coverage, and
//! container similarity, selects the best one above the threshold τ, and
//! labels the transition with a change kind. When no candidate clears τ
//! the whole-file mapping is consulted for extraction and inlining before
//! declaring the element introduced.

use crate::config::TrackConfig;
use crate::locate::containers_equivalent;
use crate::matcher::NodeMapping;
use crate::models::{ChangeKind, Element, ElementId, ElementKind, StructuralModel};
use tracing::{debug, trace};

/// Minimum mapped nodes for an extract/inline fragment to count as
/// evidence rather than coincidence.
const MIN_FRAGMENT_NODES: usize = 8;

/// Minimum coverage for the whole-file receiver fallback.
const MIN_RECEIVER_COVERAGE: f64 = 0.5;

/// Outcome of classifying one commit-to-parent transition.
#[derive(Debug)]
pub struct Choice {
    /// Chosen parent-side element, or `None` for "introduced here"
    pub element: Option<ElementId>,
    pub kind: ChangeKind,
    pub score: f64,
}

impl Choice {
    fn introduced() -> Self {
        Self {
            element: None,
            kind: ChangeKind::Introduced,
            score: 0.0,
        }
    }
}

/// Normalized Levenshtein similarity of two identifiers, in [0, 1].
pub fn name_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - edit_distance(&a, &b) as f64 / max_len as f64
}

/// Similarity of two parameter-type lists, in [0, 1].
pub fn signature_similarity(a: &Element, b: &Element) -> f64 {
    let params_a = &a.signature.parameters;
    let params_b = &b.signature.parameters;
    let max_len = params_a.len().max(params_b.len());
    let param_sim = if max_len == 0 {
        1.0
    } else {
        1.0 - edit_distance(params_a, params_b) as f64 / max_len as f64
    };
    let return_sim = if a.signature.return_type == b.signature.return_type {
        1.0
    } else {
        0.0
    };
    0.8 * param_sim + 0.2 * return_sim
}

/// Classic dynamic-programming edit distance over any comparable items.
fn edit_distance<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, item_a) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, item_b) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(item_a != item_b);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Weighted candidate score against the target.
pub fn score_candidate(
    target: &Element,
    target_model: &StructuralModel,
    candidate: &Element,
    candidate_model: &StructuralModel,
    mapping: &NodeMapping,
    config: &TrackConfig,
) -> f64 {
    let w = &config.weights;
    let name = name_similarity(&target.name, &candidate.name);
    let signature = signature_similarity(target, candidate);
    let coverage = mapping.coverage_into(
        &target_model.ast,
        &target.range,
        &candidate_model.ast,
        &candidate.range,
    );
    let container = name_similarity(
        &target_model.container_path_string(target.id),
        &candidate_model.container_path_string(candidate.id),
    );
    (w.name * name + w.signature * signature + w.coverage * coverage + w.container * container)
        / w.sum()
}

/// Choose among the locator's candidates and label the transition.
///
/// `mapping` is the whole-file correspondence from the target's (child)
/// AST to the parent AST.
pub fn classify(
    target: &Element,
    target_model: &StructuralModel,
    candidates: &[ElementId],
    parent_model: &StructuralModel,
    mapping: &NodeMapping,
    config: &TrackConfig,
) -> Choice {
    let best = candidates
        .iter()
        .map(|&id| {
            let candidate = parent_model.get(id);
            let score =
                score_candidate(target, target_model, candidate, parent_model, mapping, config);
            (id, score)
        })
        // Highest score wins; ties break on minimal range delta, then id.
        .min_by(|(a_id, a_score), (b_id, b_score)| {
            b_score
                .partial_cmp(a_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let a_delta = target.range.delta(&parent_model.get(*a_id).range);
                    let b_delta = target.range.delta(&parent_model.get(*b_id).range);
                    a_delta.cmp(&b_delta)
                })
                .then_with(|| a_id.0.cmp(&b_id.0))
        });

    if let Some((id, score)) = best {
        if score >= config.tau {
            let candidate = parent_model.get(id);
            let kind = classify_kind(target, target_model, candidate, parent_model, mapping);
            trace!(
                target = %target.qualified_name,
                candidate = %candidate.qualified_name,
                score,
                ?kind,
                "candidate selected"
            );
            return Choice {
                element: Some(id),
                kind,
                score,
            };
        }
        debug!(
            target = %target.qualified_name,
            best_score = score,
            tau = config.tau,
            "no candidate crossed the threshold"
        );
    }

    // Nothing cheap matched: whole-file AST comparison, looking for the
    // element the target's body came out of.
    if let Some((receiver, coverage)) = find_receiver(target, target_model, parent_model, mapping) {
        if coverage >= config.tau.max(MIN_RECEIVER_COVERAGE) {
            let kind = if origin_is_new(target, target_model, parent_model) {
                ChangeKind::Extract
            } else {
                ChangeKind::ContainerChange
            };
            debug!(
                target = %target.qualified_name,
                receiver = %parent_model.get(receiver).qualified_name,
                coverage,
                ?kind,
                "whole-file fallback matched"
            );
            return Choice {
                element: Some(receiver),
                kind,
                score: coverage,
            };
        }
    }

    Choice::introduced()
}

/// The parent element that receives the largest share of the target's
/// subtree under the whole-file mapping, preferring the most specific
/// (smallest) receiver among equals.
fn find_receiver(
    target: &Element,
    target_model: &StructuralModel,
    parent_model: &StructuralModel,
    mapping: &NodeMapping,
) -> Option<(ElementId, f64)> {
    parent_model
        .iter()
        .filter(|e| matches!(e.kind, ElementKind::Method | ElementKind::Block))
        .map(|e| {
            let coverage = mapping.coverage_into(
                &target_model.ast,
                &target.range,
                &parent_model.ast,
                &e.range,
            );
            (e.id, coverage, e.range.line_count())
        })
        .filter(|(_, coverage, _)| *coverage > 0.0)
        .min_by(|(a_id, a_cov, a_len), (b_id, b_cov, b_len)| {
            b_cov
                .partial_cmp(a_cov)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a_len.cmp(b_len))
                .then_with(|| a_id.0.cmp(&b_id.0))
        })
        .map(|(id, coverage, _)| (id, coverage))
}

/// The target, or its declaring container, was created in the child commit
/// itself: the hallmark of an extraction.
fn origin_is_new(
    target: &Element,
    target_model: &StructuralModel,
    parent_model: &StructuralModel,
) -> bool {
    if !parent_model.has_qualified_name(&target.qualified_name, target.kind) {
        if let Some(container) = target.container.map(|c| target_model.get(c)) {
            return !parent_model.has_name(&container.name);
        }
        return true;
    }
    false
}

fn classify_kind(
    target: &Element,
    target_model: &StructuralModel,
    candidate: &Element,
    parent_model: &StructuralModel,
    mapping: &NodeMapping,
) -> ChangeKind {
    if !containers_equivalent(target, target_model, candidate, parent_model) {
        return ChangeKind::ContainerChange;
    }
    if target.name != candidate.name {
        return ChangeKind::Rename;
    }
    if target.signature.parameters != candidate.signature.parameters
        || target.signature.return_type != candidate.signature.return_type
    {
        return ChangeKind::SignatureChange;
    }
    if target.body_tokens != candidate.body_tokens {
        if absorbed_removed_element(target, target_model, candidate, parent_model, mapping) {
            return ChangeKind::Inline;
        }
        return ChangeKind::BodyChange;
    }
    ChangeKind::Unchanged
}

/// Inline detection: a sizable fragment of the target's body maps into a
/// distinct parent element that no longer exists in the child revision.
fn absorbed_removed_element(
    target: &Element,
    target_model: &StructuralModel,
    candidate: &Element,
    parent_model: &StructuralModel,
    mapping: &NodeMapping,
) -> bool {
    let subtree = target_model.ast.nodes_in_range(&target.range);
    for donor in parent_model.iter() {
        if donor.kind != ElementKind::Method
            || donor.id == candidate.id
            || target_model.has_qualified_name(&donor.qualified_name, ElementKind::Method)
        {
            continue;
        }
        let received = subtree
            .iter()
            .filter(|&&i| {
                mapping
                    .mapped(i)
                    .is_some_and(|j| donor.range.contains(&parent_model.ast.node(j).range))
            })
            .count();
        if received >= MIN_FRAGMENT_NODES {
            return true;
        }
    }
    false
}
