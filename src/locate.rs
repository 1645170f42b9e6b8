//! Element locator
//!
//! Finds the seed element for a track call and, during the walk, the
//! parent-revision candidates that might be "the same" logical element.
//! Candidate tiers run from cheapest and most specific to most expensive
//! and least specific, so whole-tree comparison only happens when the
//! cheap name, signature, and containment heuristics all fail.

use crate::models::{Element, ElementId, ElementKind, SeedLocator, SourceRange, StructuralModel};
use crate::score::name_similarity;
use tracing::trace;

/// Containers renamed beyond this similarity are treated as moves.
const RENAMED_CONTAINER_SIMILARITY: f64 = 0.5;

/// Locate the caller's starting element in the start commit's model.
pub fn seed_element(model: &StructuralModel, locator: &SeedLocator) -> Option<ElementId> {
    match locator {
        SeedLocator::Class { name } => model
            .iter()
            .filter(|e| e.kind == ElementKind::Class)
            .find(|e| e.qualified_name == *name || e.name == *name)
            .map(|e| e.id),
        SeedLocator::Method { name, line } => nearest_named(model, ElementKind::Method, name, *line),
        SeedLocator::Attribute { name, line } => {
            nearest_named(model, ElementKind::Attribute, name, *line)
        }
        SeedLocator::Variable {
            name,
            method_name,
            line,
        } => model
            .iter()
            .filter(|e| {
                e.kind == ElementKind::Variable
                    && e.name == *name
                    && container_name(model, e) == Some(method_name.as_str())
            })
            .min_by_key(|e| e.range.start_line.abs_diff(*line))
            .map(|e| e.id),
        SeedLocator::Block {
            method_name,
            start_line,
            end_line,
        } => {
            let wanted = SourceRange::new(*start_line, *end_line);
            let blocks: Vec<&Element> = model
                .iter()
                .filter(|e| {
                    e.kind == ElementKind::Block
                        && container_name(model, e) == Some(method_name.as_str())
                })
                .collect();
            // Exact range first, then the smallest block containing it.
            blocks
                .iter()
                .find(|e| e.range == wanted)
                .or_else(|| {
                    blocks
                        .iter()
                        .filter(|e| e.range.contains(&wanted))
                        .min_by_key(|e| e.range.line_count())
                })
                .map(|e| e.id)
        }
    }
}

fn nearest_named(
    model: &StructuralModel,
    kind: ElementKind,
    name: &str,
    line: u32,
) -> Option<ElementId> {
    model
        .iter()
        .filter(|e| e.kind == kind && e.name == name)
        .filter(|e| {
            e.range.contains(&SourceRange::new(line, line)) || e.range.start_line == line
        })
        .min_by_key(|e| e.range.start_line.abs_diff(line))
        .map(|e| e.id)
}

fn container_name<'a>(model: &'a StructuralModel, element: &Element) -> Option<&'a str> {
    element.container.map(|c| model.get(c).name.as_str())
}

/// Qualified name without the parameter list, the identity tier-two
/// compares when only the signature changed.
fn base_qualified_name(element: &Element) -> &str {
    match element.qualified_name.find('(') {
        Some(idx) => &element.qualified_name[..idx],
        None => &element.qualified_name,
    }
}

/// Whether two elements declare in "the same" container: identical simple
/// names, or a renamed container that no longer exists under its old name
/// in the parent revision.
pub(crate) fn containers_equivalent(
    target: &Element,
    target_model: &StructuralModel,
    candidate: &Element,
    candidate_model: &StructuralModel,
) -> bool {
    let target_container = target.container.map(|c| target_model.get(c));
    let candidate_container = candidate.container.map(|c| candidate_model.get(c));
    match (target_container, candidate_container) {
        (None, None) => true,
        (Some(t), Some(c)) => {
            if t.name == c.name {
                return true;
            }
            name_similarity(&t.name, &c.name) >= RENAMED_CONTAINER_SIMILARITY
                && !candidate_model.has_name(&t.name)
        }
        _ => false,
    }
}

/// Candidates in `model` that might be the same logical element as
/// `target`. Each tier returns as soon as it matches.
pub fn candidates_for(
    target: &Element,
    target_model: &StructuralModel,
    model: &StructuralModel,
) -> Vec<ElementId> {
    // Tier 1: exact qualified name, signature, and kind.
    let tier1: Vec<ElementId> = model
        .iter()
        .filter(|e| {
            e.kind == target.kind
                && e.qualified_name == target.qualified_name
                && e.signature == target.signature
        })
        .map(|e| e.id)
        .collect();
    if !tier1.is_empty() {
        trace!(element = %target.qualified_name, "tier 1: exact match");
        return tier1;
    }

    // Tier 2: exact qualified name and kind; signature differs.
    let tier2: Vec<ElementId> = model
        .iter()
        .filter(|e| {
            e.kind == target.kind && base_qualified_name(e) == base_qualified_name(target)
        })
        .map(|e| e.id)
        .collect();
    if !tier2.is_empty() {
        trace!(element = %target.qualified_name, "tier 2: signature candidates");
        return tier2;
    }

    // Tier 3: same simple name and kind in the same or a renamed container.
    let tier3: Vec<ElementId> = model
        .iter()
        .filter(|e| {
            e.kind == target.kind
                && e.name == target.name
                && containers_equivalent(target, target_model, e, model)
        })
        .map(|e| e.id)
        .collect();
    if !tier3.is_empty() {
        trace!(element = %target.qualified_name, "tier 3: simple-name candidates");
        return tier3;
    }

    // Tier 4: structural containment, covering extraction, inlining, and
    // block motion within the file.
    let tier4: Vec<ElementId> = model
        .iter()
        .filter(|e| kinds_containable(target.kind, e.kind))
        .filter(|e| e.range.contains(&target.range) || target.range.contains(&e.range))
        .map(|e| e.id)
        .collect();
    if !tier4.is_empty() {
        trace!(element = %target.qualified_name, "tier 4: containment candidates");
        return tier4;
    }

    // Tier 5: nothing cheap applies; the scorer falls back to whole-file
    // AST comparison.
    Vec::new()
}

fn kinds_containable(target: ElementKind, candidate: ElementKind) -> bool {
    target == candidate
        || matches!(
            (target, candidate),
            (ElementKind::Block, ElementKind::Method) | (ElementKind::Method, ElementKind::Block)
        )
}
