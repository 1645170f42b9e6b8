//! History builder
//!
//! Drives the walk backward through the commit graph: an explicit worklist
//! of active branch states (one per surviving branch, fanning out at merge
//! commits) rather than recursion, so stack depth stays bounded on deep
//! histories. Branch-local failures become terminal reasons; siblings
//! continue.
//!
//! Branches that reconverge on a position another branch already owns do
//! not walk it again; their anchors are attached to the owning lineage's
//! outcome instead, so every non-seed node ends up with an outgoing edge
//! or a terminal reason.

use crate::cache::RevisionModelCache;
use crate::config::TrackConfig;
use crate::error::TrackError;
use crate::git::{ParentVersion, RepositoryAccess};
use crate::history::{ChangeEdge, History, HistoryNode};
use crate::locate;
use crate::matcher::TreeMatcher;
use crate::models::{ChangeKind, SourceRange, TerminationReason, TrackedElement};
use crate::score;
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Position of a branch cursor: one element version in one commit.
type Key = (String, SourceRange);

/// What happened to the lineage that passed through one position.
/// Replayed onto the anchors of branches that reconverge on it later.
#[derive(Clone)]
enum LineageEvent {
    /// A classified change edge to this history node
    Edge(NodeIndex, ChangeEdge),
    /// The lineage terminated here
    Terminal(TerminationReason),
    /// An unchanged advance into another position
    Forward(Key),
}

enum StepOutcome {
    /// Unchanged in this parent; the cursor moves on without a node
    Advance(TrackedElement),
    /// A classified change into this parent version
    Change(TrackedElement, ChangeEdge),
    /// This parent holds no earlier version of the element
    NoMatch,
    /// Branch-local failure; the reason lands on the branch's anchors
    Failed(TerminationReason),
}

pub struct HistoryBuilder<'a> {
    repo: &'a dyn RepositoryAccess,
    cache: &'a RevisionModelCache,
    matcher: &'a dyn TreeMatcher,
    config: &'a TrackConfig,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> HistoryBuilder<'a> {
    pub fn new(
        repo: &'a dyn RepositoryAccess,
        cache: &'a RevisionModelCache,
        matcher: &'a dyn TreeMatcher,
        config: &'a TrackConfig,
    ) -> Self {
        Self {
            repo,
            cache,
            matcher,
            config,
            cancel: None,
        }
    }

    /// Caller-supplied cancellation flag, checked once per commit visited.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Walk backward from the seed until every branch terminates.
    pub fn run(&self, seed: TrackedElement) -> History {
        let mut history = History::new(node_of(&seed));

        // visited: positions ever scheduled. pending: anchors of branches
        // still in the worklist. settled: events of processed positions.
        let mut visited: HashSet<Key> = HashSet::new();
        let mut pending: HashMap<Key, Vec<NodeIndex>> = HashMap::new();
        let mut settled: HashMap<Key, Vec<LineageEvent>> = HashMap::new();
        let mut worklist: VecDeque<TrackedElement> = VecDeque::new();

        let seed_key = key_of(&seed);
        visited.insert(seed_key.clone());
        pending.insert(seed_key, vec![history.seed()]);
        worklist.push_back(seed);

        let mut commits_visited = 0usize;
        while let Some(cursor) = worklist.pop_front() {
            let key = key_of(&cursor);
            let anchors = pending.remove(&key).unwrap_or_default();

            if self.cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                terminate(
                    &mut history,
                    &anchors,
                    TerminationReason::Cancelled,
                    &mut settled,
                    key,
                );
                history.set_truncated();
                continue;
            }
            if commits_visited >= self.config.max_commits {
                terminate(
                    &mut history,
                    &anchors,
                    TerminationReason::BudgetExceeded,
                    &mut settled,
                    key,
                );
                history.set_truncated();
                continue;
            }
            commits_visited += 1;

            let parents = match self.repo.parent_versions(&cursor.commit.id, &cursor.path) {
                Ok(parents) => parents,
                Err(e) => {
                    warn!(
                        commit = %cursor.commit.short_id,
                        error = %e,
                        "branch aborted on repository error"
                    );
                    terminate(
                        &mut history,
                        &anchors,
                        TerminationReason::Repository,
                        &mut settled,
                        key,
                    );
                    continue;
                }
            };

            // No parent still contains the file: the element originates here.
            if parents.is_empty() {
                terminate(
                    &mut history,
                    &anchors,
                    TerminationReason::Introduced,
                    &mut settled,
                    key,
                );
                continue;
            }

            let mut events: Vec<LineageEvent> = Vec::new();
            let mut extended = false;
            let mut failed = false;
            for parent in &parents {
                match self.step(&cursor, parent) {
                    StepOutcome::Advance(next) => {
                        extended = true;
                        let next_key = key_of(&next);
                        events.push(LineageEvent::Forward(next_key.clone()));
                        if visited.insert(next_key.clone()) {
                            pending.insert(next_key, anchors.clone());
                            worklist.push_back(next);
                        } else {
                            // Another branch owns this position; its
                            // outcome applies to these anchors too.
                            attach(&mut history, &settled, &mut pending, &anchors, next_key);
                        }
                    }
                    StepOutcome::Change(next, edge) => {
                        extended = true;
                        let (node_idx, is_new) =
                            history.add_version(anchors[0], node_of(&next), edge.clone());
                        for &anchor in &anchors[1..] {
                            history.connect(anchor, node_idx, edge.clone());
                        }
                        events.push(LineageEvent::Edge(node_idx, edge));
                        if is_new {
                            let next_key = key_of(&next);
                            visited.insert(next_key.clone());
                            pending.insert(next_key, vec![node_idx]);
                            worklist.push_back(next);
                        }
                    }
                    StepOutcome::NoMatch => {}
                    StepOutcome::Failed(reason) => {
                        for &anchor in &anchors {
                            history.mark_terminal(anchor, reason.clone());
                        }
                        events.push(LineageEvent::Terminal(reason));
                        failed = true;
                    }
                }
            }
            if !extended && !failed {
                for &anchor in &anchors {
                    history.mark_terminal(anchor, TerminationReason::Introduced);
                }
                events.push(LineageEvent::Terminal(TerminationReason::Introduced));
            }
            settled.insert(key, events);
        }

        debug!(
            nodes = history.node_count(),
            edges = history.edge_count(),
            commits_visited,
            "history walk complete"
        );
        history
    }

    /// Process one (commit, parent) step of a branch.
    fn step(&self, cursor: &TrackedElement, parent: &ParentVersion) -> StepOutcome {
        // Identical blob: same content, same element. Advance the cursor
        // without parsing or matching anything.
        if parent.blob_unchanged {
            return StepOutcome::Advance(TrackedElement {
                commit: parent.commit.clone(),
                path: parent.path.clone(),
                model: cursor.model.clone(),
                element: cursor.element,
            });
        }

        let parent_model = match self
            .cache
            .model_of(self.repo, &parent.commit.id, &parent.path)
        {
            Ok(model) => model,
            Err(TrackError::Unparseable { .. }) => {
                warn!(
                    commit = %parent.commit.short_id,
                    path = %parent.path,
                    "unparseable revision; branch stops"
                );
                return StepOutcome::Failed(TerminationReason::Unparseable);
            }
            Err(e) => {
                warn!(commit = %parent.commit.short_id, error = %e, "blob read failed");
                return StepOutcome::Failed(TerminationReason::Repository);
            }
        };

        let target = cursor.element();
        let candidates = locate::candidates_for(target, &cursor.model, &parent_model);

        // Cheap path: an exact twin with an identical body needs no AST
        // mapping to be recognized as unchanged.
        let exact_twin = candidates.iter().copied().find(|&id| {
            let c = parent_model.get(id);
            c.qualified_name == target.qualified_name
                && c.signature == target.signature
                && c.body_tokens == target.body_tokens
        });
        let choice = match exact_twin {
            Some(id) => score::Choice {
                element: Some(id),
                kind: ChangeKind::Unchanged,
                score: 1.0,
            },
            None => {
                let mapping = self.matcher.match_trees(&cursor.model.ast, &parent_model.ast);
                score::classify(
                    target,
                    &cursor.model,
                    &candidates,
                    &parent_model,
                    &mapping,
                    self.config,
                )
            }
        };

        let Some(chosen) = choice.element else {
            return StepOutcome::NoMatch;
        };

        let next = TrackedElement {
            commit: parent.commit.clone(),
            path: parent.path.clone(),
            model: parent_model.clone(),
            element: chosen,
        };

        if choice.kind == ChangeKind::Unchanged {
            return StepOutcome::Advance(next);
        }
        StepOutcome::Change(
            next,
            ChangeEdge {
                kind: choice.kind,
                score: choice.score,
            },
        )
    }
}

fn key_of(cursor: &TrackedElement) -> Key {
    (cursor.commit.id.clone(), cursor.element().range)
}

/// Terminate every anchor of a branch and record the event for branches
/// reconverging on the same position later.
fn terminate(
    history: &mut History,
    anchors: &[NodeIndex],
    reason: TerminationReason,
    settled: &mut HashMap<Key, Vec<LineageEvent>>,
    key: Key,
) {
    for &anchor in anchors {
        history.mark_terminal(anchor, reason.clone());
    }
    settled.insert(key, vec![LineageEvent::Terminal(reason)]);
}

/// Attach reconverging anchors to the lineage that owns a position: still
/// pending, the anchors simply join it; already settled, its recorded
/// events are replayed, following unchanged forwards.
fn attach(
    history: &mut History,
    settled: &HashMap<Key, Vec<LineageEvent>>,
    pending: &mut HashMap<Key, Vec<NodeIndex>>,
    anchors: &[NodeIndex],
    key: Key,
) {
    let mut stack = vec![key];
    while let Some(key) = stack.pop() {
        if let Some(waiting) = pending.get_mut(&key) {
            waiting.extend_from_slice(anchors);
            continue;
        }
        let Some(events) = settled.get(&key) else {
            continue;
        };
        for event in events {
            match event {
                LineageEvent::Edge(node, edge) => {
                    for &anchor in anchors {
                        history.connect(anchor, *node, edge.clone());
                    }
                }
                LineageEvent::Terminal(reason) => {
                    for &anchor in anchors {
                        history.mark_terminal(anchor, reason.clone());
                    }
                }
                LineageEvent::Forward(next) => stack.push(next.clone()),
            }
        }
    }
}

fn node_of(tracked: &TrackedElement) -> HistoryNode {
    let element = tracked.element();
    HistoryNode {
        commit: tracked.commit.clone(),
        path: tracked.path.clone(),
        kind: element.kind,
        qualified_name: element.qualified_name.clone(),
        range: element.range,
    }
}
