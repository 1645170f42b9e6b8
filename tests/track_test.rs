//! Integration tests for the tracking pipeline
//!
//! Each test builds a throwaway git repository with git2, commits Java
//! sources, and walks a real history. Timestamps and signatures are fixed
//! so runs are deterministic.

use codetrail::cache::RevisionModelCache;
use codetrail::config::TrackConfig;
use codetrail::git::GitRepository;
use codetrail::models::{ChangeKind, TerminationReason};
use codetrail::parsers::JavaModelBuilder;
use codetrail::track::{
    AttributeOptions, AttributeTracker, BlockOptions, BlockTracker, ClassOptions, ClassTracker,
    MethodOptions, MethodTracker, VariableOptions, VariableTracker,
};
use codetrail::TrackError;
use git2::{Commit, Oid, Repository, Signature, Time};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;

fn signature(seconds: i64) -> Signature<'static> {
    Signature::new("Alice Dev", "alice@example.com", &Time::new(seconds, 0)).unwrap()
}

/// Commit a full snapshot of the given files, returning the commit id.
/// No ref is updated: sibling branches of a merge would otherwise trip
/// libgit2's first-parent check, and the tests address commits by id.
fn commit(
    repo: &Repository,
    files: &[(&str, &str)],
    message: &str,
    parents: &[Oid],
    seconds: i64,
) -> Oid {
    let mut builder = repo.treebuilder(None).unwrap();
    for (name, content) in files {
        let blob = repo.blob(content.as_bytes()).unwrap();
        builder.insert(name, blob, 0o100644).unwrap();
    }
    let tree = repo.find_tree(builder.write().unwrap()).unwrap();
    let parent_commits: Vec<Commit> = parents
        .iter()
        .map(|&p| repo.find_commit(p).unwrap())
        .collect();
    let parent_refs: Vec<&Commit> = parent_commits.iter().collect();
    let sig = signature(seconds);
    repo.commit(None, &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

fn open(dir: &TempDir) -> (Arc<GitRepository>, Arc<RevisionModelCache>) {
    let repo = Arc::new(GitRepository::discover(dir.path()).unwrap());
    let cache = Arc::new(RevisionModelCache::new(Box::new(JavaModelBuilder)));
    (repo, cache)
}

fn method_tracker(
    repo: Arc<GitRepository>,
    cache: Arc<RevisionModelCache>,
    start: Oid,
    file: &str,
    name: &str,
    line: u32,
    config: TrackConfig,
) -> MethodTracker {
    MethodTracker::new(
        repo,
        cache,
        MethodOptions {
            start_commit: start.to_string(),
            file_path: file.to_string(),
            name: name.to_string(),
            line,
        },
        config,
    )
    .unwrap()
}

const CALC_FOO: &str = "\
public class Calculator {
    public int foo(int value) {
        int next = value * 2;
        next = next + 7;
        return next;
    }
}
";

const CALC_BAR: &str = "\
public class Calculator {
    public int bar(int value) {
        int next = value * 2;
        next = next + 7;
        return next;
    }
}
";

/// Scenario A: a pure rename with an unchanged body yields one Rename
/// edge with a high similarity score.
#[test]
fn rename_with_unchanged_body() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let c1 = commit(&repo, &[("Calculator.java", CALC_FOO)], "add foo", &[], 100);
    let c2 = commit(
        &repo,
        &[("Calculator.java", CALC_BAR)],
        "rename foo to bar",
        &[c1],
        200,
    );

    let (repo, cache) = open(&dir);
    let history = method_tracker(repo, cache, c2, "Calculator.java", "bar", 2, Default::default())
        .track()
        .unwrap();

    assert_eq!(history.node_count(), 2);
    assert_eq!(history.edge_count(), 1);
    assert!(history.is_acyclic());

    let edges = history.edges();
    let (_, to, edge) = &edges[0];
    assert_eq!(edge.kind, ChangeKind::Rename);
    assert!(edge.score > 0.7, "rename score was {}", edge.score);
    assert_eq!(history.node(*to).qualified_name, "Calculator.foo(int)");
    assert_eq!(
        history.terminals(),
        &[(*to, TerminationReason::Introduced)]
    );
}

/// Scenario B: an element with no commit-touching ancestor has exactly one
/// node, zero edges, terminal reason Introduced.
#[test]
fn introduced_at_root_commit() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let c1 = commit(&repo, &[("Calculator.java", CALC_FOO)], "initial", &[], 100);

    let (repo, cache) = open(&dir);
    let history = method_tracker(repo, cache, c1, "Calculator.java", "foo", 2, Default::default())
        .track()
        .unwrap();

    assert_eq!(history.node_count(), 1);
    assert_eq!(history.edge_count(), 0);
    assert_eq!(
        history.terminals(),
        &[(history.seed(), TerminationReason::Introduced)]
    );
}

const SCALE_V1: &str = "\
public class Calculator {
    public int scale(int value) {
        return value * 2;
    }
}
";

const SCALE_V2: &str = "\
public class Calculator {
    public int scale(int value) {
        return value * 3;
    }
}
";

/// Scenario C: at a merge commit, a parent whose branch never carried the
/// file contributes no branch; the file-bearing parent contributes one.
#[test]
fn merge_with_one_file_bearing_parent() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let base = commit(&repo, &[("Other.java", "class Other {}")], "base", &[], 100);
    let p1 = commit(
        &repo,
        &[("Other.java", "class Other {}"), ("Calculator.java", SCALE_V1)],
        "add calculator",
        &[base],
        200,
    );
    let p2 = commit(
        &repo,
        &[("Other.java", "class Other { int x; }")],
        "unrelated branch",
        &[base],
        250,
    );
    let m = commit(
        &repo,
        &[
            ("Other.java", "class Other { int x; }"),
            ("Calculator.java", SCALE_V2),
        ],
        "merge",
        &[p1, p2],
        300,
    );

    let (repo, cache) = open(&dir);
    let history = method_tracker(repo, cache, m, "Calculator.java", "scale", 2, Default::default())
        .track()
        .unwrap();

    // Exactly one edge out of the merge node, toward the p1 version.
    let seed_edges = history.edges_from(history.seed());
    assert_eq!(seed_edges.len(), 1);
    let (earlier, edge) = &seed_edges[0];
    assert_eq!(edge.kind, ChangeKind::BodyChange);
    assert_eq!(history.node(*earlier).commit.id, p1.to_string());
    assert_eq!(history.node_count(), 2);
    assert_eq!(
        history.terminals(),
        &[(*earlier, TerminationReason::Introduced)]
    );
}

const SERVICE_BEFORE: &str = "\
public class Service {
    public int process(int[] values) {
        int sum = 0;
        for (int v : values) {
            sum = sum + v;
            sum = sum * 2;
            sum = sum - 1;
        }
        return sum;
    }
}
";

const SERVICE_AFTER: &str = "\
public class Service {
    public int process(int[] values) {
        int sum = accumulate(values);
        return sum;
    }

    private int accumulate(int[] values) {
        int sum = 0;
        for (int v : values) {
            sum = sum + v;
            sum = sum * 2;
            sum = sum - 1;
        }
        return sum;
    }
}
";

/// Scenario D: a block extracted into a new private method within one
/// commit classifies as Extract, pointing at its pre-extraction home.
#[test]
fn extracted_block_is_classified_extract() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let c1 = commit(&repo, &[("Service.java", SERVICE_BEFORE)], "inline loop", &[], 100);
    let c2 = commit(
        &repo,
        &[("Service.java", SERVICE_AFTER)],
        "extract accumulate",
        &[c1],
        200,
    );

    let (repo, cache) = open(&dir);
    let tracker = BlockTracker::new(
        repo,
        cache,
        BlockOptions {
            start_commit: c2.to_string(),
            file_path: "Service.java".into(),
            method_name: "accumulate".into(),
            start_line: 9,
            end_line: 13,
        },
        TrackConfig::default(),
    )
    .unwrap();
    let history = tracker.track().unwrap();

    let seed_edges = history.edges_from(history.seed());
    assert_eq!(seed_edges.len(), 1);
    let (earlier, edge) = &seed_edges[0];
    assert_eq!(edge.kind, ChangeKind::Extract);
    // The pre-extraction version lives inside process().
    assert!(history
        .node(*earlier)
        .qualified_name
        .starts_with("Service.process(int[])"));
    assert_eq!(history.node(*earlier).commit.id, c1.to_string());
}

/// The inverse refactoring: a helper's body folded back into its caller,
/// the helper deleted in the same commit, classifies as Inline.
#[test]
fn inlined_helper_is_classified_inline() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let c1 = commit(
        &repo,
        &[("Service.java", SERVICE_AFTER)],
        "helper extracted",
        &[],
        100,
    );
    let c2 = commit(
        &repo,
        &[("Service.java", SERVICE_BEFORE)],
        "inline accumulate",
        &[c1],
        200,
    );

    let (repo, cache) = open(&dir);
    let history = method_tracker(repo, cache, c2, "Service.java", "process", 2, Default::default())
        .track()
        .unwrap();

    let seed_edges = history.edges_from(history.seed());
    assert_eq!(seed_edges.len(), 1);
    let (earlier, edge) = &seed_edges[0];
    assert_eq!(edge.kind, ChangeKind::Inline);
    assert_eq!(
        history.node(*earlier).qualified_name,
        "Service.process(int[])"
    );
}

const F_V0: &str = "\
public class A {
    public int f(int x) {
        return x + 1;
    }
}
";

const F_V1: &str = "\
public class A {
    public int f(int x) {
        return x + 2;
    }
}
";

const F_BROKEN: &str = "\
public class A {
    public int f(int x) {
        return x + ;
    }
}
";

const F_V2: &str = "\
public class A {
    public int f(int x) {
        return x + 3;
    }
}
";

/// Scenario E: one merge parent is unparseable; that branch terminates
/// with reason Unparseable while its sibling completes.
#[test]
fn unparseable_branch_does_not_stop_siblings() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let base = commit(&repo, &[("A.java", F_V0)], "base", &[], 100);
    let p1 = commit(&repo, &[("A.java", F_V1)], "good branch", &[base], 200);
    let p2 = commit(&repo, &[("A.java", F_BROKEN)], "broken branch", &[base], 250);
    let m = commit(&repo, &[("A.java", F_V2)], "merge", &[p1, p2], 300);

    let (repo, cache) = open(&dir);
    let history = method_tracker(repo, cache, m, "A.java", "f", 2, Default::default())
        .track()
        .unwrap();

    // The sibling branch walked all the way to the root.
    let commits: Vec<String> = history.nodes().map(|(_, n)| n.commit.id.clone()).collect();
    assert!(commits.contains(&p1.to_string()));
    assert!(commits.contains(&base.to_string()));
    assert!(!commits.contains(&p2.to_string()));

    let reasons: Vec<&TerminationReason> =
        history.terminals().iter().map(|(_, r)| r).collect();
    assert!(reasons.contains(&&TerminationReason::Unparseable));
    assert!(reasons.contains(&&TerminationReason::Introduced));
    assert!(history.is_acyclic());
}

/// Both merge parents hold the pre-edit method, so the two change nodes
/// reconverge through an unchanged step at the base commit. Every
/// non-seed node must still carry an outgoing edge or a terminal reason.
#[test]
fn reconverging_merge_branches_share_the_origin() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let base = commit(&repo, &[("A.java", F_V0)], "base", &[], 100);
    let p1 = commit(&repo, &[("A.java", F_V0)], "left", &[base], 200);
    let p2 = commit(&repo, &[("A.java", F_V0)], "right", &[base], 250);
    let m = commit(&repo, &[("A.java", F_V1)], "edit f in merge", &[p1, p2], 300);

    let (repo, cache) = open(&dir);
    let history = method_tracker(repo, cache, m, "A.java", "f", 2, Default::default())
        .track()
        .unwrap();

    assert_eq!(history.node_count(), 3);
    assert_complete(&history);
    let introduced = history
        .terminals()
        .iter()
        .filter(|(_, r)| *r == TerminationReason::Introduced)
        .count();
    // Both parent-side versions terminate at the shared origin.
    assert_eq!(introduced, 2);
}

/// Reconvergence where one side arrives after the shared position was
/// already walked: the late branch inherits the recorded outcome.
#[test]
fn late_reconvergence_inherits_the_outcome() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let base = commit(&repo, &[("A.java", F_V0)], "base", &[], 100);
    let p1 = commit(&repo, &[("A.java", F_V0)], "left", &[base], 200);
    let mid = commit(&repo, &[("A.java", F_V0)], "right step", &[base], 240);
    let p2 = commit(&repo, &[("A.java", F_V0)], "right", &[mid], 250);
    let m = commit(&repo, &[("A.java", F_V1)], "edit f in merge", &[p1, p2], 300);

    let (repo, cache) = open(&dir);
    let history = method_tracker(repo, cache, m, "A.java", "f", 2, Default::default())
        .track()
        .unwrap();

    assert_complete(&history);
    let introduced = history
        .terminals()
        .iter()
        .filter(|(_, r)| *r == TerminationReason::Introduced)
        .count();
    assert_eq!(introduced, 2);
}

/// Every non-seed node has at least one outgoing edge or a terminal
/// reason attached.
fn assert_complete(history: &codetrail::History) {
    let terminal_nodes: Vec<_> = history.terminals().iter().map(|(n, _)| *n).collect();
    for (idx, node) in history.nodes() {
        assert!(
            idx == history.seed()
                || !history.edges_from(idx).is_empty()
                || terminal_nodes.contains(&idx),
            "node {} at {} has no outgoing edge and no terminal reason",
            node.qualified_name,
            node.commit.short_id
        );
    }
}

/// A VCS-level file rename with unchanged content adds no history node;
/// the walk follows the old path.
#[test]
fn file_rename_is_followed_silently() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let c1 = commit(&repo, &[("Calculator.java", CALC_FOO)], "initial", &[], 100);
    let c2 = commit(&repo, &[("Calc.java", CALC_FOO)], "rename file", &[c1], 200);

    let (repo, cache) = open(&dir);
    let history = method_tracker(repo, cache, c2, "Calc.java", "foo", 2, Default::default())
        .track()
        .unwrap();

    assert_eq!(history.node_count(), 1);
    assert_eq!(
        history.terminals(),
        &[(history.seed(), TerminationReason::Introduced)]
    );
}

const MOVE_BEFORE: &str = "\
public class A {
    public int m(int x) {
        int y = x * 3;
        return y + 10;
    }
}
class B {
}
";

const MOVE_AFTER: &str = "\
public class A {
}
class B {
    public int m(int x) {
        int y = x * 3;
        return y + 10;
    }
}
";

/// A method moved between classes in the same file is a ContainerChange.
#[test]
fn moved_method_is_container_change() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let c1 = commit(&repo, &[("AB.java", MOVE_BEFORE)], "m in A", &[], 100);
    let c2 = commit(&repo, &[("AB.java", MOVE_AFTER)], "move m to B", &[c1], 200);

    let (repo, cache) = open(&dir);
    let history = method_tracker(repo, cache, c2, "AB.java", "m", 4, Default::default())
        .track()
        .unwrap();

    let seed_edges = history.edges_from(history.seed());
    assert_eq!(seed_edges.len(), 1);
    let (earlier, edge) = &seed_edges[0];
    assert_eq!(edge.kind, ChangeKind::ContainerChange);
    assert_eq!(history.node(*earlier).qualified_name, "A.m(int)");
}

const FIELD_INT: &str = "\
public class A {
    private int total;
}
";

const FIELD_LONG: &str = "\
public class A {
    private long total;
}
";

/// An attribute whose declared type changed classifies as SignatureChange.
#[test]
fn attribute_type_change() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let c1 = commit(&repo, &[("A.java", FIELD_INT)], "int total", &[], 100);
    let c2 = commit(&repo, &[("A.java", FIELD_LONG)], "widen total", &[c1], 200);

    let (repo, cache) = open(&dir);
    let tracker = AttributeTracker::new(
        repo,
        cache,
        AttributeOptions {
            start_commit: c2.to_string(),
            file_path: "A.java".into(),
            name: "total".into(),
            line: 2,
        },
        TrackConfig::default(),
    )
    .unwrap();
    let history = tracker.track().unwrap();

    assert_eq!(history.edge_count(), 1);
    let edges = history.edges();
    assert_eq!(edges[0].2.kind, ChangeKind::SignatureChange);
}

/// Identical repository state and seed produce an identical history.
#[test]
fn repeated_runs_are_deterministic() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let c1 = commit(&repo, &[("Calculator.java", CALC_FOO)], "add foo", &[], 100);
    let c2 = commit(
        &repo,
        &[("Calculator.java", CALC_BAR)],
        "rename foo to bar",
        &[c1],
        200,
    );

    let first = {
        let (repo, cache) = open(&dir);
        method_tracker(repo, cache, c2, "Calculator.java", "bar", 2, Default::default())
            .track()
            .unwrap()
            .to_report()
    };
    let second = {
        let (repo, cache) = open(&dir);
        method_tracker(repo, cache, c2, "Calculator.java", "bar", 2, Default::default())
            .track()
            .unwrap()
            .to_report()
    };
    assert_eq!(first, second);
}

/// Exhausting the commit budget terminates remaining branches with
/// BudgetExceeded and flags the history as truncated.
#[test]
fn budget_exhaustion_truncates_history() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let mut bodies = Vec::new();
    for i in 0..5 {
        bodies.push(format!(
            "public class A {{\n    public int f(int x) {{\n        return x + {i};\n    }}\n}}\n"
        ));
    }
    let mut parents = Vec::new();
    let mut last = None;
    for (i, body) in bodies.iter().enumerate() {
        let id = commit(
            &repo,
            &[("A.java", body.as_str())],
            &format!("v{i}"),
            &parents,
            100 + i as i64,
        );
        parents = vec![id];
        last = Some(id);
    }

    let (repo, cache) = open(&dir);
    let config = TrackConfig {
        max_commits: 2,
        ..Default::default()
    };
    let history = method_tracker(repo, cache, last.unwrap(), "A.java", "f", 2, config)
        .track()
        .unwrap();

    assert!(history.truncated());
    assert!(history
        .terminals()
        .iter()
        .any(|(_, r)| *r == TerminationReason::BudgetExceeded));
    // Bounded: strictly fewer nodes than the five versions that exist.
    assert!(history.node_count() < 5);
}

/// A seed that cannot be located fails the whole call with InvalidSeed.
#[test]
fn missing_seed_is_rejected() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let c1 = commit(&repo, &[("Calculator.java", CALC_FOO)], "initial", &[], 100);

    let (repo, cache) = open(&dir);
    let err = method_tracker(repo, cache, c1, "Calculator.java", "nope", 2, Default::default())
        .track()
        .unwrap_err();
    assert!(matches!(err, TrackError::InvalidSeed(_)));
}

/// Multi-step history: rename then body change, oldest terminal introduced.
#[test]
fn chained_changes_build_a_chain() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let v1 = "\
public class Calculator {
    public int foo(int value) {
        int next = value * 2;
        return next;
    }
}
";
    let c1 = commit(&repo, &[("Calculator.java", v1)], "v1", &[], 100);
    let c2 = commit(&repo, &[("Calculator.java", CALC_FOO)], "grow body", &[c1], 200);
    let c3 = commit(&repo, &[("Calculator.java", CALC_BAR)], "rename", &[c2], 300);

    let (repo, cache) = open(&dir);
    let history = method_tracker(repo, cache, c3, "Calculator.java", "bar", 2, Default::default())
        .track()
        .unwrap();

    assert_eq!(history.node_count(), 3);
    assert_eq!(history.edge_count(), 2);
    let summary = history.change_summary();
    assert_eq!(summary[&ChangeKind::Rename], 1);
    assert_eq!(summary[&ChangeKind::BodyChange], 1);
    assert!(history.is_acyclic());
}

/// The seed file must exist at the start commit; a missing path surfaces
/// as a repository error rather than a panic.
#[test]
fn missing_file_at_seed_is_a_repository_error() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let c1 = commit(&repo, &[("Other.java", "class Other {}")], "initial", &[], 100);

    let (repo, cache) = open(&dir);
    let err = method_tracker(repo, cache, c1, "Missing.java", "foo", 2, Default::default())
        .track()
        .unwrap_err();
    assert!(matches!(err, TrackError::Repository(_)));
}

/// A cancellation flag raised before the walk starts stops at the seed
/// with reason Cancelled and flags the history as truncated.
#[test]
fn raised_cancel_flag_stops_the_walk() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let c1 = commit(&repo, &[("Calculator.java", CALC_FOO)], "v1", &[], 100);
    let c2 = commit(&repo, &[("Calculator.java", CALC_BAR)], "rename", &[c1], 200);

    let (repo, cache) = open(&dir);
    let flag = Arc::new(AtomicBool::new(true));
    let history = method_tracker(repo, cache, c2, "Calculator.java", "bar", 2, Default::default())
        .with_cancel_flag(flag)
        .track()
        .unwrap();

    assert!(history.truncated());
    assert_eq!(history.node_count(), 1);
    assert_eq!(
        history.terminals(),
        &[(history.seed(), TerminationReason::Cancelled)]
    );
}

const ALPHA: &str = "\
public class Alpha {
    private int total;

    public int add(int value) {
        total = total + value;
        return total;
    }
}
";

const BETA: &str = "\
public class Beta {
    private int total;

    public int add(int value) {
        total = total + value;
        return total;
    }
}
";

/// Class-level tracking: a renamed class with an unchanged body.
#[test]
fn renamed_class_is_tracked_end_to_end() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let c1 = commit(&repo, &[("A.java", ALPHA)], "alpha", &[], 100);
    let c2 = commit(&repo, &[("A.java", BETA)], "rename class", &[c1], 200);

    let (repo, cache) = open(&dir);
    let tracker = ClassTracker::new(
        repo,
        cache,
        ClassOptions {
            start_commit: c2.to_string(),
            file_path: "A.java".into(),
            name: "Beta".into(),
        },
        TrackConfig::default(),
    )
    .unwrap();
    let history = tracker.track().unwrap();

    assert_eq!(history.node_count(), 2);
    let edges = history.edges();
    let (_, to, edge) = &edges[0];
    assert_eq!(edge.kind, ChangeKind::Rename);
    assert_eq!(history.node(*to).qualified_name, "Alpha");
    assert_eq!(history.terminals(), &[(*to, TerminationReason::Introduced)]);
}

const NEXT_V1: &str = "\
public class Calculator {
    public int scale(int value) {
        int next = value * 2;
        return next;
    }
}
";

const NEXT_V2: &str = "\
public class Calculator {
    public int scale(int value) {
        int next = value * 3;
        return next;
    }
}
";

/// Variable-level tracking: a local whose initializer changed.
#[test]
fn local_variable_body_change_is_tracked() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let c1 = commit(&repo, &[("Calculator.java", NEXT_V1)], "times two", &[], 100);
    let c2 = commit(
        &repo,
        &[("Calculator.java", NEXT_V2)],
        "times three",
        &[c1],
        200,
    );

    let (repo, cache) = open(&dir);
    let tracker = VariableTracker::new(
        repo,
        cache,
        VariableOptions {
            start_commit: c2.to_string(),
            file_path: "Calculator.java".into(),
            name: "next".into(),
            method_name: "scale".into(),
            line: 3,
        },
        TrackConfig::default(),
    )
    .unwrap();
    let history = tracker.track().unwrap();

    assert_eq!(history.node_count(), 2);
    let edges = history.edges();
    let (_, to, edge) = &edges[0];
    assert_eq!(edge.kind, ChangeKind::BodyChange);
    assert_eq!(
        history.node(*to).qualified_name,
        "Calculator.scale(int)#next"
    );
    assert_eq!(history.terminals(), &[(*to, TerminationReason::Introduced)]);
}
