// SPDX-License-Identifier: MPL-2.0

//! Worked examples from the specification (trivial resolution,
//! backtracking, diamonds) plus the classic dart-lang `pub` solver-doc
//! scenarios this algorithm has historically been validated against, run
//! end to end against [`OfflineProvider`].

use std::io::Write;

use log::LevelFilter;

use pavo_resolver::version_ranges::{SemanticVersion, VersionRange};
use pavo_resolver::{solve, Dependency, OfflineProvider, PackageRef};

fn init_log() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Trace)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .is_test(true)
        .try_init();
}

fn v(major: u64, minor: u64, patch: u64) -> SemanticVersion {
    SemanticVersion::new(major, minor, patch)
}

fn pkg(name: &str) -> PackageRef {
    PackageRef::named(name)
}

fn dep(name: &str, range: VersionRange<SemanticVersion>) -> Dependency<SemanticVersion> {
    Dependency::new(pkg(name), range)
}

/// https://github.com/dart-lang/pub/blob/master/doc/solver.md#no-conflicts
#[test]
fn no_conflict() {
    init_log();
    let mut provider = OfflineProvider::new();
    provider.add(
        PackageRef::Root,
        v(1, 0, 0),
        vec![dep("foo", VersionRange::between(v(1, 0, 0), v(2, 0, 0)))],
    );
    provider.add(
        pkg("foo"),
        v(1, 0, 0),
        vec![dep("bar", VersionRange::between(v(1, 0, 0), v(2, 0, 0)))],
    );
    provider.add(pkg("bar"), v(1, 0, 0), vec![]);
    provider.add(pkg("bar"), v(2, 0, 0), vec![]);

    let solution = solve(PackageRef::Root, v(1, 0, 0), provider).unwrap();

    assert_eq!(solution.get(&pkg("foo")), Some(&v(1, 0, 0)));
    assert_eq!(solution.get(&pkg("bar")), Some(&v(1, 0, 0)));
}

/// https://github.com/dart-lang/pub/blob/master/doc/solver.md#avoiding-conflict-during-decision-making
#[test]
fn avoiding_conflict_during_decision_making() {
    init_log();
    let mut provider = OfflineProvider::new();
    provider.add(
        PackageRef::Root,
        v(1, 0, 0),
        vec![
            dep("foo", VersionRange::between(v(1, 0, 0), v(2, 0, 0))),
            dep("bar", VersionRange::between(v(1, 0, 0), v(2, 0, 0))),
        ],
    );
    provider.add(
        pkg("foo"),
        v(1, 1, 0),
        vec![dep("bar", VersionRange::between(v(2, 0, 0), v(3, 0, 0)))],
    );
    provider.add(pkg("foo"), v(1, 0, 0), vec![]);
    provider.add(pkg("bar"), v(1, 0, 0), vec![]);
    provider.add(pkg("bar"), v(1, 1, 0), vec![]);
    provider.add(pkg("bar"), v(2, 0, 0), vec![]);

    let solution = solve(PackageRef::Root, v(1, 0, 0), provider).unwrap();

    assert_eq!(solution.get(&pkg("foo")), Some(&v(1, 0, 0)));
    assert_eq!(solution.get(&pkg("bar")), Some(&v(1, 1, 0)));
}

/// https://github.com/dart-lang/pub/blob/master/doc/solver.md#performing-conflict-resolution
#[test]
fn conflict_resolution() {
    init_log();
    let mut provider = OfflineProvider::new();
    provider.add(
        PackageRef::Root,
        v(1, 0, 0),
        vec![dep("foo", VersionRange::higher_than(v(1, 0, 0)))],
    );
    provider.add(
        pkg("foo"),
        v(2, 0, 0),
        vec![dep("bar", VersionRange::between(v(1, 0, 0), v(2, 0, 0)))],
    );
    provider.add(pkg("foo"), v(1, 0, 0), vec![]);
    provider.add(
        pkg("bar"),
        v(1, 0, 0),
        vec![dep("foo", VersionRange::between(v(1, 0, 0), v(2, 0, 0)))],
    );

    let solution = solve(PackageRef::Root, v(1, 0, 0), provider).unwrap();

    assert_eq!(solution.get(&pkg("foo")), Some(&v(1, 0, 0)));
    assert!(solution.get(&pkg("bar")).is_none());
}

/// https://github.com/dart-lang/pub/blob/master/doc/solver.md#conflict-resolution-with-a-partial-satisfier
#[test]
fn conflict_with_partial_satisfier() {
    init_log();
    let mut provider = OfflineProvider::new();
    // root depends on foo ^1.0.0 and target ^2.0.0
    provider.add(
        PackageRef::Root,
        v(1, 0, 0),
        vec![
            dep("foo", VersionRange::between(v(1, 0, 0), v(2, 0, 0))),
            dep("target", VersionRange::between(v(2, 0, 0), v(3, 0, 0))),
        ],
    );
    // foo 1.1.0 depends on left ^1.0.0 and right ^1.0.0
    provider.add(
        pkg("foo"),
        v(1, 1, 0),
        vec![
            dep("left", VersionRange::between(v(1, 0, 0), v(2, 0, 0))),
            dep("right", VersionRange::between(v(1, 0, 0), v(2, 0, 0))),
        ],
    );
    provider.add(pkg("foo"), v(1, 0, 0), vec![]);
    // left 1.0.0 depends on shared >=1.0.0
    provider.add(
        pkg("left"),
        v(1, 0, 0),
        vec![dep("shared", VersionRange::higher_than(v(1, 0, 0)))],
    );
    // right 1.0.0 depends on shared <2.0.0
    provider.add(
        pkg("right"),
        v(1, 0, 0),
        vec![dep("shared", VersionRange::strictly_lower_than(v(2, 0, 0)))],
    );
    provider.add(pkg("shared"), v(2, 0, 0), vec![]);
    // shared 1.0.0 depends on target ^1.0.0
    provider.add(
        pkg("shared"),
        v(1, 0, 0),
        vec![dep("target", VersionRange::between(v(1, 0, 0), v(2, 0, 0)))],
    );
    provider.add(pkg("target"), v(2, 0, 0), vec![]);
    provider.add(pkg("target"), v(1, 0, 0), vec![]);

    let solution = solve(PackageRef::Root, v(1, 0, 0), provider).unwrap();

    assert_eq!(solution.get(&pkg("foo")), Some(&v(1, 0, 0)));
    assert_eq!(solution.get(&pkg("target")), Some(&v(2, 0, 0)));
}

/// Specification §8, scenario 1: trivial resolution, no backtracking needed.
#[test]
fn spec_trivial() {
    init_log();
    let mut provider = OfflineProvider::new();
    provider.add(
        PackageRef::Root,
        v(0, 1, 0),
        vec![dep("a", VersionRange::between(v(1, 0, 0), v(2, 0, 0)))],
    );
    provider.add(pkg("a"), v(1, 0, 0), vec![]);

    let solution = solve(PackageRef::Root, v(0, 1, 0), provider).unwrap();

    assert_eq!(solution.len(), 1);
    assert_eq!(solution.get(&pkg("a")), Some(&v(1, 0, 0)));
}

/// Specification §8, scenario 2: the solver picks the newest `a`, conflicts
/// on `b`, learns, backjumps, and settles on the older `a`.
#[test]
fn spec_backtracking() {
    init_log();
    let mut provider = OfflineProvider::new();
    provider.add(
        PackageRef::Root,
        v(0, 1, 0),
        vec![
            dep("a", VersionRange::between(v(1, 0, 0), v(2, 0, 0))),
            dep("b", VersionRange::between(v(1, 0, 0), v(2, 0, 0))),
        ],
    );
    provider.add(
        pkg("a"),
        v(1, 1, 0),
        vec![dep("b", VersionRange::between(v(2, 0, 0), v(3, 0, 0)))],
    );
    provider.add(pkg("a"), v(1, 0, 0), vec![]);
    provider.add(pkg("b"), v(1, 0, 0), vec![]);

    let solution = solve(PackageRef::Root, v(0, 1, 0), provider).unwrap();

    assert_eq!(solution.get(&pkg("a")), Some(&v(1, 0, 0)));
    assert_eq!(solution.get(&pkg("b")), Some(&v(1, 0, 0)));
}

/// Specification §8, scenario 3: `a`'s only version depends on `b ^2.0`, but
/// only `b 1.0.0` exists — unsatisfiable, and the report names both.
#[test]
fn spec_unsatisfiable_reports_both_deps() {
    init_log();
    let mut provider = OfflineProvider::new();
    provider.add(
        PackageRef::Root,
        v(0, 1, 0),
        vec![
            dep("a", VersionRange::between(v(1, 0, 0), v(2, 0, 0))),
            dep("b", VersionRange::between(v(1, 0, 0), v(2, 0, 0))),
        ],
    );
    provider.add(
        pkg("a"),
        v(1, 0, 0),
        vec![dep("b", VersionRange::between(v(2, 0, 0), v(3, 0, 0)))],
    );
    provider.add(pkg("b"), v(1, 0, 0), vec![]);

    let err = solve(PackageRef::Root, v(0, 1, 0), provider).unwrap_err();
    let report = err.to_string();
    assert!(report.contains("depends on both"), "report: {report}");
    assert!(report.contains("1.0.0"), "report: {report}");
}

/// Specification §8, scenario 4: the requested range has no matching version.
#[test]
fn spec_no_versions() {
    init_log();
    let mut provider = OfflineProvider::new();
    provider.add(
        PackageRef::Root,
        v(0, 1, 0),
        vec![dep("a", VersionRange::higher_than(v(5, 0, 0)))],
    );
    provider.add(pkg("a"), v(1, 0, 0), vec![]);

    let err = solve(PackageRef::Root, v(0, 1, 0), provider).unwrap_err();
    let report = err.to_string();
    assert!(report.contains("no versions"), "report: {report}");
    assert!(report.contains('a'), "report: {report}");
}

/// Specification §8, scenario 5: the provider doesn't know `ghost` at all.
#[test]
fn spec_package_not_found() {
    init_log();
    let mut provider = OfflineProvider::new();
    provider.add(
        PackageRef::Root,
        v(0, 1, 0),
        vec![dep("ghost", VersionRange::any())],
    );

    let err = solve(PackageRef::Root, v(0, 1, 0), provider).unwrap_err();
    let report = err.to_string();
    assert!(report.contains("ghost"), "report: {report}");
    assert!(report.contains("doesn't exist"), "report: {report}");
}

/// Specification §8, scenario 6: a diamond dependency on `c` resolves to the
/// newest version satisfying both branches.
#[test]
fn spec_diamond_picks_newest_shared_version() {
    init_log();
    let mut provider = OfflineProvider::new();
    provider.add(
        PackageRef::Root,
        v(0, 1, 0),
        vec![dep("a", VersionRange::any()), dep("b", VersionRange::any())],
    );
    provider.add(
        pkg("a"),
        v(1, 0, 0),
        vec![dep("c", VersionRange::between(v(1, 0, 0), v(2, 0, 0)))],
    );
    provider.add(
        pkg("b"),
        v(1, 0, 0),
        vec![dep("c", VersionRange::between(v(1, 0, 0), v(2, 0, 0)))],
    );
    provider.add(pkg("c"), v(1, 0, 0), vec![]);
    provider.add(pkg("c"), v(1, 1, 0), vec![]);

    let solution = solve(PackageRef::Root, v(0, 1, 0), provider).unwrap();

    assert_eq!(solution.get(&pkg("c")), Some(&v(1, 1, 0)));
}

/// a0 depends on b and c; b0 depends on d0, b1 depends on a nonexistent d1;
/// c0 has no dependencies, c1 depends on a nonexistent d2; d0 exists with no
/// dependencies. Only one fully satisfiable combination exists.
#[test]
fn double_choices() {
    init_log();
    let mut provider = OfflineProvider::new();
    provider.add(
        PackageRef::Root,
        v(0, 1, 0),
        vec![dep("a", VersionRange::any())],
    );
    provider.add(
        pkg("a"),
        v(0, 0, 0),
        vec![dep("b", VersionRange::any()), dep("c", VersionRange::any())],
    );
    provider.add(
        pkg("b"),
        v(0, 0, 0),
        vec![dep("d", VersionRange::singleton(v(0, 0, 0)))],
    );
    provider.add(
        pkg("b"),
        v(1, 0, 0),
        vec![dep("d", VersionRange::singleton(v(1, 0, 0)))],
    );
    provider.add(pkg("c"), v(0, 0, 0), vec![]);
    provider.add(
        pkg("c"),
        v(1, 0, 0),
        vec![dep("d", VersionRange::singleton(v(2, 0, 0)))],
    );
    provider.add(pkg("d"), v(0, 0, 0), vec![]);

    let solution = solve(PackageRef::Root, v(0, 1, 0), provider).unwrap();

    assert_eq!(solution.get(&pkg("a")), Some(&v(0, 0, 0)));
    assert_eq!(solution.get(&pkg("b")), Some(&v(0, 0, 0)));
    assert_eq!(solution.get(&pkg("c")), Some(&v(0, 0, 0)));
    assert_eq!(solution.get(&pkg("d")), Some(&v(0, 0, 0)));
}
