// SPDX-License-Identifier: MPL-2.0

//! Solver-level behaviors that aren't tied to one specific worked example:
//! determinism, re-solving a pinned solution, and the way an empty
//! dependency range excludes the version that carries it.

use pavo_resolver::version_ranges::{SemanticVersion, VersionRange};
use pavo_resolver::{solve, Dependency, OfflineProvider, PackageRef, Provider};

fn v(major: u64, minor: u64, patch: u64) -> SemanticVersion {
    SemanticVersion::new(major, minor, patch)
}

fn pkg(name: &str) -> PackageRef {
    PackageRef::named(name)
}

fn dep(name: &str, range: VersionRange<SemanticVersion>) -> Dependency<SemanticVersion> {
    Dependency::new(pkg(name), range)
}

/// A dependency on the empty range means "nothing satisfies this", which
/// rules out the version that declared it, not the dependency's target.
#[test]
fn empty_range_dependency_excludes_the_declaring_version() {
    let mut provider = OfflineProvider::new();
    provider.add(
        PackageRef::Root,
        v(0, 1, 0),
        vec![dep("a", VersionRange::any())],
    );
    // a 1.0.0 depends on b through the empty set: it can never be chosen.
    provider.add(pkg("a"), v(1, 0, 0), vec![dep("b", VersionRange::empty())]);
    // a 0.1.0 has no such constraint and should be picked instead.
    provider.add(pkg("a"), v(0, 1, 0), vec![]);
    provider.add(pkg("b"), v(1, 0, 0), vec![]);

    let solution = solve(PackageRef::Root, v(0, 1, 0), provider).unwrap();

    assert_eq!(solution.get(&pkg("a")), Some(&v(0, 1, 0)));
    assert!(solution.get(&pkg("b")).is_none());
}

/// A dependency's own constraint on a third package still shows up in the
/// solution even though it's never mentioned by the root.
#[test]
fn transitive_constraints_affect_the_solution() {
    let mut provider = OfflineProvider::new();
    provider.add(
        PackageRef::Root,
        v(0, 1, 0),
        vec![dep("a", VersionRange::any())],
    );
    provider.add(
        pkg("a"),
        v(1, 0, 0),
        vec![
            dep("b", VersionRange::any()),
            dep("c", VersionRange::singleton(v(1, 0, 0))),
        ],
    );
    provider.add(pkg("b"), v(1, 0, 0), vec![dep("c", VersionRange::any())]);
    provider.add(pkg("c"), v(1, 0, 0), vec![]);
    provider.add(pkg("c"), v(2, 0, 0), vec![]);

    let solution = solve(PackageRef::Root, v(0, 1, 0), provider).unwrap();

    assert_eq!(solution.get(&pkg("a")), Some(&v(1, 0, 0)));
    assert_eq!(solution.get(&pkg("b")), Some(&v(1, 0, 0)));
    assert_eq!(solution.get(&pkg("c")), Some(&v(1, 0, 0)));
}

/// Repeated solves of the same registry produce byte-identical decisions.
#[test]
fn same_result_on_repeated_runs() {
    let mut provider = OfflineProvider::new();
    provider.add(pkg("c"), v(1, 0, 0), vec![]);
    provider.add(pkg("c"), v(2, 0, 0), vec![]);
    provider.add(pkg("b"), v(1, 0, 0), vec![]);
    provider.add(
        pkg("b"),
        v(2, 0, 0),
        vec![dep("c", VersionRange::between(v(1, 0, 0), v(2, 0, 0)))],
    );
    provider.add(
        PackageRef::Root,
        v(0, 1, 0),
        vec![dep("b", VersionRange::any()), dep("c", VersionRange::any())],
    );

    let first = solve(PackageRef::Root, v(0, 1, 0), provider.clone()).unwrap();
    for _ in 0..10 {
        let again = solve(PackageRef::Root, v(0, 1, 0), provider.clone()).unwrap();
        assert_eq!(first, again);
    }
}

/// A successful solve can be fed right back through the solver, pinned
/// exactly, and must succeed again with the same result.
#[test]
fn pinned_rerun_succeeds() {
    let mut provider = OfflineProvider::new();
    provider.add(
        PackageRef::Root,
        v(0, 1, 0),
        vec![dep("a", VersionRange::any()), dep("b", VersionRange::any())],
    );
    provider.add(pkg("a"), v(1, 0, 0), vec![dep("b", VersionRange::any())]);
    provider.add(pkg("b"), v(1, 0, 0), vec![]);
    provider.add(pkg("b"), v(2, 0, 0), vec![]);

    let solution = solve(PackageRef::Root, v(0, 1, 0), provider.clone()).unwrap();

    let mut pinned = OfflineProvider::new();
    pinned.add(
        PackageRef::Root,
        v(0, 1, 0),
        solution
            .iter()
            .map(|(p, ver)| dep(p.name(), VersionRange::singleton(ver.clone())))
            .collect(),
    );
    for (p, ver) in &solution {
        let deps = provider
            .dependencies_of(p, ver)
            .expect("pinned package still known to the original provider");
        pinned.add(p.clone(), ver.clone(), deps);
    }

    let rerun = solve(PackageRef::Root, v(0, 1, 0), pinned).unwrap();
    assert_eq!(rerun, solution);
}

/// Every version in a successful solution lies within the root's
/// transitively-implied range for that package — trivially true here
/// since each package has exactly one candidate version in range, but
/// checked explicitly per the specification's "testable properties".
#[test]
fn solution_versions_are_within_requested_ranges() {
    let mut provider = OfflineProvider::new();
    provider.add(
        PackageRef::Root,
        v(0, 1, 0),
        vec![dep("a", VersionRange::between(v(1, 0, 0), v(2, 0, 0)))],
    );
    provider.add(pkg("a"), v(1, 5, 0), vec![]);
    provider.add(pkg("a"), v(2, 0, 0), vec![]);

    let solution = solve(PackageRef::Root, v(0, 1, 0), provider).unwrap();
    let requested = VersionRange::between(v(1, 0, 0), v(2, 0, 0));
    assert!(requested.contains(solution.get(&pkg("a")).unwrap()));
}
