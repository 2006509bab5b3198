// SPDX-License-Identifier: MPL-2.0

//! Property tests over randomly generated registries.
//!
//! `NumberVersion` is defined locally (rather than reusing `SemanticVersion`)
//! because the orphan rules forbid implementing a foreign trait for a
//! foreign type in an integration test crate, and a bare `u32` is easier to
//! generate and reason about than triples of integers.

use std::fmt;

use pavo_resolver::version_ranges::{Version, VersionRange};
use pavo_resolver::{solve, Dependency, OfflineProvider, PackageRef};

use proptest::collection::{btree_map, vec};
use proptest::prelude::*;
use proptest::sample::Index;
use proptest::string::string_regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct NumberVersion(u32);

impl From<u32> for NumberVersion {
    fn from(n: u32) -> Self {
        NumberVersion(n)
    }
}

impl fmt::Display for NumberVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Version for NumberVersion {}

/// Generates a random registry index: `Vec<(name, version, dependencies)>`.
/// Has a high probability of producing valid, mostly-satisfiable
/// dependencies rather than a flat rejection sample.
fn registry_strategy(
    max_crates: usize,
    max_versions: usize,
    shrinkage: usize,
) -> impl Strategy<Value = Vec<(String, NumberVersion, Vec<(String, VersionRange<NumberVersion>)>)>>
{
    let name = string_regex("[A-Za-z][A-Za-z0-9_-]{0,5}")
        .unwrap()
        .prop_filter("reserved names", |n| {
            // "root" is added separately below and "bad" names a dependency
            // that deliberately resolves to nothing.
            n != "root" && n != "bad"
        });

    // If this is false the crate depends on the nonexistent "bad" instead
    // of the set generated for it below.
    let allow_deps = prop::bool::weighted(0.99);

    let a_version = ..(max_versions as u32);

    let list_of_versions = btree_map(a_version, allow_deps, 1..=max_versions)
        .prop_map(move |ver| ver.into_iter().collect::<Vec<_>>());

    let list_of_crates_with_versions = btree_map(name, list_of_versions, 1..=max_crates);

    // Each version of each crate can depend on each crate smaller than it.
    let max_deps = max_versions * (max_crates * (max_crates - 1)) / shrinkage;

    let raw_version_range = (any::<Index>(), any::<Index>());
    let raw_dependency = (any::<Index>(), any::<Index>(), raw_version_range);

    fn order_index(a: Index, b: Index, size: usize) -> (usize, usize) {
        use std::cmp::{max, min};
        let (a, b) = (a.index(size), b.index(size));
        (min(a, b), max(a, b))
    }

    let list_of_raw_dependency = vec(raw_dependency, ..=max_deps);

    // By default a package depends only on packages with a smaller name,
    // keeping the generated registry a DAG; when true the ordering flips.
    let reverse_alphabetical = any::<bool>().no_shrink();

    (
        list_of_crates_with_versions,
        list_of_raw_dependency,
        reverse_alphabetical,
    )
        .prop_map(
            move |(crate_vers_by_name, raw_dependencies, reverse_alphabetical)| {
                let list_of_pkgid: Vec<((String, NumberVersion), bool)> = crate_vers_by_name
                    .iter()
                    .flat_map(|(name, vers)| {
                        vers.iter()
                            .map(move |x| ((name.clone(), NumberVersion::from(x.0)), x.1))
                    })
                    .collect();
                let len_all_pkgid = list_of_pkgid.len();
                let mut dependency_by_pkgid: Vec<Vec<(String, VersionRange<NumberVersion>)>> =
                    vec![vec![]; len_all_pkgid];
                for (a, b, (c, d)) in raw_dependencies {
                    let (a, b) = order_index(a, b, len_all_pkgid);
                    let (a, b) = if reverse_alphabetical { (b, a) } else { (a, b) };
                    let ((dep_name, _), _) = &list_of_pkgid[a];
                    if &(list_of_pkgid[b].0).0 == dep_name {
                        continue;
                    }
                    let s = &crate_vers_by_name[dep_name];
                    let s_last_index = s.len() - 1;
                    let (c, d) = order_index(c, d, s.len());

                    dependency_by_pkgid[b].push((
                        dep_name.to_owned(),
                        if c == 0 && d == s_last_index {
                            VersionRange::any()
                        } else if c == 0 {
                            VersionRange::strictly_lower_than(s[d].0 + 1)
                        } else if d == s_last_index {
                            VersionRange::higher_than(s[c].0)
                        } else if c == d {
                            VersionRange::singleton(s[c].0)
                        } else {
                            VersionRange::between(s[c].0, s[d].0 + 1)
                        },
                    ))
                }

                let mut out: Vec<_> = list_of_pkgid
                    .into_iter()
                    .zip(dependency_by_pkgid.into_iter())
                    .map(|(((name, ver), allow_deps), deps)| {
                        (
                            name,
                            ver,
                            if !allow_deps {
                                vec![("bad".to_owned(), VersionRange::any())]
                            } else {
                                let mut deps = deps;
                                deps.sort_by_key(|(ref d, _)| d.clone());
                                deps.dedup_by_key(|(ref d, _)| d.clone());
                                deps
                            },
                        )
                    })
                    .collect();

                if reverse_alphabetical {
                    // Keep the complicated cases at the end.
                    out.reverse();
                }

                out
            },
        )
}

/// Builds an `OfflineProvider` from a generated registry, plus a synthetic
/// root depending on every top-level crate the registry produced so the
/// whole generated graph is actually exercised by one `solve` call.
fn provider_with_root(
    registry: Vec<(String, NumberVersion, Vec<(String, VersionRange<NumberVersion>)>)>,
) -> OfflineProvider<NumberVersion> {
    let mut provider = OfflineProvider::new();
    let mut names: Vec<String> = Vec::new();
    for (name, version, deps) in registry {
        if !names.contains(&name) {
            names.push(name.clone());
        }
        let deps = deps
            .into_iter()
            .map(|(n, range)| Dependency::new(PackageRef::named(n), range))
            .collect();
        provider.add(PackageRef::named(name), version, deps);
    }
    let root_deps = names
        .into_iter()
        .map(|n| Dependency::new(PackageRef::named(n), VersionRange::any()))
        .collect();
    provider.add(PackageRef::Root, NumberVersion(0), root_deps);
    provider
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// `solve` must never panic over any registry this generator can
    /// produce, whether it finds a solution or proves there is none.
    #[test]
    fn solve_never_panics(registry in registry_strategy(15, 6, 30)) {
        let provider = provider_with_root(registry);
        let _ = solve(PackageRef::Root, NumberVersion(0), provider);
    }

    /// Re-running `solve` on an unchanged registry always reaches the same
    /// kind of outcome, and the same selected versions when it succeeds.
    #[test]
    fn solve_is_deterministic(registry in registry_strategy(12, 5, 30)) {
        let provider = provider_with_root(registry);

        let first = solve(PackageRef::Root, NumberVersion(0), provider.clone());
        for _ in 0..3 {
            let again = solve(PackageRef::Root, NumberVersion(0), provider.clone());
            match (&first, &again) {
                (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                (Err(_), Err(_)) => {}
                _ => prop_assert!(false, "solve outcome changed between runs"),
            }
        }
    }
}
