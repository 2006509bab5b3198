// SPDX-License-Identifier: MPL-2.0

//! The public solving entry point.

use pavo_version_ranges::Version;

use crate::error::ResolveError;
use crate::internal::{Incompatibility, State};
use crate::package::PackageRef;
use crate::provider::{Provider, ProviderError};
use crate::report::DerivationTree;
use crate::type_aliases::SelectedDependencies;

/// Find a set of package versions satisfying every requirement reachable
/// from `root` at `root_version`, using `provider` to discover candidate
/// versions and their dependencies.
///
/// This is the whole public surface of the engine: everything else in this
/// crate exists to make this one call correct, deterministic and able to
/// explain itself when it fails.
pub fn solve<V: Version, P: Provider<V>>(
    root: PackageRef,
    root_version: V,
    mut provider: P,
) -> Result<SelectedDependencies<V>, ResolveError<V, P::Error>> {
    let mut state = State::init(root.clone(), root_version);
    let mut next = root;

    loop {
        match state.unit_propagation(next) {
            Ok(()) => {}
            Err(terminal) => {
                let tree = state.build_derivation_tree(terminal);
                let report = DerivationTree::report(terminal, &state.incompatibility_store);
                return Err(if state.partial_solution.current_decision_level().0 == 0 {
                    ResolveError::Overconstrained { tree, report }
                } else {
                    ResolveError::SolveFailure { tree, report }
                });
            }
        }

        match pick_next(&mut state, &mut provider)? {
            Some(package) => next = package,
            None => return Ok(state.partial_solution.extract_solution()),
        }
    }
}

/// Step 3 of the core loop: among undecided packages, choose the one with
/// fewest matching versions (ties broken by package identity), fetch its
/// dependencies, and either decide a version or derive incompatibilities
/// ruling candidates out.
///
/// Returns `Ok(None)` once there is nothing left to decide: the partial
/// solution is a complete, valid assignment.
fn pick_next<V: Version, P: Provider<V>>(
    state: &mut State<V>,
    provider: &mut P,
) -> Result<Option<PackageRef>, ResolveError<V, P::Error>> {
    let mut undecided: Vec<PackageRef> =
        state.partial_solution.undecided_packages().cloned().collect();
    if undecided.is_empty() {
        return Ok(None);
    }
    // Deterministic tie-break: smallest matching-version count first,
    // then package identity order.
    undecided.sort();

    let mut chosen: Option<(PackageRef, Vec<V>)> = None;
    for package in undecided {
        let range = state
            .partial_solution
            .term_intersection_for_package(&package)
            .expect("an undecided package always has an accumulated term")
            .range()
            .clone();

        let versions = match provider.versions_for(&package, &range) {
            Ok(versions) => versions,
            Err(ProviderError::PackageNotFound(_)) => {
                state.add_incompatibility(Incompatibility::package_not_found(package.clone(), range));
                return Ok(Some(package));
            }
            Err(ProviderError::Other(e)) => return Err(ProviderError::Other(e).into()),
        };

        if versions.is_empty() {
            state.add_incompatibility(Incompatibility::no_versions(package.clone(), range));
            return Ok(Some(package));
        }

        if chosen.as_ref().map_or(true, |(_, best)| versions.len() < best.len()) {
            chosen = Some((package, versions));
        }
    }

    let (package, versions) = chosen.expect("undecided packages is non-empty");

    for version in versions {
        let dependencies = match provider.dependencies_of(&package, &version) {
            Ok(dependencies) => dependencies,
            Err(ProviderError::PackageNotFound(_)) => continue,
            Err(ProviderError::Other(e)) => return Err(ProviderError::Other(e).into()),
        };

        let mut sorted = dependencies;
        sorted.sort_by(|a, b| a.package.cmp(&b.package));
        let new_incompatibilities: Vec<Incompatibility<V>> = sorted
            .iter()
            .map(|dep| Incompatibility::from_dependency(package.clone(), version.clone(), dep))
            .collect();

        if state.partial_solution.decision_is_sound(&package, &version, &new_incompatibilities) {
            for incompat in new_incompatibilities {
                state.add_incompatibility(incompat);
            }
            state.partial_solution.decide(package.clone(), version);
            return Ok(Some(package));
        }

        for incompat in new_incompatibilities {
            state.add_incompatibility(incompat);
        }
    }

    // Every candidate version conflicts with the partial solution already:
    // the incompatibilities just added let the next unit propagation pass
    // derive that no version of `package` can be chosen.
    Ok(Some(package))
}

