// SPDX-License-Identifier: MPL-2.0

//! Errors surfaced by [`crate::solve`].

use thiserror::Error;

use pavo_version_ranges::Version;

use crate::provider::ProviderError;
use crate::report::DerivationTree;

/// Errors that may occur while resolving dependencies.
#[derive(Error, Debug)]
pub enum ResolveError<V: Version, E: std::error::Error + 'static> {
    /// Version solving proved the requirements unsatisfiable. Carries the
    /// root incompatibility's derivation tree and its rendered report.
    #[error("{report}")]
    SolveFailure {
        tree: DerivationTree<V>,
        report: String,
    },

    /// The root package's own requirements contradict each other before any
    /// provider call is even needed (e.g. two direct dependencies on
    /// disjoint ranges of the same package). A sub-case of `SolveFailure`
    /// surfaced separately because its cause is always local to the root.
    #[error("the root package's requirements are contradictory: {report}")]
    Overconstrained {
        tree: DerivationTree<V>,
        report: String,
    },

    /// Passed through unchanged from the [`Provider`](crate::provider::Provider).
    #[error(transparent)]
    Provider(#[from] ProviderError<E>),
}
