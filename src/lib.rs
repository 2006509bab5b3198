// SPDX-License-Identifier: MPL-2.0

//! A PubGrub-based version solving engine.
//!
//! Version solving means efficiently finding a set of packages and
//! versions that satisfy all the constraints of a given project's
//! dependencies. When that isn't possible, this crate tries to produce a
//! human-readable explanation of why not, rather than just "no solution".
//!
//! Unlike some PubGrub implementations, this crate does not generalize
//! over the package identifier type: packages are always a concrete
//! [`PackageRef`], a name plus an optional source, with a distinguished
//! virtual root. Versions remain generic over any type implementing
//! [`Version`](pavo_version_ranges::Version); [`SemanticVersion`](pavo_version_ranges::SemanticVersion)
//! is provided by the companion `pavo-version-ranges` crate for the
//! common case.
//!
//! # Basic example
//!
//! Imagine we are resolving a project where:
//!
//! - `root` depends on `menu` and `icons`
//! - `menu` depends on `dropdown`
//! - `dropdown` depends on `icons`
//! - `icons` has no dependencies
//!
//! ```
//! use pavo_resolver::{solve, OfflineProvider, PackageRef};
//! use pavo_version_ranges::{SemanticVersion, VersionRange};
//!
//! fn v(major: u64) -> SemanticVersion {
//!     SemanticVersion::new(major, 0, 0)
//! }
//!
//! let mut provider = OfflineProvider::new();
//! let root = PackageRef::Root;
//! let menu = PackageRef::named("menu");
//! let icons = PackageRef::named("icons");
//! let dropdown = PackageRef::named("dropdown");
//!
//! provider.add(root.clone(), v(1), vec![
//!     pavo_resolver::Dependency::new(menu.clone(), VersionRange::any()),
//!     pavo_resolver::Dependency::new(icons.clone(), VersionRange::any()),
//! ]);
//! provider.add(menu.clone(), v(1), vec![
//!     pavo_resolver::Dependency::new(dropdown.clone(), VersionRange::any()),
//! ]);
//! provider.add(dropdown.clone(), v(1), vec![
//!     pavo_resolver::Dependency::new(icons.clone(), VersionRange::any()),
//! ]);
//! provider.add(icons.clone(), v(1), vec![]);
//!
//! let solution = solve(root, v(1), provider).unwrap();
//! assert_eq!(solution.get(&menu), Some(&v(1)));
//! ```
//!
//! # The `Provider` trait
//!
//! The example above uses [`OfflineProvider`], a basic in-memory
//! [`Provider`]. Implementing the trait for your own registry, lockfile or
//! network client requires two methods: [`versions_for`](Provider::versions_for)
//! (candidate versions for a package, newest first) and
//! [`dependencies_of`](Provider::dependencies_of) (that version's own
//! requirements). Both are free to do file or network I/O; the engine
//! calls through the trait synchronously and does no caching of its own.
//!
//! # Error reporting
//!
//! When [`solve`] cannot find a solution, it returns a
//! [`ResolveError::SolveFailure`] (or, when the root package's own direct
//! requirements are already contradictory, [`ResolveError::Overconstrained`]),
//! carrying both a [`DerivationTree`] — the full chain of incompatibilities
//! that proves no solution exists — and a pre-rendered, numbered textual
//! report suitable for showing to a user directly.

#![warn(missing_docs)]

mod error;
mod package;
mod provider;
mod report;
mod solver;
mod term;
mod type_aliases;

mod internal;

pub use error::ResolveError;
pub use package::{Dependency, PackageRef, PackageSource};
pub use provider::{OfflineProvider, Provider, ProviderError};
pub use report::DerivationTree;
pub use solver::solve;
pub use term::{Relation, Term};
pub use type_aliases::SelectedDependencies;

pub use pavo_version_ranges as version_ranges;
