// SPDX-License-Identifier: MPL-2.0

//! The engine's narrow, synchronous view of "where packages come from".
//!
//! The solver never talks to a registry, a lockfile or the filesystem
//! directly. It only ever calls through a [`Provider`]. This mirrors the
//! teacher's `DependencyProvider` split, narrowed to the three operations
//! the specification actually needs plus the naming/root helpers the
//! failure reporter requires.

use std::fmt::Debug;

use pavo_version_ranges::{Version, VersionRange};

use crate::package::{Dependency, PackageRef};

/// Supplies candidate versions and their dependencies on demand.
///
/// The engine never caches across invocations; implementations are free
/// to (and, for anything backed by a network, should).
pub trait Provider<V: Version> {
    /// An error type specific to this provider, e.g. network failures.
    /// `PackageNotFound` is handled separately (see below) and is not part
    /// of this type.
    type Error: std::error::Error + 'static;

    /// Versions of `package` compatible with `range`, newest first.
    ///
    /// An empty result means "no such version exists", which the solver
    /// turns into a `NoVersions` incompatibility — it is not itself an
    /// error.
    fn versions_for(
        &mut self,
        package: &PackageRef,
        range: &VersionRange<V>,
    ) -> Result<Vec<V>, ProviderError<Self::Error>>;

    /// The dependencies of `package` at `version`.
    fn dependencies_of(
        &mut self,
        package: &PackageRef,
        version: &V,
    ) -> Result<Vec<Dependency<V>>, ProviderError<Self::Error>>;

    /// A fully-qualified name for `package`, used in rendered reports.
    fn complete_name(&self, package: &PackageRef) -> String {
        package.to_string()
    }

    /// Is `package` the virtual root?
    fn is_root(&self, package: &PackageRef) -> bool {
        package.is_root()
    }
}

/// Errors a [`Provider`] may raise.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError<E: std::error::Error + 'static> {
    /// The provider has no knowledge of this package at all (as opposed to
    /// knowing it and finding no matching version, which is expressed by
    /// an empty `versions_for` result instead).
    #[error("package {0} doesn't exist")]
    PackageNotFound(String),

    /// Any other provider failure (network error, parse error, ...). Passed
    /// through unchanged to the caller of `solve`.
    #[error(transparent)]
    Other(#[from] E),
}

/// A trivial in-memory [`Provider`], useful for tests and as documentation
/// of the interface's contract.
#[derive(Debug, Default, Clone)]
pub struct OfflineProvider<V: Version> {
    packages: rustc_hash::FxHashMap<PackageRef, std::collections::BTreeMap<V, Vec<Dependency<V>>>>,
}

impl<V: Version> OfflineProvider<V> {
    pub fn new() -> Self {
        Self {
            packages: rustc_hash::FxHashMap::default(),
        }
    }

    /// Register a package version and its dependencies.
    pub fn add(&mut self, package: PackageRef, version: V, dependencies: Vec<Dependency<V>>) {
        self.packages
            .entry(package)
            .or_default()
            .insert(version, dependencies);
    }
}

impl<V: Version> Provider<V> for OfflineProvider<V> {
    type Error = std::convert::Infallible;

    fn versions_for(
        &mut self,
        package: &PackageRef,
        range: &VersionRange<V>,
    ) -> Result<Vec<V>, ProviderError<Self::Error>> {
        let Some(versions) = self.packages.get(package) else {
            return Err(ProviderError::PackageNotFound(package.to_string()));
        };
        let mut matching: Vec<V> = versions
            .keys()
            .filter(|v| range.contains(v))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.cmp(a));
        Ok(matching)
    }

    fn dependencies_of(
        &mut self,
        package: &PackageRef,
        version: &V,
    ) -> Result<Vec<Dependency<V>>, ProviderError<Self::Error>> {
        let versions = self
            .packages
            .get(package)
            .ok_or_else(|| ProviderError::PackageNotFound(package.to_string()))?;
        Ok(versions
            .get(version)
            .cloned_or_not_found(package, version)?)
    }
}

/// Small helper so `dependencies_of` reads naturally above: a missing
/// version is a programmer/provider-data error distinct from a missing
/// package, but the specification only defines `PackageNotFound`, so we
/// fold it into the same variant with the version appended to the name.
trait OrNotFound<V: Version> {
    fn cloned_or_not_found(
        self,
        package: &PackageRef,
        version: &V,
    ) -> Result<Vec<Dependency<V>>, ProviderError<std::convert::Infallible>>;
}

impl<V: Version> OrNotFound<V> for Option<&Vec<Dependency<V>>> {
    fn cloned_or_not_found(
        self,
        package: &PackageRef,
        version: &V,
    ) -> Result<Vec<Dependency<V>>, ProviderError<std::convert::Infallible>> {
        self.cloned().ok_or_else(|| {
            ProviderError::PackageNotFound(format!("{package}@{version}"))
        })
    }
}
