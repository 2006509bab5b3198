// SPDX-License-Identifier: MPL-2.0

//! Package identity.
//!
//! Unlike the generic `Package: Clone + Eq + Hash + Debug + Display` trait
//! bound some PubGrub implementations use, this engine works against a
//! concrete package identity: a name plus an optional source qualifier,
//! with a distinguished virtual root.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use pavo_version_ranges::{Version, VersionRange};

/// Where a package's versions are meant to come from.
///
/// Two [`PackageRef`]s with the same name but different sources never
/// unify: `foo` from the default registry and `foo` pinned to a git URL
/// are different packages as far as the solver is concerned.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PackageSource {
    /// The default package registry.
    Registry,
    /// A git repository, identified by its URL (and optional ref/rev, folded
    /// into the string by the caller).
    Git(Arc<str>),
    /// A local filesystem path.
    Path(Arc<str>),
}

impl Display for PackageSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PackageSource::Registry => Ok(()),
            PackageSource::Git(url) => write!(f, " (git+{url})"),
            PackageSource::Path(path) => write!(f, " (path+{path})"),
        }
    }
}

/// Identifies a package: either the virtual root, or a name with an
/// optional source qualifier.
///
/// `Root` is distinguished rather than being just another name so the
/// solver (and the failure reporter) can special-case it without relying
/// on string comparisons against some reserved name.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PackageRef {
    /// The virtual package standing for the project being resolved.
    Root,
    /// A real package, named and optionally sourced.
    Named {
        name: Arc<str>,
        source: Option<PackageSource>,
    },
}

impl PackageRef {
    /// Construct a registry-sourced package reference.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        PackageRef::Named {
            name: name.into(),
            source: None,
        }
    }

    /// Construct a package reference with an explicit source.
    pub fn with_source(name: impl Into<Arc<str>>, source: PackageSource) -> Self {
        PackageRef::Named {
            name: name.into(),
            source: Some(source),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, PackageRef::Root)
    }

    /// The bare name, without source qualifier. `"$root"` for the root.
    pub fn name(&self) -> &str {
        match self {
            PackageRef::Root => "$root",
            PackageRef::Named { name, .. } => name,
        }
    }
}

impl Display for PackageRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PackageRef::Root => write!(f, "root"),
            PackageRef::Named { name, source } => {
                write!(f, "{name}")?;
                if let Some(source) = source {
                    write!(f, "{source}")?;
                }
                Ok(())
            }
        }
    }
}

/// Ordering used only to break ties deterministically (package-name order),
/// never to express semantic precedence between packages.
impl Ord for PackageRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (PackageRef::Root, PackageRef::Root) => std::cmp::Ordering::Equal,
            (PackageRef::Root, _) => std::cmp::Ordering::Less,
            (_, PackageRef::Root) => std::cmp::Ordering::Greater,
            (
                PackageRef::Named { name: n1, source: s1 },
                PackageRef::Named { name: n2, source: s2 },
            ) => n1.cmp(n2).then_with(|| s1.cmp(s2)),
        }
    }
}

impl PartialOrd for PackageRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A requirement: `package` must be selected from within `range`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dependency<V: Version> {
    pub package: PackageRef,
    pub range: VersionRange<V>,
}

impl<V: Version> Dependency<V> {
    pub fn new(package: PackageRef, range: VersionRange<V>) -> Self {
        Self { package, range }
    }
}

impl<V: Version> PartialEq for Dependency<V> {
    fn eq(&self, other: &Self) -> bool {
        self.package == other.package && self.range == other.range
    }
}

impl<V: Version> Eq for Dependency<V> {}
