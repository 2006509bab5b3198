// SPDX-License-Identifier: MPL-2.0

//! Publicly exported type aliases.

use std::collections::HashMap;
use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;

pub(crate) type Map<K, V> = HashMap<K, V, BuildHasherDefault<FxHasher>>;

/// The concrete version picked for every non-root package, as returned by
/// [`crate::solver::solve`].
pub type SelectedDependencies<V> = std::collections::HashMap<crate::package::PackageRef, V>;
