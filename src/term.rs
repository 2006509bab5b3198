// SPDX-License-Identifier: MPL-2.0

//! A [`Term`] is a signed predicate over a single package: either
//! "package is in range" (positive) or "package is not in range" (negative).
//! Incompatibilities are conjunctions of terms; the solver spends most of
//! its time intersecting, negating and comparing them.

use std::fmt::{self, Display, Formatter};

use pavo_version_ranges::{Version, VersionRange};

use crate::package::{Dependency, PackageRef};

/// The result of comparing two terms' logical relationship.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Relation {
    /// `self` implies `other`.
    Satisfied,
    /// `self` implies `other.inverse()`.
    Contradicted,
    /// Neither of the above.
    Inconclusive,
}

/// A signed predicate: "`dependency.package` is in `dependency.range`"
/// (positive) or its negation (negative).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Term<V: Version> {
    dependency: Dependency<V>,
    positive: bool,
}

impl<V: Version> Term<V> {
    /// Construct a positive term. Panics if `range` is empty: a positive
    /// term over the empty range can never be satisfied and must never be
    /// constructed (see the invariant in the data model).
    pub fn positive(package: PackageRef, range: VersionRange<V>) -> Self {
        debug_assert!(
            !range.is_empty(),
            "a positive term over an empty range must never be constructed"
        );
        Term {
            dependency: Dependency::new(package, range),
            positive: true,
        }
    }

    /// Construct a negative term, or `None` if `range` is empty: a negative
    /// term over the empty range is trivially true and must be discarded
    /// rather than represented.
    pub fn negative(package: PackageRef, range: VersionRange<V>) -> Option<Self> {
        if range.is_empty() {
            return None;
        }
        Some(Term {
            dependency: Dependency::new(package, range),
            positive: false,
        })
    }

    /// A positive term asserting exactly one version.
    pub fn exact(package: PackageRef, version: V) -> Self {
        Term::positive(package, VersionRange::singleton(version))
    }

    pub fn package(&self) -> &PackageRef {
        &self.dependency.package
    }

    pub fn dependency(&self) -> &Dependency<V> {
        &self.dependency
    }

    pub fn is_positive(&self) -> bool {
        self.positive
    }

    /// The range this term asserts membership in (for positive terms) or
    /// exclusion from (for negative terms).
    pub fn range(&self) -> &VersionRange<V> {
        &self.dependency.range
    }

    /// Flip the sign of this term.
    ///
    /// Negating a positive term over `any()` yields a negative term over
    /// `any()`, which by definition would be trivially true; callers must
    /// not call `inverse` on terms where that degenerate case matters
    /// without checking first, since `inverse` never fails.
    pub fn inverse(&self) -> Term<V> {
        Term {
            dependency: self.dependency.clone(),
            positive: !self.positive,
        }
    }

    /// The set of versions this term, read as a predicate, accepts.
    /// For a positive term this is `range`; for a negative term it is
    /// `range.complement()`.
    fn accepted(&self) -> VersionRange<V> {
        if self.positive {
            self.dependency.range.clone()
        } else {
            self.dependency.range.complement()
        }
    }

    fn from_accepted(package: PackageRef, accepted: VersionRange<V>) -> Term<V> {
        Term {
            dependency: Dependency::new(package, accepted),
            positive: true,
        }
    }

    /// `self.intersect(other)`, as a term over the same package.
    ///
    /// Both terms must share a package ref; combining terms of different
    /// packages makes no sense and is a programmer error.
    pub fn intersect(&self, other: &Term<V>) -> Term<V> {
        debug_assert_eq!(
            self.package(),
            other.package(),
            "terms may be combined only if their package refs match"
        );
        let accepted = self.accepted().intersect(&other.accepted());
        Term::from_accepted(self.package().clone(), accepted)
    }

    /// `self ∧ other.inverse()`, the set this term accepts that `other`
    /// rejects.
    pub fn difference(&self, other: &Term<V>) -> Term<V> {
        self.intersect(&other.inverse())
    }

    /// Does `self` imply `other`? Equivalent to `self.intersect(other) == self`,
    /// i.e. every version `self` accepts, `other` accepts too.
    pub fn satisfies(&self, other: &Term<V>) -> bool {
        debug_assert_eq!(self.package(), other.package());
        self.accepted().is_subset_of(&other.accepted())
    }

    /// Does `self` accept `version`?
    pub fn contains(&self, version: &V) -> bool {
        self.accepted().contains(version)
    }

    /// Is `self` trivially true, i.e. does it accept every version?
    ///
    /// A positive term over `any()` or a negative term over `empty()` both
    /// mean "no constraint at all" and must never be kept around as a term
    /// of an incompatibility: per the data model, a negative term over the
    /// empty range "equals true and must be discarded".
    pub(crate) fn is_trivially_true(&self) -> bool {
        self.accepted() == VersionRange::any()
    }

    /// Is `self ∧ other` unsatisfiable?
    pub fn contradicts(&self, other: &Term<V>) -> bool {
        debug_assert_eq!(self.package(), other.package());
        self.accepted().is_disjoint_from(&other.accepted())
    }

    /// How `self` relates to `other`: does it imply it, imply its negation,
    /// or neither?
    pub fn relation(&self, other: &Term<V>) -> Relation {
        if self.satisfies(other) {
            Relation::Satisfied
        } else if self.contradicts(other) {
            Relation::Contradicted
        } else {
            Relation::Inconclusive
        }
    }
}

impl<V: Version> PartialEq for Term<V> {
    fn eq(&self, other: &Self) -> bool {
        self.package() == other.package() && self.positive == other.positive && self.range() == other.range()
    }
}

impl<V: Version> Eq for Term<V> {}

impl<V: Version> Display for Term<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(f, "{} {}", self.package(), self.range())
        } else {
            write!(f, "not {} {}", self.package(), self.range())
        }
    }
}
