// SPDX-License-Identifier: MPL-2.0

//! Version and version-range algebra.
//!
//! This crate knows nothing about packages or dependency graphs. It only
//! answers one question: for a totally ordered [`Version`] type, what set
//! operations can we perform on the ranges of values a constraint allows?
//!
//! [`VersionRange`] represents any such set as a concatenation of half-open
//! intervals. The building blocks are:
//!  - [empty()](VersionRange::empty): the empty set
//!  - [any()](VersionRange::any): the set of all possible versions
//!  - [singleton(v)](VersionRange::singleton): the set containing only `v`
//!  - [higher_than(v)](VersionRange::higher_than): `v <= version`
//!  - [strictly_higher_than(v)](VersionRange::strictly_higher_than): `v < version`
//!  - [lower_than(v)](VersionRange::lower_than): `version <= v`
//!  - [strictly_lower_than(v)](VersionRange::strictly_lower_than): `version < v`
//!  - [between(v1, v2)](VersionRange::between): `v1 <= version < v2`

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::ops::Bound::{self, Excluded, Included, Unbounded};
use std::ops::RangeBounds;

use smallvec::SmallVec;

/// A totally ordered version with a notion of pre-release.
///
/// Pre-release versions order below the release they precede, and are
/// excluded from ranges unless the range explicitly names one as an
/// endpoint. See [`VersionRange::contains`].
pub trait Version: Clone + Ord + Eq + Debug + Display {
    /// Whether this version is a pre-release (alpha, beta, rc, dev, ...).
    ///
    /// Defaults to `false` so plain version types opt out of the pre-release
    /// exclusion policy entirely.
    fn is_prerelease(&self) -> bool {
        false
    }
}

/// Semantic version: `major.minor.patch[-pre.release.tag]`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SemanticVersion {
    major: u64,
    minor: u64,
    patch: u64,
    pre: Vec<PreReleaseIdentifier>,
}

/// A single dot-separated pre-release identifier, e.g. `alpha` or `1`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
enum PreReleaseIdentifier {
    Numeric(u64),
    Alphanumeric(String),
}

impl SemanticVersion {
    /// Construct a release version `major.minor.patch`.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: Vec::new(),
        }
    }

    /// Construct a pre-release version, e.g. `new_pre(1, 0, 0, "rc.1")`.
    pub fn new_pre(major: u64, minor: u64, patch: u64, pre: &str) -> Self {
        let pre = pre
            .split('.')
            .map(|part| match part.parse::<u64>() {
                Ok(n) => PreReleaseIdentifier::Numeric(n),
                Err(_) => PreReleaseIdentifier::Alphanumeric(part.to_owned()),
            })
            .collect();
        Self {
            major,
            minor,
            patch,
            pre,
        }
    }

    /// Version `0.0.0`.
    pub fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn bump_patch(&self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }

    pub fn bump_minor(&self) -> Self {
        Self::new(self.major, self.minor + 1, 0)
    }

    pub fn bump_major(&self) -> Self {
        Self::new(self.major + 1, 0, 0)
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                // A release is newer than any pre-release of the same (major, minor, patch).
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            })
    }
}

impl Display for SemanticVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            write!(f, "-")?;
            for (i, part) in self.pre.iter().enumerate() {
                if i > 0 {
                    write!(f, ".")?;
                }
                match part {
                    PreReleaseIdentifier::Numeric(n) => write!(f, "{n}")?,
                    PreReleaseIdentifier::Alphanumeric(s) => write!(f, "{s}")?,
                }
            }
        }
        Ok(())
    }
}

impl Version for SemanticVersion {
    fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }
}

type Interval<V> = (Bound<V>, Bound<V>);

/// A set of versions representable as a union of half-open intervals.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VersionRange<V> {
    segments: SmallVec<[Interval<V>; 2]>,
}

impl<V> VersionRange<V> {
    /// The empty set of versions.
    pub fn empty() -> Self {
        Self {
            segments: SmallVec::new(),
        }
    }

    /// The set of every possible version.
    pub fn any() -> Self {
        Self {
            segments: SmallVec::from_buf([(Unbounded, Unbounded)]),
        }
    }

    /// `v <= version`.
    pub fn higher_than(v: impl Into<V>) -> Self {
        Self {
            segments: SmallVec::from_buf([(Included(v.into()), Unbounded)]),
        }
    }

    /// `v < version`.
    pub fn strictly_higher_than(v: impl Into<V>) -> Self {
        Self {
            segments: SmallVec::from_buf([(Excluded(v.into()), Unbounded)]),
        }
    }

    /// `version < v`.
    pub fn strictly_lower_than(v: impl Into<V>) -> Self {
        Self {
            segments: SmallVec::from_buf([(Unbounded, Excluded(v.into()))]),
        }
    }

    /// `version <= v`.
    pub fn lower_than(v: impl Into<V>) -> Self {
        Self {
            segments: SmallVec::from_buf([(Unbounded, Included(v.into()))]),
        }
    }

    /// `v1 <= version < v2`.
    pub fn between(v1: impl Into<V>, v2: impl Into<V>) -> Self {
        Self {
            segments: SmallVec::from_buf([(Included(v1.into()), Excluded(v2.into()))]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl<V: PartialEq> VersionRange<V> {
    /// If this range contains exactly one version, return it.
    pub fn as_singleton(&self) -> Option<&V> {
        match self.segments.as_slice() {
            [(Included(a), Included(b))] if a == b => Some(a),
            _ => None,
        }
    }
}

impl<V: Clone> VersionRange<V> {
    /// The set containing exactly `v`.
    pub fn singleton(v: impl Into<V>) -> Self {
        let v = v.into();
        Self {
            segments: SmallVec::from_buf([(Included(v.clone()), Included(v))]),
        }
    }

    /// All versions except `v`.
    pub fn not_equal(v: impl Into<V>) -> Self {
        let v = v.into();
        let mut segments = SmallVec::new();
        segments.push((Unbounded, Excluded(v.clone())));
        segments.push((Excluded(v), Unbounded));
        Self { segments }
    }

    /// The complement of this set.
    pub fn complement(&self) -> Self {
        match self.segments.first() {
            None => Self::any(),
            Some((Unbounded, Unbounded)) => Self::empty(),
            Some((Included(v), Unbounded)) => Self::strictly_lower_than(v.clone()),
            Some((Excluded(v), Unbounded)) => Self::lower_than(v.clone()),
            Some((Unbounded, Included(v))) => {
                Self::negate_segments(Excluded(v.clone()), &self.segments[1..])
            }
            Some((Unbounded, Excluded(v))) => {
                Self::negate_segments(Included(v.clone()), &self.segments[1..])
            }
            Some(_) => Self::negate_segments(Unbounded, &self.segments),
        }
    }

    fn negate_segments(start: Bound<V>, segments: &[Interval<V>]) -> Self {
        let mut complement_segments = SmallVec::new();
        let mut start = start;
        for (v1, v2) in segments {
            complement_segments.push((
                start,
                match v1 {
                    Included(v) => Excluded(v.clone()),
                    Excluded(v) => Included(v.clone()),
                    Unbounded => unreachable!(),
                },
            ));
            start = match v2 {
                Included(v) => Excluded(v.clone()),
                Excluded(v) => Included(v.clone()),
                Unbounded => Unbounded,
            };
        }
        if !matches!(start, Unbounded) {
            complement_segments.push((start, Unbounded));
        }
        Self {
            segments: complement_segments,
        }
    }
}

impl<V: Ord> VersionRange<V> {
    /// Convert from anything implementing [`RangeBounds`], e.g. `v1..v2`.
    pub fn from_range_bounds<R, IV>(bounds: R) -> Self
    where
        R: RangeBounds<IV>,
        IV: Clone + Into<V>,
    {
        let start = match bounds.start_bound() {
            Included(v) => Included(v.clone().into()),
            Excluded(v) => Excluded(v.clone().into()),
            Unbounded => Unbounded,
        };
        let end = match bounds.end_bound() {
            Included(v) => Included(v.clone().into()),
            Excluded(v) => Excluded(v.clone().into()),
            Unbounded => Unbounded,
        };
        match (start, end) {
            (Included(a), Included(b)) if b < a => Self::empty(),
            (Excluded(a), Excluded(b)) if b <= a => Self::empty(),
            (Included(a), Excluded(b)) if b <= a => Self::empty(),
            (Excluded(a), Included(b)) if b <= a => Self::empty(),
            (a, b) => {
                let mut segments = SmallVec::new();
                segments.push((a, b));
                Self { segments }
            }
        }
    }
}

impl<V: Version> VersionRange<V> {
    /// Does this range contain `v`, honoring the pre-release exclusion policy?
    ///
    /// A pre-release version is only ever contained in a range whose bounds
    /// mention a pre-release explicitly: it does not leak in through an
    /// unbounded or release-only endpoint.
    pub fn contains(&self, v: &V) -> bool {
        if !self.contains_ignoring_prerelease(v) {
            return false;
        }
        !v.is_prerelease() || self.mentions_prerelease()
    }

    fn mentions_prerelease(&self) -> bool {
        fn bound_is_prerelease<V: Version>(b: &Bound<V>) -> bool {
            match b {
                Included(v) | Excluded(v) => v.is_prerelease(),
                Unbounded => false,
            }
        }
        self.segments
            .iter()
            .any(|(lo, hi)| bound_is_prerelease(lo) || bound_is_prerelease(hi))
    }

    fn contains_ignoring_prerelease(&self, v: &V) -> bool {
        for segment in self.segments.iter() {
            let inside = match segment {
                (Unbounded, Unbounded) => true,
                (Unbounded, Included(end)) => v <= end,
                (Unbounded, Excluded(end)) => v < end,
                (Included(start), Unbounded) => v >= start,
                (Included(start), Included(end)) => v >= start && v <= end,
                (Included(start), Excluded(end)) => v >= start && v < end,
                (Excluded(start), Unbounded) => v > start,
                (Excluded(start), Included(end)) => v > start && v <= end,
                (Excluded(start), Excluded(end)) => v > start && v < end,
            };
            if inside {
                return true;
            }
        }
        false
    }
}

impl<V: Ord + Clone> VersionRange<V> {
    /// Intersection of two sets of versions.
    ///
    /// Commutative, associative and idempotent.
    pub fn intersect(&self, other: &Self) -> Self {
        let mut segments: SmallVec<[Interval<V>; 2]> = SmallVec::new();
        let mut left_iter = self.segments.iter();
        let mut right_iter = other.segments.iter();
        let mut left = left_iter.next();
        let mut right = right_iter.next();
        while let (Some((left_lower, left_upper)), Some((right_lower, right_upper))) =
            (left, right)
        {
            if let (
                Included(left_upper_version) | Excluded(left_upper_version),
                Included(right_lower_version) | Excluded(right_lower_version),
            ) = (left_upper, right_lower)
            {
                match left_upper_version.cmp(right_lower_version) {
                    Ordering::Less => {
                        left = left_iter.next();
                        continue;
                    }
                    Ordering::Equal => {
                        if !matches!((left_upper, right_lower), (Included(_), Included(_))) {
                            left = left_iter.next();
                            continue;
                        }
                    }
                    Ordering::Greater => {}
                }
            }
            if let (
                Included(left_lower_version) | Excluded(left_lower_version),
                Included(right_upper_version) | Excluded(right_upper_version),
            ) = (left_lower, right_upper)
            {
                match right_upper_version.cmp(left_lower_version) {
                    Ordering::Less => {
                        right = right_iter.next();
                        continue;
                    }
                    Ordering::Equal => {
                        if !matches!((right_upper, left_lower), (Included(_), Included(_))) {
                            right = right_iter.next();
                            continue;
                        }
                    }
                    Ordering::Greater => {}
                }
            }

            let lower = match (left_lower, right_lower) {
                (Unbounded, Included(_) | Excluded(_)) => right_lower.clone(),
                (Included(_) | Excluded(_), Unbounded) => left_lower.clone(),
                (Unbounded, Unbounded) => Unbounded,
                (Included(l) | Excluded(l), Included(r) | Excluded(r)) => match l.cmp(r) {
                    Ordering::Less => right_lower.clone(),
                    Ordering::Equal => match (left_lower, right_lower) {
                        (Included(_), Excluded(v)) => Excluded(v.clone()),
                        (Excluded(_), Excluded(v)) => Excluded(v.clone()),
                        (Excluded(v), Included(_)) => Excluded(v.clone()),
                        (Included(_), Included(v)) => Included(v.clone()),
                        _ => unreachable!(),
                    },
                    Ordering::Greater => left_lower.clone(),
                },
            };

            let upper = match (left_upper, right_upper) {
                (Unbounded, Included(_) | Excluded(_)) => {
                    right = right_iter.next();
                    right_upper.clone()
                }
                (Included(_) | Excluded(_), Unbounded) => {
                    left = left_iter.next();
                    left_upper.clone()
                }
                (Unbounded, Unbounded) => {
                    left = left_iter.next();
                    right = right_iter.next();
                    Unbounded
                }
                (Included(l) | Excluded(l), Included(r) | Excluded(r)) => match l.cmp(r) {
                    Ordering::Less => {
                        left = left_iter.next();
                        left_upper.clone()
                    }
                    Ordering::Equal => match (left_upper, right_upper) {
                        (Included(_), Excluded(v)) => {
                            right = right_iter.next();
                            Excluded(v.clone())
                        }
                        (Excluded(_), Excluded(v)) => {
                            left = left_iter.next();
                            right = right_iter.next();
                            Excluded(v.clone())
                        }
                        (Excluded(v), Included(_)) => {
                            left = left_iter.next();
                            Excluded(v.clone())
                        }
                        (Included(_), Included(v)) => {
                            left = left_iter.next();
                            right = right_iter.next();
                            Included(v.clone())
                        }
                        _ => unreachable!(),
                    },
                    Ordering::Greater => {
                        right = right_iter.next();
                        right_upper.clone()
                    }
                },
            };

            segments.push((lower, upper));
        }

        Self { segments }
    }

    /// Union of two sets of versions, via De Morgan's law over [`complement`](Self::complement).
    pub fn union(&self, other: &Self) -> Self {
        self.complement().intersect(&other.complement()).complement()
    }

    /// `self` contains no version that `other` doesn't.
    ///
    /// Reflexive and transitive.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        &self.intersect(other) == self
    }

    /// `self` and `other` share no version.
    pub fn is_disjoint_from(&self, other: &Self) -> bool {
        self.intersect(other) == Self::empty()
    }
}

impl<V: Display + Eq> Display for VersionRange<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "∅")?;
        } else {
            for (idx, segment) in self.segments.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                match segment {
                    (Unbounded, Unbounded) => write!(f, "*")?,
                    (Unbounded, Included(v)) => write!(f, "<={v}")?,
                    (Unbounded, Excluded(v)) => write!(f, "<{v}")?,
                    (Included(v), Unbounded) => write!(f, ">={v}")?,
                    (Included(v), Included(b)) => {
                        if v == b {
                            write!(f, "{v}")?
                        } else {
                            write!(f, ">={v},<={b}")?
                        }
                    }
                    (Included(v), Excluded(b)) => write!(f, ">={v},<{b}")?,
                    (Excluded(v), Unbounded) => write!(f, ">{v}")?,
                    (Excluded(v), Included(b)) => write!(f, ">{v},<={b}")?,
                    (Excluded(v), Excluded(b)) => write!(f, ">{v},<{b}")?,
                };
            }
        }
        Ok(())
    }
}
