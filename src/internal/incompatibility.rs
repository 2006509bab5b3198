// SPDX-License-Identifier: MPL-2.0

//! An incompatibility is a set of terms that should never all hold at
//! once. It is the unit of learning in the solver's CDCL loop: every
//! conflict produces a new incompatibility via resolution, and the whole
//! derivation graph of incompatibilities is what the failure reporter
//! eventually renders as a proof.

use std::fmt::{self, Display, Formatter};

use pavo_version_ranges::Version;

use crate::internal::arena::{Arena, Id};
use crate::package::PackageRef;
use crate::term::{Relation as TermRelation, Term};

pub(crate) type IncompId<V> = Id<Incompatibility<V>>;

/// Why an incompatibility holds. The seven variants named in the data
/// model: six external (leaf) causes plus the one internal cause,
/// `Conflict`, produced by resolution during conflict resolution.
#[derive(Debug, Clone)]
pub(crate) enum IncompatibilityCause<V: Version> {
    /// The seed: the root package is exactly its own version.
    Root,
    /// A dependency: the first term's package, at the versions it names,
    /// requires the second term's package within some range.
    Dependency,
    /// No available version of the sole positive term's package matches
    /// its range.
    NoVersions,
    /// The provider reports that the sole positive term's package doesn't
    /// exist at all.
    PackageNotFound,
    /// An environment predicate ("requires Python ...") failed.
    PythonRequirement(String),
    /// An environment predicate ("requires platform ...") failed.
    PlatformRequirement(String),
    /// Learned by resolution from two parent incompatibilities, which are
    /// retained for proof rendering.
    Conflict {
        conflict: IncompId<V>,
        other: IncompId<V>,
    },
}

/// How a set of terms (typically the partial solution) relates to an
/// incompatibility.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum Relation<V: Version> {
    /// Every term in the incompatibility is satisfied: the incompatibility
    /// itself is satisfied, which is a conflict.
    Satisfied,
    /// At least one term is contradicted: the incompatibility can never
    /// fire and can be ignored.
    Contradicted,
    /// All but one term are satisfied and the remaining one is
    /// inconclusive: the incompatibility forces that term's negation.
    AlmostSatisfied(PackageRef),
    /// Neither satisfied, contradicted, nor almost-satisfied.
    Inconclusive,
}

/// A set of terms whose conjunction is impossible, plus the reason it was
/// learned.
#[derive(Debug, Clone)]
pub(crate) struct Incompatibility<V: Version> {
    terms: Vec<Term<V>>,
    cause: IncompatibilityCause<V>,
}

impl<V: Version> Incompatibility<V> {
    /// Build a normalized incompatibility from raw terms and a cause.
    ///
    /// Normalization: coalesce multiple terms about the same package ref
    /// (intersecting them into one), and, for `Conflict`-caused
    /// incompatibilities with more than one term, strip any positive term
    /// on the root package ref, since the root is always satisfied and
    /// keeping it around only clutters the proof.
    pub(crate) fn new(mut terms: Vec<Term<V>>, cause: IncompatibilityCause<V>) -> Self {
        if terms.len() != 1 && matches!(cause, IncompatibilityCause::Conflict { .. }) {
            let has_positive_root = terms
                .iter()
                .any(|t| t.is_positive() && t.package().is_root());
            if has_positive_root {
                terms.retain(|t| !(t.is_positive() && t.package().is_root()));
            }
        }

        let short_circuit = terms.len() == 1
            || (terms.len() == 2 && terms[0].package() != terms[1].package());

        if !short_circuit {
            let mut coalesced: Vec<Term<V>> = Vec::with_capacity(terms.len());
            for term in terms {
                if let Some(existing) = coalesced
                    .iter_mut()
                    .find(|t: &&mut Term<V>| t.package() == term.package())
                {
                    *existing = existing.intersect(&term);
                } else {
                    coalesced.push(term);
                }
            }
            terms = coalesced;
        }

        Self { terms, cause }
    }

    /// The seed incompatibility: `[not root@{root_version}]`.
    pub(crate) fn root(root: PackageRef, root_version: V) -> Self {
        let term = Term::negative(
            root,
            pavo_version_ranges::VersionRange::singleton(root_version),
        )
        .expect("singleton range is never empty");
        Self {
            terms: vec![term],
            cause: IncompatibilityCause::Root,
        }
    }

    /// `[+pkg@{version}, ¬dep_pkg in dep_range]`, caused by a dependency.
    pub(crate) fn from_dependency(
        package: PackageRef,
        version: V,
        dependency: &crate::package::Dependency<V>,
    ) -> Self {
        let depender = Term::exact(package, version);
        let dependee = Term::negative(dependency.package.clone(), dependency.range.clone());
        let mut terms = vec![depender];
        if let Some(dependee) = dependee {
            terms.push(dependee);
        }
        Self::new(terms, IncompatibilityCause::Dependency)
    }

    /// `[+pkg in range]`, caused by there being no matching version.
    pub(crate) fn no_versions(package: PackageRef, range: pavo_version_ranges::VersionRange<V>) -> Self {
        Self::new(
            vec![Term::positive(package, range)],
            IncompatibilityCause::NoVersions,
        )
    }

    /// `[+pkg in range]`, caused by the provider reporting the package
    /// doesn't exist.
    pub(crate) fn package_not_found(
        package: PackageRef,
        range: pavo_version_ranges::VersionRange<V>,
    ) -> Self {
        Self::new(
            vec![Term::positive(package, range)],
            IncompatibilityCause::PackageNotFound,
        )
    }

    pub(crate) fn terms(&self) -> &[Term<V>] {
        &self.terms
    }

    pub(crate) fn cause(&self) -> &IncompatibilityCause<V> {
        &self.cause
    }

    pub(crate) fn get(&self, package: &PackageRef) -> Option<&Term<V>> {
        self.terms.iter().find(|t| t.package() == package)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Term<V>> {
        self.terms.iter()
    }

    /// `terms` is empty, or a single negative term on the root ref: the
    /// fundamental "not root" axiom surviving unrefined, meaning nothing
    /// else could ever contradict it.
    pub(crate) fn is_failure(&self) -> bool {
        self.terms.is_empty()
            || (self.terms.len() == 1
                && self.terms[0].package().is_root()
                && !self.terms[0].is_positive())
    }

    /// How `terms_for` (typically the partial solution) relates to this
    /// incompatibility.
    pub(crate) fn relation(&self, mut terms_for: impl FnMut(&PackageRef) -> Option<Term<V>>) -> Relation<V> {
        let mut relation = Relation::Satisfied;
        for incompat_term in &self.terms {
            match terms_for(incompat_term.package()) {
                Some(term) => match term.relation(incompat_term) {
                    TermRelation::Satisfied => {}
                    TermRelation::Contradicted => return Relation::Contradicted,
                    TermRelation::Inconclusive => {
                        if relation == Relation::Satisfied {
                            relation = Relation::AlmostSatisfied(incompat_term.package().clone());
                        } else {
                            relation = Relation::Inconclusive;
                        }
                    }
                },
                None => {
                    if relation == Relation::Satisfied {
                        relation = Relation::AlmostSatisfied(incompat_term.package().clone());
                    } else {
                        relation = Relation::Inconclusive;
                    }
                }
            }
        }
        relation
    }

    /// Resolution rule: the terms of a new incompatibility combining
    /// `self` (the conflicting incompatibility) with `satisfier_cause`
    /// (the cause of the most recent satisfier), dropping `pivot` and
    /// unioning its terms from both sides. The caller wraps the result in
    /// `Incompatibility::new` together with the `Conflict` cause, since
    /// only the caller holds the arena ids of both parents.
    pub(crate) fn resolve_terms(&self, satisfier_cause: &Self, pivot: &PackageRef) -> Vec<Term<V>> {
        let mut terms: Vec<Term<V>> = self
            .terms
            .iter()
            .filter(|t| t.package() != pivot)
            .cloned()
            .collect();
        terms.extend(
            satisfier_cause
                .terms
                .iter()
                .filter(|t| t.package() != pivot)
                .cloned(),
        );

        if let (Some(t1), Some(t2)) = (self.get(pivot), satisfier_cause.get(pivot)) {
            // Union of t1 and t2, via De Morgan's law over intersection.
            let union = t1.inverse().intersect(&t2.inverse()).inverse();
            // A trivially true term carries no information and must be
            // discarded rather than kept as a vacuous constraint.
            if !union.is_trivially_true() {
                terms.push(union);
            }
        }

        terms
    }

    /// Walk the derivation graph, collecting every leaf (external) cause
    /// reachable through `Conflict` nodes.
    pub(crate) fn external_incompatibilities(
        id: IncompId<V>,
        store: &Arena<Self>,
        out: &mut Vec<IncompId<V>>,
    ) {
        match &store[id].cause {
            IncompatibilityCause::Conflict { conflict, other } => {
                Self::external_incompatibilities(*conflict, store, out);
                Self::external_incompatibilities(*other, store, out);
            }
            _ => out.push(id),
        }
    }

    fn terse(&self, term: &Term<V>, allow_every: bool) -> String {
        if allow_every && term.range() == &pavo_version_ranges::VersionRange::any() {
            format!("every version of {}", term.package())
        } else if term.package().is_root() {
            term.package().to_string()
        } else {
            format!("{} ({})", term.package(), term.range())
        }
    }

    fn single_term_where(&self, mut pred: impl FnMut(&Term<V>) -> bool) -> Option<&Term<V>> {
        let mut found = None;
        for term in &self.terms {
            if pred(term) {
                if found.is_some() {
                    return None;
                }
                found = Some(term);
            }
        }
        found
    }

    fn is_dependency_cause(&self) -> bool {
        matches!(self.cause, IncompatibilityCause::Dependency)
    }

    /// Pairing renderer: combine this incompatibility's rendering with
    /// `other`'s, citing `this_line`/`other_line` (already-emitted line
    /// numbers) where available. Tries three common two-incompatibility
    /// shapes before falling back to plain concatenation.
    pub(crate) fn and_to_string(
        &self,
        other: &Self,
        this_line: Option<usize>,
        other_line: Option<usize>,
    ) -> String {
        if let Some(s) = self.try_requires_both(other, this_line, other_line) {
            return s;
        }
        if let Some(s) = self.try_requires_through(other, this_line, other_line) {
            return s;
        }
        if let Some(s) = self.try_requires_forbidden(other, this_line, other_line) {
            return s;
        }

        let mut buffer = self.to_string();
        if let Some(l) = this_line {
            buffer.push_str(&format!(" ({l})"));
        }
        buffer.push_str(&format!(" and {other}"));
        if let Some(l) = other_line {
            buffer.push_str(&format!(" ({l})"));
        }
        buffer
    }

    fn try_requires_both(
        &self,
        other: &Self,
        this_line: Option<usize>,
        other_line: Option<usize>,
    ) -> Option<String> {
        if self.terms.len() == 1 || other.terms.len() == 1 {
            return None;
        }
        let this_positive = self.single_term_where(Term::is_positive)?;
        let other_positive = other.single_term_where(Term::is_positive)?;
        if this_positive.package() != other_positive.package() {
            return None;
        }

        let this_negatives = self
            .terms
            .iter()
            .filter(|t| !t.is_positive())
            .map(|t| self.terse(t, false))
            .collect::<Vec<_>>()
            .join(" or ");
        let other_negatives = other
            .terms
            .iter()
            .filter(|t| !t.is_positive())
            .map(|t| other.terse(t, false))
            .collect::<Vec<_>>()
            .join(" or ");

        let mut buffer = format!("{} ", self.terse(this_positive, true));
        buffer.push_str(if self.is_dependency_cause() && other.is_dependency_cause() {
            "depends on"
        } else {
            "requires"
        });
        buffer.push_str(&format!(" both {this_negatives}"));
        if let Some(l) = this_line {
            buffer.push_str(&format!(" ({l})"));
        }
        buffer.push_str(&format!(" and {other_negatives}"));
        if let Some(l) = other_line {
            buffer.push_str(&format!(" ({l})"));
        }
        Some(buffer)
    }

    fn try_requires_through(
        &self,
        other: &Self,
        this_line: Option<usize>,
        other_line: Option<usize>,
    ) -> Option<String> {
        if self.terms.len() == 1 || other.terms.len() == 1 {
            return None;
        }
        let this_negative = self.single_term_where(|t| !t.is_positive());
        let other_negative = other.single_term_where(|t| !t.is_positive());
        if this_negative.is_none() && other_negative.is_none() {
            return None;
        }
        let this_positive = self.single_term_where(Term::is_positive);
        let other_positive = other.single_term_where(Term::is_positive);

        let (prior, prior_negative, prior_line, latter, latter_line) =
            if let (Some(neg), Some(pos)) = (this_negative, other_positive) {
                if neg.package() == pos.package() && neg.inverse().satisfies(pos) {
                    (self, neg, this_line, other, other_line)
                } else {
                    return None;
                }
            } else if let (Some(neg), Some(pos)) = (other_negative, this_positive) {
                if neg.package() == pos.package() && neg.inverse().satisfies(pos) {
                    (other, neg, other_line, self, this_line)
                } else {
                    return None;
                }
            } else {
                return None;
            };

        let prior_positives: Vec<&Term<V>> = prior.terms.iter().filter(|t| t.is_positive()).collect();

        let mut buffer = String::new();
        if prior_positives.len() > 1 {
            let prior_string = prior_positives
                .iter()
                .map(|t| prior.terse(t, false))
                .collect::<Vec<_>>()
                .join(" or ");
            buffer.push_str(&format!("if {prior_string} then "));
        } else {
            let verb = if prior.is_dependency_cause() { "depends on" } else { "requires" };
            buffer.push_str(&format!("{} {verb} ", prior.terse(prior_positives[0], true)));
        }
        buffer.push_str(&prior.terse(prior_negative, false));
        if let Some(l) = prior_line {
            buffer.push_str(&format!(" ({l})"));
        }
        buffer.push_str(" which ");
        buffer.push_str(if latter.is_dependency_cause() { "depends on " } else { "requires " });
        buffer.push_str(
            &latter
                .terms
                .iter()
                .filter(|t| !t.is_positive())
                .map(|t| latter.terse(t, false))
                .collect::<Vec<_>>()
                .join(" or "),
        );
        if let Some(l) = latter_line {
            buffer.push_str(&format!(" ({l})"));
        }
        Some(buffer)
    }

    fn try_requires_forbidden(
        &self,
        other: &Self,
        this_line: Option<usize>,
        other_line: Option<usize>,
    ) -> Option<String> {
        if self.terms.len() != 1 && other.terms.len() != 1 {
            return None;
        }
        let (prior, latter, prior_line, latter_line) = if self.terms.len() == 1 {
            (other, self, other_line, this_line)
        } else {
            (self, other, this_line, other_line)
        };

        let negative = prior.single_term_where(|t| !t.is_positive())?;
        if !negative.inverse().satisfies(&latter.terms[0]) {
            return None;
        }

        let positives: Vec<&Term<V>> = prior.terms.iter().filter(|t| t.is_positive()).collect();
        let mut buffer = String::new();
        if positives.len() > 1 {
            let prior_string = positives
                .iter()
                .map(|t| prior.terse(t, false))
                .collect::<Vec<_>>()
                .join(" or ");
            buffer.push_str(&format!("if {prior_string} then "));
        } else {
            buffer.push_str(&prior.terse(positives[0], true));
            buffer.push_str(if prior.is_dependency_cause() { " depends on " } else { " requires " });
        }
        buffer.push_str(&prior.terse(&latter.terms[0], false));
        buffer.push(' ');
        if let Some(l) = prior_line {
            buffer.push_str(&format!("({l}) "));
        }

        buffer.push_str(match &latter.cause {
            IncompatibilityCause::PythonRequirement(req) => return Some({
                buffer.push_str(&format!("which requires Python {req}"));
                if let Some(l) = latter_line {
                    buffer.push_str(&format!(" ({l})"));
                }
                buffer
            }),
            IncompatibilityCause::NoVersions => "which doesn't match any versions",
            IncompatibilityCause::PackageNotFound => "which doesn't exist",
            _ => "which is forbidden",
        });
        if let Some(l) = latter_line {
            buffer.push_str(&format!(" ({l})"));
        }
        Some(buffer)
    }
}

impl<V: Version> Display for Incompatibility<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.cause {
            IncompatibilityCause::Dependency => {
                if self.terms.len() == 2 {
                    let depender = &self.terms[0];
                    let dependee = &self.terms[1];
                    return write!(
                        f,
                        "{} depends on {}",
                        self.terse(depender, true),
                        self.terse(dependee, false)
                    );
                }
            }
            IncompatibilityCause::PythonRequirement(req) => {
                if let Some(term) = self.terms.first() {
                    return write!(f, "{} requires Python {req}", self.terse(term, true));
                }
            }
            IncompatibilityCause::PlatformRequirement(req) => {
                if let Some(term) = self.terms.first() {
                    return write!(f, "{} requires platform {req}", self.terse(term, true));
                }
            }
            IncompatibilityCause::NoVersions => {
                if let Some(term) = self.terms.first() {
                    return write!(f, "no versions of {} match {}", term.package(), term.range());
                }
            }
            IncompatibilityCause::PackageNotFound => {
                if let Some(term) = self.terms.first() {
                    return write!(f, "{} doesn't exist", term.package());
                }
            }
            IncompatibilityCause::Root => {
                if let Some(term) = self.terms.first() {
                    return write!(f, "{} is {}", term.package(), term.range());
                }
            }
            IncompatibilityCause::Conflict { .. } => {}
        }

        if self.is_failure() {
            return write!(f, "version solving failed");
        }

        if self.terms.len() == 1 {
            let term = &self.terms[0];
            return write!(
                f,
                "{} is {}",
                term.package(),
                if term.is_positive() { "forbidden" } else { "required" }
            );
        }

        if self.terms.len() == 2 {
            let (t1, t2) = (&self.terms[0], &self.terms[1]);
            if t1.is_positive() == t2.is_positive() {
                if t1.is_positive() {
                    return write!(f, "{} is incompatible with {}", self.terse(t1, true), self.terse(t2, true));
                }
                return write!(f, "either {} or {}", self.terse(t1, false), self.terse(t2, false));
            }
        }

        let positive: Vec<String> = self.terms.iter().filter(|t| t.is_positive()).map(|t| self.terse(t, false)).collect();
        let negative: Vec<String> = self.terms.iter().filter(|t| !t.is_positive()).map(|t| self.terse(t, false)).collect();

        if !positive.is_empty() && !negative.is_empty() {
            if positive.len() == 1 {
                let positive_term = self.terms.iter().find(|t| t.is_positive()).unwrap();
                write!(f, "{} requires {}", self.terse(positive_term, true), negative.join(" or "))
            } else {
                write!(f, "if {} then {}", positive.join(" and "), negative.join(" or "))
            }
        } else if !positive.is_empty() {
            write!(f, "one of {} must be false", positive.join(" or "))
        } else {
            write!(f, "one of {} must be true", negative.join(" or "))
        }
    }
}
