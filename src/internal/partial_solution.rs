// SPDX-License-Identifier: MPL-2.0

//! The partial solution: the solver's growing, backtrackable log of
//! decisions and derivations, one per package touched so far.

use std::fmt::{self, Display, Formatter};
use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::FxHasher;

use pavo_version_ranges::Version;

use crate::internal::assignment::Assignment;
use crate::internal::incompatibility::{IncompId, Incompatibility, Relation};
use crate::package::PackageRef;
use crate::term::Term;

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// How far into the decision log we are. Level 0 means no decision has
/// been made yet.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Default)]
pub(crate) struct DecisionLevel(pub u32);

impl DecisionLevel {
    fn increment(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Outcome of looking for the earliest assignment that, combined with
/// everything before it, already forces a conflicting incompatibility.
pub(crate) enum SatisfierSearch<V: Version> {
    /// The satisfier and the next-most-recent satisfier sit at different
    /// decision levels: we can backjump straight to the earlier one.
    DifferentDecisionLevels {
        previous_satisfier_level: DecisionLevel,
    },
    /// They share a decision level: resolution must continue, combining
    /// `satisfier_cause` with the conflicting incompatibility.
    SameDecisionLevels { satisfier_cause: IncompId<V> },
}

/// One package's chronological history: every assignment about that
/// package, paired with the running intersection of itself and everything
/// that came before it for that same package.
struct PackageAssignments<V: Version> {
    history: Vec<(Assignment<V>, Term<V>)>,
}

impl<V: Version> PackageAssignments<V> {
    fn accumulated_term(&self) -> &Term<V> {
        &self
            .history
            .last()
            .expect("a package's assignment history is never empty")
            .1
    }

    fn smallest_decision_level(&self) -> DecisionLevel {
        DecisionLevel(self.history.first().unwrap().0.decision_level)
    }

    /// The earliest assignment in this package's own history whose running
    /// accumulated term already rules out `start_term`. Since each step only
    /// narrows the accumulated term, the first assignment where the two
    /// become disjoint is the one that "tips" any incompatibility containing
    /// `start_term.inverse()` into satisfied.
    fn satisfier(&self, start_term: &Term<V>) -> (Term<V>, Option<IncompId<V>>, u32, DecisionLevel) {
        for (assignment, accumulated) in &self.history {
            if accumulated.contradicts(start_term) {
                return (
                    assignment.term.clone(),
                    assignment.cause,
                    assignment.index,
                    DecisionLevel(assignment.decision_level),
                );
            }
        }
        unreachable!("a package's own history always eventually rules out any term it disagrees with")
    }
}

/// The current assignment: an ordered log of decisions and derivations,
/// indexed by package for fast lookup during propagation.
pub(crate) struct PartialSolution<V: Version> {
    next_index: u32,
    current_decision_level: DecisionLevel,
    package_assignments: FxIndexMap<PackageRef, PackageAssignments<V>>,
}

impl<V: Version> Display for PartialSolution<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut lines: Vec<String> = self
            .package_assignments
            .iter()
            .map(|(p, pa)| format!("{p}: {}", pa.accumulated_term()))
            .collect();
        lines.sort();
        write!(f, "level {}: {}", self.current_decision_level.0, lines.join(", "))
    }
}

impl<V: Version> PartialSolution<V> {
    pub(crate) fn empty() -> Self {
        Self {
            next_index: 0,
            current_decision_level: DecisionLevel(0),
            package_assignments: FxIndexMap::default(),
        }
    }

    /// Append a positive decision term at a new decision level.
    pub(crate) fn decide(&mut self, package: PackageRef, version: V) {
        self.current_decision_level = self.current_decision_level.increment();
        let index = self.next_index;
        self.next_index += 1;
        let term = Term::exact(package.clone(), version);
        let assignment = Assignment::decision(term.clone(), self.current_decision_level.0, index);
        self.push(package, assignment, term);
    }

    /// Append a derivation at the current decision level.
    pub(crate) fn derive(&mut self, term: Term<V>, cause: IncompId<V>) {
        let package = term.package().clone();
        let index = self.next_index;
        self.next_index += 1;
        let assignment =
            Assignment::derivation(term.clone(), self.current_decision_level.0, index, cause);
        self.push(package, assignment, term);
    }

    fn push(&mut self, package: PackageRef, assignment: Assignment<V>, term: Term<V>) {
        match self.package_assignments.get_mut(&package) {
            Some(pa) => {
                let accumulated = pa.accumulated_term().intersect(&term);
                pa.history.push((assignment, accumulated));
            }
            None => {
                self.package_assignments
                    .insert(package, PackageAssignments { history: vec![(assignment, term)] });
            }
        }
    }

    /// The currently implied term for `package`, intersecting every
    /// assignment made about it so far.
    pub(crate) fn term_intersection_for_package(&self, package: &PackageRef) -> Option<&Term<V>> {
        self.package_assignments.get(package).map(PackageAssignments::accumulated_term)
    }

    pub(crate) fn relation(&self, incompat: &Incompatibility<V>) -> Relation<V> {
        incompat.relation(|p| self.term_intersection_for_package(p).cloned())
    }

    pub(crate) fn current_decision_level(&self) -> DecisionLevel {
        self.current_decision_level
    }

    /// Packages with a positive accumulated term and no decision yet —
    /// candidates for the next decision.
    pub(crate) fn undecided_packages(&self) -> impl Iterator<Item = &PackageRef> {
        self.package_assignments.iter().filter_map(|(p, pa)| {
            let (assignment, term) = pa.history.last().unwrap();
            (!assignment.is_decision() && term.is_positive()).then_some(p)
        })
    }

    /// If every positive term has a corresponding decision, the solve
    /// succeeded: return the chosen version of every decided package
    /// (skipping the virtual root).
    pub(crate) fn extract_solution(&self) -> crate::type_aliases::SelectedDependencies<V> {
        self.package_assignments
            .iter()
            .filter(|(p, _)| !p.is_root())
            .map(|(p, pa)| {
                let (assignment, term) = pa.history.last().unwrap();
                assert!(assignment.is_decision(), "{p} has no decision at solve end");
                let version = term
                    .range()
                    .as_singleton()
                    .expect("a decision's term is always an exact singleton")
                    .clone();
                (p.clone(), version)
            })
            .collect()
    }

    /// Truncate every assignment with `decision_level > level`.
    pub(crate) fn backtrack(&mut self, level: DecisionLevel) {
        self.current_decision_level = level;
        self.package_assignments.retain(|_, pa| {
            if pa.smallest_decision_level() > level {
                return false;
            }
            while pa.history.len() > 1 && pa.history.last().unwrap().0.decision_level > level.0 {
                pa.history.pop();
            }
            if pa.history.last().unwrap().0.decision_level > level.0 {
                return false;
            }
            true
        });
    }

    /// Would deciding `package @ version` immediately conflict with
    /// `new_incompatibilities`? Used to avoid deciding a version whose
    /// freshly-fetched dependencies are already unsatisfiable against the
    /// current partial solution.
    pub(crate) fn decision_is_sound(
        &self,
        package: &PackageRef,
        version: &V,
        new_incompatibilities: &[Incompatibility<V>],
    ) -> bool {
        let exact = Term::exact(package.clone(), version.clone());
        new_incompatibilities.iter().all(|incompat| {
            incompat.relation(|p| {
                if p == package {
                    Some(exact.clone())
                } else {
                    self.term_intersection_for_package(p).cloned()
                }
            }) != Relation::Satisfied
        })
    }

    /// For each package `incompat` mentions, find the earliest assignment in
    /// that package's own history that alone rules out `incompat`'s term for
    /// it. The overall satisfier is whichever of those came last (highest
    /// global index) — the assignment that tipped the whole incompatibility
    /// from "almost" into "actual" conflict. `previous_satisfier_level` is
    /// the level we could safely backjump to: the latest point, strictly
    /// before the satisfier's own tipping assignment, at which every other
    /// term was already ruled out too.
    pub(crate) fn satisfier_search(
        &self,
        incompat: &Incompatibility<V>,
    ) -> (PackageRef, SatisfierSearch<V>) {
        let mut satisfied: FxIndexMap<PackageRef, (Term<V>, Option<IncompId<V>>, u32, DecisionLevel)> =
            FxIndexMap::default();
        for term in incompat.iter() {
            let pa = self
                .package_assignments
                .get(term.package())
                .expect("incompatibility term for a package not in the partial solution");
            satisfied.insert(term.package().clone(), pa.satisfier(&term.inverse()));
        }

        let (satisfier_package, satisfier_cause, satisfier_level) = satisfied
            .iter()
            .max_by_key(|(_, (_, _, index, _))| *index)
            .map(|(p, &(_, cause, _, level))| (p.clone(), cause, level))
            .expect("a conflicting incompatibility always has at least one term");

        let previous_satisfier_level =
            self.previous_satisfier_level(incompat, &satisfier_package, satisfied);

        let search = if previous_satisfier_level >= satisfier_level {
            SatisfierSearch::SameDecisionLevels {
                satisfier_cause: satisfier_cause.expect(
                    "a satisfier sharing its predecessor's decision level must be a derivation",
                ),
            }
        } else {
            SatisfierSearch::DifferentDecisionLevels { previous_satisfier_level }
        };
        (satisfier_package, search)
    }

    /// Re-derive `satisfier_package`'s own satisfier against a term narrowed
    /// by what `incompat` actually needs from it, then take the decision
    /// level reached across every package's satisfier — floored at 1 so
    /// conflict resolution never backjumps past the root decision, which
    /// would otherwise risk re-deriving and re-conflicting forever.
    fn previous_satisfier_level(
        &self,
        incompat: &Incompatibility<V>,
        satisfier_package: &PackageRef,
        mut satisfied: FxIndexMap<PackageRef, (Term<V>, Option<IncompId<V>>, u32, DecisionLevel)>,
    ) -> DecisionLevel {
        let satisfier_pa = self
            .package_assignments
            .get(satisfier_package)
            .expect("satisfier package has assignments");
        let (accum_term, ..) = satisfied
            .get(satisfier_package)
            .expect("satisfier package has a recorded satisfier");
        let incompat_term = incompat
            .get(satisfier_package)
            .expect("the satisfier package is one of this incompatibility's own terms");

        let narrowed = accum_term.intersect(&incompat_term.inverse());
        satisfied.insert(satisfier_package.clone(), satisfier_pa.satisfier(&narrowed));

        satisfied
            .values()
            .map(|(_, _, _, level)| *level)
            .max()
            .unwrap_or(DecisionLevel(0))
            .max(DecisionLevel(1))
    }
}
