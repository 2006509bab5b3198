// SPDX-License-Identifier: MPL-2.0

//! The solver's mutable state: the incompatibility store, the index from
//! package to the incompatibilities that mention it, and the partial
//! solution being grown. This is the engine room; [`crate::solver::solve`]
//! is the public-facing loop that drives it.

use std::collections::VecDeque;
use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::FxHasher;

use pavo_version_ranges::Version;

use crate::internal::incompatibility::Relation;
use crate::internal::{
    Arena, DecisionLevel, IncompId, Incompatibility, IncompatibilityCause, PartialSolution,
    SatisfierSearch,
};
use crate::package::PackageRef;
use crate::report::DerivationTree;

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Current state of the solving algorithm.
pub(crate) struct State<V: Version> {
    pub(crate) root: PackageRef,
    pub(crate) root_version: V,

    /// Index from a package to every incompatibility mentioning it, newest
    /// last (so propagation can scan in reverse to try the newest learned
    /// incompatibilities first).
    incompatibilities: FxIndexMap<PackageRef, Vec<IncompId<V>>>,

    /// Incompatibilities already known to be contradicted by the partial
    /// solution, along with the decision level at which that was found.
    /// They stay contradicted until we backtrack past that level.
    contradicted: FxIndexMap<IncompId<V>, DecisionLevel>,

    pub(crate) partial_solution: PartialSolution<V>,
    pub(crate) incompatibility_store: Arena<Incompatibility<V>>,

    /// Work queue for unit propagation. Reused across calls to avoid
    /// reallocating on every decision.
    unit_propagation_buffer: VecDeque<PackageRef>,
}

impl<V: Version> State<V> {
    pub(crate) fn init(root: PackageRef, root_version: V) -> Self {
        let mut incompatibility_store = Arena::new();
        let root_id =
            incompatibility_store.alloc(Incompatibility::root(root.clone(), root_version.clone()));
        let mut incompatibilities = FxIndexMap::default();
        incompatibilities.insert(root.clone(), vec![root_id]);
        Self {
            root,
            root_version,
            incompatibilities,
            contradicted: FxIndexMap::default(),
            partial_solution: PartialSolution::empty(),
            incompatibility_store,
            unit_propagation_buffer: VecDeque::new(),
        }
    }

    /// Allocate `incompat` and index it by every package it mentions.
    pub(crate) fn add_incompatibility(&mut self, incompat: Incompatibility<V>) -> IncompId<V> {
        let id = self.incompatibility_store.alloc(incompat);
        let packages: Vec<PackageRef> =
            self.incompatibility_store[id].iter().map(|t| t.package().clone()).collect();
        for package in packages {
            self.incompatibilities.entry(package).or_default().push(id);
        }
        id
    }

    /// The heart of the algorithm: propagate the consequences of the
    /// partial solution until nothing more follows, resolving any
    /// conflicts encountered along the way.
    ///
    /// Returns `Err(incompat)` with the terminal (unresolvable)
    /// incompatibility if the requirements are proven unsatisfiable.
    pub(crate) fn unit_propagation(&mut self, package: PackageRef) -> Result<(), IncompId<V>> {
        self.unit_propagation_buffer.clear();
        self.unit_propagation_buffer.push_back(package);
        while let Some(current) = self.unit_propagation_buffer.pop_front() {
            let Some(incompat_ids) = self.incompatibilities.get(&current) else {
                continue;
            };
            let mut conflict = None;
            // Newest incompatibilities first: they are more likely to be
            // immediately relevant to what was just decided or derived.
            for &incompat_id in incompat_ids.iter().rev() {
                if self.contradicted.contains_key(&incompat_id) {
                    continue;
                }
                let incompat = &self.incompatibility_store[incompat_id];
                match self.partial_solution.relation(incompat) {
                    Relation::Satisfied => {
                        log::info!("conflict detected: {incompat}");
                        conflict = Some(incompat_id);
                        break;
                    }
                    Relation::AlmostSatisfied(almost) => {
                        if !self.unit_propagation_buffer.contains(&almost) {
                            self.unit_propagation_buffer.push_back(almost.clone());
                        }
                        let forced = incompat
                            .get(&almost)
                            .expect("the almost-satisfied package has a term in this incompatibility")
                            .inverse();
                        self.partial_solution.derive(forced, incompat_id);
                        self.contradicted
                            .insert(incompat_id, self.partial_solution.current_decision_level());
                    }
                    Relation::Contradicted => {
                        self.contradicted
                            .insert(incompat_id, self.partial_solution.current_decision_level());
                    }
                    Relation::Inconclusive => {}
                }
            }
            if let Some(incompat_id) = conflict {
                let (almost, root_cause) = self.conflict_resolution(incompat_id)?;
                self.unit_propagation_buffer.clear();
                self.unit_propagation_buffer.push_back(almost.clone());
                let forced = self.incompatibility_store[root_cause]
                    .get(&almost)
                    .expect("root cause has a term for the package it was derived from")
                    .inverse();
                self.partial_solution.derive(forced, root_cause);
                self.contradicted
                    .insert(root_cause, self.partial_solution.current_decision_level());
            }
        }
        Ok(())
    }

    /// Repeatedly resolve `incompat` against its most recent satisfier
    /// until either we can backjump to an earlier decision level, or the
    /// incompatibility reduces to "not root is the same version" — the
    /// terminal failure.
    fn conflict_resolution(
        &mut self,
        incompat: IncompId<V>,
    ) -> Result<(PackageRef, IncompId<V>), IncompId<V>> {
        let mut current = incompat;
        loop {
            if self.incompatibility_store[current].is_failure() {
                return Err(current);
            }
            let (package, search) =
                self.partial_solution.satisfier_search(&self.incompatibility_store[current]);
            match search {
                SatisfierSearch::DifferentDecisionLevels { previous_satisfier_level } => {
                    self.backtrack(previous_satisfier_level);
                    log::info!("backtrack to decision level {}", previous_satisfier_level.0);
                    return Ok((package, current));
                }
                SatisfierSearch::SameDecisionLevels { satisfier_cause } => {
                    let terms = self.incompatibility_store[current]
                        .resolve_terms(&self.incompatibility_store[satisfier_cause], &package);
                    let cause = IncompatibilityCause::Conflict { conflict: current, other: satisfier_cause };
                    let learned = Incompatibility::new(terms, cause);
                    log::info!("learned: {learned}");
                    current = self.add_incompatibility(learned);
                }
            }
        }
    }

    fn backtrack(&mut self, level: DecisionLevel) {
        self.partial_solution.backtrack(level);
        self.contradicted.retain(|_, dl| *dl <= level);
    }

    /// Render the derivation graph rooted at `incompat` as a failure report.
    pub(crate) fn build_derivation_tree(&self, incompat: IncompId<V>) -> DerivationTree<V> {
        DerivationTree::build(incompat, &self.incompatibility_store)
    }
}
