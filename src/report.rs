// SPDX-License-Identifier: MPL-2.0

//! Turning a learned derivation graph into a human-readable proof of
//! unsatisfiability.
//!
//! The graph is a DAG of [`Incompatibility`](crate::internal::Incompatibility)
//! nodes: external (leaf) causes at the bottom, `Conflict` nodes combining
//! two earlier causes above them, terminating at the incompatibility
//! conflict resolution could not resolve any further.
//! [`DerivationTree::build`] captures that graph as an owned tree for
//! programmatic inspection; [`DerivationTree::report`] renders it as the
//! numbered, multi-paragraph explanation users actually read.

use std::collections::HashSet;

use pavo_version_ranges::Version;

use crate::internal::incompatibility::{IncompId, Incompatibility, IncompatibilityCause};
use crate::internal::Arena;
use crate::term::Term;
use crate::type_aliases::Map;

/// A node in the proof of unsatisfiability.
#[derive(Debug, Clone)]
pub enum DerivationTree<V: Version> {
    /// A leaf cause: no compatible version, a dependency requirement, the
    /// provider reporting a missing package, or the root axiom.
    External { rendered: String, terms: Vec<Term<V>> },
    /// Learned by resolving `cause1` and `cause2` during conflict
    /// resolution.
    Derived {
        rendered: String,
        terms: Vec<Term<V>>,
        cause1: Box<DerivationTree<V>>,
        cause2: Box<DerivationTree<V>>,
    },
}

impl<V: Version> DerivationTree<V> {
    /// The terms of the incompatibility this node stands for.
    pub fn terms(&self) -> &[Term<V>] {
        match self {
            DerivationTree::External { terms, .. } => terms,
            DerivationTree::Derived { terms, .. } => terms,
        }
    }

    pub(crate) fn build(root: IncompId<V>, store: &Arena<Incompatibility<V>>) -> Self {
        let incompat = &store[root];
        let terms = incompat.terms().to_vec();
        match incompat.cause() {
            IncompatibilityCause::Conflict { conflict, other } => DerivationTree::Derived {
                rendered: incompat.to_string(),
                terms,
                cause1: Box::new(Self::build(*conflict, store)),
                cause2: Box::new(Self::build(*other, store)),
            },
            _ => DerivationTree::External { rendered: incompat.to_string(), terms },
        }
    }

    /// Render the full derivation graph this tree was built from as a
    /// numbered, human-readable proof ending in "... version solving
    /// failed."
    pub(crate) fn report(root: IncompId<V>, store: &Arena<Incompatibility<V>>) -> String {
        let mut visited = HashSet::new();
        let mut shared = HashSet::new();
        mark_shared(root, store, &mut visited, &mut shared);

        let mut lines: Vec<String> = Vec::new();
        let mut numbered: Map<IncompId<V>, usize> = Map::default();
        let final_text = render(root, store, &shared, &mut numbered, &mut lines);
        lines.push(format!("So, because {final_text}, version solving failed."));
        lines.join("\n")
    }
}

/// Mark every incompatibility id reachable from more than one place in the
/// DAG: those need their own numbered line so later citations can refer
/// back to them instead of re-deriving their text.
fn mark_shared<V: Version>(
    id: IncompId<V>,
    store: &Arena<Incompatibility<V>>,
    visited: &mut HashSet<IncompId<V>>,
    shared: &mut HashSet<IncompId<V>>,
) {
    if !visited.insert(id) {
        shared.insert(id);
        return;
    }
    if let IncompatibilityCause::Conflict { conflict, other } = store[id].cause() {
        mark_shared(*conflict, store, visited, shared);
        mark_shared(*other, store, visited, shared);
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Recursively render `id`'s sentence, emitting a numbered line for any
/// shared derived node the first time it is reached (post-order: its own
/// causes are rendered, and possibly numbered, before it is).
fn render<V: Version>(
    id: IncompId<V>,
    store: &Arena<Incompatibility<V>>,
    shared: &HashSet<IncompId<V>>,
    numbered: &mut Map<IncompId<V>, usize>,
    lines: &mut Vec<String>,
) -> String {
    if let Some(&n) = numbered.get(&id) {
        return format!("{} ({n})", store[id]);
    }

    let rendered = match store[id].cause() {
        IncompatibilityCause::Conflict { conflict, other } => {
            let (conflict, other) = (*conflict, *other);
            let _ = render(conflict, store, shared, numbered, lines);
            let _ = render(other, store, shared, numbered, lines);
            let left_line = numbered.get(&conflict).copied();
            let right_line = numbered.get(&other).copied();
            store[conflict].and_to_string(&store[other], left_line, right_line)
        }
        _ => store[id].to_string(),
    };

    if shared.contains(&id) {
        lines.push(format!("{}.", capitalize(&rendered)));
        let line_number = lines.len();
        numbered.insert(id, line_number);
        format!("{} ({line_number})", store[id])
    } else {
        rendered
    }
}
