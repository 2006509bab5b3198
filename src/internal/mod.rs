// SPDX-License-Identifier: MPL-2.0

//! Non exposed modules.

mod arena;
mod assignment;
mod core;
mod incompatibility;
mod partial_solution;

pub(crate) use arena::{Arena, Id};
pub(crate) use assignment::Assignment;
pub(crate) use core::State;
pub(crate) use incompatibility::{IncompId, Incompatibility, IncompatibilityCause};
pub(crate) use partial_solution::{DecisionLevel, PartialSolution, SatisfierSearch};
