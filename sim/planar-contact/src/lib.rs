//! Impulse resolution and resting contact-force solving.
//!
//! This crate contains the two contact-response algorithms of the engine:
//!
//! - [`ImpulseResolver`] - instantaneous restitution impulses for colliding
//!   contacts, including the merged handling of two simultaneous contacts
//!   between the same pair of bodies.
//! - [`ContactForceSolver`] - the resting-contact force solver: given `n`
//!   simultaneous resting contacts and the externally computed free
//!   accelerations, it finds forces `f >= 0` with resulting contact
//!   accelerations `a = A f + b >= 0` and `f_i a_i = 0` for every contact
//!   (a linear complementarity problem, solved by Dantzig-style incremental
//!   pivoting after Baraff).
//!
//! # Failure semantics
//!
//! The force solver never panics in library code. Non-convergence past the
//! iteration bound, unbounded pivot steps, singular sub-systems, and sign
//! violations all surface as [`SolverError`](planar_types::SolverError);
//! the driver drops contact forces for that substep and lets bodies fall
//! freely, which is visibly wrong for at most one frame.
//!
//! # Layer 0
//!
//! Headless, no UI dependencies. The solver reads a captured body snapshot
//! and a separate acceleration slice; it never mutates body state.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn, clippy::suboptimal_flops)]

mod impulse;
mod matrix;
mod solver;

pub use impulse::{AppliedImpulse, ImpulseResolver};
pub use matrix::{build_a_matrix, build_b_vector};
pub use solver::{compute_forces, ContactForceSolver, ForceSolution};

// Re-export the dense types the solver speaks in
pub use nalgebra::{DMatrix, DVector};
