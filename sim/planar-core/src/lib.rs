//! World registry and step pipeline for the planar contact engine.
//!
//! This crate wires the detector, impulse resolver, and contact-force
//! solver to an external explicit integrator:
//!
//! 1. The integrator calls [`World::evaluate`] with the state vector for
//!    every substep. Evaluation computes the free derivative (gravity,
//!    thrust, damping), detects interpenetration (returned as
//!    `Err(PenetrationSignal)` so the integrator can back up and bisect the
//!    timestep), and, when resting contacts exist, augments the derivative
//!    with solved contact forces.
//! 2. After an accepted step the driver calls [`World::handle_collisions`],
//!    which resolves any interpenetrating contacts with restitution
//!    impulses; the step is then a velocity discontinuity point.
//!
//! A solver failure never escapes: contact forces are dropped for that one
//! substep (the bodies fall freely) and the event is logged.
//!
//! # Concurrent readers
//!
//! A renderer runs concurrently with the simulation loop. It must never
//! observe a body mid-update, so all read access goes through
//! [`World::snapshot`], an immutable copy taken once per completed step.
//! The snapshot includes the applied contact forces and impulses for debug
//! overlays.
//!
//! # State vector layout
//!
//! Six slots per body, in registry order:
//! `[x, y, angle, vx, vy, angular_velocity]`.
//!
//! # Example
//!
//! ```
//! use planar_core::World;
//! use planar_types::{Boundary, RigidBody, SimConfig};
//! use nalgebra::Point2;
//!
//! let mut world = World::new(
//!     Boundary::new(-5.0, 5.0, 0.0, 10.0),
//!     SimConfig::default().with_gravity(10.0),
//! )
//! .unwrap();
//! world
//!     .add_body(RigidBody::new(1.0, 1.0, 1.0).at_position(Point2::new(0.0, 5.0)))
//!     .unwrap();
//!
//! // One forward-Euler substep, driven externally
//! let mut state = world.state_vector();
//! let mut derivative = vec![0.0; state.len()];
//! world.evaluate(&state, &mut derivative).unwrap();
//! for (s, d) in state.iter_mut().zip(&derivative) {
//!     *s += 0.01 * d;
//! }
//! world.sync_from_state(&state).unwrap();
//! assert!(world.bodies()[0].velocity.y < 0.0); // falling
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn, clippy::suboptimal_flops)]

mod snapshot;
mod world;

pub use snapshot::{BodySnapshot, WorldSnapshot};
pub use world::{World, STATE_SLOTS};
