//! Collision and resting-contact detection for planar rigid bodies.
//!
//! This crate scans every body corner against the simulation walls and every
//! other body's edges, producing [`Contact`](planar_types::Contact) records
//! for the two downstream consumers:
//!
//! - **Colliding contacts** (penetration depth > 0): routed to the impulse
//!   resolver after an accepted step.
//! - **Resting contacts** (corner within a distance tolerance of an edge,
//!   normal relative velocity within a velocity tolerance of zero): routed
//!   to the contact-force solver inside the derivative evaluation.
//!
//! Body-vs-body tests run in the candidate body's local frame: the world
//! corner is rotated in, tested against the half-extents, and classified by
//! the nearest of the four half-planes.
//!
//! # Layer 0
//!
//! Headless, no UI dependencies. All scans build their contact lists fresh
//! per call; there is no shared mutable scratch state.
//!
//! # Example
//!
//! ```
//! use planar_collision::CollisionDetector;
//! use planar_types::{Boundary, RigidBody, SimConfig};
//! use nalgebra::Point2;
//!
//! let config = SimConfig::default();
//! let arena = Boundary::new(-5.0, 5.0, 0.0, 10.0);
//! // Unit box sunk 0.1 into the floor
//! let bodies = vec![RigidBody::new(1.0, 1.0, 1.0).at_position(Point2::new(0.0, 0.4))];
//!
//! let detector = CollisionDetector::new(&config);
//! let contacts = detector.detect_collisions(&bodies, &arena);
//! assert_eq!(contacts.len(), 2); // both bottom corners
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn, clippy::suboptimal_flops)]

mod detector;

pub use detector::CollisionDetector;
