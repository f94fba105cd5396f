//! Core types for planar rigid-body simulation.
//!
//! This crate provides the foundational types for a 2D rigid-body contact
//! engine:
//!
//! - [`RigidBody`] - Position, orientation, velocity of an oriented rectangle
//! - [`Boundary`] / [`WallSide`] - The static simulation enclosure
//! - [`Contact`] - A detected touching or interpenetrating configuration
//! - [`SimConfig`] - Restitution, gravity, detection tolerances
//! - [`SolverError`] / [`PenetrationSignal`] - Typed failure and control-flow
//!   results for the contact pipeline
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no collision detection, no
//! solving, no integration. They're the common language between:
//!
//! - Collision detection (planar-collision)
//! - Impulse and contact-force solvers (planar-contact)
//! - The world/step driver (planar-core)
//! - External integrators and renderers
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero UI dependencies**. It can be used in:
//!
//! - Headless simulation loops
//! - Analysis tools
//! - Other engines
//!
//! # Coordinate System
//!
//! - X: right
//! - Y: up
//! - Angles counter-clockwise, radians
//!
//! # Example
//!
//! ```
//! use planar_types::RigidBody;
//! use nalgebra::Point2;
//!
//! // A unit-mass 1x3 block lying flat, centered half a unit above the origin
//! let body = RigidBody::new(1.0, 3.0, 1.0).at_position(Point2::new(0.0, 0.5));
//!
//! let corners = body.corners();
//! assert_eq!(corners[0], Point2::new(-1.5, 0.0));
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,  // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,      // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,    // Error docs added where non-obvious
)]

mod body;
mod config;
mod contact;
mod dynamics;
mod error;
mod wall;

pub use body::{BodyId, RigidBody};
pub use config::SimConfig;
pub use contact::{Contact, ContactKind, ContactPartner};
pub use dynamics::{AppliedForce, BodyAccel};
pub use error::{PenetrationSignal, SimError, SolverError};
pub use wall::{Boundary, WallSide};

// Re-export math types for convenience
pub use nalgebra::{Point2, Rotation2, Vector2};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
