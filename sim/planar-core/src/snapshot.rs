//! Immutable per-step snapshots for concurrent readers.
//!
//! The simulation loop owns all body mutation; a renderer or debug overlay
//! reads a [`WorldSnapshot`] captured once per completed step instead of
//! touching live state, so partially-applied impulses are never visible.

use nalgebra::{Point2, Vector2};

use planar_contact::AppliedImpulse;
use planar_types::{AppliedForce, BodyId, RigidBody};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One body's pose and derived display geometry at a step boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodySnapshot {
    /// The body's registry ID.
    pub id: BodyId,
    /// Center-of-mass position.
    pub position: Point2<f64>,
    /// Orientation angle.
    pub angle: f64,
    /// Linear velocity.
    pub velocity: Vector2<f64>,
    /// Angular velocity.
    pub angular_velocity: f64,
    /// The four corner positions, consistent with the pose above.
    pub corners: [Point2<f64>; 4],
}

/// A consistent view of the world at a step boundary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldSnapshot {
    /// Simulation time of the capture.
    pub time: f64,
    /// All bodies, in registry order.
    pub bodies: Vec<BodySnapshot>,
    /// Contact forces applied during the last substep, for overlay drawing.
    pub contact_forces: Vec<AppliedForce>,
    /// Impulses applied at the last accepted step, for overlay drawing.
    pub impulses: Vec<AppliedImpulse>,
}

impl WorldSnapshot {
    /// Capture a snapshot from live state. Called by the world at step
    /// boundaries only.
    #[must_use]
    pub(crate) fn capture(
        time: f64,
        bodies: &[RigidBody],
        contact_forces: &[AppliedForce],
        impulses: &[AppliedImpulse],
    ) -> Self {
        Self {
            time,
            bodies: bodies
                .iter()
                .enumerate()
                .map(|(i, body)| BodySnapshot {
                    id: BodyId::new(i as u64),
                    position: body.position,
                    angle: body.angle,
                    velocity: body.velocity,
                    angular_velocity: body.angular_velocity,
                    corners: body.corners(),
                })
                .collect(),
            contact_forces: contact_forces.to_vec(),
            impulses: impulses.to_vec(),
        }
    }
}
