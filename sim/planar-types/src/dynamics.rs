//! Acceleration and force-record types shared by the solver and the driver.

use nalgebra::{Point2, Vector2};

use crate::body::BodyId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Linear and angular acceleration of one body for the current substep.
///
/// The driver computes the "free" accelerations (gravity, thrust, damping)
/// into a slice of these, the contact-force solver adds its forces on top,
/// and the integrator consumes the result.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyAccel {
    /// Acceleration of the center of mass.
    pub linear: Vector2<f64>,
    /// Angular acceleration (rad/s^2).
    pub angular: f64,
}

impl BodyAccel {
    /// Create an acceleration record.
    #[must_use]
    pub const fn new(linear: Vector2<f64>, angular: f64) -> Self {
        Self { linear, angular }
    }

    /// Zero acceleration.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            linear: Vector2::zeros(),
            angular: 0.0,
        }
    }

    /// Acceleration of a point at offset `r` from the center of mass,
    /// ignoring the velocity-dependent (centripetal) part:
    /// `a + alpha x r`.
    #[must_use]
    pub fn point_accel(&self, r: Vector2<f64>) -> Vector2<f64> {
        self.linear + self.angular * Vector2::new(-r.y, r.x)
    }
}

/// A contact force applied during one substep, kept for the debug overlay.
///
/// Renderers read these from the per-step snapshot to draw force vectors at
/// their application points.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AppliedForce {
    /// The body the force acts on.
    pub body: BodyId,
    /// World-space application point.
    pub point: Point2<f64>,
    /// The force vector.
    pub force: Vector2<f64>,
}
