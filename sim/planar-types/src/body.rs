//! Rigid-body state for oriented rectangular bodies.
//!
//! A body is an oriented rectangle described by its center-of-mass position,
//! orientation angle, and linear/angular velocity. Corners and inertial
//! quantities are always derived from these fields, never stored, so they
//! cannot drift out of sync with the pose.

use nalgebra::{Point2, Rotation2, Vector2};

use crate::error::SimError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier for a rigid body in the simulation.
///
/// Identifiers are assigned by the body registry in insertion order, so the
/// raw value doubles as the index into the registry's body slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u64);

impl BodyId {
    /// Create a new body ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Get the ID as a slice index.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u64> for BodyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// State of one oriented rectangular rigid body.
///
/// Mass may be finite or [`f64::INFINITY`]; an infinite-mass body has zero
/// inverse mass and zero inverse moment, and therefore never responds to
/// impulses or contact forces.
///
/// # Example
///
/// ```
/// use planar_types::RigidBody;
/// use nalgebra::Vector2;
///
/// let body = RigidBody::new(2.0, 1.0, 3.0);
/// assert_eq!(body.inv_mass(), 0.5);
///
/// // Moment of a rectangle about its center: m (w^2 + h^2) / 12
/// assert!((body.moment_about_cm() - 2.0 * 10.0 / 12.0).abs() < 1e-12);
///
/// let wall = RigidBody::static_body(1.0, 1.0);
/// assert_eq!(wall.inv_mass(), 0.0);
/// assert_eq!(wall.inv_moment_about_cm(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBody {
    /// Center-of-mass position in world coordinates.
    pub position: Point2<f64>,
    /// Orientation angle (radians, counter-clockwise).
    pub angle: f64,
    /// Linear velocity of the center of mass.
    pub velocity: Vector2<f64>,
    /// Angular velocity (rad/s, counter-clockwise positive).
    pub angular_velocity: f64,
    /// Thrust force in body-local coordinates, applied at the attachment
    /// point. Zero when the thruster is off.
    pub thrust: Vector2<f64>,
    mass: f64,
    width: f64,
    height: f64,
    thrust_offset: Vector2<f64>,
}

impl RigidBody {
    /// Create a body at the origin, at rest, with the given mass and extents.
    ///
    /// The thrust attachment point defaults to the midpoint of the top edge.
    #[must_use]
    pub fn new(mass: f64, width: f64, height: f64) -> Self {
        Self {
            position: Point2::origin(),
            angle: 0.0,
            velocity: Vector2::zeros(),
            angular_velocity: 0.0,
            thrust: Vector2::zeros(),
            mass,
            width,
            height,
            thrust_offset: Vector2::new(0.0, height / 2.0),
        }
    }

    /// Create an immovable body (infinite mass).
    #[must_use]
    pub fn static_body(width: f64, height: f64) -> Self {
        Self::new(f64::INFINITY, width, height)
    }

    /// Set the position (builder style).
    #[must_use]
    pub fn at_position(mut self, position: Point2<f64>) -> Self {
        self.position = position;
        self
    }

    /// Set the orientation angle (builder style).
    #[must_use]
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    /// Set the linear and angular velocity (builder style).
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vector2<f64>, angular_velocity: f64) -> Self {
        self.velocity = velocity;
        self.angular_velocity = angular_velocity;
        self
    }

    /// Set the body-local thrust attachment offset (builder style).
    #[must_use]
    pub fn with_thrust_offset(mut self, offset: Vector2<f64>) -> Self {
        self.thrust_offset = offset;
        self
    }

    /// Validate mass and extents.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.mass <= 0.0 || self.mass.is_nan() {
            return Err(SimError::invalid_mass(format!(
                "mass must be positive or infinite, got {}",
                self.mass
            )));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(SimError::invalid_mass(format!(
                "extents must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.width.is_finite() || !self.height.is_finite() {
            return Err(SimError::invalid_mass("extents must be finite"));
        }
        Ok(())
    }

    /// The body's mass (possibly infinite).
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Rectangle width (extent along the body-local X axis).
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Rectangle height (extent along the body-local Y axis).
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Whether this body can move (finite mass).
    #[must_use]
    pub fn is_movable(&self) -> bool {
        self.mass.is_finite()
    }

    /// Inverse mass; exactly zero for infinite mass.
    #[must_use]
    pub fn inv_mass(&self) -> f64 {
        if self.mass.is_finite() {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Moment of inertia about the center of mass: `m (w^2 + h^2) / 12`.
    #[must_use]
    pub fn moment_about_cm(&self) -> f64 {
        self.mass * (self.width * self.width + self.height * self.height) / 12.0
    }

    /// Inverse moment about the center of mass; exactly zero for infinite mass.
    #[must_use]
    pub fn inv_moment_about_cm(&self) -> f64 {
        if self.mass.is_finite() {
            12.0 / (self.mass * (self.width * self.width + self.height * self.height))
        } else {
            0.0
        }
    }

    /// The rotation taking body-local vectors to world vectors.
    #[must_use]
    pub fn rotation(&self) -> Rotation2<f64> {
        Rotation2::new(self.angle)
    }

    /// Transform a body-local point to world coordinates.
    #[must_use]
    pub fn local_to_world(&self, local: Point2<f64>) -> Point2<f64> {
        self.position + self.rotation() * local.coords
    }

    /// Transform a world point to body-local coordinates.
    #[must_use]
    pub fn world_to_local(&self, world: Point2<f64>) -> Point2<f64> {
        Point2::from(self.rotation().inverse() * (world - self.position))
    }

    /// The four corner positions in world coordinates, recomputed from the
    /// current pose. Order: bottom-left, bottom-right, top-right, top-left
    /// in body-local coordinates, counter-clockwise.
    #[must_use]
    pub fn corners(&self) -> [Point2<f64>; 4] {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        [
            self.local_to_world(Point2::new(-hw, -hh)),
            self.local_to_world(Point2::new(hw, -hh)),
            self.local_to_world(Point2::new(hw, hh)),
            self.local_to_world(Point2::new(-hw, hh)),
        ]
    }

    /// The thrust attachment point in world coordinates.
    #[must_use]
    pub fn thrust_point(&self) -> Point2<f64> {
        self.position + self.rotation() * self.thrust_offset
    }

    /// The thrust force rotated into world coordinates.
    #[must_use]
    pub fn thrust_world(&self) -> Vector2<f64> {
        self.rotation() * self.thrust
    }

    /// Velocity of a point on the body at offset `r` from the center of mass:
    /// `v + omega x r = (vx - w*ry, vy + w*rx)`.
    #[must_use]
    pub fn point_velocity(&self, r: Vector2<f64>) -> Vector2<f64> {
        Vector2::new(
            self.velocity.x - self.angular_velocity * r.y,
            self.velocity.y + self.angular_velocity * r.x,
        )
    }

    /// Kinetic energy `m v^2 / 2 + I w^2 / 2`.
    ///
    /// Immovable bodies carry no tracked energy and report zero.
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        if !self.mass.is_finite() {
            return 0.0;
        }
        0.5 * self.mass * self.velocity.norm_squared()
            + 0.5 * self.moment_about_cm() * self.angular_velocity * self.angular_velocity
    }

    /// Linear momentum and angular momentum about the center of mass.
    ///
    /// Immovable bodies report zero.
    #[must_use]
    pub fn momentum(&self) -> (Vector2<f64>, f64) {
        if !self.mass.is_finite() {
            return (Vector2::zeros(), 0.0);
        }
        (
            self.mass * self.velocity,
            self.moment_about_cm() * self.angular_velocity,
        )
    }

    /// Check that the pose and velocities contain no `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.angle.is_finite()
            && self.velocity.iter().all(|x| x.is_finite())
            && self.angular_velocity.is_finite()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_body_id() {
        let id = BodyId::new(3);
        assert_eq!(id.raw(), 3);
        assert_eq!(id.index(), 3);
        assert_eq!(BodyId::from(3), id);
        assert_eq!(id.to_string(), "Body(3)");
    }

    #[test]
    fn test_corners_axis_aligned() {
        let body = RigidBody::new(1.0, 4.0, 2.0).at_position(Point2::new(1.0, 1.0));
        let c = body.corners();
        assert_eq!(c[0], Point2::new(-1.0, 0.0));
        assert_eq!(c[1], Point2::new(3.0, 0.0));
        assert_eq!(c[2], Point2::new(3.0, 2.0));
        assert_eq!(c[3], Point2::new(-1.0, 2.0));
    }

    #[test]
    fn test_corners_rotated() {
        // Quarter turn swaps width and height
        let body = RigidBody::new(1.0, 4.0, 2.0).with_angle(std::f64::consts::FRAC_PI_2);
        let c = body.corners();
        // Local (-2, -1) -> world (1, -2)
        assert_relative_eq!(c[0].x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(c[0].y, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_corners_track_pose() {
        let mut body = RigidBody::new(1.0, 2.0, 2.0);
        let before = body.corners();
        body.position = Point2::new(5.0, -3.0);
        let after = body.corners();
        assert_eq!(after[0], before[0] + Vector2::new(5.0, -3.0));
    }

    #[test]
    fn test_inertia() {
        let body = RigidBody::new(3.0, 1.0, 3.0);
        assert_relative_eq!(body.moment_about_cm(), 3.0 * 10.0 / 12.0);
        assert_relative_eq!(
            body.inv_moment_about_cm(),
            1.0 / body.moment_about_cm(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_infinite_mass() {
        let body = RigidBody::static_body(2.0, 2.0);
        assert!(!body.is_movable());
        assert_eq!(body.inv_mass(), 0.0);
        assert_eq!(body.inv_moment_about_cm(), 0.0);
        assert_eq!(body.kinetic_energy(), 0.0);
        assert_eq!(body.momentum().1, 0.0);
    }

    #[test]
    fn test_point_velocity() {
        let body =
            RigidBody::new(1.0, 1.0, 1.0).with_velocity(Vector2::new(1.0, 2.0), 3.0);
        let v = body.point_velocity(Vector2::new(0.5, -0.5));
        // (vx - w*ry, vy + w*rx)
        assert_relative_eq!(v.x, 1.0 + 1.5);
        assert_relative_eq!(v.y, 2.0 + 1.5);
    }

    #[test]
    fn test_kinetic_energy() {
        let body =
            RigidBody::new(2.0, 1.0, 1.0).with_velocity(Vector2::new(3.0, 4.0), 0.0);
        assert_relative_eq!(body.kinetic_energy(), 0.5 * 2.0 * 25.0);
    }

    #[test]
    fn test_local_world_round_trip() {
        let body = RigidBody::new(1.0, 2.0, 1.0)
            .at_position(Point2::new(2.0, -1.0))
            .with_angle(0.7);
        let p = Point2::new(0.3, -0.4);
        let back = body.world_to_local(body.local_to_world(p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-12);
    }

    #[test]
    fn test_validate() {
        assert!(RigidBody::new(1.0, 1.0, 1.0).validate().is_ok());
        assert!(RigidBody::static_body(1.0, 1.0).validate().is_ok());
        assert!(RigidBody::new(-1.0, 1.0, 1.0).validate().is_err());
        assert!(RigidBody::new(1.0, 0.0, 1.0).validate().is_err());
        assert!(RigidBody::new(f64::NAN, 1.0, 1.0).validate().is_err());
    }
}
