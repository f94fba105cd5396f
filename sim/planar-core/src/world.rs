//! The body registry and the two integrator-facing entry points.

use nalgebra::Vector2;
use tracing::{debug, error, warn};

use planar_collision::CollisionDetector;
use planar_contact::{AppliedImpulse, ContactForceSolver, ImpulseResolver};
use planar_types::{
    AppliedForce, BodyAccel, BodyId, Boundary, PenetrationSignal, RigidBody, SimConfig, SimError,
};

use crate::snapshot::WorldSnapshot;

/// State-vector slots per body: `[x, y, angle, vx, vy, angular_velocity]`.
pub const STATE_SLOTS: usize = 6;

/// Owns the bodies, the boundary, and the per-step contact pipeline.
///
/// The external integrator owns the state vector; the world synchronizes
/// bodies from it on every [`evaluate`](World::evaluate) call and exposes
/// [`state_vector`](World::state_vector) to seed it.
#[derive(Debug, Clone)]
pub struct World {
    bodies: Vec<RigidBody>,
    boundary: Boundary,
    config: SimConfig,
    detector: CollisionDetector,
    force_solver: ContactForceSolver,
    impulse_resolver: ImpulseResolver,
    contact_forces: Vec<AppliedForce>,
    impulses: Vec<AppliedImpulse>,
    time: f64,
}

impl World {
    /// Create an empty world.
    ///
    /// # Errors
    ///
    /// Returns an error if the boundary or configuration is invalid.
    pub fn new(boundary: Boundary, config: SimConfig) -> Result<Self, SimError> {
        boundary.validate()?;
        config.validate()?;
        Ok(Self {
            bodies: Vec::new(),
            boundary,
            config,
            detector: CollisionDetector::new(&config),
            force_solver: ContactForceSolver::new(&config),
            impulse_resolver: ImpulseResolver::new(config.elasticity),
            contact_forces: Vec::new(),
            impulses: Vec::new(),
            time: 0.0,
        })
    }

    /// Add a body to the registry, returning its ID (also its index).
    ///
    /// # Errors
    ///
    /// Returns an error if the body's mass properties are invalid.
    pub fn add_body(&mut self, body: RigidBody) -> Result<BodyId, SimError> {
        body.validate()?;
        let id = BodyId::new(self.bodies.len() as u64);
        self.bodies.push(body);
        Ok(id)
    }

    /// The registered bodies, in ID order.
    #[must_use]
    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    /// Look up one body.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.get(id.index())
    }

    /// Set a body's thrust force (body-local coordinates, applied at its
    /// attachment point). Zero turns the thruster off.
    pub fn set_thrust(&mut self, id: BodyId, thrust: Vector2<f64>) -> Result<(), SimError> {
        let body = self
            .bodies
            .get_mut(id.index())
            .ok_or(SimError::InvalidBodyId(id.raw()))?;
        body.thrust = thrust;
        Ok(())
    }

    /// The simulation boundary.
    #[must_use]
    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// The simulation configuration.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Elapsed simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Advance the clock after an accepted step.
    pub fn advance_time(&mut self, dt: f64) {
        self.time += dt;
    }

    /// Expected state-vector length for the current registry.
    #[must_use]
    pub fn state_len(&self) -> usize {
        self.bodies.len() * STATE_SLOTS
    }

    /// Pack the current body states into a fresh state vector.
    #[must_use]
    pub fn state_vector(&self) -> Vec<f64> {
        let mut state = vec![0.0; self.state_len()];
        for (i, body) in self.bodies.iter().enumerate() {
            let base = i * STATE_SLOTS;
            state[base] = body.position.x;
            state[base + 1] = body.position.y;
            state[base + 2] = body.angle;
            state[base + 3] = body.velocity.x;
            state[base + 4] = body.velocity.y;
            state[base + 5] = body.angular_velocity;
        }
        state
    }

    /// Overwrite body poses and velocities from a state vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length does not match
    /// [`state_len`](World::state_len).
    pub fn sync_from_state(&mut self, state: &[f64]) -> Result<(), SimError> {
        if state.len() != self.state_len() {
            return Err(SimError::StateLengthMismatch {
                expected: self.state_len(),
                actual: state.len(),
            });
        }
        for (i, body) in self.bodies.iter_mut().enumerate() {
            let base = i * STATE_SLOTS;
            body.position.x = state[base];
            body.position.y = state[base + 1];
            body.angle = state[base + 2];
            body.velocity.x = state[base + 3];
            body.velocity.y = state[base + 4];
            body.angular_velocity = state[base + 5];
        }
        Ok(())
    }

    /// Evaluate the derivative of the state vector for one substep.
    ///
    /// Syncs bodies from `state`, fills `derivative` with position
    /// derivatives and free accelerations, then augments the accelerations
    /// with resting contact forces when bodies are in contact.
    ///
    /// Slice lengths must match [`state_len`](World::state_len); a mismatch
    /// is a caller bug and the overhang is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PenetrationSignal`] when a body interpenetrates beyond the
    /// distance tolerance: the integrator must back up and bisect the
    /// timestep rather than accept this state. No derivative is produced.
    pub fn evaluate(
        &mut self,
        state: &[f64],
        derivative: &mut [f64],
    ) -> Result<(), PenetrationSignal> {
        debug_assert_eq!(state.len(), self.state_len());
        debug_assert_eq!(derivative.len(), self.state_len());

        if state.len() == self.state_len() {
            // Infallible given the length check above.
            let _ = self.sync_from_state(state);
        }

        // Interpenetration is the integrator's cue to bisect.
        if let Some(signal) = self.deepest_penetration() {
            debug!(
                body = %signal.body,
                depth = signal.depth,
                "penetration detected, requesting bisection"
            );
            return Err(signal);
        }

        let mut change = self.free_accelerations();
        self.augment_with_contact_forces(&mut change);

        for (i, accel) in change.iter().enumerate() {
            let base = i * STATE_SLOTS;
            if base + STATE_SLOTS > derivative.len() {
                break;
            }
            let body = &self.bodies[i];
            derivative[base] = body.velocity.x;
            derivative[base + 1] = body.velocity.y;
            derivative[base + 2] = body.angular_velocity;
            derivative[base + 3] = accel.linear.x;
            derivative[base + 4] = accel.linear.y;
            derivative[base + 5] = accel.angular;
        }

        Ok(())
    }

    /// Detect and resolve collisions after an accepted step.
    ///
    /// Applies restitution impulses to every interpenetrating contact (the
    /// merged two-point path for matched pairs) and records them for the
    /// snapshot. Returns the number of impulses applied; the step becomes a
    /// velocity discontinuity point when it is nonzero.
    pub fn handle_collisions(&mut self) -> usize {
        let contacts = self.detector.detect_collisions(&self.bodies, &self.boundary);
        if contacts.is_empty() {
            self.impulses.clear();
            return 0;
        }

        debug!(count = contacts.len(), "resolving collisions");
        self.impulses = self.impulse_resolver.resolve(&mut self.bodies, &contacts);
        self.impulses.len()
    }

    /// Immutable per-step snapshot for concurrent readers.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(
            self.time,
            &self.bodies,
            &self.contact_forces,
            &self.impulses,
        )
    }

    /// Total kinetic energy over all movable bodies.
    #[must_use]
    pub fn total_kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(RigidBody::kinetic_energy).sum()
    }

    /// Total linear momentum and angular momentum about each body's center
    /// of mass, summed over all movable bodies.
    #[must_use]
    pub fn total_momentum(&self) -> (Vector2<f64>, f64) {
        self.bodies.iter().fold(
            (Vector2::zeros(), 0.0),
            |(linear, angular), body| {
                let (p, l) = body.momentum();
                (linear + p, angular + l)
            },
        )
    }

    /// The deepest interpenetration past the distance tolerance, if any.
    fn deepest_penetration(&self) -> Option<PenetrationSignal> {
        self.detector
            .detect_collisions(&self.bodies, &self.boundary)
            .into_iter()
            .filter(|c| c.depth > self.config.distance_tol)
            .max_by(|a, b| a.depth.total_cmp(&b.depth))
            .map(|c| PenetrationSignal {
                body: c.body,
                partner: c.partner,
                depth: c.depth,
            })
    }

    /// Free accelerations for this substep: gravity, thrust, damping.
    fn free_accelerations(&self) -> Vec<BodyAccel> {
        self.bodies
            .iter()
            .map(|body| {
                if !body.is_movable() {
                    return BodyAccel::zero();
                }
                let inv_mass = body.inv_mass();
                let inv_moment = body.inv_moment_about_cm();

                let mut linear = Vector2::new(0.0, -self.config.gravity);
                let mut angular = 0.0;

                let thrust = body.thrust_world();
                if thrust != Vector2::zeros() {
                    let arm = body.thrust_point() - body.position;
                    linear += thrust * inv_mass;
                    angular += arm.perp(&thrust) * inv_moment;
                }

                if self.config.damping > 0.0 {
                    linear -= self.config.damping * body.velocity * inv_mass;
                    angular -= self.config.damping * body.angular_velocity * inv_moment;
                }

                BodyAccel::new(linear, angular)
            })
            .collect()
    }

    /// Run the resting-contact pipeline, folding solved forces into
    /// `change`. On solver failure the substep proceeds with free-fall
    /// accelerations.
    fn augment_with_contact_forces(&mut self, change: &mut [BodyAccel]) {
        let resting = self.detector.detect_resting(&self.bodies, &self.boundary);
        if resting.is_empty() {
            self.contact_forces.clear();
            return;
        }

        match self.force_solver.solve(&resting, &self.bodies, change) {
            Ok(solution) => {
                self.contact_forces =
                    self.force_solver
                        .apply_forces(&resting, &self.bodies, &solution, change);
            }
            Err(err) if err.is_consistency_violation() => {
                // Detection should have rejected this step; loud, then
                // free-fall for one substep.
                error!(error = %err, "resting contact inconsistent with detection");
                self.contact_forces.clear();
            }
            Err(err) => {
                warn!(
                    error = %err,
                    "contact force solve failed; bodies fall freely this substep"
                );
                self.contact_forces.clear();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn arena() -> Boundary {
        Boundary::new(-5.0, 5.0, 0.0, 10.0)
    }

    fn world_with(config: SimConfig) -> World {
        World::new(arena(), config).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(World::new(arena(), SimConfig::default().with_elasticity(2.0)).is_err());
        assert!(World::new(Boundary::new(1.0, 0.0, 0.0, 1.0), SimConfig::default()).is_err());
    }

    #[test]
    fn test_add_body_assigns_sequential_ids() {
        let mut world = world_with(SimConfig::default());
        let a = world.add_body(RigidBody::new(1.0, 1.0, 1.0)).unwrap();
        let b = world.add_body(RigidBody::new(2.0, 1.0, 1.0)).unwrap();
        assert_eq!(a, BodyId::new(0));
        assert_eq!(b, BodyId::new(1));
        assert!(world.add_body(RigidBody::new(-1.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_state_vector_round_trip() {
        let mut world = world_with(SimConfig::default());
        world
            .add_body(
                RigidBody::new(1.0, 1.0, 1.0)
                    .at_position(Point2::new(1.0, 2.0))
                    .with_angle(0.3)
                    .with_velocity(Vector2::new(-1.0, 0.5), 0.25),
            )
            .unwrap();

        let state = world.state_vector();
        assert_eq!(state, vec![1.0, 2.0, 0.3, -1.0, 0.5, 0.25]);

        let mut moved = state.clone();
        moved[0] = 4.0;
        world.sync_from_state(&moved).unwrap();
        assert_eq!(world.bodies()[0].position.x, 4.0);

        assert!(world.sync_from_state(&state[..3]).is_err());
    }

    #[test]
    fn test_evaluate_free_fall() {
        let mut world = world_with(SimConfig::default().with_gravity(10.0));
        world
            .add_body(RigidBody::new(1.0, 1.0, 1.0).at_position(Point2::new(0.0, 5.0)))
            .unwrap();

        let state = world.state_vector();
        let mut derivative = vec![0.0; state.len()];
        world.evaluate(&state, &mut derivative).unwrap();

        assert_relative_eq!(derivative[4], -10.0);
        assert_relative_eq!(derivative[3], 0.0);
    }

    #[test]
    fn test_evaluate_signals_penetration() {
        let mut world = world_with(SimConfig::default());
        world
            .add_body(RigidBody::new(1.0, 1.0, 1.0).at_position(Point2::new(0.0, 0.3)))
            .unwrap();

        let state = world.state_vector();
        let mut derivative = vec![0.0; state.len()];
        let signal = world.evaluate(&state, &mut derivative).unwrap_err();

        assert_eq!(signal.body, BodyId::new(0));
        assert_relative_eq!(signal.depth, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_evaluate_resting_block_is_supported() {
        let mut world = world_with(SimConfig::resting());
        world
            .add_body(RigidBody::new(1.0, 3.0, 1.0).at_position(Point2::new(0.0, 0.5)))
            .unwrap();

        let state = world.state_vector();
        let mut derivative = vec![0.0; state.len()];
        world.evaluate(&state, &mut derivative).unwrap();

        // Contact forces cancel gravity: zero net acceleration
        assert_relative_eq!(derivative[4], 0.0, epsilon = 1e-9);
        assert_relative_eq!(derivative[5], 0.0, epsilon = 1e-9);

        let snapshot = world.snapshot();
        assert_eq!(snapshot.contact_forces.len(), 2);
        let total: f64 = snapshot.contact_forces.iter().map(|f| f.force.y).sum();
        assert_relative_eq!(total, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_handle_collisions_bounces_body() {
        let mut world = world_with(SimConfig::bouncy());
        world
            .add_body(
                RigidBody::new(1.0, 1.0, 1.0)
                    .at_position(Point2::new(0.0, 0.4999))
                    .with_velocity(Vector2::new(0.0, -2.0), 0.0),
            )
            .unwrap();

        let applied = world.handle_collisions();

        assert_eq!(applied, 1); // merged two-corner impulse
        assert_relative_eq!(world.bodies()[0].velocity.y, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_handle_collisions_noop_when_clear() {
        let mut world = world_with(SimConfig::default());
        world
            .add_body(RigidBody::new(1.0, 1.0, 1.0).at_position(Point2::new(0.0, 5.0)))
            .unwrap();
        assert_eq!(world.handle_collisions(), 0);
        assert!(world.snapshot().impulses.is_empty());
    }

    #[test]
    fn test_thrust_enters_derivative() {
        let mut world = world_with(SimConfig::default().with_gravity(0.0));
        let id = world
            .add_body(RigidBody::new(2.0, 1.0, 1.0).at_position(Point2::new(0.0, 5.0)))
            .unwrap();
        world.set_thrust(id, Vector2::new(4.0, 0.0)).unwrap();

        let state = world.state_vector();
        let mut derivative = vec![0.0; state.len()];
        world.evaluate(&state, &mut derivative).unwrap();

        assert_relative_eq!(derivative[3], 2.0); // F/m
        // Attachment above the CM: +X thrust torques clockwise
        assert!(derivative[5] < 0.0);

        assert!(world
            .set_thrust(BodyId::new(9), Vector2::zeros())
            .is_err());
    }

    #[test]
    fn test_damping_opposes_motion() {
        let mut world = world_with(SimConfig::default().with_gravity(0.0).with_damping(0.5));
        world
            .add_body(
                RigidBody::new(1.0, 1.0, 1.0)
                    .at_position(Point2::new(0.0, 5.0))
                    .with_velocity(Vector2::new(2.0, 0.0), 1.0),
            )
            .unwrap();

        let state = world.state_vector();
        let mut derivative = vec![0.0; state.len()];
        world.evaluate(&state, &mut derivative).unwrap();

        assert_relative_eq!(derivative[3], -1.0); // -k v / m
        assert!(derivative[5] < 0.0);
    }

    #[test]
    fn test_diagnostics() {
        let mut world = world_with(SimConfig::default());
        world
            .add_body(
                RigidBody::new(2.0, 1.0, 1.0)
                    .at_position(Point2::new(0.0, 5.0))
                    .with_velocity(Vector2::new(3.0, 0.0), 0.0),
            )
            .unwrap();
        world
            .add_body(RigidBody::static_body(1.0, 1.0).at_position(Point2::new(3.0, 5.0)))
            .unwrap();

        assert_relative_eq!(world.total_kinetic_energy(), 9.0);
        assert_relative_eq!(world.total_momentum().0.x, 6.0);
    }
}
