//! Configuration for the contact engine.

use crate::error::SimError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Recognized simulation options: restitution, gravity, damping, and the
/// detection tolerances.
///
/// # Example
///
/// ```
/// use planar_types::SimConfig;
///
/// let config = SimConfig::default().with_elasticity(0.8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimConfig {
    /// Coefficient of restitution (0 = inelastic, 1 = perfectly elastic).
    pub elasticity: f64,
    /// Gravitational acceleration magnitude; acts along -Y.
    pub gravity: f64,
    /// Linear and angular velocity damping coefficient (force per velocity).
    pub damping: f64,
    /// Distance tolerance: how close a corner must be to an edge to count as
    /// touching, and how far apart two impact points may be before they are
    /// distinct contacts.
    pub distance_tol: f64,
    /// Velocity tolerance: the normal relative speed below which a touching
    /// contact is resting rather than colliding.
    pub velocity_tol: f64,
    /// Fixed integration timestep handed to the external integrator (s).
    pub timestep: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            elasticity: 0.8,
            gravity: 4.0,
            damping: 0.0,
            distance_tol: 0.01,
            velocity_tol: 0.05,
            timestep: 1.0 / 60.0,
        }
    }
}

impl SimConfig {
    /// Perfectly elastic, zero-gravity configuration (billiards style).
    #[must_use]
    pub fn bouncy() -> Self {
        Self {
            elasticity: 1.0,
            gravity: 0.0,
            ..Default::default()
        }
    }

    /// Inelastic, heavy-gravity configuration for resting-contact scenes.
    #[must_use]
    pub fn resting() -> Self {
        Self {
            elasticity: 0.0,
            gravity: 10.0,
            ..Default::default()
        }
    }

    /// Set the restitution coefficient.
    #[must_use]
    pub fn with_elasticity(mut self, elasticity: f64) -> Self {
        self.elasticity = elasticity;
        self
    }

    /// Set the gravity magnitude.
    #[must_use]
    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the damping coefficient.
    #[must_use]
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Set the detection tolerances.
    #[must_use]
    pub fn with_tolerances(mut self, distance_tol: f64, velocity_tol: f64) -> Self {
        self.distance_tol = distance_tol;
        self.velocity_tol = velocity_tol;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(0.0..=1.0).contains(&self.elasticity) {
            return Err(SimError::invalid_config(format!(
                "elasticity must be in [0, 1], got {}",
                self.elasticity
            )));
        }
        if self.gravity < 0.0 || !self.gravity.is_finite() {
            return Err(SimError::invalid_config("gravity must be non-negative"));
        }
        if self.damping < 0.0 || !self.damping.is_finite() {
            return Err(SimError::invalid_config("damping must be non-negative"));
        }
        if self.distance_tol <= 0.0 || self.velocity_tol <= 0.0 {
            return Err(SimError::invalid_config(
                "detection tolerances must be positive",
            ));
        }
        if self.timestep <= 0.0 || !self.timestep.is_finite() {
            return Err(SimError::invalid_config(format!(
                "invalid timestep: {}",
                self.timestep
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
        assert!(SimConfig::bouncy().validate().is_ok());
        assert!(SimConfig::resting().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        assert!(SimConfig::default().with_elasticity(1.5).validate().is_err());
        assert!(SimConfig::default().with_gravity(-1.0).validate().is_err());
        assert!(SimConfig::default()
            .with_tolerances(0.0, 0.1)
            .validate()
            .is_err());

        let mut config = SimConfig::default();
        config.timestep = 0.0;
        assert!(config.validate().is_err());
    }
}
