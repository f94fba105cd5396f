//! Error and control-flow result types for the contact pipeline.
//!
//! Two distinct kinds of "failure" flow through the engine and they are kept
//! apart on purpose:
//!
//! - [`SolverError`] - the resting contact-force solver could not produce a
//!   valid force vector. Recoverable: the caller drops contact forces for
//!   one substep and lets the bodies fall freely.
//! - [`PenetrationSignal`] - interpenetration detected while evaluating a
//!   derivative. Not a fault at all: it tells the external integrator to
//!   bisect the timestep and retry. It is an explicit `Err` value, never an
//!   exception-style escape.

use thiserror::Error;

use crate::body::BodyId;
use crate::contact::ContactPartner;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors in simulation setup and bookkeeping.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Invalid body ID referenced.
    #[error("invalid body ID: {0}")]
    InvalidBodyId(u64),

    /// Invalid mass properties.
    #[error("invalid mass properties: {reason}")]
    InvalidMassProperties {
        /// Description of what's wrong.
        reason: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// State vector length does not match the body registry.
    #[error("state vector length {actual} does not match expected {expected}")]
    StateLengthMismatch {
        /// Expected number of slots.
        expected: usize,
        /// Provided number of slots.
        actual: usize,
    },
}

impl SimError {
    /// Create an invalid mass properties error.
    #[must_use]
    pub fn invalid_mass(reason: impl Into<String>) -> Self {
        Self::InvalidMassProperties {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Failures of the resting contact-force solver.
///
/// All variants are recoverable at the process level: the caller skips
/// applying contact forces for the offending substep, logs the event, and
/// keeps simulating. [`SolverError::PenetratingContact`] additionally marks
/// a caller-side ordering defect (detection should have rejected the step)
/// and is logged loudly rather than as a routine fallback.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    /// The pivoting loop exceeded its iteration bound without driving the
    /// working contact's acceleration to zero.
    #[error("contact solver did not converge within {iterations} iterations at contact {contact}")]
    NonConvergence {
        /// The contact being driven when the bound was hit.
        contact: usize,
        /// The iteration bound that was exhausted.
        iterations: usize,
    },

    /// No finite non-negative step exists along the current force direction.
    #[error("unbounded pivot step while driving contact {contact}")]
    UnboundedStep {
        /// The contact being driven.
        contact: usize,
    },

    /// The clamped-contact sub-system `A_CC` was singular.
    #[error("singular clamped-contact subsystem while driving contact {contact}")]
    SingularSystem {
        /// The contact being driven.
        contact: usize,
    },

    /// A resolved force or a pinned acceleration came out negative.
    #[error("sign invariant violated: {reason}")]
    SignViolation {
        /// Description of the violated invariant.
        reason: String,
    },

    /// A contact handed over as resting is still interpenetrating, which
    /// means the caller accepted a step it should have bisected.
    #[error(
        "resting contact {contact} between {body} and {partner} is interpenetrating (depth {depth:.6})"
    )]
    PenetratingContact {
        /// Index of the offending contact in the solve batch.
        contact: usize,
        /// The body whose corner is involved.
        body: BodyId,
        /// The normal-supplying side.
        partner: ContactPartner,
        /// The observed penetration depth.
        depth: f64,
    },
}

impl SolverError {
    /// Create a sign-violation error.
    #[must_use]
    pub fn sign_violation(reason: impl Into<String>) -> Self {
        Self::SignViolation {
            reason: reason.into(),
        }
    }

    /// Whether this failure indicates a caller-side consistency defect
    /// rather than ordinary numerical trouble.
    #[must_use]
    pub fn is_consistency_violation(&self) -> bool {
        matches!(self, Self::PenetratingContact { .. })
    }

    /// Whether this is the iteration-bound failure.
    #[must_use]
    pub fn is_non_convergence(&self) -> bool {
        matches!(self, Self::NonConvergence { .. })
    }
}

/// Interpenetration detected during derivative evaluation.
///
/// Returned as the `Err` of `evaluate` so the external integrator backs up
/// and bisects the timestep. Carries the deepest offending contact.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[error("interpenetration of {body} against {partner} (depth {depth:.6})")]
pub struct PenetrationSignal {
    /// The body whose corner penetrated.
    pub body: BodyId,
    /// What it penetrated into.
    pub partner: ContactPartner,
    /// Penetration depth (positive).
    pub depth: f64,
}
