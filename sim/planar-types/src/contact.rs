//! Contact records produced by collision detection.
//!
//! A [`Contact`] describes a body corner touching (or interpenetrating) an
//! edge supplied by another body or a wall. The same record type serves both
//! the instantaneous impulse path (`kind == Colliding`) and the resting
//! contact-force solver (`kind == Resting`); the detector decides which.

use nalgebra::{Point2, Vector2};

use crate::body::BodyId;
use crate::wall::WallSide;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Normals shorter than this cannot be safely normalized.
const MIN_NORMAL_LENGTH: f64 = 1e-9;

/// Whether a contact calls for an impulse or a contact force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ContactKind {
    /// Interpenetrating with approach velocity: resolved by an impulse.
    Colliding,
    /// Touching with near-zero normal velocity: resolved by contact forces.
    Resting,
}

/// The side of a contact that supplies the normal: another body or a wall.
///
/// Walls behave as infinite-mass bodies with a fixed normal; matching on
/// this enum replaces any sign-sentinel index encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ContactPartner {
    /// Another rigid body in the registry.
    Body(BodyId),
    /// One side of the simulation boundary.
    Wall(WallSide),
}

impl ContactPartner {
    /// The body ID if the partner is a body.
    #[must_use]
    pub fn body_id(self) -> Option<BodyId> {
        match self {
            Self::Body(id) => Some(id),
            Self::Wall(_) => None,
        }
    }
}

impl std::fmt::Display for ContactPartner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Body(id) => write!(f, "{id}"),
            Self::Wall(side) => write!(f, "{side}"),
        }
    }
}

/// A detected contact between a body corner and an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contact {
    /// The body whose corner is involved.
    pub body: BodyId,
    /// The body or wall supplying the normal.
    pub partner: ContactPartner,
    /// Which of the body's four corners (0..4, counter-clockwise from
    /// bottom-left in body-local coordinates).
    pub corner: usize,
    /// Unit normal, pointing from the partner toward the body.
    pub normal: Vector2<f64>,
    /// Impact point in world coordinates.
    pub point: Point2<f64>,
    /// Vector from the body's center of mass to the impact point.
    pub r: Vector2<f64>,
    /// Vector from the partner's center of mass to the impact point
    /// (zero for walls).
    pub r2: Vector2<f64>,
    /// Signed penetration depth; positive means interpenetrating.
    pub depth: f64,
    /// Impulse or contact-force classification.
    pub kind: ContactKind,
}

impl Contact {
    /// Build a contact, normalizing the normal and rejecting degenerate
    /// geometry (zero-length or non-finite normal, non-finite point).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        body: BodyId,
        partner: ContactPartner,
        corner: usize,
        normal: Vector2<f64>,
        point: Point2<f64>,
        r: Vector2<f64>,
        r2: Vector2<f64>,
        depth: f64,
        kind: ContactKind,
    ) -> Option<Self> {
        let length = normal.norm();
        if !length.is_finite() || length < MIN_NORMAL_LENGTH {
            return None;
        }
        if !point.coords.iter().all(|x| x.is_finite()) || !depth.is_finite() {
            return None;
        }
        Some(Self {
            body,
            partner,
            corner,
            normal: normal / length,
            point,
            r,
            r2,
            depth,
            kind,
        })
    }

    /// Whether this contact should be routed to the impulse resolver.
    #[must_use]
    pub fn is_colliding(&self) -> bool {
        self.kind == ContactKind::Colliding
    }

    /// Whether this contact should be routed to the contact-force solver.
    #[must_use]
    pub fn is_resting(&self) -> bool {
        self.kind == ContactKind::Resting
    }

    /// Whether two contacts involve the same unordered (body, partner) pair.
    ///
    /// A body corner touching another body is the same physical pair no
    /// matter which side reported it.
    #[must_use]
    pub fn same_pair(&self, other: &Self) -> bool {
        if self.body == other.body && self.partner == other.partner {
            return true;
        }
        match (self.partner, other.partner) {
            (ContactPartner::Body(a), ContactPartner::Body(b)) => {
                a == other.body && b == self.body
            }
            _ => false,
        }
    }

    /// Whether two contacts involve the same *ordered* (body, partner) pair,
    /// the precondition for the merged two-point impulse path.
    #[must_use]
    pub fn same_ordered_pair(&self, other: &Self) -> bool {
        self.body == other.body && self.partner == other.partner
    }
}
