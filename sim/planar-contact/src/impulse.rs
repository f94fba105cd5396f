//! Instantaneous impulse resolution for colliding contacts.
//!
//! For a contact with normal `n` (pointing from the partner into the body)
//! and relative contact-point velocity `v_rel`, the impulse scalar is
//!
//! ```text
//! j = -(1 + e) (v_rel . n) / (invM_a + invM_b + (r_a x n)^2 invI_a + (r_b x n)^2 invI_b)
//! ```
//!
//! applied as `+j n` to the body and `-j n` to the partner. Walls are the
//! infinite-mass side (both inverses zero). Contacts whose normal relative
//! velocity is already separating are stale and skipped.
//!
//! # Simultaneous contacts
//!
//! When the same ordered (body, partner) pair appears twice in a batch (a
//! body's two corners striking the same edge at the same instant), the two
//! contacts merge into one: the combined normal is perpendicular to the
//! segment joining the two impact points, oriented away from the supporting
//! partner, and the impact point is their midpoint. One impulse is applied
//! for the pair.
//!
//! Three-way simultaneous contacts are **not** handled as a coupled system:
//! each contact is resolved independently, which can gain or lose energy.
//! This limitation is deliberate and asserted by a test; a correct general
//! n-body simultaneous impulse solve is out of scope.

use nalgebra::{Point2, Vector2};
use tracing::debug;

use planar_types::{BodyId, Contact, ContactKind, ContactPartner, RigidBody};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Two impact points closer than this are one corner for merging purposes.
const MIN_MERGE_SEPARATION: f64 = 1e-9;

/// One applied collision impulse, kept for the debug overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AppliedImpulse {
    /// The body that received `+j n`.
    pub body: BodyId,
    /// The side that received `-j n`.
    pub partner: ContactPartner,
    /// Impulse scalar `j` (always positive).
    pub magnitude: f64,
    /// World-space application point.
    pub point: Point2<f64>,
    /// The contact normal the impulse acted along.
    pub normal: Vector2<f64>,
}

/// Resolves batches of simultaneous colliding contacts.
#[derive(Debug, Clone, Copy)]
pub struct ImpulseResolver {
    elasticity: f64,
}

impl ImpulseResolver {
    /// Create a resolver with the given coefficient of restitution.
    #[must_use]
    pub fn new(elasticity: f64) -> Self {
        Self { elasticity }
    }

    /// The coefficient of restitution in use.
    #[must_use]
    pub fn elasticity(&self) -> f64 {
        self.elasticity
    }

    /// Resolve a batch of simultaneous colliding contacts, mutating body
    /// velocities in place.
    ///
    /// Matched same-pair contacts go through the merged two-point path;
    /// everything else is resolved independently in input order. Returns the
    /// impulses actually applied (separating contacts apply none).
    pub fn resolve(&self, bodies: &mut [RigidBody], contacts: &[Contact]) -> Vec<AppliedImpulse> {
        let mut handled = vec![false; contacts.len()];
        let mut applied = Vec::new();

        // Merged two-point pass: pair up same ordered-pair contacts first.
        for i in 0..contacts.len() {
            if handled[i] {
                continue;
            }
            for j in (i + 1)..contacts.len() {
                if handled[j] || !contacts[i].same_ordered_pair(&contacts[j]) {
                    continue;
                }
                if let Some(merged) = merge_pair(&contacts[i], &contacts[j], bodies) {
                    handled[i] = true;
                    handled[j] = true;
                    if let Some(impulse) = self.apply(bodies, &merged) {
                        applied.push(impulse);
                    }
                }
                break;
            }
        }

        // Independent pass for everything unmatched.
        for (i, contact) in contacts.iter().enumerate() {
            if handled[i] {
                continue;
            }
            if let Some(impulse) = self.apply(bodies, contact) {
                applied.push(impulse);
            }
        }

        applied
    }

    /// Apply one impulse for one contact. Returns `None` for separating,
    /// degenerate, or fully-immovable configurations.
    fn apply(&self, bodies: &mut [RigidBody], contact: &Contact) -> Option<AppliedImpulse> {
        let ia = contact.body.index();
        let a = *bodies.get(ia)?;

        let partner = match contact.partner {
            ContactPartner::Body(id) => {
                let ib = id.index();
                Some((ib, *bodies.get(ib)?))
            }
            ContactPartner::Wall(_) => None,
        };

        let n = contact.normal;
        let partner_velocity = partner
            .map(|(_, b)| b.point_velocity(contact.r2))
            .unwrap_or_else(Vector2::zeros);
        let approach = (a.point_velocity(contact.r) - partner_velocity).dot(&n);
        if approach >= 0.0 {
            debug!(body = %contact.body, "skipping separating contact");
            return None;
        }

        let cross_a = contact.r.perp(&n);
        let cross_b = contact.r2.perp(&n);
        let mut denom = a.inv_mass() + cross_a * cross_a * a.inv_moment_about_cm();
        if let Some((_, b)) = partner {
            denom += b.inv_mass() + cross_b * cross_b * b.inv_moment_about_cm();
        }
        if denom <= 0.0 {
            // Both sides immovable; nothing to push.
            return None;
        }

        let j = -(1.0 + self.elasticity) * approach / denom;

        bodies[ia].velocity += j * n * a.inv_mass();
        bodies[ia].angular_velocity += j * cross_a * a.inv_moment_about_cm();
        if let Some((ib, b)) = partner {
            bodies[ib].velocity -= j * n * b.inv_mass();
            bodies[ib].angular_velocity -= j * cross_b * b.inv_moment_about_cm();
        }

        Some(AppliedImpulse {
            body: contact.body,
            partner: contact.partner,
            magnitude: j,
            point: contact.point,
            normal: n,
        })
    }
}

/// Synthesize the merged contact for two simultaneous contacts on the same
/// ordered pair: midpoint impact, normal perpendicular to the segment
/// joining the two points, oriented away from the supporting partner.
fn merge_pair(a: &Contact, b: &Contact, bodies: &[RigidBody]) -> Option<Contact> {
    let segment = b.point - a.point;
    if segment.norm() < MIN_MERGE_SEPARATION {
        // Coincident points should have been de-duplicated upstream; let
        // the independent path handle them.
        return None;
    }

    let mut normal = Vector2::new(-segment.y, segment.x);
    if normal.dot(&(a.normal + b.normal)) < 0.0 {
        normal = -normal;
    }

    let midpoint = Point2::from((a.point.coords + b.point.coords) / 2.0);
    let body = bodies.get(a.body.index())?;
    let r = midpoint - body.position;
    let r2 = match a.partner {
        ContactPartner::Body(id) => midpoint - bodies.get(id.index())?.position,
        ContactPartner::Wall(_) => Vector2::zeros(),
    };

    Contact::new(
        a.body,
        a.partner,
        a.corner,
        normal,
        midpoint,
        r,
        r2,
        a.depth.max(b.depth),
        ContactKind::Colliding,
    )
}
