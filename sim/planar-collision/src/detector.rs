//! Corner-versus-edge contact scans.

use nalgebra::{Point2, Vector2};
use tracing::debug;

use planar_types::{
    BodyId, Boundary, Contact, ContactKind, ContactPartner, RigidBody, SimConfig, WallSide,
};

/// Scans body corners against walls and other bodies' edges.
///
/// The detector holds only its tolerances; every scan builds its output from
/// scratch, so a detector can be shared freely across steps.
#[derive(Debug, Clone, Copy)]
pub struct CollisionDetector {
    distance_tol: f64,
    velocity_tol: f64,
}

/// A corner-inside-body classification, in world coordinates.
struct EdgeHit {
    normal: Vector2<f64>,
    depth: f64,
}

impl CollisionDetector {
    /// Create a detector with the configuration's tolerances.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            distance_tol: config.distance_tol,
            velocity_tol: config.velocity_tol,
        }
    }

    /// Create a detector with explicit tolerances.
    #[must_use]
    pub fn with_tolerances(distance_tol: f64, velocity_tol: f64) -> Self {
        Self {
            distance_tol,
            velocity_tol,
        }
    }

    /// The distance tolerance in use.
    #[must_use]
    pub fn distance_tol(&self) -> f64 {
        self.distance_tol
    }

    /// Scan for interpenetrating contacts (`kind == Colliding`).
    ///
    /// Every corner is tested against the four walls and every other body's
    /// edges; when a corner overlaps more than one candidate, the
    /// maximum-depth candidate wins, so a single corner is never reported
    /// against two edges at once. The result is de-duplicated: contacts on
    /// the same pair with impact points within the distance tolerance
    /// collapse to the deeper one.
    #[must_use]
    pub fn detect_collisions(&self, bodies: &[RigidBody], boundary: &Boundary) -> Vec<Contact> {
        let mut contacts = Vec::new();

        for (i, body) in bodies.iter().enumerate() {
            if !body.is_finite() {
                debug!(body = i, "skipping body with non-finite state");
                continue;
            }
            let id = BodyId::new(i as u64);

            for (ci, corner) in body.corners().into_iter().enumerate() {
                let mut best: Option<Contact> = None;

                for side in WallSide::ALL {
                    let depth = boundary.penetration(side, corner);
                    if depth <= 0.0 {
                        continue;
                    }
                    let candidate = Contact::new(
                        id,
                        ContactPartner::Wall(side),
                        ci,
                        side.normal(),
                        corner,
                        corner - body.position,
                        Vector2::zeros(),
                        depth,
                        ContactKind::Colliding,
                    );
                    keep_deeper(&mut best, candidate);
                }

                for (j, other) in bodies.iter().enumerate() {
                    if j == i || !other.is_finite() {
                        continue;
                    }
                    let Some(hit) = corner_inside(corner, other) else {
                        continue;
                    };
                    let candidate = Contact::new(
                        id,
                        ContactPartner::Body(BodyId::new(j as u64)),
                        ci,
                        hit.normal,
                        corner,
                        corner - body.position,
                        corner - other.position,
                        hit.depth,
                        ContactKind::Colliding,
                    );
                    keep_deeper(&mut best, candidate);
                }

                if let Some(contact) = best {
                    contacts.push(contact);
                }
            }
        }

        self.dedup(contacts)
    }

    /// Scan for resting contacts (`kind == Resting`).
    ///
    /// A corner rests on an edge or wall when its signed separation is within
    /// the distance tolerance of zero and the normal component of the
    /// relative point velocity is within the velocity tolerance of zero.
    /// A corner wedged into the arena's corner may legitimately rest on two
    /// walls at once.
    #[must_use]
    pub fn detect_resting(&self, bodies: &[RigidBody], boundary: &Boundary) -> Vec<Contact> {
        let mut contacts = Vec::new();

        for (i, body) in bodies.iter().enumerate() {
            if !body.is_finite() || !body.is_movable() {
                continue;
            }
            let id = BodyId::new(i as u64);

            for (ci, corner) in body.corners().into_iter().enumerate() {
                let r = corner - body.position;

                for side in WallSide::ALL {
                    let depth = boundary.penetration(side, corner);
                    if depth.abs() > self.distance_tol {
                        continue;
                    }
                    let normal = side.normal();
                    let approach = normal.dot(&body.point_velocity(r));
                    if approach.abs() > self.velocity_tol {
                        continue;
                    }
                    if let Some(contact) = Contact::new(
                        id,
                        ContactPartner::Wall(side),
                        ci,
                        normal,
                        corner,
                        r,
                        Vector2::zeros(),
                        depth,
                        ContactKind::Resting,
                    ) {
                        contacts.push(contact);
                    }
                }

                for (j, other) in bodies.iter().enumerate() {
                    if j == i || !other.is_finite() {
                        continue;
                    }
                    let Some(hit) = corner_near_edge(corner, other, self.distance_tol) else {
                        continue;
                    };
                    let r2 = corner - other.position;
                    let relative = body.point_velocity(r) - other.point_velocity(r2);
                    if hit.normal.dot(&relative).abs() > self.velocity_tol {
                        continue;
                    }
                    if let Some(contact) = Contact::new(
                        id,
                        ContactPartner::Body(BodyId::new(j as u64)),
                        ci,
                        hit.normal,
                        corner,
                        r,
                        r2,
                        hit.depth,
                        ContactKind::Resting,
                    ) {
                        contacts.push(contact);
                    }
                }
            }
        }

        self.dedup(contacts)
    }

    /// Collapse near-duplicate contacts.
    ///
    /// Two contacts naming the same (body, partner) pair whose impact points
    /// lie within the distance tolerance are one physical contact reported
    /// twice; the one closer to interpenetrating (larger depth) survives.
    #[must_use]
    pub fn dedup(&self, contacts: Vec<Contact>) -> Vec<Contact> {
        let mut keep = vec![true; contacts.len()];

        for i in 0..contacts.len() {
            if !keep[i] {
                continue;
            }
            for j in (i + 1)..contacts.len() {
                if !keep[j] || !contacts[i].same_pair(&contacts[j]) {
                    continue;
                }
                let gap = (contacts[i].point - contacts[j].point).norm();
                if gap > self.distance_tol {
                    continue;
                }
                if contacts[i].depth >= contacts[j].depth {
                    keep[j] = false;
                } else {
                    keep[i] = false;
                    break;
                }
            }
        }

        contacts
            .into_iter()
            .zip(keep)
            .filter_map(|(c, k)| k.then_some(c))
            .collect()
    }
}

/// Apply the max-depth-wins rule for one corner's candidates.
fn keep_deeper(best: &mut Option<Contact>, candidate: Option<Contact>) {
    let Some(candidate) = candidate else { return };
    match best {
        Some(current) if current.depth >= candidate.depth => {}
        _ => *best = Some(candidate),
    }
}

/// Classify a world point strictly inside `other`, returning the world
/// normal of the nearest edge and the penetration depth past it.
fn corner_inside(p: Point2<f64>, other: &RigidBody) -> Option<EdgeHit> {
    let local = other.world_to_local(p);
    let hw = other.width() / 2.0;
    let hh = other.height() / 2.0;

    // Distance inward from each edge plane; all positive means inside.
    let from_right = hw - local.x;
    let from_left = local.x + hw;
    let from_top = hh - local.y;
    let from_bottom = local.y + hh;

    if from_right <= 0.0 || from_left <= 0.0 || from_top <= 0.0 || from_bottom <= 0.0 {
        return None;
    }

    let (depth, local_normal) = nearest_edge(from_right, from_left, from_top, from_bottom);
    Some(EdgeHit {
        normal: other.rotation() * local_normal,
        depth,
    })
}

/// Classify a world point near one of `other`'s edges (inside or outside by
/// at most `tol`, and within the edge's span).
fn corner_near_edge(p: Point2<f64>, other: &RigidBody, tol: f64) -> Option<EdgeHit> {
    let local = other.world_to_local(p);
    let hw = other.width() / 2.0;
    let hh = other.height() / 2.0;

    let from_right = hw - local.x;
    let from_left = local.x + hw;
    let from_top = hh - local.y;
    let from_bottom = local.y + hh;

    // Tangential margin inside the edge's span; ties between two edges of a
    // shared corner break toward the edge the point is more interior to.
    let x_margin = hw - local.x.abs();
    let y_margin = hh - local.y.abs();

    let mut best: Option<(f64, f64, Vector2<f64>)> = None;
    let mut consider = |signed_depth: f64, margin: f64, local_normal: Vector2<f64>| {
        if margin < -tol || signed_depth.abs() > tol {
            return;
        }
        match best {
            Some((m, _, _)) if m >= margin => {}
            _ => best = Some((margin, signed_depth, local_normal)),
        }
    };

    consider(from_right, y_margin, Vector2::new(1.0, 0.0));
    consider(from_left, y_margin, Vector2::new(-1.0, 0.0));
    consider(from_top, x_margin, Vector2::new(0.0, 1.0));
    consider(from_bottom, x_margin, Vector2::new(0.0, -1.0));

    best.map(|(_, depth, local_normal)| EdgeHit {
        normal: other.rotation() * local_normal,
        depth,
    })
}

/// Pick the edge the point is closest to, with its outward local normal.
fn nearest_edge(
    from_right: f64,
    from_left: f64,
    from_top: f64,
    from_bottom: f64,
) -> (f64, Vector2<f64>) {
    let mut depth = from_right;
    let mut normal = Vector2::new(1.0, 0.0);
    if from_left < depth {
        depth = from_left;
        normal = Vector2::new(-1.0, 0.0);
    }
    if from_top < depth {
        depth = from_top;
        normal = Vector2::new(0.0, 1.0);
    }
    if from_bottom < depth {
        depth = from_bottom;
        normal = Vector2::new(0.0, -1.0);
    }
    (depth, normal)
}
