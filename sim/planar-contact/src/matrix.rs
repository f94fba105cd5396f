//! Assembly of the resting-contact linear system `a = A f + b`.
//!
//! `A[i][j]` is the separation acceleration induced at contact `i` by a unit
//! normal force at contact `j`. A unit force `n_j` at offset `r` on a body
//! produces center-of-mass acceleration `n_j invM` and angular acceleration
//! `(r x n_j) invI`; projecting the resulting contact-point acceleration
//! through contact `i`'s normal gives the coefficient. Up to four terms
//! accumulate per entry, one for each way contact `i`'s body or partner can
//! coincide with contact `j`'s body or partner. Walls have zero inverse mass
//! and moment and contribute nothing.
//!
//! `b[i]` is the force-independent part: the externally computed free
//! accelerations projected through the same geometry, plus the term from the
//! contact normal rotating with the partner body,
//! `2 w_partner (-n_y, n_x) . (v_rel)`.

use nalgebra::{DMatrix, DVector, Vector2};

use planar_types::{BodyAccel, BodyId, Contact, ContactPartner, RigidBody};

/// Build the n-by-n force-to-acceleration matrix for a resting contact set.
///
/// The entry accumulation is exhaustive over the four body-coincidence
/// cases; contacts are coupled only through shared movable bodies.
#[must_use]
pub fn build_a_matrix(contacts: &[Contact], bodies: &[RigidBody]) -> DMatrix<f64> {
    DMatrix::from_fn(contacts.len(), contacts.len(), |i, j| {
        entry(&contacts[i], &contacts[j], bodies)
    })
}

/// One A-matrix entry: acceleration at contact `i` per unit force at `j`.
fn entry(ci: &Contact, cj: &Contact, bodies: &[RigidBody]) -> f64 {
    let mut a = 0.0;

    // Contact j pushes +n_j at cj.r on its body, and -n_j at cj.r2 on its
    // partner. Contact i's separation accelerates as
    // n_i . (accel of its body's point - accel of its partner's point).
    if ci.body == cj.body {
        a += coupling(body(bodies, ci.body), ci.r, cj.r, ci.normal, cj.normal);
    }
    if cj.partner == ContactPartner::Body(ci.body) {
        a -= coupling(body(bodies, ci.body), ci.r, cj.r2, ci.normal, cj.normal);
    }
    if let ContactPartner::Body(p) = ci.partner {
        if p == cj.body {
            a -= coupling(body(bodies, p), ci.r2, cj.r, ci.normal, cj.normal);
        }
        if cj.partner == ContactPartner::Body(p) {
            a += coupling(body(bodies, p), ci.r2, cj.r2, ci.normal, cj.normal);
        }
    }

    a
}

/// Acceleration at a point offset `r_i` on `body`, per unit force `n_j`
/// applied at offset `r_j` on the same body, projected onto `n_i`.
fn coupling(
    body: Option<&RigidBody>,
    r_i: Vector2<f64>,
    r_j: Vector2<f64>,
    n_i: Vector2<f64>,
    n_j: Vector2<f64>,
) -> f64 {
    let Some(body) = body else { return 0.0 };
    let linear = n_j * body.inv_mass();
    let alpha = r_j.perp(&n_j) * body.inv_moment_about_cm();
    let point_accel = linear + alpha * Vector2::new(-r_i.y, r_i.x);
    n_i.dot(&point_accel)
}

fn body(bodies: &[RigidBody], id: BodyId) -> Option<&RigidBody> {
    bodies.get(id.index())
}

/// Build the force-independent acceleration vector for a resting contact set.
///
/// `change` holds each body's free accelerations (gravity, thrust, damping)
/// for this substep, indexed parallel to `bodies`.
#[must_use]
pub fn build_b_vector(
    contacts: &[Contact],
    bodies: &[RigidBody],
    change: &[BodyAccel],
) -> DVector<f64> {
    DVector::from_fn(contacts.len(), |i, _| {
        let c = &contacts[i];
        let n = c.normal;

        let Some(obj) = body(bodies, c.body) else {
            return 0.0;
        };
        let obj_accel = change
            .get(c.body.index())
            .map(|a| a.point_accel(c.r))
            .unwrap_or_else(Vector2::zeros);
        let obj_velocity = obj.point_velocity(c.r);

        let (partner_accel, partner_velocity, partner_omega) = match c.partner {
            ContactPartner::Wall(_) => (Vector2::zeros(), Vector2::zeros(), 0.0),
            ContactPartner::Body(id) => {
                let Some(p) = body(bodies, id) else {
                    return 0.0;
                };
                let accel = change
                    .get(id.index())
                    .map(|a| a.point_accel(c.r2))
                    .unwrap_or_else(Vector2::zeros);
                (accel, p.point_velocity(c.r2), p.angular_velocity)
            }
        };

        // The normal is attached to the partner, so it rotates at the
        // partner's angular velocity: n-dot = w (-n_y, n_x).
        let normal_rate = 2.0 * partner_omega * Vector2::new(-n.y, n.x);

        n.dot(&(obj_accel - partner_accel)) + normal_rate.dot(&(obj_velocity - partner_velocity))
    })
}
