//! The resting contact-force solver.
//!
//! Given `n` simultaneous resting contacts, solves for forces `f >= 0` such
//! that the contact accelerations `a = A f + b` satisfy `a >= 0` and the
//! complementarity law `f_i a_i = 0`: at every contact, either the bodies
//! push on each other or they are free to separate, never both.
//!
//! # Algorithm
//!
//! Dantzig-style incremental pivoting (after Baraff, "Fast contact force
//! computation for nonpenetrating rigid bodies"). Contacts are brought into
//! the solution one at a time, in input order; each new contact `d` with
//! negative acceleration is driven to zero by `drive_to_zero`:
//!
//! 1. `fdirection` picks a force increment with `df[d] = 1`, zero at every
//!    separating contact, and values at the clamped set `C` chosen so the
//!    clamped accelerations stay pinned at zero (an `A_CC` sub-solve).
//! 2. `max_step` finds the largest step along `(df, da)` that drives `a[d]`
//!    toward zero without sending any clamped force or separating
//!    acceleration negative, and reports which constraint binds.
//! 3. The binding contact migrates between the clamped set `C` and the
//!    separating set `NC`, and the loop repeats until `a[d]` reaches zero.
//!
//! Because earlier contacts' constraints are maintained (never revisited)
//! as later contacts enter, different input orderings may produce
//! different but equally valid force vectors. The ordering dependence is
//! part of the contract.
//!
//! The working sets are plain local boolean vectors rebuilt on every solve;
//! nothing persists between calls.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use planar_types::{
    AppliedForce, BodyAccel, Contact, ContactPartner, RigidBody, SimConfig, SolverError,
};

use crate::matrix::{build_a_matrix, build_b_vector};

/// Inner-loop bound for `drive_to_zero`. Exceeding it is a solver failure.
const MAX_DRIVE_ITERATIONS: usize = 200;

/// Negative values larger than this are floating-point residue and are
/// clamped to exactly zero after each pivot step.
const RESIDUE_TOL: f64 = 1e-10;

/// Tolerance for the post-solve sign invariant check.
const SIGN_TOL: f64 = 1e-8;

/// A solved resting-contact force set.
#[derive(Debug, Clone)]
pub struct ForceSolution {
    /// Non-negative contact force magnitudes, one per input contact.
    pub forces: DVector<f64>,
    /// Resulting contact accelerations `A f + b`, all non-negative.
    pub accelerations: DVector<f64>,
}

impl ForceSolution {
    fn empty() -> Self {
        Self {
            forces: DVector::zeros(0),
            accelerations: DVector::zeros(0),
        }
    }
}

/// Computes and applies resting contact forces.
///
/// The solver reads a captured body snapshot and the free-acceleration
/// slice; it never mutates body state. All scratch state is local to one
/// [`solve`](ContactForceSolver::solve) call.
#[derive(Debug, Clone, Copy)]
pub struct ContactForceSolver {
    distance_tol: f64,
}

impl ContactForceSolver {
    /// Create a solver with the configuration's distance tolerance.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            distance_tol: config.distance_tol,
        }
    }

    /// Solve for the contact forces of a resting contact set.
    ///
    /// `change` holds the free accelerations (gravity, thrust, damping)
    /// computed for this substep, indexed parallel to `bodies`.
    ///
    /// # Errors
    ///
    /// - [`SolverError::PenetratingContact`] if a contact is interpenetrating
    ///   beyond the distance tolerance: the caller accepted a step it should
    ///   have bisected. Loud by design.
    /// - [`SolverError::NonConvergence`], [`SolverError::UnboundedStep`],
    ///   [`SolverError::SingularSystem`], [`SolverError::SignViolation`] for
    ///   numerical failures; the caller should drop contact forces for this
    ///   substep.
    pub fn solve(
        &self,
        contacts: &[Contact],
        bodies: &[RigidBody],
        change: &[BodyAccel],
    ) -> Result<ForceSolution, SolverError> {
        if contacts.is_empty() {
            return Ok(ForceSolution::empty());
        }

        for (i, contact) in contacts.iter().enumerate() {
            if contact.depth > self.distance_tol {
                return Err(SolverError::PenetratingContact {
                    contact: i,
                    body: contact.body,
                    partner: contact.partner,
                    depth: contact.depth,
                });
            }
        }

        let a_matrix = build_a_matrix(contacts, bodies);
        let b = build_b_vector(contacts, bodies, change);
        let forces = compute_forces(&a_matrix, &b)?;
        let accelerations = &a_matrix * &forces + &b;

        check_signs(&forces, &accelerations)?;

        Ok(ForceSolution {
            forces,
            accelerations,
        })
    }

    /// Fold a force solution into the acceleration slice the integrator
    /// consumes, returning the per-contact force records for the debug
    /// overlay.
    ///
    /// Each contact's force pushes its body along `+n` and its partner
    /// along `-n`; immovable partners (walls, infinite mass) are unmoved
    /// through their zero inverses.
    pub fn apply_forces(
        &self,
        contacts: &[Contact],
        bodies: &[RigidBody],
        solution: &ForceSolution,
        change: &mut [BodyAccel],
    ) -> Vec<AppliedForce> {
        let mut applied = Vec::new();

        for (i, contact) in contacts.iter().enumerate() {
            let f = solution.forces[i];
            if f == 0.0 {
                continue;
            }
            let n = contact.normal;

            if let (Some(body), Some(accel)) = (
                bodies.get(contact.body.index()),
                change.get_mut(contact.body.index()),
            ) {
                accel.linear += f * n * body.inv_mass();
                accel.angular += f * contact.r.perp(&n) * body.inv_moment_about_cm();
            }

            if let ContactPartner::Body(id) = contact.partner {
                if let (Some(partner), Some(accel)) =
                    (bodies.get(id.index()), change.get_mut(id.index()))
                {
                    accel.linear -= f * n * partner.inv_mass();
                    accel.angular -= f * contact.r2.perp(&n) * partner.inv_moment_about_cm();
                }
            }

            applied.push(AppliedForce {
                body: contact.body,
                point: contact.point,
                force: f * n,
            });
        }

        applied
    }
}

/// Solve the LCP `a = A f + b, f >= 0, a >= 0, f.a = 0` by incremental
/// pivoting.
///
/// Exposed for property tests and benchmarks; [`ContactForceSolver::solve`]
/// is the full pipeline with consistency and sign checking.
///
/// # Errors
///
/// See [`ContactForceSolver::solve`].
pub fn compute_forces(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, SolverError> {
    let n = b.len();
    let mut f = DVector::zeros(n);
    let mut accel = b.clone();
    // Working sets: clamped (force-bearing, acceleration pinned to zero)
    // and separating (force pinned to zero). Contacts past `d` are in
    // neither until their turn comes.
    let mut clamped = vec![false; n];
    let mut separating = vec![false; n];

    for d in 0..n {
        if accel[d] >= -RESIDUE_TOL {
            accel[d] = accel[d].max(0.0);
            separating[d] = true;
            continue;
        }
        drive_to_zero(d, a, &mut f, &mut accel, &mut clamped, &mut separating)?;
    }

    Ok(f)
}

/// Increase the force at contact `d` until its acceleration reaches zero,
/// maintaining every earlier contact's constraints along the way.
fn drive_to_zero(
    d: usize,
    a: &DMatrix<f64>,
    f: &mut DVector<f64>,
    accel: &mut DVector<f64>,
    clamped: &mut [bool],
    separating: &mut [bool],
) -> Result<(), SolverError> {
    for _ in 0..MAX_DRIVE_ITERATIONS {
        let delta_f = fdirection(d, a, clamped)?;
        let delta_a = a * &delta_f;

        let (step, binding) = max_step(d, f, accel, &delta_f, &delta_a, clamped, separating);
        if !step.is_finite() || step < 0.0 {
            return Err(SolverError::UnboundedStep { contact: d });
        }

        f.axpy(step, &delta_f, 1.0);
        accel.axpy(step, &delta_a, 1.0);
        clamp_residue(f);
        clamp_residue(accel);

        if binding == d {
            clamped[d] = true;
            separating[d] = false;
            return Ok(());
        }
        if clamped[binding] {
            // Its force hit zero: release it to the separating set.
            clamped[binding] = false;
            separating[binding] = true;
        } else {
            // Its acceleration hit zero: it now bears force.
            separating[binding] = false;
            clamped[binding] = true;
        }
    }

    debug!(contact = d, "drive_to_zero exhausted its iteration bound");
    Err(SolverError::NonConvergence {
        contact: d,
        iterations: MAX_DRIVE_ITERATIONS,
    })
}

/// Compute the force direction for driving contact `d`: unit increment at
/// `d`, zero at separating contacts, and values at the clamped set chosen
/// so clamped accelerations stay at zero (`A_CC df_C = -A_Cd`).
fn fdirection(d: usize, a: &DMatrix<f64>, clamped: &[bool]) -> Result<DVector<f64>, SolverError> {
    let n = clamped.len();
    let mut delta_f = DVector::zeros(n);
    delta_f[d] = 1.0;

    let members: Vec<usize> = (0..n).filter(|&i| clamped[i]).collect();
    if members.is_empty() {
        return Ok(delta_f);
    }

    let k = members.len();
    let a_cc = DMatrix::from_fn(k, k, |r, c| a[(members[r], members[c])]);
    let rhs = DVector::from_fn(k, |r, _| -a[(members[r], d)]);

    let solution = a_cc
        .lu()
        .solve(&rhs)
        .ok_or(SolverError::SingularSystem { contact: d })?;

    for (slot, &i) in members.iter().enumerate() {
        delta_f[i] = solution[slot];
    }
    Ok(delta_f)
}

/// The largest non-negative step along `(delta_f, delta_a)` that violates no
/// constraint, and the index of the constraint that binds:
///
/// - contact `d`'s own acceleration must not overshoot past zero,
/// - no clamped contact's force may go negative,
/// - no separating contact's acceleration may go negative.
fn max_step(
    d: usize,
    f: &DVector<f64>,
    accel: &DVector<f64>,
    delta_f: &DVector<f64>,
    delta_a: &DVector<f64>,
    clamped: &[bool],
    separating: &[bool],
) -> (f64, usize) {
    let mut step = f64::INFINITY;
    let mut binding = d;

    if delta_a[d] > 0.0 {
        step = -accel[d] / delta_a[d];
    }

    for i in 0..f.len() {
        if clamped[i] && delta_f[i] < 0.0 {
            let bound = -f[i] / delta_f[i];
            if bound < step {
                step = bound;
                binding = i;
            }
        } else if separating[i] && delta_a[i] < 0.0 {
            let bound = -accel[i] / delta_a[i];
            if bound < step {
                step = bound;
                binding = i;
            }
        }
    }

    (step, binding)
}

/// Zero out tiny negative floating-point residues in place.
fn clamp_residue(v: &mut DVector<f64>) {
    for x in v.iter_mut() {
        if *x < 0.0 && *x > -RESIDUE_TOL {
            *x = 0.0;
        }
    }
}

/// Post-solve sign invariants: forces and accelerations non-negative.
fn check_signs(f: &DVector<f64>, accel: &DVector<f64>) -> Result<(), SolverError> {
    for i in 0..f.len() {
        if f[i] < -SIGN_TOL {
            return Err(SolverError::sign_violation(format!(
                "negative force {} at contact {i}",
                f[i]
            )));
        }
        if accel[i] < -SIGN_TOL {
            return Err(SolverError::sign_violation(format!(
                "negative acceleration {} at contact {i}",
                accel[i]
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point2, Vector2};
    use planar_types::{BodyId, ContactKind, WallSide};

    fn assert_complementarity(a: &DMatrix<f64>, b: &DVector<f64>, f: &DVector<f64>) {
        let accel = a * f + b;
        for i in 0..f.len() {
            assert!(f[i] >= -1e-8, "negative force at {i}: {}", f[i]);
            assert!(accel[i] >= -1e-8, "negative acceleration at {i}: {}", accel[i]);
            assert!(
                (f[i] * accel[i]).abs() <= 1e-6,
                "complementarity broken at {i}: f={} a={}",
                f[i],
                accel[i]
            );
        }
    }

    #[test]
    fn test_single_contact() {
        let a = DMatrix::from_element(1, 1, 2.0);
        let b = DVector::from_element(1, -10.0);

        let f = compute_forces(&a, &b).unwrap();

        assert_relative_eq!(f[0], 5.0, epsilon = 1e-12);
        assert_complementarity(&a, &b, &f);
    }

    #[test]
    fn test_already_separating_contact_gets_no_force() {
        let a = DMatrix::from_element(1, 1, 2.0);
        let b = DVector::from_element(1, 3.0);

        let f = compute_forces(&a, &b).unwrap();
        assert_eq!(f[0], 0.0);
    }

    #[test]
    fn test_symmetric_two_contact_equilibrium() {
        // The 1x3 block on the floor: A = [[3.7, -1.7], [-1.7, 3.7]],
        // b = (-10, -10). Forces split evenly and sum to m g.
        let a = DMatrix::from_row_slice(2, 2, &[3.7, -1.7, -1.7, 3.7]);
        let b = DVector::from_element(2, -10.0);

        let f = compute_forces(&a, &b).unwrap();

        assert_relative_eq!(f[0], 5.0, epsilon = 1e-9);
        assert_relative_eq!(f[1], 5.0, epsilon = 1e-9);
        assert_complementarity(&a, &b, &f);
    }

    #[test]
    fn test_one_pushed_one_separating() {
        // Strong coupling: driving contact 0 lifts contact 1 clear.
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.5, 1.0]);
        let b = DVector::from_row_slice(&[-4.0, -1.0]);

        let f = compute_forces(&a, &b).unwrap();

        assert_complementarity(&a, &b, &f);
        // Contact 1's acceleration ends positive, so its force must be zero
        let accel = &a * &f + &b;
        assert!(accel[1] > 0.0);
        assert_eq!(f[1], 0.0);
    }

    #[test]
    fn test_three_contact_chain() {
        let a = DMatrix::from_row_slice(
            3,
            3,
            &[2.0, -0.5, 0.0, -0.5, 2.0, -0.5, 0.0, -0.5, 2.0],
        );
        let b = DVector::from_row_slice(&[-1.0, -2.0, -3.0]);

        let f = compute_forces(&a, &b).unwrap();
        assert_complementarity(&a, &b, &f);
    }

    #[test]
    fn test_pathological_matrix_is_recoverable() {
        // Indefinite matrix with contradictory coupling: no finite step can
        // drive contact 1 to zero. Must error, not panic or loop forever.
        let a = DMatrix::from_row_slice(2, 2, &[1.0, -2.0, -2.0, 1.0]);
        let b = DVector::from_row_slice(&[-1.0, -1.0]);

        let err = compute_forces(&a, &b).unwrap_err();
        assert!(matches!(
            err,
            SolverError::UnboundedStep { .. }
                | SolverError::NonConvergence { .. }
                | SolverError::SingularSystem { .. }
        ));
    }

    #[test]
    fn test_zero_matrix_unbounded() {
        let a = DMatrix::zeros(1, 1);
        let b = DVector::from_element(1, -1.0);

        let err = compute_forces(&a, &b).unwrap_err();
        assert_eq!(err, SolverError::UnboundedStep { contact: 0 });
    }

    #[test]
    fn test_solve_rejects_penetrating_contact() {
        let body = RigidBody::new(1.0, 1.0, 1.0).at_position(Point2::new(0.0, 0.3));
        let point = Point2::new(0.0, -0.2);
        let contact = Contact::new(
            BodyId::new(0),
            ContactPartner::Wall(WallSide::Bottom),
            0,
            Vector2::new(0.0, 1.0),
            point,
            point - body.position,
            Vector2::zeros(),
            0.2,
            ContactKind::Resting,
        )
        .unwrap();
        let solver = ContactForceSolver::new(&SimConfig::default());

        let err = solver
            .solve(&[contact], &[body], &[BodyAccel::zero()])
            .unwrap_err();
        assert!(err.is_consistency_violation());
    }

    #[test]
    fn test_solve_and_apply_block_equilibrium() {
        // The flagship scenario: a 1x3 unit-mass block flat on the floor
        // under gravity 10. Total vertical force m g, split evenly, and the
        // resulting net vertical acceleration is zero.
        let body = RigidBody::new(1.0, 3.0, 1.0).at_position(Point2::new(0.0, 0.5));
        let contacts: Vec<Contact> = [-1.5, 1.5]
            .into_iter()
            .map(|x| {
                let point = Point2::new(x, 0.0);
                Contact::new(
                    BodyId::new(0),
                    ContactPartner::Wall(WallSide::Bottom),
                    0,
                    Vector2::new(0.0, 1.0),
                    point,
                    point - body.position,
                    Vector2::zeros(),
                    0.0,
                    ContactKind::Resting,
                )
                .unwrap()
            })
            .collect();
        let bodies = vec![body];
        let mut change = vec![BodyAccel::new(Vector2::new(0.0, -10.0), 0.0)];
        let solver = ContactForceSolver::new(&SimConfig::default());

        let solution = solver.solve(&contacts, &bodies, &change).unwrap();

        let total: f64 = solution.forces.iter().sum();
        assert_relative_eq!(total, 10.0, epsilon = 1e-9);
        assert!(solution.forces.iter().all(|&f| f >= 0.0));
        assert_relative_eq!(solution.forces[0], solution.forces[1], epsilon = 1e-9);

        let applied = solver.apply_forces(&contacts, &bodies, &solution, &mut change);

        assert_eq!(applied.len(), 2);
        assert_relative_eq!(change[0].linear.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(change[0].angular, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_solver_error_leaves_change_untouched() {
        // On failure nothing is applied: the caller's accelerations keep
        // their free-fall values.
        let a = DMatrix::from_row_slice(2, 2, &[1.0, -2.0, -2.0, 1.0]);
        let b = DVector::from_row_slice(&[-1.0, -1.0]);
        assert!(compute_forces(&a, &b).is_err());
        // compute_forces takes immutable refs only; there is no body or
        // acceleration state for it to corrupt by construction.
    }

    #[test]
    fn test_ordering_dependence_is_tolerated() {
        // Reversing contact order may change the pivot path but both
        // solutions must satisfy the complementarity conditions.
        let a1 = DMatrix::from_row_slice(2, 2, &[3.7, -1.7, -1.7, 3.7]);
        let b1 = DVector::from_row_slice(&[-10.0, -4.0]);
        let a2 = DMatrix::from_row_slice(2, 2, &[3.7, -1.7, -1.7, 3.7]);
        let b2 = DVector::from_row_slice(&[-4.0, -10.0]);

        let f1 = compute_forces(&a1, &b1).unwrap();
        let f2 = compute_forces(&a2, &b2).unwrap();

        assert_complementarity(&a1, &b1, &f1);
        assert_complementarity(&a2, &b2, &f2);
    }
}
