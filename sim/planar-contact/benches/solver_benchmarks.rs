//! Benchmarks for resting-contact force solving.
//!
//! Run with: cargo bench -p planar-contact

#![allow(missing_docs, clippy::wildcard_imports)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::{Point2, Vector2};

use planar_contact::{build_a_matrix, build_b_vector, compute_forces};
use planar_types::{BodyAccel, BodyId, Contact, ContactKind, ContactPartner, RigidBody, WallSide};

/// A stack of boxes on the floor: box 0 rests on the floor, box k rests on
/// box k-1. Every box contributes two resting corner contacts.
fn build_stack(boxes: usize) -> (Vec<RigidBody>, Vec<Contact>, Vec<BodyAccel>) {
    let mut bodies = Vec::with_capacity(boxes);
    let mut contacts = Vec::with_capacity(boxes * 2);

    for k in 0..boxes {
        let body =
            RigidBody::new(1.0, 2.0, 1.0).at_position(Point2::new(0.0, 0.5 + k as f64));
        bodies.push(body);

        for x in [-1.0, 1.0] {
            let point = Point2::new(x, k as f64);
            let partner = if k == 0 {
                ContactPartner::Wall(WallSide::Bottom)
            } else {
                ContactPartner::Body(BodyId::new(k as u64 - 1))
            };
            let r2 = if k == 0 {
                Vector2::zeros()
            } else {
                point - bodies[k - 1].position
            };
            let contact = Contact::new(
                BodyId::new(k as u64),
                partner,
                0,
                Vector2::new(0.0, 1.0),
                point,
                point - body.position,
                r2,
                0.0,
                ContactKind::Resting,
            )
            .unwrap();
            contacts.push(contact);
        }
    }

    let change = vec![BodyAccel::new(Vector2::new(0.0, -10.0), 0.0); boxes];
    (bodies, contacts, change)
}

fn bench_matrix_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix_assembly");

    for boxes in [1, 2, 4] {
        let (bodies, contacts, change) = build_stack(boxes);
        group.bench_with_input(
            BenchmarkId::new("build_a_matrix", boxes),
            &boxes,
            |bench, _| {
                bench.iter(|| black_box(build_a_matrix(&contacts, &bodies)));
            },
        );
        group.bench_with_input(
            BenchmarkId::new("build_b_vector", boxes),
            &boxes,
            |bench, _| {
                bench.iter(|| black_box(build_b_vector(&contacts, &bodies, &change)));
            },
        );
    }

    group.finish();
}

fn bench_compute_forces(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_forces");

    for boxes in [1, 2, 4] {
        let (bodies, contacts, change) = build_stack(boxes);
        let a = build_a_matrix(&contacts, &bodies);
        let b = build_b_vector(&contacts, &bodies, &change);

        group.bench_with_input(BenchmarkId::new("stack", boxes), &boxes, |bench, _| {
            bench.iter(|| black_box(compute_forces(&a, &b)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_matrix_assembly, bench_compute_forces);
criterion_main!(benches);
