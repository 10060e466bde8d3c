//! Dispatch Performance Benchmarks
//!
//! Measures the cost of call-site dispatch across cache tiers:
//!
//! 1. **L0 fast path**: warmed monomorphic sites
//! 2. **L1 rotation**: polymorphic sites alternating shapes
//! 3. **L2 reuse**: fresh sites resolving from the shared binder cache
//! 4. **Cold bind**: full miss including binder synthesis
//!
//! The generic slow-path lookup is included as the baseline dispatch
//! is supposed to beat after warm-up.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use onyx_dispatch::ops::member::GetMemberBinder;
use onyx_dispatch::ops::{BinaryOpBinder, BinaryOperator};
use onyx_dispatch::CallSite;
use onyx_runtime::{global_shapes, intern, Instance, Value};
use std::sync::Arc;

// =============================================================================
// Benchmark Helpers
// =============================================================================

/// Object with `pad` padding members followed by "v".
fn padded_object(pad: usize, value: i64) -> Value {
    let obj = Instance::new(global_shapes().empty_shape());
    for i in 0..pad {
        obj.set_member(intern(&format!("pad{}", i)), Value::Null, global_shapes());
    }
    obj.set_member(intern("v"), Value::Int(value), global_shapes());
    Value::Object(Arc::new(obj))
}

// =============================================================================
// Member Dispatch Benchmarks
// =============================================================================

fn bench_member_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("member_dispatch");

    // Warmed monomorphic site: every call is an L0 hit.
    group.bench_function("monomorphic_fast_path", |b| {
        let site = CallSite::new(Arc::new(GetMemberBinder::new("v")));
        let obj = padded_object(0, 7);
        site.invoke(std::slice::from_ref(&obj)).unwrap();

        b.iter(|| black_box(site.invoke(std::slice::from_ref(&obj)).unwrap()))
    });

    // Generic lookup baseline: what every call would cost without
    // caching.
    group.bench_function("generic_lookup_baseline", |b| {
        let obj = padded_object(0, 7);
        let name = intern("v");

        b.iter(|| {
            let instance = obj.as_object().unwrap();
            black_box(instance.get_member(name))
        })
    });

    // Polymorphic rotation: each call misses L0 and hits L1.
    for shapes in [2usize, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("polymorphic_rotation", shapes),
            &shapes,
            |b, &shapes| {
                let site = CallSite::new(Arc::new(GetMemberBinder::new("v")));
                let objects: Vec<Value> =
                    (0..shapes).map(|i| padded_object(i, i as i64)).collect();
                for obj in &objects {
                    site.invoke(std::slice::from_ref(obj)).unwrap();
                }

                let mut index = 0;
                b.iter(|| {
                    index = (index + 1) % objects.len();
                    black_box(site.invoke(std::slice::from_ref(&objects[index])).unwrap())
                })
            },
        );
    }

    // Fresh sites over a warmed binder: L2 resolution, no binding.
    group.bench_function("shared_cache_site_warmup", |b| {
        let binder = Arc::new(GetMemberBinder::new("v"));
        let obj = padded_object(0, 7);
        let warm = CallSite::new(binder.clone());
        warm.invoke(std::slice::from_ref(&obj)).unwrap();

        b.iter(|| {
            let site = CallSite::new(binder.clone());
            black_box(site.invoke(std::slice::from_ref(&obj)).unwrap())
        })
    });

    // Cold dispatch: fresh binder and site, full bind every iteration.
    group.bench_function("cold_bind", |b| {
        let obj = padded_object(0, 7);

        b.iter(|| {
            let site = CallSite::new(Arc::new(GetMemberBinder::new("v")));
            black_box(site.invoke(std::slice::from_ref(&obj)).unwrap())
        })
    });

    group.finish();
}

// =============================================================================
// Operator Dispatch Benchmarks
// =============================================================================

fn bench_operator_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("operator_dispatch");

    group.bench_function("int_add_fast_path", |b| {
        let site = CallSite::new(Arc::new(BinaryOpBinder::new(BinaryOperator::Add)));
        site.invoke(&[Value::Int(1), Value::Int(2)]).unwrap();

        b.iter(|| black_box(site.invoke(&[Value::Int(40), Value::Int(2)]).unwrap()))
    });

    group.bench_function("mixed_add_two_rules", |b| {
        let site = CallSite::new(Arc::new(BinaryOpBinder::new(BinaryOperator::Add)));
        site.invoke(&[Value::Int(1), Value::Int(2)]).unwrap();
        site.invoke(&[Value::Int(1), Value::Float(2.0)]).unwrap();

        let mut toggle = false;
        b.iter(|| {
            toggle = !toggle;
            let rhs = if toggle { Value::Int(2) } else { Value::Float(2.0) };
            black_box(site.invoke(&[Value::Int(40), rhs]).unwrap())
        })
    });

    group.finish();
}

// =============================================================================
// Criterion Groups
// =============================================================================

criterion_group!(dispatch_benches, bench_member_dispatch, bench_operator_dispatch);
criterion_main!(dispatch_benches);
