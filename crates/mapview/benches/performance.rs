//! Performance benchmarks for mapview operations.
//!
//! Run with: cargo bench --package mapview

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mapview::{AttributeDef, InterfaceDef, TypeRef, ViewContext};
use serde_json::{json, Value};

// ============================================================================
// Helper functions to generate test data
// ============================================================================

/// Register `Item` with N string attributes and `Basket` holding a list of items.
fn context(num_fields: usize) -> ViewContext {
    let ctx = ViewContext::new();
    let mut item = InterfaceDef::new("Item");
    for i in 0..num_fields {
        item = item.attribute(AttributeDef::new(format!("field{i}"), TypeRef::Str));
    }
    ctx.registry().register_interface(item);
    ctx.registry().register_interface(
        InterfaceDef::new("Basket")
            .attribute(AttributeDef::new("items", TypeRef::list(TypeRef::interface("Item")))),
    );
    ctx
}

/// Generate a flat item document with N fields
fn generate_item(num_fields: usize) -> Value {
    let mut obj = serde_json::Map::new();
    for i in 0..num_fields {
        obj.insert(format!("field{i}"), json!(format!("value{i}")));
    }
    json!(obj)
}

/// Generate a basket with N items of 10 fields each
fn generate_basket(num_items: usize) -> Value {
    json!({ "items": (0..num_items).map(|_| generate_item(10)).collect::<Vec<_>>() })
}

// ============================================================================
// Benchmark: view construction
// ============================================================================

fn bench_construct_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("construct_flat_view");

    for num_fields in [10, 100, 1000] {
        group.throughput(Throughput::Elements(num_fields as u64));
        let ctx = context(num_fields);
        let doc = generate_item(num_fields);

        group.bench_with_input(
            BenchmarkId::from_parameter(num_fields),
            &num_fields,
            |b, _| {
                b.iter(|| {
                    let view = ctx
                        .builder_for("Item")
                        .with_json(black_box(doc.clone()))
                        .and_then(|builder| builder.build());
                    black_box(view)
                });
            },
        );
    }

    group.finish();
}

fn bench_construct_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("construct_nested_views");

    for num_items in [10, 100, 1000] {
        group.throughput(Throughput::Elements(num_items as u64));
        let ctx = context(10);
        let doc = generate_basket(num_items);

        group.bench_with_input(BenchmarkId::from_parameter(num_items), &num_items, |b, _| {
            b.iter(|| {
                let view = ctx
                    .builder_for("Basket")
                    .with_json(black_box(doc.clone()))
                    .and_then(|builder| builder.build());
                black_box(view)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: export
// ============================================================================

fn bench_to_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_map_nested");

    for num_items in [10, 100, 1000] {
        group.throughput(Throughput::Elements(num_items as u64));
        let ctx = context(10);
        let view = ctx
            .builder_for("Basket")
            .with_json(generate_basket(num_items))
            .and_then(|builder| builder.build())
            .expect("basket view");

        group.bench_with_input(BenchmarkId::from_parameter(num_items), &num_items, |b, _| {
            b.iter(|| black_box(black_box(&view).to_map()));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: descriptor cache
// ============================================================================

fn bench_descriptor_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("descriptor_cache");
    let ctx = context(100);

    group.bench_function("hit", |b| {
        ctx.descriptors("Item").expect("descriptors");
        b.iter(|| black_box(ctx.descriptors(black_box("Item"))));
    });

    group.bench_function("miss", |b| {
        b.iter(|| {
            ctx.cache().clear();
            black_box(ctx.descriptors(black_box("Item")))
        });
    });

    group.finish();
}

// ============================================================================
// Benchmark: reads and writes
// ============================================================================

fn bench_get_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("attribute_access");
    let ctx = context(100);
    let view = ctx
        .builder_for("Item")
        .with_json(generate_item(100))
        .and_then(|builder| builder.build())
        .expect("item view");

    group.bench_function("get", |b| {
        b.iter(|| black_box(view.get(black_box("field50"))));
    });

    group.bench_function("set_shared", |b| {
        b.iter(|| {
            let mut copy = view.clone();
            black_box(copy.set("field50", "changed"))
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_construct_flat,
    bench_construct_nested,
    bench_to_map,
    bench_descriptor_cache,
    bench_get_set,
);

criterion_main!(benches);
