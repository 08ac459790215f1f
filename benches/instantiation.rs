//! Benchmarks for generic method instantiation.
//!
//! Measures the cache on its hot and cold paths:
//! - Lock-free hits on completed instances
//! - First-time construction of method-level and class-level instances
//! - Full-name formatting for diagnostics

extern crate methodinst;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use methodinst::prelude::*;
use std::{hint::black_box, sync::Arc};

fn int32() -> RuntimeTypeRc {
    Arc::new(RuntimeType::new(Token::type_def(1), "System", "Int32", true))
}

fn map_key(int32: &RuntimeTypeRc) -> GenericMethodRc {
    let helpers = Arc::new(RuntimeType::new(Token::type_def(2), "", "Helpers", false));
    let map = Arc::new(
        MethodDefinition::new(Token::method_def(1), "Map", helpers)
            .with_generic_params(vec![GenericParameter::new("T", 0)])
            .with_return_type(TypeSig::MVar(0))
            .with_parameters(vec![Parameter::new("value", 0, TypeSig::MVar(0))]),
    );

    Arc::new(GenericMethod::new(
        map,
        GenericContext::new(None, Some(GenericInst::new(vec![TypeSig::Type(int32.clone())]))),
    ))
}

/// Benchmark repeated lookups of an already realized instance.
fn bench_cache_hit(c: &mut Criterion) {
    let cache = GenericMethodCache::new(Collaborators::new());
    let key = map_key(&int32());
    cache.get_method(&key, true).unwrap();

    c.bench_function("generic_method_cache_hit", |b| {
        b.iter(|| {
            let method = cache.get_method(black_box(&key), true).unwrap();
            black_box(method)
        });
    });
}

/// Benchmark constructing a method-level instance in an empty cache.
/// Instance: Helpers::Map<System.Int32>
fn bench_construct_method_instance(c: &mut Criterion) {
    let key = map_key(&int32());

    c.bench_function("generic_method_construct_method_inst", |b| {
        b.iter_batched(
            || GenericMethodCache::new(Collaborators::new()),
            |cache| {
                let method = cache.get_method(black_box(&key), false).unwrap();
                black_box(method)
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark constructing a class-level instance, including realization of the
/// declaring type.
/// Instance: Pair<System.Int32, System.Int32>::Compare
fn bench_construct_class_instance(c: &mut Criterion) {
    let int32 = int32();
    let pair = Arc::new(
        RuntimeType::new(Token::type_def(3), "", "Pair", false).with_generic_params(vec![
            GenericParameter::new("TFirst", 0),
            GenericParameter::new("TSecond", 1),
        ]),
    );
    let compare = Arc::new(
        MethodDefinition::new(Token::method_def(2), "Compare", pair)
            .with_parameters(vec![
                Parameter::new("first", 0, TypeSig::Var(0)),
                Parameter::new("second", 1, TypeSig::Var(1)),
            ]),
    );
    let key = Arc::new(GenericMethod::new(
        compare,
        GenericContext::new(
            Some(GenericInst::new(vec![
                TypeSig::Type(int32.clone()),
                TypeSig::Type(int32),
            ])),
            None,
        ),
    ));

    c.bench_function("generic_method_construct_class_inst", |b| {
        b.iter_batched(
            || GenericMethodCache::new(Collaborators::new()),
            |cache| {
                let method = cache.get_method(black_box(&key), false).unwrap();
                black_box(method)
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark formatting the diagnostic name of an instance.
fn bench_format_full_name(c: &mut Criterion) {
    let cache = GenericMethodCache::new(Collaborators::new());
    let key = map_key(&int32());

    c.bench_function("generic_method_full_name", |b| {
        b.iter(|| black_box(cache.format_full_name(black_box(&key))));
    });
}

criterion_group!(
    benches,
    bench_cache_hit,
    bench_construct_method_instance,
    bench_construct_class_instance,
    bench_format_full_name,
);
criterion_main!(benches);
