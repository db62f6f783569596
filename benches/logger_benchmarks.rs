//! Criterion benchmarks for rust_template_logger

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_template_logger::prelude::*;
use rust_template_logger::template::tokenize;
use std::sync::Arc;

fn null_logger(min_level: LogLevel, send_mode: SendMode) -> Logger {
    Logger::builder()
        .category("bench")
        .min_level(min_level)
        .send_mode(send_mode)
        .emitter(Arc::new(FnEmitter(|batch: LogBatch| {
            black_box(batch);
        })))
        .build()
        .expect("Failed to build logger")
}

// ============================================================================
// Level Gate Benchmarks
// ============================================================================

fn bench_level_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_gate");
    group.throughput(Throughput::Elements(1));

    let gate = LevelGate::new(LogLevel::Warn)
        .with_namespace("app::", LogLevel::Info)
        .with_namespace("app::db::", LogLevel::Debug)
        .with_category("app::db::pool", LogLevel::Trace);

    group.bench_function("exact_override", |b| {
        b.iter(|| gate.is_enabled(black_box("app::db::pool"), black_box(LogLevel::Trace)));
    });

    group.bench_function("namespace_prefix", |b| {
        b.iter(|| gate.is_enabled(black_box("app::db::query"), black_box(LogLevel::Trace)));
    });

    group.bench_function("global_minimum", |b| {
        b.iter(|| gate.is_enabled(black_box("vendor::lib"), black_box(LogLevel::Info)));
    });

    group.finish();
}

// ============================================================================
// Logging Performance Benchmarks
// ============================================================================

fn bench_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("logging");
    group.throughput(Throughput::Elements(1));

    let disabled = null_logger(LogLevel::Error, SendMode::Automatic);
    group.bench_function("disabled_macro", |b| {
        b.iter(|| {
            rust_template_logger::debug!(disabled, "Skipped {Value}", black_box(42));
        });
    });

    let enabled = null_logger(LogLevel::Trace, SendMode::Automatic);
    group.bench_function("automatic_cached_template", |b| {
        b.iter(|| {
            enabled.info(
                black_box("User {Name} performed {Action}"),
                vec![Value::from("alice"), Value::from("login")],
            );
        });
    });

    group.bench_function("automatic_destructure", |b| {
        b.iter(|| {
            enabled.info(
                black_box("Order {@Order}"),
                vec![Value::structure([("id", Value::from(7)), ("total", Value::from(19.99))])],
            );
        });
    });

    let manual = null_logger(LogLevel::Trace, SendMode::Manual);
    group.bench_function("manual_append", |b| {
        b.iter(|| {
            manual.info(black_box("Row {Row}"), vec![Value::from(1)]);
            if manual.pending_manual() >= 1024 {
                manual.submit();
            }
        });
    });

    group.finish();
}

// ============================================================================
// Template Benchmarks
// ============================================================================

fn bench_templates(c: &mut Criterion) {
    let mut group = c.benchmark_group("templates");

    let template = "Request {Method} {Path} returned {Status,5} in {Elapsed:.2} ms {{cached}}";
    group.bench_function("tokenize", |b| {
        b.iter(|| tokenize(black_box(template)));
    });

    let processor = MessageProcessor::new();
    let message = processor.process(
        template,
        vec![
            Value::from("GET"),
            Value::from("/api/orders"),
            Value::from(200),
            Value::from(12.3456),
        ],
        &[],
    );
    group.bench_function("render", |b| {
        b.iter(|| black_box(message.render()));
    });

    group.finish();
}

criterion_group!(benches, bench_level_gate, bench_logging, bench_templates);
criterion_main!(benches);
