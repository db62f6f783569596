//! Stress tests for concurrent dispatch
//!
//! These tests verify:
//! - Concurrent automatic writes are emitted exactly once
//! - Concurrent manual writes and submits lose and duplicate nothing
//! - Batches from one logger reach sinks in order
//! - Overflow accounting adds up under a flood

use rust_template_logger::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(30);

fn blocking_channel(capacity: usize) -> (Arc<ChannelEmitter>, MemorySink) {
    let sink = MemorySink::new();
    let emitter = ChannelEmitter::builder()
        .sink(sink.clone())
        .capacity(capacity)
        .overflow_policy(OverflowPolicy::Block)
        .build()
        .expect("Failed to start emitter");
    (Arc::new(emitter), sink)
}

fn shared_logger(send_mode: SendMode, emitter: Arc<ChannelEmitter>) -> Arc<Logger> {
    Arc::new(
        Logger::builder()
            .category("stress")
            .min_level(LogLevel::Trace)
            .send_mode(send_mode)
            .emitter(emitter)
            .build()
            .expect("Failed to build logger"),
    )
}

/// K threads each writing M automatic events yield exactly K×M distinct events
#[test]
fn test_concurrent_automatic_writes_exactly_once() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 500;

    let (emitter, sink) = blocking_channel(64);
    let logger = shared_logger(SendMode::Automatic, Arc::clone(&emitter));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.info("thread {T} event {I}", vec![Value::from(t), Value::from(i)]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Writer thread panicked");
    }
    assert!(emitter.wait_idle(WAIT));

    let messages = sink.messages();
    assert_eq!(messages.len(), THREADS * PER_THREAD);
    let unique: HashSet<_> = messages.iter().collect();
    assert_eq!(unique.len(), THREADS * PER_THREAD);
    assert_eq!(emitter.metrics().dropped_count(), 0);
}

/// Concurrent manual writers with a concurrent submitter
#[test]
fn test_concurrent_manual_writes_and_submits() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 1000;

    let (emitter, sink) = blocking_channel(256);
    let logger = shared_logger(SendMode::Manual, Arc::clone(&emitter));
    let finished = Arc::new(AtomicUsize::new(0));

    let writers: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.debug("writer {T} row {I}", vec![Value::from(t), Value::from(i)]);
                }
                finished.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    let submitter = {
        let logger = Arc::clone(&logger);
        let finished = Arc::clone(&finished);
        thread::spawn(move || {
            while finished.load(Ordering::SeqCst) < THREADS {
                logger.submit();
                thread::yield_now();
            }
        })
    };

    for writer in writers {
        writer.join().expect("Writer thread panicked");
    }
    submitter.join().expect("Submitter thread panicked");
    logger.submit();
    assert!(emitter.wait_idle(WAIT));

    let batches = sink.batches();
    let transactions: HashSet<_> = batches.iter().map(|b| b.transaction_id).collect();
    assert_eq!(transactions.len(), batches.len(), "a transaction was emitted twice");

    let messages = sink.messages();
    assert_eq!(messages.len(), THREADS * PER_THREAD);
    let unique: HashSet<_> = messages.iter().collect();
    assert_eq!(unique.len(), THREADS * PER_THREAD);
    assert_eq!(logger.pending_manual(), 0);
}

/// N manual events then one submit gives one batch of N
#[test]
fn test_manual_batch_is_emitted_once() {
    const EVENTS: usize = 10_000;

    let (emitter, sink) = blocking_channel(4);
    let logger = shared_logger(SendMode::Manual, Arc::clone(&emitter));

    for i in 0..EVENTS {
        logger.trace("row {I}", vec![Value::from(i)]);
    }
    assert!(emitter.wait_idle(WAIT));
    assert_eq!(sink.batch_count(), 0);

    logger.submit();
    assert!(emitter.wait_idle(WAIT));

    let batches = sink.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), EVENTS);
    assert_eq!(batches[0].events[EVENTS - 1].render_message(), format!("row {}", EVENTS - 1));
}

/// Batches written from one thread keep their order through the worker
#[test]
fn test_single_logger_batch_order() {
    let (emitter, sink) = blocking_channel(8);
    let logger = shared_logger(SendMode::Automatic, Arc::clone(&emitter));

    for i in 0..2000 {
        logger.info("seq {I}", vec![Value::from(i)]);
    }
    assert!(emitter.wait_idle(WAIT));

    let expected: Vec<_> = (0..2000).map(|i| format!("seq {}", i)).collect();
    assert_eq!(sink.messages(), expected);
}

/// Every flooded event is either delivered or counted as dropped
#[test]
fn test_drop_newest_accounting_under_flood() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 2000;

    let sink = MemorySink::new();
    let emitter = Arc::new(
        ChannelEmitter::builder()
            .sink(sink.clone())
            .capacity(2)
            .overflow_policy(OverflowPolicy::DropNewest)
            .build()
            .expect("Failed to start emitter"),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let emitter = Arc::clone(&emitter);
            thread::spawn(move || {
                let logger = Logger::builder()
                    .category(format!("flood::{}", t))
                    .emitter(emitter)
                    .build()
                    .expect("Failed to build logger");
                for i in 0..PER_THREAD {
                    logger.warn("flood {I}", vec![Value::from(i)]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Writer thread panicked");
    }
    assert!(emitter.wait_idle(WAIT));

    let metrics = emitter.metrics();
    assert_eq!(
        metrics.events_emitted() + metrics.dropped_count(),
        (THREADS * PER_THREAD) as u64
    );
    assert_eq!(sink.event_count() as u64, metrics.events_emitted());
}
