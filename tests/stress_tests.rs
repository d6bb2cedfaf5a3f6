//! Stress tests for concurrent fan-out
//!
//! These tests verify:
//! - No record is lost under concurrent writers
//! - Each writer's records keep their order on every transport
//! - Transports can be added and removed while writers run
//! - Child loggers and level handles are safe to share across threads

use logfan::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const WRITERS: usize = 8;
const PER_WRITER: usize = 500;

/// Test that concurrent writers lose nothing and keep per-writer order
#[test]
fn test_concurrent_writers_keep_order() {
    let fast = Arc::new(MemoryTransport::new());
    let slow = Arc::new(MemoryTransport::new().with_delay(Duration::from_micros(20)));
    let logger = Logger::builder()
        .transport(fast.clone())
        .transport(slow.clone())
        .build()
        .unwrap();

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let logger = logger.clone();
            thread::spawn(move || {
                for seq in 0..PER_WRITER {
                    logger
                        .log_with("info", "tick", json!({"writer": writer, "seq": seq}))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer panicked");
    }
    logger.close();

    for transport in [&fast, &slow] {
        let records = transport.records();
        assert_eq!(records.len(), WRITERS * PER_WRITER);

        let mut last: HashMap<u64, u64> = HashMap::new();
        for record in &records {
            let writer = record.get("writer").unwrap().as_u64().unwrap();
            let seq = record.get("seq").unwrap().as_u64().unwrap();
            if let Some(previous) = last.insert(writer, seq) {
                assert!(seq > previous, "writer {} out of order", writer);
            }
        }
    }
    assert_eq!(logger.metrics().total_written(), (WRITERS * PER_WRITER) as u64);
    assert_eq!(logger.metrics().delivered(), (2 * WRITERS * PER_WRITER) as u64);
}

/// Test that bindings can come and go while records are being written
#[test]
fn test_add_remove_under_load() {
    let anchor = Arc::new(MemoryTransport::new());
    let logger = Logger::builder().transport(anchor.clone()).build().unwrap();
    let running = Arc::new(AtomicBool::new(true));

    let writer = {
        let logger = logger.clone();
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let mut written = 0usize;
            while running.load(Ordering::Relaxed) {
                logger.info(format!("m{}", written)).unwrap();
                written += 1;
            }
            written
        })
    };

    let mut churned = Vec::new();
    for _ in 0..20 {
        let memory = Arc::new(MemoryTransport::new());
        let sink = Sink::from(memory.clone());
        logger.add(sink.clone()).unwrap();
        thread::sleep(Duration::from_millis(2));
        assert!(logger.remove(&sink));
        churned.push(memory);
    }

    running.store(false, Ordering::Relaxed);
    let written = writer.join().expect("writer panicked");
    logger.close();

    assert_eq!(anchor.len(), written);
    assert!(churned.iter().all(|m| m.is_closed()));
    assert_eq!(logger.transport_count(), 0);
}

/// Test that children and handles shared across threads all reach the parent
#[test]
fn test_shared_children_and_handles() {
    let memory = Arc::new(MemoryTransport::new());
    let logger = Logger::builder()
        .level("debug")
        .transport(memory.clone())
        .build()
        .unwrap();
    let child = logger.child(json!({"component": "worker"}));
    let debug = child.level_handle("debug").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let child = child.child(json!({"worker": i}));
            let debug = debug.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    child.info("busy").unwrap();
                    debug.log("detail").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer panicked");
    }
    logger.close();

    let records = memory.records();
    assert_eq!(records.len(), 800);
    assert!(records
        .iter()
        .all(|r| r.get("component") == Some(&json!("worker"))));
    assert_eq!(records.iter().filter(|r| r.contains("worker")).count(), 400);
}

/// Test that a failing transport under load never disturbs a healthy one
#[test]
fn test_failures_under_load_are_isolated() {
    let broken = Arc::new(MemoryTransport::new().with_name("broken").failing("nope"));
    let healthy = Arc::new(MemoryTransport::new());
    let logger = Logger::builder()
        .transport(broken)
        .transport(healthy.clone())
        .build()
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let logger = logger.clone();
            thread::spawn(move || {
                for _ in 0..250 {
                    logger.warn("pressure").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer panicked");
    }
    logger.close();

    assert_eq!(healthy.len(), 1000);
    assert_eq!(logger.metrics().transport_failures(), 1000);
}
