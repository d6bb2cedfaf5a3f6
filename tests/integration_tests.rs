//! Integration tests for the fan-out engine
//!
//! These tests verify:
//! - Threshold routing per transport
//! - Record shape at the transport
//! - Drain-to-completion on close
//! - Per-transport ordering and isolation
//! - Transport error and warning forwarding
//! - Child loggers, profiling and level handles

use logfan::formats::{Json, Simple};
use logfan::prelude::*;
use logfan::{format_fn, Format, Pipeline, TransportEvents};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn collect_events(logger: &Logger) -> Arc<Mutex<Vec<LoggerEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    logger.on_event(Arc::new(move |event: &LoggerEvent| {
        sink.lock().push(event.clone());
    }));
    events
}

/// Appends each payload as one line
struct FileTransport {
    file: Mutex<File>,
}

impl FileTransport {
    fn open(path: &Path) -> Self {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .expect("Failed to open log file");
        Self {
            file: Mutex::new(file),
        }
    }
}

impl Transport for FileTransport {
    fn log(&self, record: &LogRecord) -> logfan::Result<()> {
        let line = record.payload().unwrap_or_default().replace('\n', "\\n");
        writeln!(self.file.lock(), "{}", line)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }

    fn flush(&self) -> logfan::Result<()> {
        self.file.lock().flush()?;
        Ok(())
    }
}

/// Raises a warning through its event hub for every record
struct Grumbling {
    events: TransportEvents,
}

impl Transport for Grumbling {
    fn log(&self, _record: &LogRecord) -> logfan::Result<()> {
        self.events.warn("queue almost full");
        Ok(())
    }

    fn name(&self) -> &str {
        "grumbling"
    }

    fn events(&self) -> Option<&TransportEvents> {
        Some(&self.events)
    }
}

#[test]
fn test_threshold_routes_per_transport() {
    let levels = Levels::new([("error", 0), ("warn", 1), ("info", 2), ("debug", 3)]).unwrap();
    let a = Arc::new(MemoryTransport::new().with_name("a").with_level("error"));
    let b = Arc::new(MemoryTransport::new().with_name("b").with_level("info"));
    let logger = Logger::builder()
        .levels(levels)
        .transport(a.clone())
        .transport(b.clone())
        .build()
        .unwrap();

    logger.warn("disk at 85%").unwrap();
    logger.close();

    assert!(a.is_empty());
    assert_eq!(b.len(), 1);
}

#[test]
fn test_logger_threshold_applies_without_override() {
    let memory = Arc::new(MemoryTransport::new());
    let logger = Logger::builder()
        .level("warn")
        .transport(memory.clone())
        .build()
        .unwrap();

    for level in ["error", "warn", "info", "debug"] {
        logger.log(level, level).unwrap();
    }
    logger.close();

    let seen: Vec<String> = memory.records().iter().map(|r| r.message_text()).collect();
    assert_eq!(seen, vec!["error", "warn"]);
}

#[test]
fn test_record_arrives_flat_with_payload() {
    let memory = Arc::new(MemoryTransport::new());
    let logger = Logger::builder().transport(memory.clone()).build().unwrap();

    logger.log_with("info", "hello", json!({"a": 1, "b": 2})).unwrap();
    logger.close();

    let record = &memory.records()[0];
    let keys: Vec<&str> = record.fields().keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 4);
    for key in ["level", "message", "a", "b"] {
        assert!(keys.contains(&key));
    }
    let payload: Value = serde_json::from_str(record.payload().unwrap()).unwrap();
    assert_eq!(payload, json!({"level": "info", "message": "hello", "a": 1, "b": 2}));
}

#[test]
fn test_close_waits_for_every_transport() {
    let fast = Arc::new(MemoryTransport::new().with_name("one"));
    let also_fast = Arc::new(MemoryTransport::new().with_name("two"));
    let slow = Arc::new(
        MemoryTransport::new()
            .with_name("three")
            .with_delay(Duration::from_millis(300)),
    );
    let logger = Logger::builder()
        .transport(fast.clone())
        .transport(also_fast.clone())
        .transport(slow.clone())
        .build()
        .unwrap();
    let events = collect_events(&logger);

    logger.info("last words").unwrap();
    let start = Instant::now();
    logger.close();

    assert!(start.elapsed() >= Duration::from_millis(250));
    for transport in [&fast, &also_fast, &slow] {
        assert_eq!(transport.len(), 1);
        assert_eq!(transport.flush_count(), 1);
        assert!(transport.is_closed());
    }
    assert!(matches!(events.lock().last(), Some(LoggerEvent::Finish)));
}

#[test]
fn test_fifo_per_transport() {
    let first = Arc::new(MemoryTransport::new());
    let second = Arc::new(MemoryTransport::new().with_delay(Duration::from_micros(50)));
    let logger = Logger::builder()
        .transport(first.clone())
        .transport(second.clone())
        .build()
        .unwrap();

    for i in 0..300 {
        logger.info(format!("m{}", i)).unwrap();
    }
    logger.close();

    let expected: Vec<String> = (0..300).map(|i| format!("m{}", i)).collect();
    for transport in [&first, &second] {
        let seen: Vec<String> = transport.records().iter().map(|r| r.message_text()).collect();
        assert_eq!(seen, expected);
    }
}

#[test]
fn test_slow_transport_does_not_block_others() {
    let fast = Arc::new(MemoryTransport::new());
    let slow = Arc::new(MemoryTransport::new().with_delay(Duration::from_millis(500)));
    let logger = Logger::builder()
        .transport(slow.clone())
        .transport(fast.clone())
        .build()
        .unwrap();

    let start = Instant::now();
    for i in 0..3 {
        logger.info(format!("m{}", i)).unwrap();
    }
    assert!(start.elapsed() < Duration::from_millis(250), "write must not wait on sinks");
    assert!(fast.wait_for(3, Duration::from_millis(250)));
    assert!(slow.len() < 3);

    logger.close();
    assert_eq!(slow.len(), 3);
}

#[test]
fn test_failing_transport_reports_and_others_continue() {
    let broken = Arc::new(MemoryTransport::new().with_name("broken").failing("disk full"));
    let healthy = Arc::new(MemoryTransport::new());
    let logger = Logger::builder()
        .transport(broken.clone())
        .transport(healthy.clone())
        .build()
        .unwrap();
    let events = collect_events(&logger);

    assert!(logger.error("first").is_ok());
    assert!(logger.error("second").is_ok());
    logger.close();

    assert_eq!(healthy.len(), 2);
    let failures = events
        .lock()
        .iter()
        .filter(|e| matches!(e, LoggerEvent::TransportError { transport, .. } if transport == "broken"))
        .count();
    assert_eq!(failures, 2);
    assert_eq!(logger.metrics().transport_failures(), 2);
    assert_eq!(logger.metrics().delivered(), 2);
}

#[test]
fn test_failing_transport_removed_from_its_own_error_event() {
    let broken = Arc::new(MemoryTransport::new().with_name("broken").failing("disk full"));
    let healthy = Arc::new(MemoryTransport::new());
    let target = Sink::from(broken.clone());
    let logger = Logger::builder()
        .transport(target.clone())
        .transport(healthy.clone())
        .build()
        .unwrap();

    // the callback runs on the failing transport's worker thread
    let supervisor = Arc::new(Mutex::new(Some(logger.clone())));
    let removed = Arc::new(Mutex::new(Vec::new()));
    {
        let supervisor = Arc::clone(&supervisor);
        let removed = Arc::clone(&removed);
        logger.on_event(Arc::new(move |event: &LoggerEvent| {
            if let LoggerEvent::TransportError { transport, .. } = event {
                let logger = supervisor.lock().clone();
                if let Some(logger) = logger {
                    removed.lock().push((transport.clone(), logger.remove(&target)));
                }
            }
        }));
    }

    logger.error("first").unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !broken.is_closed() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }

    assert!(broken.is_closed());
    assert_eq!(broken.flush_count(), 1);
    assert_eq!(*removed.lock(), vec![("broken".to_string(), true)]);
    assert_eq!(logger.transport_names(), vec!["memory"]);

    logger.error("second").unwrap();
    logger.close();
    assert_eq!(healthy.len(), 2);
    assert_eq!(logger.metrics().transport_failures(), 1);
    supervisor.lock().take();
}

#[test]
fn test_transport_events_forwarded_once_per_instance() {
    let grumbling = Arc::new(Grumbling {
        events: TransportEvents::new(),
    });
    let logger = Logger::new();
    let events = collect_events(&logger);

    logger.add(grumbling.clone()).unwrap();
    logger.add(grumbling.clone()).unwrap();
    assert_eq!(grumbling.events.listener_count(), 1);

    logger.info("x").unwrap();
    logger.close();

    // two bindings each logged once
    let warnings = events
        .lock()
        .iter()
        .filter(|e| matches!(e, LoggerEvent::TransportWarn { .. }))
        .count();
    assert_eq!(warnings, 2);
    assert_eq!(grumbling.events.listener_count(), 0);
}

#[test]
fn test_remove_drains_then_detaches() {
    let memory = Arc::new(MemoryTransport::new().with_delay(Duration::from_millis(20)));
    let sink = Sink::from(memory.clone());
    let logger = Logger::new();
    logger.add(sink.clone()).unwrap();

    for i in 0..5 {
        logger.info(format!("m{}", i)).unwrap();
    }
    assert!(logger.remove(&sink));
    assert_eq!(memory.len(), 5);
    assert!(memory.is_closed());

    assert!(!logger.remove(&sink));
    logger.info("after").unwrap();
    assert_eq!(memory.len(), 5);
}

#[test]
fn test_shared_sink_removed_once_keeps_other_binding() {
    let memory = Arc::new(MemoryTransport::new());
    let sink = Sink::from(memory.clone());
    let logger = Logger::new();
    logger.add(sink.clone()).unwrap();
    logger.add(sink.clone()).unwrap();

    assert!(logger.remove(&sink));
    assert_eq!(logger.transport_count(), 1);

    logger.info("still bound").unwrap();
    logger.close();
    assert_eq!(memory.len(), 1);
}

#[test]
fn test_clear_detaches_everything() {
    let logger = Logger::new();
    logger.add(Arc::new(MemoryTransport::new())).unwrap();
    logger.add(Arc::new(MemoryTransport::new())).unwrap();
    let events = collect_events(&logger);

    logger.clear();
    assert_eq!(logger.transport_count(), 0);

    logger.info("nobody home").unwrap();
    assert!(events.lock().iter().any(|e| matches!(
        e,
        LoggerEvent::Notice(Notice { kind: NoticeKind::NoTransports, .. })
    )));
}

#[test]
fn test_is_level_enabled_global_then_per_transport() {
    let logger = Logger::new();
    assert!(logger.is_level_enabled("info"));
    assert!(!logger.is_level_enabled("debug"));
    assert!(!logger.is_level_enabled("nonsense"));

    let verbose = Arc::new(MemoryTransport::new().with_level("debug"));
    logger.add(verbose.clone()).unwrap();
    assert!(logger.is_level_enabled("debug"));
    assert!(!logger.is_level_enabled("silly"));

    logger.close();
    assert!(verbose.is_empty());
}

#[test]
fn test_binding_format_overrides_engine_format() {
    let json = Arc::new(MemoryTransport::new());
    let simple = Arc::new(MemoryTransport::new());
    let logger = Logger::builder()
        .format(Json::new())
        .transport(json.clone())
        .transport_with(simple.clone(), BindingOptions::new().format(Simple::new()))
        .build()
        .unwrap();

    logger.info("ready").unwrap();
    logger.close();

    assert_eq!(json.payloads(), vec![r#"{"level":"info","message":"ready"}"#]);
    assert_eq!(simple.payloads(), vec!["info: ready"]);
}

#[test]
fn test_binding_level_override() {
    let memory = Arc::new(MemoryTransport::new().with_level("error"));
    let logger = Logger::new();
    logger
        .add_with(memory.clone(), BindingOptions::new().level("debug"))
        .unwrap();

    logger.debug("binding wins over sink").unwrap();
    logger.close();
    assert_eq!(memory.len(), 1);
}

#[test]
fn test_format_can_drop_records() {
    let memory = Arc::new(MemoryTransport::new());
    let no_secrets = format_fn("no-secrets", |record: LogRecord| {
        if record.contains("password") {
            Ok(None)
        } else {
            Ok(Some(record))
        }
    });
    let logger = Logger::builder()
        .format(Pipeline::new().stage(no_secrets).stage(Json::new()))
        .transport(memory.clone())
        .build()
        .unwrap();

    logger
        .log_with("info", "login", json!({"password": "hunter2"}))
        .unwrap();
    logger.info("logout").unwrap();
    logger.close();

    assert_eq!(memory.len(), 1);
    assert_eq!(logger.metrics().dropped_count(), 1);
    assert_eq!(logger.metrics().total_written(), 1);
}

#[test]
fn test_rewritten_level_keeps_routing() {
    let memory = Arc::new(MemoryTransport::new().with_level("warn"));
    let upper = format_fn("upper", |mut record: LogRecord| {
        let level = record.level().unwrap_or_default().to_uppercase();
        record.insert("level", level);
        Ok(Some(record))
    });
    let logger = Logger::builder()
        .format(upper)
        .transport(memory.clone())
        .build()
        .unwrap();

    logger.warn("routed by original name").unwrap();
    logger.info("filtered by original name").unwrap();
    logger.close();

    let records = memory.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level(), Some("WARN"));
    assert_eq!(records[0].routing_level(), Some("warn"));
}

#[test]
fn test_crash_flagged_records_need_opt_in() {
    let plain = Arc::new(MemoryTransport::new());
    let opted = Arc::new(MemoryTransport::new());
    let logger = Logger::builder()
        .exit_on_error(false)
        .transport(plain.clone())
        .transport_with(opted.clone(), BindingOptions::new().handle_exceptions(true))
        .build()
        .unwrap();

    logger
        .write(LogRecord::new("error", "crash").with_field("exception", true))
        .unwrap();
    logger.close();

    assert!(plain.is_empty());
    assert_eq!(opted.len(), 1);
}

#[test]
fn test_child_precedence_and_late_parent_meta() {
    let memory = Arc::new(MemoryTransport::new());
    let logger = Logger::builder()
        .default_meta(json!({"service": "auth"}))
        .transport(memory.clone())
        .build()
        .unwrap();
    let child = logger.child(json!({"requestId": "42"}));

    child.info("hi").unwrap();
    child
        .write(LogRecord::new("info", "again").with_field("requestId", "override"))
        .unwrap();
    logger.set_default_meta(json!({"service": "auth", "region": "eu"}));
    child.info("later").unwrap();
    logger.close();

    let records = memory.records();
    assert_eq!(records[0].get("service"), Some(&json!("auth")));
    assert_eq!(records[0].get("requestId"), Some(&json!("42")));
    assert_eq!(records[0].message_text(), "hi");
    assert_eq!(records[1].get("requestId"), Some(&json!("override")));
    assert_eq!(records[1].get("service"), Some(&json!("auth")));
    assert_eq!(records[2].get("region"), Some(&json!("eu")));
}

#[test]
fn test_profile_and_timer() {
    let memory = Arc::new(MemoryTransport::new());
    let logger = Logger::builder().transport(memory.clone()).build().unwrap();

    logger.profile("import").unwrap();
    std::thread::sleep(Duration::from_millis(15));
    logger.profile("import").unwrap();

    let timer = logger.start_timer();
    timer
        .done_with(json!({"message": "batch", "level": "debug"}))
        .unwrap();
    logger.close();

    let records = memory.records();
    // the debug timer record is below the info threshold
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message_text(), "import");
    assert_eq!(records[0].level(), Some("info"));
    assert!(records[0].get("durationMs").unwrap().as_u64().unwrap() >= 15);
}

#[test]
fn test_level_handles_follow_configure() {
    let memory = Arc::new(MemoryTransport::new());
    let logger = Logger::builder().transport(memory.clone()).build().unwrap();

    let config = LoggerConfig::from_json_str(r#"{"levels": "cli", "level": "data"}"#).unwrap();
    logger.configure(config).unwrap();

    assert!(logger.level_handle("http").is_none());
    let help = logger.level_handle("help").unwrap();
    assert!(help.is_enabled());
    help.log_with("usage", json!({"command": "sync"})).unwrap();
    assert!(!logger.level_handle("prompt").unwrap().is_enabled());
    logger.close();

    assert_eq!(memory.records()[0].level(), Some("help"));
    assert_eq!(memory.records()[0].get("command"), Some(&json!("sync")));
}

#[test]
fn test_unknown_level_is_still_delivered() {
    let memory = Arc::new(MemoryTransport::new());
    let logger = Logger::builder().transport(memory.clone()).build().unwrap();
    let events = collect_events(&logger);

    logger.log("loud", "made-up level").unwrap();
    logger.close();

    assert_eq!(memory.len(), 1);
    assert!(events.lock().iter().any(|e| matches!(
        e,
        LoggerEvent::Notice(Notice { kind: NoticeKind::UnknownLevel, .. })
    )));
}

#[test]
fn test_file_transport_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("app.log");

    let logger = Logger::builder()
        .format(Simple::new())
        .transport(Arc::new(FileTransport::open(&log_file)))
        .build()
        .unwrap();

    logger.info("line one").unwrap();
    logger.log_with("warn", "line\ntwo", json!({"n": 2})).unwrap();
    logger.close();

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, vec!["info: line one", r#"warn: line\ntwo {"n":2}"#]);
}

#[test]
fn test_dropping_logger_drains_without_close() {
    let memory = Arc::new(MemoryTransport::new());
    {
        let logger = Logger::builder().transport(memory.clone()).build().unwrap();
        for i in 0..10 {
            logger.info(format!("m{}", i)).unwrap();
        }
    }
    assert_eq!(memory.len(), 10);
    assert!(!memory.is_closed());
}

#[test]
fn test_silent_engine_reports_nothing() {
    let memory = Arc::new(MemoryTransport::new());
    let logger = Logger::builder().transport(memory.clone()).build().unwrap();
    let events = collect_events(&logger);

    logger.set_silent(true);
    logger.log("loud", "unknown level but silent").unwrap();
    logger.set_silent(false);
    logger.close();

    assert!(memory.is_empty());
    assert!(events
        .lock()
        .iter()
        .all(|e| matches!(e, LoggerEvent::Finish)));
}

#[test]
fn test_format_trait_object_usable_directly() {
    let format: Arc<dyn Format> = Arc::new(Json::new());
    let out = format.transform(LogRecord::new("info", "x")).unwrap().unwrap();
    assert!(out.payload().is_some());
}
