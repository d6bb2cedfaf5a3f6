//! Child loggers, profiling and custom level tables
//!
//! Run with: cargo run --example child_loggers

use logfan::formats::Logfmt;
use logfan::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== logfan - Child Logger Example ===\n");

    let logger = Logger::builder()
        .levels(Levels::syslog())
        .level("debug")
        .format(Logfmt::new())
        .default_meta(json!({"service": "billing"}))
        .transport(Arc::new(ConsoleTransport::new()))
        .build()?;

    println!("1. Request-scoped children:");
    let request = logger.child(json!({"requestId": "r-42"}));
    request.write(LogRecord::new("info", "request received"))?;
    let db = request.child(json!({"component": "db"}));
    db.write(LogRecord::new("debug", "query planned").with_field("table", "invoices"))?;

    println!("\n2. Level handles for syslog names:");
    for handle in logger.level_handles() {
        if handle.is_enabled() {
            handle.log(format!("{} is enabled", handle.level()))?;
        }
    }

    println!("\n3. Profiling:");
    logger.profile("invoice-run")?;
    thread::sleep(Duration::from_millis(25));
    logger.profile_with("invoice-run", json!({"level": "notice", "invoices": 17}))?;

    let timer = db.start_timer();
    thread::sleep(Duration::from_millis(10));
    timer.done("query finished")?;

    logger.close();
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
