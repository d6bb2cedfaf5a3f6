//! Crash capture example
//!
//! Panics on any thread are written to a dedicated handler transport as a
//! diagnostic record. Exit is replaced here so the demo keeps running.
//!
//! Run with: cargo run --example crash_capture

use logfan::capture::report_rejection;
use logfan::formats::Simple;
use logfan::prelude::*;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== logfan - Crash Capture Example ===\n");

    let crashes = Arc::new(MemoryTransport::new().with_name("crashes"));
    let logger = Logger::builder()
        .format(Simple::new())
        .transport(Arc::new(ConsoleTransport::new()))
        .exception_handler(crashes.clone())
        .rejection_handler(crashes.clone())
        .on_exit(|code| println!("(exit({}) suppressed for the demo)", code))
        .build()?;

    println!("1. A panicking worker thread:");
    let _ = std::thread::spawn(|| panic!("worker lost its connection")).join();

    println!("\n2. An error nobody awaited:");
    let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "upload timed out");
    report_rejection(FatalError::from_error(io));

    println!("\n3. Captured records:");
    for record in crashes.records() {
        let first_line = record.message_text().lines().next().unwrap_or_default().to_string();
        println!("   {}", first_line);
        if let Some(pid) = record.get("process").and_then(|p| p.get("pid")) {
            println!("   pid: {}", pid);
        }
    }

    logger.close();
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
