//! Basic logger usage example
//!
//! Demonstrates level routing to console transports with different formats.
//!
//! Run with: cargo run --example basic_usage

use logfan::formats::{Colorize, Simple, Timestamp};
use logfan::prelude::*;
use logfan::{info, warn, Pipeline};
use serde_json::json;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== logfan - Basic Usage Example ===\n");

    // Human-readable lines for everything at info and above
    let logger = Logger::builder()
        .level("info")
        .format(
            Pipeline::new()
                .stage(Colorize::new())
                .stage(Simple::new()),
        )
        .transport(Arc::new(ConsoleTransport::new().with_stderr_levels(["error"])))
        .build()?;

    println!("1. Logging at different levels:");
    logger.error("This is an error message")?;
    logger.warn("This is a warning message")?;
    logger.info("This is an info message")?;
    logger.debug("Debug message (hidden)")?;

    println!("\n2. Metadata and macros:");
    logger.log_with("info", "user signed in", json!({"user": "ada", "method": "sso"}))?;
    let port = 8080;
    info!(logger, { "tls": true }, "listening on port {}", port)?;
    warn!(logger, "certificate expires in {} days", 12)?;

    println!("\n3. A second transport with its own level and format:");
    logger.add_with(
        Arc::new(ConsoleTransport::new()),
        BindingOptions::new()
            .level("warn")
            .format(Pipeline::new().stage(Timestamp::new()).stage(Json::new())),
    )?;
    logger.info("only the first transport prints this")?;
    logger.warn("both transports print this")?;

    println!("\n4. Changing the threshold:");
    logger.set_level("debug")?;
    logger.debug("Debug message (visible now)")?;

    logger.close();
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
