//! File logging example
//!
//! Demonstrates console, plain file and rotating file destinations, configured
//! from JSON.
//!
//! Run with: cargo run --example file_logging

use sim_logger::prelude::*;
use std::sync::Arc;

const CONFIG: &str = r#"{
    "loggers": {
        "root": { "level": "debug" },
        "vehicle1.propulsion": { "level": "warn", "immediate_flush": true }
    }
}"#;

fn main() -> Result<()> {
    println!("=== Sim Logger - File Logging Example ===\n");

    let registry = LoggerRegistry::new();
    LoggingConfig::from_json(CONFIG)?.apply(&registry);

    let file = FileDestination::new("application.log")?.with_durable_flush(true);
    let json = FileDestination::new("application.jsonl")?.with_output_format(OutputFormat::Json);
    let rotating = RotatingFileDestination::with_policy(
        "logs/rotating.log",
        RotationPolicy::new()
            .with_max_size(4 * 1024)
            .with_max_backups(3)
            .with_compression(true),
    )?;

    let root = registry.root();
    root.set_destinations(vec![
        Arc::new(ConsoleDestination::stdout().with_color_mode(ColorMode::Auto)),
        Arc::new(file),
        Arc::new(json),
        Arc::new(rotating),
    ]);

    println!("1. Logging to console, file, JSON lines and a rotating file:");
    let app = registry.get_logger("app");
    app.info("Application started");
    app.debug("Loading configuration...");
    app.warn("Using default settings for some options");

    println!("\n2. A subtree configured at WARN with immediate flush:");
    let engine = registry.get_logger("vehicle1.propulsion");
    engine.info("Hidden by the WARN override");
    engine.error("Ignition sequence aborted");

    println!("\n3. Enough output to rotate:");
    for i in 1..=200 {
        app.log(&app.record(Level::Info, format!("Processing item {}/200", i)).tag("batch", "a").build());
    }

    // Flush to ensure all records are written
    root.flush();

    println!("\n=== Example completed successfully! ===");
    println!("Check 'application.log', 'application.jsonl' and 'logs/' for the output");

    Ok(())
}
