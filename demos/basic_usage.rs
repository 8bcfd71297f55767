//! Basic logger usage example
//!
//! Demonstrates a logger hierarchy with a console destination and level
//! inheritance.
//!
//! Run with: cargo run --example basic_usage

use sim_logger::prelude::*;
use sim_logger::{info, time_source, warn};
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Sim Logger - Basic Usage Example ===\n");

    // Deterministic clock so the {met} column is readable
    let clock = Arc::new(ManualTimeSource::new(0.0, 0.0, 0));
    time_source::install(clock.clone());

    let registry = LoggerRegistry::global();
    let console = ConsoleDestination::stdout()
        .with_output_format(OutputFormat::pattern("{met} {level} [{logger}] {msg}"));

    // Everything hangs off the root logger
    let root = registry.root();
    root.add_destination(Arc::new(console));
    root.set_level(Level::Debug);

    let vehicle = registry.get_logger("vehicle1");
    let engine = registry.get_logger("vehicle1.propulsion");

    println!("1. Logging at different levels (inherited from root):");
    engine.debug("This is a debug message");
    engine.info("This is an info message");
    engine.warn("This is a warning message");
    engine.error("This is an error message");
    engine.fatal("This is a fatal message");

    println!("\n2. Overriding the level on a subtree:");
    vehicle.set_level(Level::Warn);
    clock.advance(1.0, 1.0, 1_000_000_000);
    info!(engine, "Info message (hidden, vehicle1 is at WARN)");
    warn!(engine, "Warning message (visible), thrust at {}%", 87);
    registry.get_logger("vehicle2").info("Info on a sibling tree (visible)");

    println!("\n3. Clearing the override:");
    vehicle.clear_level_override();
    engine.info("Info message (visible again)");

    println!("\n   Filtered on vehicle1.propulsion: {}", engine.dropped_records_count());
    root.flush();

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
