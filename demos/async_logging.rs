//! Async logging example
//!
//! Demonstrates an async pipeline shared by loggers on several threads, and
//! the synchronous flush barrier.
//!
//! Run with: cargo run --example async_logging

use sim_logger::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Sim Logger - Async Logging Example ===\n");

    let console = ConsoleDestination::stdout()
        .with_output_format(OutputFormat::pattern("{met} {level} [{logger}] {msg} {tags}"));

    // Producers never wait on console I/O; they only wait when the queue is full
    let pipeline = Arc::new(
        AsyncPipeline::builder(Arc::new(console))
            .capacity(1000)
            .overflow_policy(OverflowPolicy::Block)
            .max_batch(64)
            .on_overflow(Arc::new(|count| {
                eprintln!("ALERT: {} records dropped", count);
            }))
            .build()?,
    );

    let registry = Arc::new(LoggerRegistry::new());
    registry.root().add_destination(pipeline.clone());

    println!("1. High-throughput async logging:");
    let telemetry = registry.get_logger("telemetry");
    for i in 0..100 {
        telemetry.log(&telemetry.record(Level::Info, format!("Sample #{}", i)).tag("seq", i.to_string()).build());
    }
    pipeline.flush();
    println!("   Logged and flushed 100 records");

    println!("\n2. Multi-threaded logging:");
    let mut handles = vec![];
    for vehicle in 0..5 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            let logger = registry.get_logger(&format!("fleet.vehicle{}", vehicle));
            for i in 0..20 {
                logger.info(format!("Position update {}", i));
                thread::sleep(Duration::from_millis(1));
            }
        }));
    }
    for handle in handles {
        let _ = handle.join();
    }

    // Everything written above is on screen once flush returns
    pipeline.flush();
    println!("   5 threads logged 20 records each");

    let metrics = pipeline.metrics();
    println!(
        "\n   delivered={} dropped={} failures={} flushes={}",
        metrics.delivered_count(),
        metrics.dropped_count(),
        metrics.destination_failures(),
        metrics.flushes_completed()
    );

    println!("\n3. Shutdown:");
    let clean = pipeline.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    println!("   Drain thread finished cleanly: {}", clean);

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
