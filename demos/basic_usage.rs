//! Basic logger usage example
//!
//! Demonstrates message templates, automatic and manual send modes, scopes and
//! a JSON-configured level gate writing to the console sink.
//!
//! Run with: cargo run --example basic_usage

use rust_template_logger::prelude::*;
use rust_template_logger::{debug, info, warn};
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Rust Template Logger - Basic Usage Example ===\n");

    let emitter = Arc::new(ChannelEmitter::builder().sink(ConsoleSink::new()).build()?);

    let gate = LevelGateHandle::from_config(&LevelGateConfig::from_json(
        r#"{
            "minimum": "Information",
            "namespaces": { "demo::db::*": "Debug" }
        }"#,
    )?)?;

    let api = Logger::builder()
        .category("demo::api")
        .gate(gate.clone())
        .emitter(emitter.clone())
        .build()?;

    println!("1. Templates and destructuring:");
    info!(api, "User {Name} logged in from {@Location}", "alice", Value::structure([("city", "NYC"), ("zip", "10001")]));
    info!(api, "{0} plus {1}", vec![2, 3]);
    info!(api, "Request took {Elapsed:.2} ms with status {Status,5}", 12.3456, 200);
    debug!(api, "Hidden: demo::api only enables Info and above");

    println!("\n2. Scopes:");
    {
        let _request = api.begin_scope(LogContext::new().with_field("RequestId", "req-42"));
        warn!(api, "Slow upstream {Upstream}", "billing");
    }

    println!("\n3. Manual transaction:");
    let db = Logger::builder()
        .category("demo::db::migrations")
        .gate(gate)
        .send_mode(SendMode::Manual)
        .emitter(emitter.clone())
        .build()?;
    for step in 1..=3 {
        debug!(db, "Applied migration {Step}", step);
    }
    println!("   {} events pending before submit", db.pending_manual());
    db.submit();

    emitter.wait_idle(DEFAULT_SHUTDOWN_TIMEOUT);
    emitter.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
