use pipeql::logging::LogConfig;
use pipeql::{Engine, TableBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (debug level with pretty output to stdout)
    let _guard = LogConfig::debug().init();

    println!("=== PipeQL Logging Demo ===\n");

    let mut engine = Engine::new();

    // Registration and query execution emit debug events
    engine.register_table(
        "metrics",
        TableBuilder::new()
            .columns(["host", "cpu"])
            .row(["web-1".into(), 0.42.into()])
            .row(["web-2".into(), 0.91.into()])
            .row(["db-1".into(), 0.35.into()])
            .build(),
    );

    let rows = engine.query("metrics | ?[cpu > 0.5]")?;
    println!("hot hosts: {}", rows.len());

    // Trace level additionally logs per-operation row counts
    // (set RUST_LOG=trace or use LogConfig::trace())

    Ok(())
}
