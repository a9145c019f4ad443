/// Query Engine Demo
///
/// Demonstrates the pipeline query language end to end.
use pipeql::{format_results, Engine, TableBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== PipeQL Query Demo ===\n");

    let mut engine = Engine::new();
    engine.register_table(
        "employees",
        TableBuilder::new()
            .columns(["name", "dept", "salary", "age"])
            .row(["Alice".into(), "sales".into(), 75000.0.into(), 34.0.into()])
            .row(["Bob".into(), "sales".into(), 65000.0.into(), 28.0.into()])
            .row(["Carol".into(), "eng".into(), 95000.0.into(), 41.0.into()])
            .row(["Dave".into(), "eng".into(), 85000.0.into(), 37.0.into()])
            .row(["Erin".into(), "hr".into(), 55000.0.into(), 45.0.into()])
            .build(),
    );

    println!("1. Filter: employees | ?[salary > 70000]");
    let rows = engine.query("employees | ?[salary > 70000]")?;
    println!("{}", format_results(&rows));

    println!("2. Computed columns: employees | ![name; bonus:salary*0.1]");
    let rows = engine.query("employees | ![name; bonus:salary*0.1]")?;
    println!("{}", format_results(&rows));

    println!("3. Top earners: employees | v[salary] | #[3]");
    let rows = engine.query("employees | v[salary] | #[3]")?;
    println!("{}", format_results(&rows));

    println!("4. Compound condition: employees | ?[dept = `eng & age > 38]");
    let rows = engine.query("employees | ?[dept = `eng & age > 38]")?;
    println!("{}", format_results(&rows));

    println!("5. Execution plan:");
    let plan = engine.explain("employees | ![*; b:salary*0.1] | ?[salary > 70000] | #[3]")?;
    println!("{}", plan);

    Ok(())
}
