/// Aggregation Demo
///
/// Demonstrates grouping and per-group aggregates.
use pipeql::{format_results, Engine, TableBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== PipeQL Aggregation Demo ===\n");

    let mut engine = Engine::new();
    engine.register_table(
        "orders",
        TableBuilder::new()
            .columns(["id", "region", "product", "amount"])
            .row([1.0.into(), "west".into(), "widget".into(), 120.0.into()])
            .row([2.0.into(), "west".into(), "gadget".into(), 80.0.into()])
            .row([3.0.into(), "east".into(), "widget".into(), 200.0.into()])
            .row([4.0.into(), "east".into(), "widget".into(), 50.0.into()])
            .row([5.0.into(), "north".into(), "gadget".into(), 300.0.into()])
            .build(),
    );

    println!("1. Revenue by region:");
    let rows = engine.query(
        "orders | @[region] | ![region; total:sum[amount]; mean:avg[amount]; n:count[id]]",
    )?;
    println!("{}", format_results(&rows));

    println!("2. Best region by revenue:");
    let rows =
        engine.query("orders | @[region] | ![region; total:sum[amount]] | v[total] | #[1]")?;
    println!("{}", format_results(&rows));

    println!("3. Region/product breakdown:");
    let rows = engine.query("orders | @[region; product] | ![region; product; n:count[id]]")?;
    println!("{}", format_results(&rows));

    println!("4. Instrumented plan for a grouped query:");
    let (rows, plan) =
        engine.query_optimized("orders | ?[amount >= 100] | @[region] | ![region; n:count[id]]")?;
    println!("{}", format_results(&rows));
    println!("{}", plan);

    Ok(())
}
