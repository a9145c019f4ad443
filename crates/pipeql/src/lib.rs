//! # PipeQL
//!
//! An embeddable pipeline query engine for in-memory tabular data.
//!
//! Queries start from a registered table and pipe it through bracketed
//! operations: `?[...]` filters, `![...]` selects, `^[col]`/`v[col]` sort,
//! `@[cols]` groups, `#[n]` limits, and `_[n]` drops leading rows.
//!
//! ## Quick Start
//!
//! ```rust
//! use pipeql::{Engine, TableBuilder};
//!
//! let mut engine = Engine::new();
//! let employees = TableBuilder::new()
//!     .columns(["name", "dept", "salary"])
//!     .row(["alice".into(), "sales".into(), 75000.0.into()])
//!     .row(["bob".into(), "sales".into(), 65000.0.into()])
//!     .row(["carol".into(), "eng".into(), 95000.0.into()])
//!     .build();
//! engine.register_table("employees", employees);
//!
//! let rows = engine.query("employees | ?[salary > 70000] | ^[salary]")?;
//! assert_eq!(rows.len(), 2);
//! println!("{}", pipeql::format_results(&rows));
//! # Ok::<(), pipeql::Error>(())
//! ```
//!
//! ## Aggregation
//!
//! A group operation followed by a select coordinates aggregates per group:
//!
//! ```rust
//! # use pipeql::{Engine, TableBuilder, Value};
//! # let mut engine = Engine::new();
//! # engine.register_table("employees", TableBuilder::new()
//! #     .columns(["dept", "salary"])
//! #     .row(["sales".into(), 75000.0.into()])
//! #     .row(["sales".into(), 65000.0.into()])
//! #     .build());
//! let rows = engine.query("employees | @[dept] | ![dept; avg:avg[salary]; n:count[salary]]")?;
//! assert_eq!(rows[0]["avg"], Value::Number(70000.0));
//! # Ok::<(), pipeql::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod logging;

use indexmap::IndexSet;
use tracing::debug;

// Re-export core types
pub use pipeql_core::query::{
    ColumnSpec, ExecutionPlan, Expression, Operation, Pipeline, PlanNode, QueryContext,
    QueryExecutor, QueryPlanner,
};
pub use pipeql_core::{Error, EvalError, LexError, ParseError, Result, Row, Table, Value};

use pipeql_core::query::Parser;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The main query engine handle.
///
/// Owns the registered tables and serves queries against them. Queries run
/// either directly ([`Engine::query`]) or through the optimizing planner
/// ([`Engine::query_optimized`]); both produce the same rows.
///
/// # Examples
///
/// ```rust
/// use pipeql::{Engine, TableBuilder};
///
/// let mut engine = Engine::new();
/// engine.register_table(
///     "t",
///     TableBuilder::new().columns(["x"]).row([1.0.into()]).build(),
/// );
/// let rows = engine.query("t | ?[x = 1]")?;
/// assert_eq!(rows.len(), 1);
/// # Ok::<(), pipeql::Error>(())
/// ```
pub struct Engine {
    context: QueryContext,
    planner: QueryPlanner,
}

impl Engine {
    /// Creates a new engine with no registered tables.
    pub fn new() -> Self {
        Self {
            context: QueryContext::new(),
            planner: QueryPlanner::new(),
        }
    }

    /// Registers a table, replacing any existing table with the same name.
    pub fn register_table(&mut self, name: impl Into<String>, data: Table) {
        let name = name.into();
        debug!(table = %name, rows = data.len(), "registering table");
        self.context.register_table(name, data);
    }

    /// Parses and executes a query directly, operation by operation.
    pub fn query(&self, query: &str) -> Result<Table> {
        let pipeline = self.parse(query)?;
        let executor = QueryExecutor::new(&self.context);
        Ok(executor.execute(&pipeline)?)
    }

    /// Parses a query, builds an optimized plan, and executes it.
    ///
    /// Returns the result rows together with the executed plan; the plan's
    /// node metadata carries row counts, timings, and selectivities.
    pub fn query_optimized(&self, query: &str) -> Result<(Table, ExecutionPlan)> {
        let pipeline = self.parse(query)?;
        let mut plan = self.planner.create_plan(&pipeline);
        let executor = QueryExecutor::new(&self.context);
        let rows = executor.execute_plan(&mut plan)?;
        Ok((rows, plan))
    }

    /// Builds the optimized execution plan for a query without running it.
    pub fn explain(&self, query: &str) -> Result<ExecutionPlan> {
        let pipeline = self.parse(query)?;
        Ok(self.planner.create_plan(&pipeline))
    }

    /// Access to the underlying query context.
    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    fn parse(&self, query: &str) -> Result<Pipeline> {
        let pipeline = Parser::new(query)?.parse()?;
        debug!(query, pipeline = %pipeline, "parsed query");
        Ok(pipeline)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders result rows as an aligned ASCII table.
///
/// Columns are the union of all row columns in first-seen order. Whole
/// numbers print without a fraction, other numbers with two decimals.
pub fn format_results(results: &Table) -> String {
    if results.is_empty() {
        return "No results".to_string();
    }

    let mut columns: IndexSet<&str> = IndexSet::new();
    for row in results {
        for key in row.keys() {
            columns.insert(key.as_str());
        }
    }

    let cells: Vec<Vec<String>> = results
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| row.get(*col).map_or_else(|| "null".to_string(), format_value))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            cells
                .iter()
                .map(|row| row[i].len())
                .max()
                .unwrap_or(0)
                .max(col.len())
        })
        .collect();

    let mut out = String::new();
    for (col, width) in columns.iter().zip(&widths) {
        out.push_str(&format!("| {:<width$} ", col, width = width));
    }
    out.push_str("|\n");
    for width in &widths {
        out.push_str(&format!("|-{}-", "-".repeat(*width)));
    }
    out.push_str("|\n");
    for row in &cells {
        for (cell, width) in row.iter().zip(&widths) {
            out.push_str(&format!("| {:<width$} ", cell, width = width));
        }
        out.push_str("|\n");
    }
    out
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{:.0}", n),
        Value::Number(n) => format!("{:.2}", n),
        other => other.to_string(),
    }
}

/// Builder for constructing tables row by row.
///
/// Values beyond the declared columns are ignored; missing trailing values
/// leave those columns out of the row.
///
/// # Examples
///
/// ```rust
/// use pipeql::TableBuilder;
///
/// let table = TableBuilder::new()
///     .columns(["name", "score"])
///     .row(["alice".into(), 10.0.into()])
///     .row(["bob".into(), 12.5.into()])
///     .build();
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Default)]
pub struct TableBuilder {
    columns: Vec<String>,
    rows: Table,
}

impl TableBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the column names for subsequent rows.
    pub fn columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(cols.into_iter().map(Into::into));
        self
    }

    /// Appends one row, pairing values with the declared columns in order.
    pub fn row<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let row: Row = self
            .columns
            .iter()
            .cloned()
            .zip(values)
            .collect();
        self.rows.push(row);
        self
    }

    /// Consumes the builder, returning the rows.
    pub fn build(self) -> Table {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_builder_pairs_columns_with_values() {
        let table = TableBuilder::new()
            .columns(["a", "b"])
            .row([1.0.into(), 2.0.into()])
            .row([3.0.into()])
            .build();
        assert_eq!(table[0]["b"], Value::Number(2.0));
        assert_eq!(table[1].len(), 1);
    }

    #[test]
    fn test_format_results_empty() {
        assert_eq!(format_results(&Vec::new()), "No results");
    }

    #[test]
    fn test_format_results_alignment_and_numbers() {
        let table = TableBuilder::new()
            .columns(["name", "salary"])
            .row(["alice".into(), 75000.0.into()])
            .row(["bo".into(), 0.128.into()])
            .build();
        let rendered = format_results(&table);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "| name  | salary |");
        assert_eq!(lines[1], "|-------|--------|");
        assert_eq!(lines[2], "| alice | 75000  |");
        assert_eq!(lines[3], "| bo    | 0.13   |");
    }

    #[test]
    fn test_format_results_union_of_columns() {
        let mut row_a = Row::new();
        row_a.insert("x".to_string(), Value::Number(1.0));
        let mut row_b = Row::new();
        row_b.insert("y".to_string(), Value::Number(2.0));
        let rendered = format_results(&vec![row_a, row_b]);
        assert!(rendered.contains("| x "));
        assert!(rendered.contains("| y "));
        assert!(rendered.contains("null"));
    }
}
