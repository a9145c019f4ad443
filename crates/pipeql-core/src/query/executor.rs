//! Pipeline and plan execution.
//!
//! Both entry points share one set of operation implementations, so a query
//! produces the same rows whether it runs directly or through an optimized
//! plan. Grouping never touches shared state: when a group operation is
//! immediately followed by a select, the executor materializes the groups and
//! hands each group's rows to the projection by argument.

use std::time::Instant;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::EvalError;
use crate::value::{Row, Table, Value};

use super::ast::{BinaryOperator, ColumnSpec, Expression, Operation, Pipeline, UnaryOperator};
use super::context::QueryContext;
use super::functions::is_aggregate;
use super::planner::{ExecutionPlan, NodeKind, PlanNode};

/// Name given to an unaliased select column that is not a plain variable.
/// Grouped projections are the exception: there an unaliased aggregate call
/// takes the function's name.
const PLACEHOLDER_COLUMN: &str = "col";

/// Executes pipelines and plans against a [`QueryContext`].
pub struct QueryExecutor<'a> {
    context: &'a QueryContext,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(context: &'a QueryContext) -> Self {
        Self { context }
    }

    /// Run a pipeline operation by operation.
    pub fn execute(&self, pipeline: &Pipeline) -> Result<Table, EvalError> {
        debug!(
            table = %pipeline.table_name,
            operations = pipeline.operations.len(),
            "executing pipeline"
        );
        let mut rows = self.context.table(&pipeline.table_name)?.clone();

        let ops = &pipeline.operations;
        let mut i = 0;
        while i < ops.len() {
            if let Operation::Group(columns) = &ops[i] {
                let groups = build_groups(&rows, columns);
                if let Some(Operation::Select(specs)) = ops.get(i + 1) {
                    rows = self.grouped_select(specs, &groups)?;
                    i += 2;
                } else {
                    rows = summary_rows(&groups, columns);
                    i += 1;
                }
                continue;
            }
            rows = self.apply(&ops[i], rows)?;
            i += 1;
        }
        Ok(rows)
    }

    /// Run an optimized plan, recording per-node row counts and timings into
    /// node metadata.
    pub fn execute_plan(&self, plan: &mut ExecutionPlan) -> Result<Table, EvalError> {
        debug!(table = %plan.table_name, "executing plan");
        let mut rows = self.context.table(&plan.table_name)?.clone();

        let mut node = &mut plan.root;
        loop {
            if node.children.is_empty() {
                break;
            }
            let fused = node.children[0].kind == NodeKind::Group
                && node.children[0]
                    .children
                    .first()
                    .is_some_and(|g| g.kind == NodeKind::Select);

            let parent = node;
            if fused {
                rows = self.run_fused_group_select(&mut parent.children[0], rows)?;
                node = &mut parent.children[0].children[0];
            } else {
                rows = self.run_plan_node(&mut parent.children[0], rows)?;
                node = &mut parent.children[0];
            }
        }
        Ok(rows)
    }

    fn run_plan_node(&self, node: &mut PlanNode, rows: Table) -> Result<Table, EvalError> {
        let Some(op) = node.operation.clone() else {
            return Ok(rows);
        };
        let input = rows.len();
        let start = Instant::now();
        let rows = match &op {
            Operation::Group(columns) => {
                let groups = build_groups(&rows, columns);
                summary_rows(&groups, columns)
            }
            other => self.apply(other, rows)?,
        };
        record_node(node, input, rows.len(), start);
        Ok(rows)
    }

    fn run_fused_group_select(
        &self,
        group_node: &mut PlanNode,
        rows: Table,
    ) -> Result<Table, EvalError> {
        let Some(Operation::Group(columns)) = group_node.operation.clone() else {
            return self.run_plan_node(group_node, rows);
        };
        let Some(Operation::Select(specs)) = group_node.children[0].operation.clone() else {
            return self.run_plan_node(group_node, rows);
        };

        let input = rows.len();
        let start = Instant::now();
        let groups = build_groups(&rows, &columns);
        record_node(group_node, input, groups.len(), start);

        let start = Instant::now();
        let result = self.grouped_select(&specs, &groups)?;
        record_node(&mut group_node.children[0], groups.len(), result.len(), start);
        Ok(result)
    }

    fn apply(&self, op: &Operation, rows: Table) -> Result<Table, EvalError> {
        trace!(operation = %op, input_rows = rows.len(), "applying operation");
        match op {
            Operation::Filter(condition) => {
                let mut out = Vec::new();
                for row in rows {
                    if self.eval(condition, &row)? == Value::Bool(true) {
                        out.push(row);
                    }
                }
                Ok(out)
            }
            Operation::Select(specs) => {
                let mut out = Vec::with_capacity(rows.len());
                for row in &rows {
                    let mut new_row = Row::new();
                    for spec in specs {
                        match spec {
                            ColumnSpec::Wildcard => {
                                new_row.extend(row.clone());
                            }
                            ColumnSpec::Expr { alias, expr } => {
                                let value = self.eval(expr, row)?;
                                new_row.insert(column_name(alias, expr), value);
                            }
                        }
                    }
                    out.push(new_row);
                }
                Ok(out)
            }
            Operation::Sort { column, ascending } => {
                let mut out = rows;
                out.sort_by(|a, b| {
                    let av = a.get(column).filter(|v| !v.is_null());
                    let bv = b.get(column).filter(|v| !v.is_null());
                    let ord = match (av, bv) {
                        (None, None) => std::cmp::Ordering::Equal,
                        // nulls sort as the minimum value
                        (None, Some(_)) => std::cmp::Ordering::Less,
                        (Some(_), None) => std::cmp::Ordering::Greater,
                        (Some(a), Some(b)) => a.compare(b),
                    };
                    if *ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                });
                Ok(out)
            }
            Operation::Group(columns) => {
                let groups = build_groups(&rows, columns);
                Ok(summary_rows(&groups, columns))
            }
            Operation::Limit(n) => {
                let mut out = rows;
                if *n >= 0 {
                    out.truncate(*n as usize);
                } else {
                    let keep = (-*n) as usize;
                    let start = out.len().saturating_sub(keep);
                    out.drain(..start);
                }
                Ok(out)
            }
            Operation::Drop(n) => {
                let mut out = rows;
                let count = (*n).max(0) as usize;
                out.drain(..count.min(out.len()));
                Ok(out)
            }
        }
    }

    /// Project grouped rows: one output row per group, with aggregate calls
    /// evaluated over the group's rows and everything else evaluated against
    /// the group's first row.
    fn grouped_select(
        &self,
        specs: &[ColumnSpec],
        groups: &IndexMap<String, Vec<Row>>,
    ) -> Result<Table, EvalError> {
        let mut out = Vec::with_capacity(groups.len());
        for group in groups.values() {
            // groups are built from rows, so each holds at least one
            let first = &group[0];
            let mut row = Row::new();
            for spec in specs {
                match spec {
                    ColumnSpec::Wildcard => {
                        row.extend(first.clone());
                    }
                    ColumnSpec::Expr {
                        alias,
                        expr: Expression::FunctionCall { name, args },
                    } => {
                        let value = self.eval_group_function(name, args, group)?;
                        let col = alias.clone().unwrap_or_else(|| name.clone());
                        row.insert(col, value);
                    }
                    ColumnSpec::Expr { alias, expr } => {
                        let value = self.eval(expr, first)?;
                        row.insert(column_name(alias, expr), value);
                    }
                }
            }
            out.push(row);
        }
        Ok(out)
    }

    fn eval_group_function(
        &self,
        name: &str,
        args: &[Expression],
        group: &[Row],
    ) -> Result<Value, EvalError> {
        if !is_aggregate(name) {
            // Ordinary function: arguments see the group's first row.
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(self.eval(arg, &group[0])?);
            }
            return self.context.functions().call(name, &values);
        }

        match name.to_lowercase().as_str() {
            "count" => Ok(Value::Number(group.len() as f64)),
            "first" => match args.first() {
                Some(arg) => self.eval(arg, &group[0]),
                None => Ok(Value::Null),
            },
            "last" => match args.first() {
                Some(arg) => self.eval(arg, &group[group.len() - 1]),
                None => Ok(Value::Null),
            },
            agg => {
                let Some(arg) = args.first() else {
                    return Ok(Value::Null);
                };
                let mut nums = Vec::new();
                for row in group {
                    if let Value::Number(n) = self.eval(arg, row)? {
                        nums.push(n);
                    }
                }
                if nums.is_empty() {
                    return Ok(Value::Null);
                }
                let result = match agg {
                    "sum" => nums.iter().sum(),
                    "avg" => nums.iter().sum::<f64>() / nums.len() as f64,
                    "min" => nums.iter().cloned().fold(f64::INFINITY, f64::min),
                    _ => nums.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                };
                Ok(Value::Number(result))
            }
        }
    }

    /// Evaluate a scalar expression against one row.
    pub fn eval(&self, expr: &Expression, row: &Row) -> Result<Value, EvalError> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Variable(name) => Ok(resolve_variable(name, row)),
            Expression::BinaryOp { op, left, right } => {
                let lhs = self.eval(left, row)?;
                let rhs = self.eval(right, row)?;
                self.eval_binary(*op, lhs, rhs)
            }
            Expression::UnaryOp { op, expr } => {
                let value = self.eval(expr, row)?;
                match op {
                    UnaryOperator::Not => Ok(Value::Bool(!value.truthy())),
                    UnaryOperator::Negate => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(EvalError::NegateNonNumber(other.to_string())),
                    },
                }
            }
            Expression::FunctionCall { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, row)?);
                }
                self.context.functions().call(name, &values)
            }
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOperator,
        lhs: Value,
        rhs: Value,
    ) -> Result<Value, EvalError> {
        // Null operands: equality degrades to identity, everything else is
        // absorbed into null.
        if lhs.is_null() || rhs.is_null() {
            return Ok(match op {
                BinaryOperator::Eq => Value::Bool(lhs.is_null() && rhs.is_null()),
                BinaryOperator::Ne => Value::Bool(!(lhs.is_null() && rhs.is_null())),
                _ => Value::Null,
            });
        }

        match op {
            BinaryOperator::Add => Ok(Value::Number(lhs.to_number()? + rhs.to_number()?)),
            BinaryOperator::Sub => Ok(Value::Number(lhs.to_number()? - rhs.to_number()?)),
            BinaryOperator::Mul => Ok(Value::Number(lhs.to_number()? * rhs.to_number()?)),
            BinaryOperator::Div => Ok(Value::Number(lhs.to_number()? / rhs.to_number()?)),
            BinaryOperator::Eq => Ok(Value::Bool(lhs == rhs)),
            BinaryOperator::Ne => Ok(Value::Bool(lhs != rhs)),
            BinaryOperator::Lt => Ok(Value::Bool(lhs.compare(&rhs).is_lt())),
            BinaryOperator::Gt => Ok(Value::Bool(lhs.compare(&rhs).is_gt())),
            BinaryOperator::Le => Ok(Value::Bool(lhs.compare(&rhs).is_le())),
            BinaryOperator::Ge => Ok(Value::Bool(lhs.compare(&rhs).is_ge())),
            BinaryOperator::And => Ok(Value::Bool(lhs.truthy() && rhs.truthy())),
            BinaryOperator::Or => Ok(Value::Bool(lhs.truthy() || rhs.truthy())),
        }
    }
}

/// A dotted name falls back to its field part when the full name is absent.
fn resolve_variable(name: &str, row: &Row) -> Value {
    if let Some(value) = row.get(name) {
        return value.clone();
    }
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() == 2 {
        if let Some(value) = row.get(parts[1]) {
            return value.clone();
        }
    }
    Value::Null
}

fn column_name(alias: &Option<String>, expr: &Expression) -> String {
    if let Some(alias) = alias {
        return alias.clone();
    }
    match expr {
        Expression::Variable(name) => name.clone(),
        _ => PLACEHOLDER_COLUMN.to_string(),
    }
}

/// Group rows by the `|`-joined rendering of their group-by values, in
/// first-seen order. Distinct values rendering identically would collide;
/// callers accept that for display-oriented data.
fn build_groups(rows: &Table, columns: &[String]) -> IndexMap<String, Vec<Row>> {
    let mut groups: IndexMap<String, Vec<Row>> = IndexMap::new();
    for row in rows {
        let key = columns
            .iter()
            .map(|col| row.get(col).cloned().unwrap_or(Value::Null).to_string())
            .collect::<Vec<_>>()
            .join("|");
        groups.entry(key).or_default().push(row.clone());
    }
    groups
}

/// One row per group carrying only the group-by columns.
fn summary_rows(groups: &IndexMap<String, Vec<Row>>, columns: &[String]) -> Table {
    groups
        .values()
        .map(|group| {
            let first = &group[0];
            columns
                .iter()
                .map(|col| {
                    (
                        col.clone(),
                        first.get(col).cloned().unwrap_or(Value::Null),
                    )
                })
                .collect()
        })
        .collect()
}

fn record_node(node: &mut PlanNode, input: usize, output: usize, start: Instant) {
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    node.metadata
        .insert("input_rows".to_string(), Value::Number(input as f64));
    node.metadata
        .insert("output_rows".to_string(), Value::Number(output as f64));
    node.metadata
        .insert("execution_time_ms".to_string(), Value::Number(elapsed_ms));
    let selectivity = if input > 0 {
        output as f64 / input as f64
    } else {
        1.0
    };
    node.metadata
        .insert("selectivity".to_string(), Value::Number(selectivity));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::Parser;
    use crate::query::planner::QueryPlanner;

    fn row(cells: &[(&str, Value)]) -> Row {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn employees() -> Table {
        vec![
            row(&[
                ("name", "alice".into()),
                ("dept", "sales".into()),
                ("salary", 75000.0.into()),
            ]),
            row(&[
                ("name", "bob".into()),
                ("dept", "sales".into()),
                ("salary", 65000.0.into()),
            ]),
            row(&[
                ("name", "carol".into()),
                ("dept", "eng".into()),
                ("salary", 95000.0.into()),
            ]),
        ]
    }

    fn context() -> QueryContext {
        let mut ctx = QueryContext::new();
        ctx.register_table("t", employees());
        ctx
    }

    fn run(ctx: &QueryContext, query: &str) -> Table {
        let pipeline = Parser::new(query).unwrap().parse().unwrap();
        QueryExecutor::new(ctx).execute(&pipeline).unwrap()
    }

    fn run_plan(ctx: &QueryContext, query: &str) -> (Table, ExecutionPlan) {
        let pipeline = Parser::new(query).unwrap().parse().unwrap();
        let mut plan = QueryPlanner::new().create_plan(&pipeline);
        let rows = QueryExecutor::new(ctx).execute_plan(&mut plan).unwrap();
        (rows, plan)
    }

    #[test]
    fn test_filter_keeps_matching_rows() {
        let ctx = context();
        let rows = run(&ctx, "t | ?[salary > 80000]");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "carol".into());
    }

    #[test]
    fn test_filter_result_is_subset() {
        let ctx = context();
        let rows = run(&ctx, "t | ?[salary > 0]");
        assert_eq!(rows, employees());
    }

    #[test]
    fn test_filter_requires_exact_true() {
        // A numeric condition is truthy but not Bool(true), so nothing passes.
        let ctx = context();
        let rows = run(&ctx, "t | ?[salary]");
        assert!(rows.is_empty());
    }

    #[test]
    fn test_select_aliases_and_placeholder() {
        let ctx = context();
        let rows = run(&ctx, "t | ![name; bonus:salary*0.1; total:salary+1000]");
        assert_eq!(rows[0]["name"], "alice".into());
        assert_eq!(rows[0]["bonus"], Value::Number(7500.0));
        assert_eq!(rows[0]["total"], Value::Number(76000.0));
    }

    #[test]
    fn test_unaliased_expression_gets_placeholder_name() {
        let ctx = context();
        let rows = run(&ctx, "t | ![salary*2]");
        assert_eq!(rows[0]["col"], Value::Number(150000.0));
    }

    #[test]
    fn test_unaliased_function_call_gets_placeholder_name() {
        // Outside a grouped projection, a bare call lands in the placeholder
        // column like any other expression.
        let ctx = context();
        let rows = run(&ctx, "t | ![upper[name]]");
        assert_eq!(rows[0]["col"], "ALICE".into());
        assert!(!rows[0].contains_key("upper"));
    }

    #[test]
    fn test_wildcard_merge_and_overwrite() {
        let ctx = context();
        let rows = run(&ctx, "t | ![*; salary:salary+1]");
        assert_eq!(rows[0]["salary"], Value::Number(75001.0));
        assert_eq!(rows[0]["name"], "alice".into());
        // overwrite happens in place, order preserved
        assert_eq!(rows[0].get_index(2).unwrap().0, "salary");
    }

    #[test]
    fn test_sort_ascending_and_descending() {
        let ctx = context();
        let asc = run(&ctx, "t | ^[salary]");
        let salaries: Vec<_> = asc.iter().map(|r| r["salary"].clone()).collect();
        assert_eq!(
            salaries,
            vec![
                Value::Number(65000.0),
                Value::Number(75000.0),
                Value::Number(95000.0)
            ]
        );

        let desc = run(&ctx, "t | v[salary] | #[2]");
        assert_eq!(desc[0]["salary"], Value::Number(95000.0));
        assert_eq!(desc[1]["salary"], Value::Number(75000.0));
    }

    #[test]
    fn test_sort_null_relocation() {
        let mut ctx = QueryContext::new();
        ctx.register_table(
            "t",
            vec![
                row(&[("x", 2.0.into())]),
                row(&[("x", Value::Null)]),
                row(&[("x", 1.0.into())]),
            ],
        );
        let asc = run(&ctx, "t | ^[x]");
        assert_eq!(asc[0]["x"], Value::Null);
        assert_eq!(asc[2]["x"], Value::Number(2.0));

        let desc = run(&ctx, "t | v[x]");
        assert_eq!(desc[0]["x"], Value::Number(2.0));
        assert_eq!(desc[2]["x"], Value::Null);
    }

    #[test]
    fn test_sort_idempotence() {
        let ctx = context();
        let once = run(&ctx, "t | ^[salary]");
        let twice = run(&ctx, "t | ^[salary] | ^[salary]");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_limit_and_drop_boundaries() {
        let ctx = context();
        assert!(run(&ctx, "t | #[0]").is_empty());
        assert_eq!(run(&ctx, "t | #[10]").len(), 3);
        assert_eq!(run(&ctx, "t | _[2]").len(), 1);
        assert!(run(&ctx, "t | _[5]").is_empty());
    }

    #[test]
    fn test_negative_limit_takes_tail() {
        let ctx = context();
        let rows = run(&ctx, "t | #[-2]");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "bob".into());
        assert_eq!(rows[1]["name"], "carol".into());

        let all = run(&ctx, "t | #[-10]");
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_group_summary_rows() {
        let ctx = context();
        let rows = run(&ctx, "t | @[dept]");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], row(&[("dept", "sales".into())]));
        assert_eq!(rows[1], row(&[("dept", "eng".into())]));
    }

    #[test]
    fn test_group_aggregate_select() {
        let ctx = context();
        let rows = run(&ctx, "t | @[dept] | ![dept; avg:avg[salary]; cnt:count[id]]");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["dept"], "sales".into());
        assert_eq!(rows[0]["avg"], Value::Number(70000.0));
        assert_eq!(rows[0]["cnt"], Value::Number(2.0));
        assert_eq!(rows[1]["dept"], "eng".into());
        assert_eq!(rows[1]["avg"], Value::Number(95000.0));
        assert_eq!(rows[1]["cnt"], Value::Number(1.0));
    }

    #[test]
    fn test_group_aggregates_min_max_sum_first_last() {
        let ctx = context();
        let rows = run(
            &ctx,
            "t | @[dept] | ![dept; lo:min[salary]; hi:max[salary]; all:sum[salary]; f:first[name]; l:last[name]]",
        );
        assert_eq!(rows[0]["lo"], Value::Number(65000.0));
        assert_eq!(rows[0]["hi"], Value::Number(75000.0));
        assert_eq!(rows[0]["all"], Value::Number(140000.0));
        assert_eq!(rows[0]["f"], "alice".into());
        assert_eq!(rows[0]["l"], "bob".into());
    }

    #[test]
    fn test_group_aggregate_no_numeric_values_yields_null() {
        let ctx = context();
        let rows = run(&ctx, "t | @[dept] | ![dept; m:min[name]]");
        assert_eq!(rows[0]["m"], Value::Null);
    }

    #[test]
    fn test_group_wildcard_copies_first_row() {
        let ctx = context();
        let rows = run(&ctx, "t | @[dept] | ![*; cnt:count[id]]");
        assert_eq!(rows[0]["name"], "alice".into());
        assert_eq!(rows[0]["cnt"], Value::Number(2.0));
    }

    #[test]
    fn test_group_non_aggregate_function_uses_first_row() {
        let ctx = context();
        let rows = run(&ctx, "t | @[dept] | ![dept; u:upper[name]]");
        assert_eq!(rows[0]["u"], "ALICE".into());
    }

    #[test]
    fn test_both_routes_agree_on_aggregates() {
        let ctx = context();
        let query = "t | @[dept] | ![dept; avg:avg[salary]; cnt:count[id]]";
        let direct = run(&ctx, query);
        let (planned, _) = run_plan(&ctx, query);
        assert_eq!(direct, planned);
    }

    #[test]
    fn test_both_routes_agree_after_rewrites() {
        let ctx = context();
        let query = "t | ?[salary > 60000] | ?[dept = `sales] | #[10] | #[1]";
        let direct = run(&ctx, query);
        let (planned, _) = run_plan(&ctx, query);
        assert_eq!(direct, planned);
        assert_eq!(planned.len(), 1);
    }

    #[test]
    fn test_routes_agree_when_filter_follows_aggregate_select() {
        let ctx = context();
        let query = "t | @[dept] | ![*; n:count[id]] | ?[n > 1]";
        let direct = run(&ctx, query);
        let (planned, _) = run_plan(&ctx, query);
        assert_eq!(direct, planned);
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0]["dept"], "sales".into());
    }

    #[test]
    fn test_routes_agree_when_filter_reads_select_alias() {
        // b only exists after the projection, so the plan must keep the
        // filter downstream of the select.
        let ctx = context();
        let query = "t | ![*; b:salary*0.1] | ?[b > 7000]";
        let direct = run(&ctx, query);
        let (planned, _) = run_plan(&ctx, query);
        assert_eq!(direct, planned);
        assert_eq!(direct.len(), 2);
    }

    #[test]
    fn test_routes_agree_when_select_overwrites_filtered_column() {
        let ctx = context();
        let query = "t | ![*; salary:salary%1000] | ?[salary > 70]";
        let direct = run(&ctx, query);
        let (planned, _) = run_plan(&ctx, query);
        assert_eq!(direct, planned);
        assert_eq!(direct.len(), 2);
        assert_eq!(direct[0]["salary"], Value::Number(75.0));
        assert_eq!(direct[1]["salary"], Value::Number(95.0));
    }

    #[test]
    fn test_plan_route_records_instrumentation() {
        let ctx = context();
        let (_, plan) = run_plan(&ctx, "t | ?[salary > 80000]");
        let filter = &plan.root.children[0];
        assert_eq!(filter.metadata["input_rows"], Value::Number(3.0));
        assert_eq!(filter.metadata["output_rows"], Value::Number(1.0));
        assert!(matches!(
            filter.metadata["selectivity"],
            Value::Number(s) if (s - 1.0 / 3.0).abs() < 1e-9
        ));
        assert!(filter.metadata.contains_key("execution_time_ms"));
    }

    #[test]
    fn test_selectivity_is_one_on_empty_input() {
        let mut ctx = QueryContext::new();
        ctx.register_table("t", Vec::new());
        let (_, plan) = run_plan(&ctx, "t | ?[x > 1]");
        assert_eq!(
            plan.root.children[0].metadata["selectivity"],
            Value::Number(1.0)
        );
    }

    #[test]
    fn test_missing_column_is_null() {
        let ctx = context();
        let rows = run(&ctx, "t | ![ghost]");
        assert_eq!(rows[0]["ghost"], Value::Null);
    }

    #[test]
    fn test_dotted_variable_falls_back_to_field() {
        let ctx = context();
        let rows = run(&ctx, "t | ?[t.salary > 80000]");
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_null_equality_is_identity() {
        let ctx = context();
        let exec = QueryExecutor::new(&ctx);
        let r = row(&[("x", Value::Null)]);

        let eq = Parser::new("q | ?[x = missing]").unwrap().parse().unwrap();
        let Operation::Filter(cond) = &eq.operations[0] else {
            panic!()
        };
        assert_eq!(exec.eval(cond, &r).unwrap(), Value::Bool(true));

        let ne = Parser::new("q | ?[x <> 1]").unwrap().parse().unwrap();
        let Operation::Filter(cond) = &ne.operations[0] else {
            panic!()
        };
        assert_eq!(exec.eval(cond, &r).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_null_arithmetic_is_null() {
        let ctx = context();
        let rows = run(&ctx, "t | ![x:ghost + 1]");
        assert_eq!(rows[0]["x"], Value::Null);
    }

    #[test]
    fn test_arithmetic_coerces_numeric_text() {
        let mut ctx = QueryContext::new();
        ctx.register_table("t", vec![row(&[("x", "41".into())])]);
        let rows = run(&ctx, "t | ![y:x + 1]");
        assert_eq!(rows[0]["y"], Value::Number(42.0));
    }

    #[test]
    fn test_division_uses_percent() {
        let ctx = context();
        let rows = run(&ctx, "t | ![half:salary % 2]");
        assert_eq!(rows[0]["half"], Value::Number(37500.0));
    }

    #[test]
    fn test_negate_non_number_errors() {
        let mut ctx = QueryContext::new();
        ctx.register_table("t", vec![row(&[("x", "abc".into())])]);
        let pipeline = Parser::new("t | ![y:-x]").unwrap().parse().unwrap();
        let err = QueryExecutor::new(&ctx).execute(&pipeline).unwrap_err();
        assert_eq!(err, EvalError::NegateNonNumber("abc".to_string()));
    }

    #[test]
    fn test_unknown_table() {
        let ctx = QueryContext::new();
        let pipeline = Parser::new("ghost | #[1]").unwrap().parse().unwrap();
        let err = QueryExecutor::new(&ctx).execute(&pipeline).unwrap_err();
        assert_eq!(err, EvalError::UnknownTable("ghost".to_string()));
    }

    #[test]
    fn test_scenario_single_filter() {
        let mut ctx = QueryContext::new();
        ctx.register_table(
            "t",
            vec![
                row(&[("salary", 75000.0.into())]),
                row(&[("salary", 95000.0.into())]),
                row(&[("salary", 68000.0.into())]),
            ],
        );
        let rows = run(&ctx, "t | ?[salary > 80000]");
        assert_eq!(rows, vec![row(&[("salary", 95000.0.into())])]);
    }
}
