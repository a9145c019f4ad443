//! Query planning and plan-level rewrites.
//!
//! A plan is a linear chain of [`PlanNode`]s rooted at a table scan; each
//! child is the operation that runs after its parent. Four rewrite passes run
//! in a fixed order, then summary statistics are attached to the plan. The
//! executor later fills per-node metadata with row counts and timings.

use std::fmt;

use indexmap::IndexMap;

use crate::value::Value;

use super::ast::{BinaryOperator, ColumnSpec, Expression, Operation, Pipeline};

/// What a plan node does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    TableScan,
    Filter,
    Select,
    Sort,
    Group,
    Limit,
    Drop,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::TableScan => "TableScan",
            NodeKind::Filter => "Filter",
            NodeKind::Select => "Select",
            NodeKind::Sort => "Sort",
            NodeKind::Group => "Group",
            NodeKind::Limit => "Limit",
            NodeKind::Drop => "Drop",
        };
        write!(f, "{}", s)
    }
}

/// One node in the execution plan chain.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanNode {
    pub kind: NodeKind,
    /// The operation to run; `None` for the table scan.
    pub operation: Option<Operation>,
    /// Rewrite tags and, after execution, instrumentation values.
    pub metadata: IndexMap<String, Value>,
    /// At most one child: the next operation downstream.
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    fn new(kind: NodeKind, operation: Option<Operation>) -> Self {
        Self {
            kind,
            operation,
            metadata: IndexMap::new(),
            children: Vec::new(),
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        for _ in 0..indent {
            write!(f, "  ")?;
        }
        write!(f, "{}", self.kind)?;
        if let Some(op) = &self.operation {
            write!(f, ": {}", op)?;
        }
        if !self.metadata.is_empty() {
            write!(f, " {{")?;
            for (i, (key, value)) in self.metadata.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            write!(f, "}}")?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.fmt_indented(f, indent + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// An optimized, executable plan with summary statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub table_name: String,
    pub root: PlanNode,
    pub statistics: IndexMap<String, Value>,
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Execution Plan for table: {}", self.table_name)?;
        writeln!(f, "─────────────────────────────────────")?;
        self.root.fmt_indented(f, 0)?;
        if !self.statistics.is_empty() {
            writeln!(f, "\nStatistics:")?;
            for (key, value) in &self.statistics {
                writeln!(f, "  {}: {}", key, value)?;
            }
        }
        Ok(())
    }
}

/// Builds and optimizes execution plans.
pub struct QueryPlanner;

impl QueryPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Build the plan chain for a pipeline and run all rewrite passes.
    pub fn create_plan(&self, pipeline: &Pipeline) -> ExecutionPlan {
        let mut root = PlanNode::new(NodeKind::TableScan, None);
        root.metadata.insert(
            "table".to_string(),
            Value::Text(pipeline.table_name.clone()),
        );

        // Chain the operations under the scan, nose to tail.
        let mut chain: Option<PlanNode> = None;
        for op in pipeline.operations.iter().rev() {
            let mut node = Self::plan_node(op);
            if let Some(next) = chain.take() {
                node.children.push(next);
            }
            chain = Some(node);
        }
        if let Some(first) = chain {
            root.children.push(first);
        }

        let root = Self::push_down_filters(root);
        let root = Self::combine_filters(root);
        let root = Self::merge_limits(root);
        let root = Self::remove_redundant(root);

        let mut plan = ExecutionPlan {
            table_name: pipeline.table_name.clone(),
            root,
            statistics: IndexMap::new(),
        };
        Self::analyze_statistics(&mut plan);
        plan
    }

    fn plan_node(op: &Operation) -> PlanNode {
        let kind = match op {
            Operation::Filter(_) => NodeKind::Filter,
            Operation::Select(_) => NodeKind::Select,
            Operation::Sort { .. } => NodeKind::Sort,
            Operation::Group(_) => NodeKind::Group,
            Operation::Limit(_) => NodeKind::Limit,
            Operation::Drop(_) => NodeKind::Drop,
        };
        PlanNode::new(kind, Some(op.clone()))
    }

    /// Move filters toward the scan: a wildcard select followed by a filter
    /// swaps with it, so the filter runs on unprojected rows first. The swap
    /// is skipped when it would change results: a select without a wildcard
    /// may drop the filtered column, a select directly under a group is an
    /// aggregate projection, and a filter that reads a column the select
    /// itself produces must stay downstream of it.
    fn push_down_filters(mut node: PlanNode) -> PlanNode {
        node.children = node
            .children
            .into_iter()
            .map(Self::push_down_filters)
            .collect();

        let swappable = node.kind != NodeKind::Group
            && node.children.first().is_some_and(|c| {
                c.kind == NodeKind::Select
                    && Self::select_has_wildcard(c)
                    && c.children
                        .first()
                        .is_some_and(|g| g.kind == NodeKind::Filter)
                    && !Self::filter_reads_select_output(&c.children[0], c)
            });
        if swappable {
            let mut select = node.children.remove(0);
            let mut filter = select.children.remove(0);
            select.children = std::mem::take(&mut filter.children);
            filter.children.push(select);
            node.children.push(filter);
        }
        node
    }

    fn select_has_wildcard(node: &PlanNode) -> bool {
        match &node.operation {
            Some(Operation::Select(specs)) => specs.iter().any(ColumnSpec::is_wildcard),
            _ => false,
        }
    }

    /// Whether the filter condition references any column the select defines
    /// or overwrites. Unaliased plain variables only copy an existing column,
    /// so they do not count.
    fn filter_reads_select_output(filter: &PlanNode, select: &PlanNode) -> bool {
        let Some(Operation::Filter(condition)) = &filter.operation else {
            return false;
        };
        let Some(Operation::Select(specs)) = &select.operation else {
            return false;
        };

        let outputs: Vec<&str> = specs
            .iter()
            .filter_map(|spec| match spec {
                ColumnSpec::Wildcard => None,
                ColumnSpec::Expr {
                    alias: Some(alias), ..
                } => Some(alias.as_str()),
                ColumnSpec::Expr { alias: None, expr } => match expr {
                    Expression::Variable(_) => None,
                    _ => Some("col"),
                },
            })
            .collect();
        if outputs.is_empty() {
            return false;
        }

        let mut vars = Vec::new();
        collect_variables(condition, &mut vars);
        vars.iter().any(|v| outputs.contains(&v.as_str()))
    }

    /// Merge directly adjacent filters into one AND filter.
    fn combine_filters(mut node: PlanNode) -> PlanNode {
        node.children = node
            .children
            .into_iter()
            .map(Self::combine_filters)
            .collect();

        if node.kind == NodeKind::Filter
            && node
                .children
                .first()
                .is_some_and(|c| c.kind == NodeKind::Filter)
        {
            let mut child = node.children.remove(0);
            let (Some(Operation::Filter(outer)), Some(Operation::Filter(inner))) =
                (node.operation.take(), child.operation.take())
            else {
                unreachable!("filter nodes always carry filter operations");
            };

            let combined = Expression::BinaryOp {
                op: BinaryOperator::And,
                left: Box::new(outer),
                right: Box::new(inner),
            };
            let mut merged = PlanNode::new(NodeKind::Filter, Some(Operation::Filter(combined)));
            merged
                .metadata
                .insert("optimized".to_string(), Value::Text("combined_filters".into()));
            merged.children = std::mem::take(&mut child.children);
            return merged;
        }
        node
    }

    /// Collapse adjacent non-negative limits into the smaller one. Negative
    /// limits take from the tail, so they never merge.
    fn merge_limits(mut node: PlanNode) -> PlanNode {
        node.children = node.children.into_iter().map(Self::merge_limits).collect();

        if node.kind == NodeKind::Limit
            && node
                .children
                .first()
                .is_some_and(|c| c.kind == NodeKind::Limit)
        {
            let (Some(Operation::Limit(a)), Some(Operation::Limit(b))) = (
                node.operation.as_ref().cloned(),
                node.children[0].operation.as_ref().cloned(),
            ) else {
                unreachable!("limit nodes always carry limit operations");
            };

            if a >= 0 && b >= 0 {
                let mut child = node.children.remove(0);
                let mut merged =
                    PlanNode::new(NodeKind::Limit, Some(Operation::Limit(a.min(b))));
                merged
                    .metadata
                    .insert("optimized".to_string(), Value::Text("combined_limits".into()));
                merged.children = std::mem::take(&mut child.children);
                return merged;
            }
        }
        node
    }

    /// Drop nodes that skip zero rows do nothing; remove them from the chain.
    fn remove_redundant(mut node: PlanNode) -> PlanNode {
        node.children = node
            .children
            .into_iter()
            .filter_map(|child| {
                let child = Self::remove_redundant(child);
                if child.kind == NodeKind::Drop
                    && matches!(child.operation, Some(Operation::Drop(0)))
                {
                    child.children.into_iter().next()
                } else {
                    Some(child)
                }
            })
            .collect();
        node
    }

    fn analyze_statistics(plan: &mut ExecutionPlan) {
        let total = Self::count_nodes(&plan.root, |n| n.kind != NodeKind::TableScan);
        let filters = Self::count_nodes(&plan.root, |n| n.kind == NodeKind::Filter);
        let selects = Self::count_nodes(&plan.root, |n| n.kind == NodeKind::Select);
        let grouping = Self::count_nodes(&plan.root, |n| n.kind == NodeKind::Group) > 0;
        let sorting = Self::count_nodes(&plan.root, |n| n.kind == NodeKind::Sort) > 0;

        plan.statistics
            .insert("total_operations".to_string(), Value::Number(total as f64));
        plan.statistics
            .insert("filter_operations".to_string(), Value::Number(filters as f64));
        plan.statistics
            .insert("select_operations".to_string(), Value::Number(selects as f64));
        plan.statistics
            .insert("has_grouping".to_string(), Value::Bool(grouping));
        plan.statistics
            .insert("has_sorting".to_string(), Value::Bool(sorting));
    }

    fn count_nodes(node: &PlanNode, pred: fn(&PlanNode) -> bool) -> usize {
        let here = usize::from(pred(node));
        here + node
            .children
            .iter()
            .map(|c| Self::count_nodes(c, pred))
            .sum::<usize>()
    }
}

impl Default for QueryPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Every variable name an expression reads. Dotted names also contribute
/// their field part, matching the executor's fallback lookup.
fn collect_variables(expr: &Expression, out: &mut Vec<String>) {
    match expr {
        Expression::Variable(name) => {
            out.push(name.clone());
            if let Some((_, field)) = name.split_once('.') {
                out.push(field.to_string());
            }
        }
        Expression::BinaryOp { left, right, .. } => {
            collect_variables(left, out);
            collect_variables(right, out);
        }
        Expression::UnaryOp { expr, .. } => collect_variables(expr, out),
        Expression::FunctionCall { args, .. } => {
            for arg in args {
                collect_variables(arg, out);
            }
        }
        Expression::Literal(_) => {}
    }
}
