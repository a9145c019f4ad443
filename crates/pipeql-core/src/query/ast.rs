//! Abstract Syntax Tree node types for PipeQL queries.
//!
//! A query is a [`Pipeline`]: a source table name piped through an ordered
//! sequence of relational operations. Expressions and operations are closed
//! enums; the executor matches on them exhaustively.

use std::fmt;

use crate::value::Value;

/// Binary operators, lowest-precedence group first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Negate,
}

/// A scalar expression evaluated against one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value.
    Literal(Value),
    /// Column reference, resolved against the current row. A dotted name
    /// `a.b` also resolves against column `b` alone when `a.b` is absent.
    Variable(String),
    /// Binary operation.
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Unary operation.
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
    /// Function call dispatched by lower-cased name.
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
}

/// One column spec inside a select operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSpec {
    /// `*` — copy every source column.
    Wildcard,
    /// `alias:expr` or a bare `expr` (alias `None`).
    Expr {
        alias: Option<String>,
        expr: Expression,
    },
}

impl ColumnSpec {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, ColumnSpec::Wildcard)
    }
}

/// One pipeline operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// `?[condition]` — keep rows whose condition is exactly `true`.
    Filter(Expression),
    /// `![specs]` — project each row through the column specs.
    Select(Vec<ColumnSpec>),
    /// `^[col]` / `v[col]` — stable sort by one column.
    Sort { column: String, ascending: bool },
    /// `@[cols]` — group by the named columns, first-seen order.
    Group(Vec<String>),
    /// `#[n]` — first n rows, or the last |n| when n is negative.
    Limit(i64),
    /// `_[n]` — skip the first n rows.
    Drop(i64),
}

/// A parsed query: source table plus ordered operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub table_name: String,
    pub operations: Vec<Operation>,
}

// Display implementations for plan rendering and error messages.

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "%",
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::Le => "<=",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "&",
            BinaryOperator::Or => "|",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(v) => write!(f, "{}", v),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::BinaryOp { op, left, right } => {
                write!(f, "({} {} {})", left, op, right)
            }
            Expression::UnaryOp { op, expr } => match op {
                UnaryOperator::Not => write!(f, "not ({})", expr),
                UnaryOperator::Negate => write!(f, "-({})", expr),
            },
            Expression::FunctionCall { name, args } => {
                write!(f, "{}[", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSpec::Wildcard => write!(f, "*"),
            ColumnSpec::Expr { alias: Some(a), expr } => write!(f, "{}:{}", a, expr),
            ColumnSpec::Expr { alias: None, expr } => write!(f, "{}", expr),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Filter(cond) => write!(f, "?[{}]", cond),
            Operation::Select(specs) => {
                write!(f, "![")?;
                for (i, spec) in specs.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", spec)?;
                }
                write!(f, "]")
            }
            Operation::Sort { column, ascending } => {
                write!(f, "{}[{}]", if *ascending { "^" } else { "v" }, column)
            }
            Operation::Group(cols) => write!(f, "@[{}]", cols.join("; ")),
            Operation::Limit(n) => write!(f, "#[{}]", n),
            Operation::Drop(n) => write!(f, "_[{}]", n),
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_name)?;
        for op in &self.operations {
            write!(f, " | {}", op)?;
        }
        Ok(())
    }
}
