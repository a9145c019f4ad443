/// Query engine module
///
/// Pipeline query parsing, planning, and execution.
/// Abstract Syntax Tree types
#[allow(missing_docs)]
pub mod ast;
/// Execution context
#[allow(missing_docs)]
pub mod context;
/// Pipeline and plan executor
#[allow(missing_docs)]
pub mod executor;
/// Built-in functions
#[allow(missing_docs)]
pub mod functions;
/// Query lexer
#[allow(missing_docs)]
pub mod lexer;
/// Query parser
#[allow(missing_docs)]
pub mod parser;
/// Query planner
#[allow(missing_docs)]
pub mod planner;

// Re-export main types
pub use ast::*;
pub use context::QueryContext;
pub use executor::QueryExecutor;
pub use functions::{is_aggregate, FunctionRegistry};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use planner::{ExecutionPlan, NodeKind, PlanNode, QueryPlanner};
