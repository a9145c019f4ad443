//! # PipeQL Core
//!
//! Core types and implementations for the PipeQL query engine: dynamic
//! values, the query language front end, the planner, and the executor.
//!
//! Most users want the `pipeql` crate, which wraps this one in an engine
//! handle with table builders and result formatting.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod query;
pub mod value;

pub use error::{Error, EvalError, LexError, ParseError, Result};
pub use value::{Row, Table, Value};
