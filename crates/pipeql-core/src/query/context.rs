//! Query execution context: the registered tables and the function registry.
//!
//! The context is deliberately stateless across queries. Grouping state lives
//! on the executor's call stack, never here, so one context can serve many
//! queries (or threads, behind external synchronization) without cross-talk.

use std::collections::HashMap;

use crate::error::EvalError;
use crate::value::Table;

use super::functions::FunctionRegistry;

/// Tables and functions visible to query execution.
pub struct QueryContext {
    tables: HashMap<String, Table>,
    functions: FunctionRegistry,
}

impl QueryContext {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            functions: FunctionRegistry::new(),
        }
    }

    /// Register a table under a name, replacing any previous table of that
    /// name.
    pub fn register_table(&mut self, name: impl Into<String>, data: Table) {
        self.tables.insert(name.into(), data);
    }

    /// Look up a registered table.
    pub fn table(&self, name: &str) -> Result<&Table, EvalError> {
        self.tables
            .get(name)
            .ok_or_else(|| EvalError::UnknownTable(name.to_string()))
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Row, Value};

    #[test]
    fn test_register_and_fetch_table() {
        let mut ctx = QueryContext::new();
        let mut row = Row::new();
        row.insert("id".to_string(), Value::Number(1.0));
        ctx.register_table("t", vec![row]);

        assert!(ctx.has_table("t"));
        assert_eq!(ctx.table("t").unwrap().len(), 1);
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let ctx = QueryContext::new();
        assert_eq!(
            ctx.table("ghost").unwrap_err(),
            EvalError::UnknownTable("ghost".to_string())
        );
    }

    #[test]
    fn test_reregistering_replaces() {
        let mut ctx = QueryContext::new();
        ctx.register_table("t", vec![Row::new(), Row::new()]);
        ctx.register_table("t", vec![Row::new()]);
        assert_eq!(ctx.table("t").unwrap().len(), 1);
    }
}
