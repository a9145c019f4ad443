//! Built-in scalar functions.
//!
//! Every builtin is a pure function over already-evaluated argument values.
//! The aggregate names (`count`, `sum`, ...) also appear here with scalar
//! fallback behavior; when a query is grouped the executor intercepts those
//! names and feeds them the whole group instead.

use indexmap::IndexMap;

use crate::error::EvalError;
use crate::value::Value;

/// A built-in function: evaluated args in, one value out.
pub type BuiltinFn = fn(&[Value]) -> Result<Value, EvalError>;

/// Registry of built-in functions keyed by lower-cased name.
pub struct FunctionRegistry {
    functions: IndexMap<String, BuiltinFn>,
}

/// Function names the executor treats as aggregates inside a grouped query.
pub const AGGREGATE_NAMES: [&str; 7] = ["count", "sum", "avg", "min", "max", "first", "last"];

/// Whether the (case-insensitive) name is an aggregate.
pub fn is_aggregate(name: &str) -> bool {
    AGGREGATE_NAMES
        .iter()
        .any(|n| n.eq_ignore_ascii_case(name))
}

impl FunctionRegistry {
    pub fn new() -> Self {
        let mut functions: IndexMap<String, BuiltinFn> = IndexMap::new();

        // Aggregate names, scalar fallbacks.
        functions.insert("count".to_string(), builtin_count as BuiltinFn);
        functions.insert("sum".to_string(), builtin_sum);
        functions.insert("avg".to_string(), builtin_avg);
        functions.insert("min".to_string(), builtin_min);
        functions.insert("max".to_string(), builtin_max);
        functions.insert("first".to_string(), builtin_first);
        functions.insert("last".to_string(), builtin_last);

        // String functions.
        functions.insert("upper".to_string(), builtin_upper);
        functions.insert("lower".to_string(), builtin_lower);
        functions.insert("length".to_string(), builtin_length);
        functions.insert("substring".to_string(), builtin_substring);
        functions.insert("concat".to_string(), builtin_concat);

        // Math functions.
        functions.insert("abs".to_string(), builtin_abs);
        functions.insert("round".to_string(), builtin_round);
        functions.insert("floor".to_string(), builtin_floor);
        functions.insert("ceil".to_string(), builtin_ceil);
        functions.insert("sqrt".to_string(), builtin_sqrt);
        functions.insert("pow".to_string(), builtin_pow);

        // Conditionals.
        functions.insert("if".to_string(), builtin_if);
        functions.insert("coalesce".to_string(), builtin_coalesce);

        // Conversions.
        functions.insert("tostring".to_string(), builtin_tostring);
        functions.insert("tonumber".to_string(), builtin_tonumber);

        Self { functions }
    }

    /// Look up and invoke a function by case-insensitive name.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let func = self
            .functions
            .get(&name.to_lowercase())
            .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
        func(args)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_lowercase())
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn numeric_values(args: &[Value]) -> Vec<f64> {
    args.iter()
        .filter_map(|v| match v {
            Value::Number(n) => Some(*n),
            _ => None,
        })
        .collect()
}

// Outside a group there is no row set to count, so a bare call is one row.
fn builtin_count(_args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Number(1.0))
}

fn builtin_sum(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Number(numeric_values(args).iter().sum()))
}

fn builtin_avg(args: &[Value]) -> Result<Value, EvalError> {
    let nums = numeric_values(args);
    if nums.is_empty() {
        return Ok(Value::Null);
    }
    Ok(Value::Number(nums.iter().sum::<f64>() / nums.len() as f64))
}

fn builtin_min(args: &[Value]) -> Result<Value, EvalError> {
    Ok(numeric_values(args)
        .into_iter()
        .fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |a| a.min(v)))
        })
        .map_or(Value::Null, Value::Number))
}

fn builtin_max(args: &[Value]) -> Result<Value, EvalError> {
    Ok(numeric_values(args)
        .into_iter()
        .fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |a| a.max(v)))
        })
        .map_or(Value::Null, Value::Number))
}

fn builtin_first(args: &[Value]) -> Result<Value, EvalError> {
    Ok(args.first().cloned().unwrap_or(Value::Null))
}

fn builtin_last(args: &[Value]) -> Result<Value, EvalError> {
    Ok(args.last().cloned().unwrap_or(Value::Null))
}

fn builtin_upper(args: &[Value]) -> Result<Value, EvalError> {
    match args.first() {
        None | Some(Value::Null) => Ok(Value::Null),
        Some(v) => Ok(Value::Text(v.to_string().to_uppercase())),
    }
}

fn builtin_lower(args: &[Value]) -> Result<Value, EvalError> {
    match args.first() {
        None | Some(Value::Null) => Ok(Value::Null),
        Some(v) => Ok(Value::Text(v.to_string().to_lowercase())),
    }
}

fn builtin_length(args: &[Value]) -> Result<Value, EvalError> {
    match args.first() {
        None | Some(Value::Null) => Ok(Value::Number(0.0)),
        Some(v) => Ok(Value::Number(v.to_string().chars().count() as f64)),
    }
}

fn builtin_substring(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < 2 || args[0].is_null() {
        return Ok(Value::Null);
    }
    let text = args[0].to_string();
    let chars: Vec<char> = text.chars().collect();
    let start = (args[1].to_number()? as usize).min(chars.len());
    let end = if let Some(len_arg) = args.get(2) {
        (start + len_arg.to_number()? as usize).min(chars.len())
    } else {
        chars.len()
    };
    Ok(Value::Text(chars[start..end].iter().collect()))
}

fn builtin_concat(args: &[Value]) -> Result<Value, EvalError> {
    let mut out = String::new();
    for arg in args {
        if !arg.is_null() {
            out.push_str(&arg.to_string());
        }
    }
    Ok(Value::Text(out))
}

fn unary_math(args: &[Value], f: fn(f64) -> f64) -> Result<Value, EvalError> {
    match args.first() {
        None | Some(Value::Null) => Ok(Value::Null),
        Some(v) => Ok(Value::Number(f(v.to_number()?))),
    }
}

fn builtin_abs(args: &[Value]) -> Result<Value, EvalError> {
    unary_math(args, f64::abs)
}

fn builtin_round(args: &[Value]) -> Result<Value, EvalError> {
    match args.first() {
        None | Some(Value::Null) => Ok(Value::Null),
        Some(v) => {
            let value = v.to_number()?;
            if let Some(decimals_arg) = args.get(1) {
                let factor = 10f64.powi(decimals_arg.to_number()? as i32);
                Ok(Value::Number((value * factor).round() / factor))
            } else {
                Ok(Value::Number(value.round()))
            }
        }
    }
}

fn builtin_floor(args: &[Value]) -> Result<Value, EvalError> {
    unary_math(args, f64::floor)
}

fn builtin_ceil(args: &[Value]) -> Result<Value, EvalError> {
    unary_math(args, f64::ceil)
}

fn builtin_sqrt(args: &[Value]) -> Result<Value, EvalError> {
    unary_math(args, f64::sqrt)
}

fn builtin_pow(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < 2 {
        return Ok(Value::Null);
    }
    let base = args[0].to_number()?;
    let exponent = args[1].to_number()?;
    Ok(Value::Number(base.powf(exponent)))
}

fn builtin_if(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < 3 {
        return Ok(Value::Null);
    }
    Ok(if args[0].truthy() {
        args[1].clone()
    } else {
        args[2].clone()
    })
}

fn builtin_coalesce(args: &[Value]) -> Result<Value, EvalError> {
    for arg in args {
        if !arg.is_null() {
            return Ok(arg.clone());
        }
    }
    Ok(Value::Null)
}

fn builtin_tostring(args: &[Value]) -> Result<Value, EvalError> {
    match args.first() {
        None | Some(Value::Null) => Ok(Value::Null),
        Some(v) => Ok(Value::Text(v.to_string())),
    }
}

fn builtin_tonumber(args: &[Value]) -> Result<Value, EvalError> {
    match args.first() {
        None | Some(Value::Null) => Ok(Value::Null),
        Some(Value::Number(n)) => Ok(Value::Number(*n)),
        Some(v) => Ok(v
            .to_string()
            .parse::<f64>()
            .map_or(Value::Null, Value::Number)),
    }
}
