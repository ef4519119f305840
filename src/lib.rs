//! Reduct - a minimal homoiconic expression language built on tables
//!
//! Every value in Reduct is one of four things: a symbol, a string, a placeholder, or a
//! table. Tables are ordered maps from values to values, and they do all the heavy lifting:
//! records, positional lists, pending computations ("statements"), one-argument functions
//! and errors are all just tables with particular shapes.
//!
//! ```text
//! {a = 1, b = 2}          ; a record
//! ({a = 1, b = 2} b)      ; a statement: look up b in the record -> 2
//! {$x = ($x $x)}          ; a function of one argument via a placeholder key
//! ```
//!
//! ## Reduction
//!
//! Evaluation is a rewrite system. A statement `(m k a b)` is reduced one head lookup at a
//! time: `m` and `k` are each stepped once, `k` is looked up in `m`, and the result is
//! re-applied to the remaining arguments, giving `((m k) a b)`. When an ordinary lookup
//! misses, a table with a placeholder key acts as a function: the requested key is
//! substituted for the placeholder inside the body ("universal lookup").
//!
//! ## Errors are values
//!
//! Read and lookup failures surface as ordinary error tables, so they flow through the
//! reduction machinery unchanged. Inside the crate they travel as [`Error`] and are turned
//! into tables at the value boundary.
//!
//! ## Modules
//!
//! - `ast`: the value model, equality, ordering and reserved table shapes
//! - `reader`: text to values
//! - `printer`: canonical and pretty text forms
//! - `evaluator`: single-step `eval`, `lookup` and `universal_lookup`
//! - `driver`: repeated reduction to normal form with cycle detection

use std::fmt;

use crate::ast::{CONTEXT, ERROR, ERROR_TYPE, KEY, MAP, MESSAGE, TYPE, Table};

/// Maximum nesting of tables and groups accepted by the reader
/// Deeper input is rejected instead of risking a stack overflow in the recursive descent
pub const MAX_READ_DEPTH: usize = 64;

/// Maximum recursion of a single `eval` step through nested heads and keys
/// Set well above the read depth since reduction can nest heads further than any source text
pub const MAX_EVAL_DEPTH: usize = 256;

/// Categorizes the different kinds of data-level errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed source text
    ReadError,
    /// Missing key, non-table map, or a bad substitution during universal lookup
    LookupError,
    /// Evaluation-time failures not otherwise classified, such as the eval depth limit
    EvalError,
}

impl ErrorKind {
    /// The symbol stored under `error-type` in an error table
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ReadError => "read-error",
            ErrorKind::LookupError => "lookup-error",
            ErrorKind::EvalError => "eval-error",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "read-error" => Some(ErrorKind::ReadError),
            "lookup-error" => Some(ErrorKind::LookupError),
            "eval-error" => Some(ErrorKind::EvalError),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured error. Converts losslessly to and from an error table.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    /// The map a failed lookup was performed on
    pub map: Option<Value>,
    /// The key a failed lookup asked for
    pub key: Option<Value>,
    /// Snippet of the source text around a read failure (max 40 chars)
    pub context: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            map: None,
            key: None,
            context: None,
        }
    }

    /// Create a read error with context extracted from `input` at the given byte offset
    pub fn read_error(message: impl Into<String>, input: &str, error_offset: usize) -> Self {
        const MAX_CONTEXT: usize = 40;

        let mut start = error_offset.saturating_sub(10).min(input.len());
        while !input.is_char_boundary(start) {
            start -= 1;
        }
        let snippet: String = input[start..].chars().take(MAX_CONTEXT).collect();

        let mut context = String::new();
        if start > 0 {
            context.push_str("[...]");
        }
        context.push_str(&snippet);
        if start + snippet.len() < input.len() {
            context.push_str("[...]");
        }

        Error {
            context: Some(context.replace('\n', "\\n").replace('\r', "")),
            ..Error::new(ErrorKind::ReadError, message)
        }
    }

    pub fn lookup_error(message: impl Into<String>, map: &Value, key: &Value) -> Self {
        Error {
            map: Some(map.clone()),
            key: Some(key.clone()),
            ..Error::new(ErrorKind::LookupError, message)
        }
    }

    pub fn eval_error(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::EvalError, message)
    }

    /// Recover an `Error` from an error table, or `None` if `value` is not one
    pub fn from_value(value: &Value) -> Option<Self> {
        let table = value.as_table()?;
        if table.get(&TYPE) != Some(&*ERROR) {
            return None;
        }
        let kind = match table.get(&ERROR_TYPE)? {
            Value::Symbol(name) => ErrorKind::from_name(name)?,
            _ => return None,
        };
        let message = table.get(&MESSAGE).and_then(Value::as_str).unwrap_or_default();

        Some(Error {
            kind,
            message: message.to_owned(),
            map: table.get(&MAP).cloned(),
            key: table.get(&KEY).cloned(),
            context: table.get(&CONTEXT).and_then(Value::as_str).map(str::to_owned),
        })
    }
}

impl From<Error> for Value {
    fn from(error: Error) -> Self {
        let mut entries = vec![
            (TYPE.clone(), ERROR.clone()),
            (ERROR_TYPE.clone(), Value::symbol(error.kind.as_str())),
            (MESSAGE.clone(), Value::string(error.message)),
        ];
        if let Some(map) = error.map {
            entries.push((MAP.clone(), map));
        }
        if let Some(key) = error.key {
            entries.push((KEY.clone(), key));
        }
        if let Some(context) = error.context {
            entries.push((CONTEXT.clone(), Value::string(context)));
        }
        Value::Table(Table::from_plain_entries(entries))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(context) = &self.context {
            write!(f, "\nContext: {context}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

pub mod ast;
pub mod driver;
pub mod evaluator;
pub mod printer;
pub mod reader;

pub use ast::Value;
pub use driver::{Reduction, Termination, reduce};
pub use evaluator::eval;
pub use reader::{read, read_str};
