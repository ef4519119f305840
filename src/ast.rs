//! This module defines the value model. [`Value`] is a closed enum of four variants:
//! symbols, strings, placeholders and tables. Tables are immutable ordered maps shared
//! through `Arc`, so cloning a value is cheap and "mutation" always builds a new table.
//!
//! Equality and ordering are structural and derived: variants rank
//! `Symbol < String < Table < Placeholder`, then compare by content. Tables compare
//! lexicographically over their key-sorted `(key, value)` entries, which is exactly what
//! `BTreeMap`'s `Ord` gives us.
//!
//! The reserved shapes built on top of tables (statements and errors) are recognised
//! here through the well-known field symbols declared as `LazyLock` statics.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use crate::Error;

/// Allowed non-alphanumeric characters in symbol names
pub(crate) const SYMBOL_SPECIAL_CHARS: &str = "_!?+-*/%";

/// Prefix marking a placeholder, as in `$x`
pub const PLACEHOLDER_SIGIL: char = '$';

pub(crate) fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c)
}

/// Field holding the shape tag of statements and errors
pub static TYPE: LazyLock<Value> = LazyLock::new(|| Value::symbol("type"));
/// Tag value marking a statement
pub static STATEMENT: LazyLock<Value> = LazyLock::new(|| Value::symbol("statement"));
/// Tag value marking an error
pub static ERROR: LazyLock<Value> = LazyLock::new(|| Value::symbol("error"));
pub static ERROR_TYPE: LazyLock<Value> = LazyLock::new(|| Value::symbol("error-type"));
pub static MESSAGE: LazyLock<Value> = LazyLock::new(|| Value::symbol("message"));
pub static MAP: LazyLock<Value> = LazyLock::new(|| Value::symbol("map"));
pub static KEY: LazyLock<Value> = LazyLock::new(|| Value::symbol("key"));
pub static CONTEXT: LazyLock<Value> = LazyLock::new(|| Value::symbol("context"));
pub static EMPTY_TABLE: LazyLock<Value> = LazyLock::new(|| Value::Table(Table::new()));

/// Core value type
///
/// Variant declaration order is the rank used by the derived `Ord`. Placeholders sort
/// after tables so they print last inside a table's entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    /// Identifiers, used both as data and as field names
    Symbol(Arc<str>),
    /// String literals
    String(Arc<str>),
    /// Ordered maps from values to values
    Table(Table),
    /// Named binders (`$name`), the formal parameter of a table used as a function
    Placeholder(Arc<str>),
}

/// An immutable ordered map from values to values
///
/// Holds at most one distinct placeholder key. Every constructor that can introduce a
/// key checks this.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Table {
    entries: Arc<BTreeMap<Value, Value>>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// Build a table from entries, rejecting a second distinct placeholder key.
    /// Later duplicates of a key overwrite earlier ones.
    pub fn from_entries<I>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        entries
            .into_iter()
            .try_fold(Table::new(), |table, (key, value)| table.with(key, value))
    }

    /// Build a table whose keys are known not to be placeholders.
    pub(crate) fn from_plain_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let entries: BTreeMap<Value, Value> = entries.into_iter().collect();
        debug_assert!(
            entries.keys().all(|key| !key.is_placeholder()),
            "plain table entries must not use placeholder keys"
        );
        Table {
            entries: Arc::new(entries),
        }
    }

    /// Return a new table identical to this one except that `key` maps to `value`
    pub fn with(&self, key: Value, value: Value) -> Result<Self, Error> {
        if key.is_placeholder()
            && let Some((existing, _)) = self.placeholder_entry()
            && *existing != key
        {
            return Err(Error {
                key: Some(key),
                ..Error::eval_error("A table may contain only one placeholder key")
            });
        }

        let mut entries = Arc::clone(&self.entries);
        Arc::make_mut(&mut entries).insert(key, value);
        Ok(Table { entries })
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter()
    }

    /// The placeholder key and its body, if this table acts as a function
    pub fn placeholder_entry(&self) -> Option<(&Value, &Value)> {
        // Placeholders rank last, so only the final entry can be one.
        self.entries
            .last_key_value()
            .filter(|(key, _)| key.is_placeholder())
    }

    /// View this table as a statement if it carries the statement tag and a `0` slot
    pub fn as_statement(&self) -> Option<Statement<'_>> {
        if self.get(&TYPE) != Some(&*STATEMENT) {
            return None;
        }
        let len = (0..)
            .take_while(|&index| self.contains_key(&position_key(index)))
            .count();
        (len > 0).then_some(Statement { table: self, len })
    }
}

/// The positional key of slot `index` in a statement
pub fn position_key(index: usize) -> Value {
    Value::symbol(index.to_string())
}

/// A borrowed view of a statement table's positional slots
#[derive(Debug, Clone, Copy)]
pub struct Statement<'a> {
    table: &'a Table,
    len: usize,
}

impl<'a> Statement<'a> {
    /// Number of consecutive positional slots, always at least 1
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn get(&self, index: usize) -> Option<&'a Value> {
        if index < self.len {
            self.table.get(&position_key(index))
        } else {
            None
        }
    }

    /// The element in slot `0`
    pub fn head(&self) -> &'a Value {
        match self.get(0) {
            Some(head) => head,
            None => unreachable!("statement views always have a slot 0"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Value> + 'a {
        let table = self.table;
        (0..self.len).filter_map(move |index| table.get(&position_key(index)))
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.iter().cloned().collect()
    }
}

impl Value {
    pub fn symbol(name: impl AsRef<str>) -> Self {
        Value::Symbol(Arc::from(name.as_ref()))
    }

    pub fn string(text: impl AsRef<str>) -> Self {
        Value::String(Arc::from(text.as_ref()))
    }

    pub fn placeholder(name: impl AsRef<str>) -> Self {
        Value::Placeholder(Arc::from(name.as_ref()))
    }

    /// Build a statement from its elements. A single element is returned as-is,
    /// matching what the reader produces.
    pub fn statement(elements: Vec<Value>) -> Self {
        match <[Value; 1]>::try_from(elements) {
            Ok([single]) => single,
            Err(elements) => Value::statement_exact(elements),
        }
    }

    /// Build a statement table holding exactly `elements`, even a single one
    pub fn statement_exact(elements: Vec<Value>) -> Self {
        let entries = elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| (position_key(index), element))
            .chain(std::iter::once((TYPE.clone(), STATEMENT.clone())));
        Value::Table(Table::from_plain_entries(entries))
    }

    /// Non-destructive insert: a new table with `key` bound to `value`
    pub fn with(&self, key: Value, value: Value) -> Result<Value, Error> {
        match self {
            Value::Table(table) => table.with(key, value).map(Value::Table),
            _ => Err(Error {
                map: Some(self.clone()),
                key: Some(key),
                ..Error::eval_error("Expected a table for with")
            }),
        }
    }

    /// Text payload of a symbol, string or placeholder
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Symbol(text) | Value::String(text) | Value::Placeholder(text) => Some(text),
            Value::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_statement(&self) -> Option<Statement<'_>> {
        self.as_table().and_then(Table::as_statement)
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Value::Placeholder(_))
    }

    pub fn is_statement(&self) -> bool {
        self.as_statement().is_some()
    }

    pub fn is_error(&self) -> bool {
        self.as_table()
            .is_some_and(|table| table.get(&TYPE) == Some(&*ERROR))
    }
}

impl From<Table> for Value {
    fn from(table: Table) -> Self {
        Value::Table(table)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

/// Helper function for creating symbols
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::symbol(name)
}

/// Helper function for creating Values from anything convertible
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::printer::write_canonical(f, self)
    }
}
