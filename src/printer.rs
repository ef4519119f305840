//! Text forms of values.
//!
//! The canonical form prints every table with braces, statements included, and is what
//! `Display` for [`Value`] produces. The pretty form prints statements as `(e0 e1 ...)`.
//! The canonical form always reads back to an equal value. The pretty form does for
//! anything the reader can produce; a single-slot statement prints as `(x)` and reads
//! back as `x`, and keys beyond a statement's slots and tag are not printed.

use std::fmt::{self, Write};

use crate::ast::{PLACEHOLDER_SIGIL, Table, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Style {
    Canonical,
    Pretty,
}

/// `Display` adapter printing a value in pretty form
#[derive(Debug, Clone, Copy)]
pub struct Pretty<'a>(pub &'a Value);

impl fmt::Display for Pretty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self.0, Style::Pretty)
    }
}

pub fn to_canonical(value: &Value) -> String {
    value.to_string()
}

pub fn to_pretty(value: &Value) -> String {
    Pretty(value).to_string()
}

pub(crate) fn write_canonical(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    write_value(f, value, Style::Canonical)
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value, style: Style) -> fmt::Result {
    match value {
        Value::Symbol(name) => f.write_str(name),
        Value::String(text) => write_string_literal(f, text),
        Value::Placeholder(name) => write!(f, "{PLACEHOLDER_SIGIL}{name}"),
        Value::Table(table) => match table.as_statement() {
            Some(statement) if style == Style::Pretty => {
                f.write_char('(')?;
                for (i, element) in statement.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    write_value(f, element, style)?;
                }
                f.write_char(')')
            }
            _ => write_table(f, table, style),
        },
    }
}

fn write_table(f: &mut fmt::Formatter<'_>, table: &Table, style: Style) -> fmt::Result {
    f.write_char('{')?;
    for (i, (key, value)) in table.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_value(f, key, style)?;
        f.write_str(" = ")?;
        write_value(f, value, style)?;
    }
    f.write_char('}')
}

fn write_string_literal(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in text.chars() {
        if ch == '"' || ch == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(ch)?;
    }
    f.write_char('"')
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{EMPTY_TABLE, sym, val};
    use crate::reader::read_str;

    #[test]
    fn test_print_forms_data_driven() {
        // (value, canonical, pretty)
        let test_cases = vec![
            (sym("hello"), "hello", "hello"),
            (val("hello world"), "\"hello world\"", "\"hello world\""),
            (val("say \"hi\""), r#""say \"hi\"""#, r#""say \"hi\"""#),
            (val("back\\slash"), r#""back\\slash""#, r#""back\\slash""#),
            (Value::placeholder("x"), "$x", "$x"),
            (EMPTY_TABLE.clone(), "{}", "{}"),
            (
                Value::statement(vec![sym("f"), sym("a")]),
                "{0 = f, 1 = a, type = statement}",
                "(f a)",
            ),
            (
                Value::statement(vec![
                    sym("f"),
                    Value::statement(vec![sym("g"), sym("x")]),
                    val("s"),
                ]),
                "{0 = f, 1 = {0 = g, 1 = x, type = statement}, 2 = \"s\", type = statement}",
                "(f (g x) \"s\")",
            ),
        ];

        for (i, (value, canonical, pretty)) in test_cases.iter().enumerate() {
            assert_eq!(to_canonical(value), *canonical, "Canonical case #{}", i + 1);
            assert_eq!(to_pretty(value), *pretty, "Pretty case #{}", i + 1);
        }
    }

    #[test]
    fn test_keys_print_in_sorted_order() {
        let value = read_str("{b = 2, $x = 3, a = 1, \"s\" = 4}").unwrap();
        assert_eq!(to_canonical(&value), "{a = 1, b = 2, \"s\" = 4, $x = 3}");
    }

    #[test]
    fn test_pretty_prints_nested_statements_inside_tables() {
        let value = read_str("{$x = ($x $x), k = {a = (f a)}}").unwrap();
        assert_eq!(to_pretty(&value), "{k = {a = (f a)}, $x = ($x $x)}");
    }

    #[test]
    fn test_printed_forms_read_back() {
        for source in ["{a = (f \"x\\\"y\"), $p = ($p b)}", "(f {g = h} 'q')", "x"] {
            let value = read_str(source).unwrap();
            assert_eq!(read_str(&to_canonical(&value)).unwrap(), value, "{source}");
            assert_eq!(read_str(&to_pretty(&value)).unwrap(), value, "{source}");
        }
    }

    #[test]
    fn test_single_slot_statement_pretty_form_unwraps_on_read() {
        let single = Value::statement_exact(vec![sym("x")]);
        assert_eq!(to_pretty(&single), "(x)");
        assert_eq!(read_str(&to_pretty(&single)).unwrap(), sym("x"));
        // The canonical form keeps the wrapper
        assert_eq!(read_str(&to_canonical(&single)).unwrap(), single);
    }
}
