use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_till, take_while1},
    character::complete::{char, multispace0, one_of},
    combinator::opt,
    error::{ErrorKind as NomErrorKind, ParseError},
};

use crate::ast::{PLACEHOLDER_SIGIL, Table, Value, is_symbol_char};
use crate::{Error, MAX_READ_DEPTH};

const EOF_IN_STRING: &str = "Unexpected eof while reading string";
const EOF_IN_TABLE: &str = "Unexpected eof while reading table";
const EOF_IN_STATEMENT: &str = "Unexpected eof while reading statement";
const EXPECTED_STATEMENT: &str = "Expected a statement";

/// Reader options
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReadConfig {
    /// Treat `;` as the start of a comment running to end of line
    pub handle_comments: bool,
}

/// Failure raised inside the parser, positioned at the remaining input.
///
/// `nom::Err::Error` means "nothing readable here" and lets the caller try something
/// else; `nom::Err::Failure` is committed and travels straight to the top.
#[derive(Debug)]
struct ReadFailure<'a> {
    input: &'a str,
    message: Option<String>,
}

impl<'a> ReadFailure<'a> {
    fn new(input: &'a str, message: impl Into<String>) -> Self {
        ReadFailure {
            input,
            message: Some(message.into()),
        }
    }

    fn into_error(self, source: &str) -> Error {
        let offset = source.len().saturating_sub(self.input.len());
        let message = self.message.unwrap_or_else(|| match self.input.chars().next() {
            Some(c) => format!("Unexpected character '{c}'"),
            None => "Unexpected eof".to_owned(),
        });
        Error::read_error(message, source, offset)
    }
}

impl<'a> ParseError<&'a str> for ReadFailure<'a> {
    fn from_error_kind(input: &'a str, _kind: NomErrorKind) -> Self {
        ReadFailure {
            input,
            message: None,
        }
    }

    fn append(_input: &'a str, _kind: NomErrorKind, other: Self) -> Self {
        other
    }
}

type ReadResult<'a, T> = IResult<&'a str, T, ReadFailure<'a>>;

fn fail<'a, T>(input: &'a str, message: impl Into<String>) -> ReadResult<'a, T> {
    Err(nom::Err::Failure(ReadFailure::new(input, message)))
}

fn describe_next(input: &str) -> String {
    match input.chars().next() {
        Some(c) => format!("'{c}'"),
        None => "eof".to_owned(),
    }
}

/// Skip whitespace and, when enabled, `;` comments
fn whitespace(mut input: &str, config: ReadConfig) -> ReadResult<'_, ()> {
    loop {
        let (rest, _) = multispace0.parse(input)?;
        if config.handle_comments && rest.starts_with(';') {
            let (rest, _) = take_till(|c: char| c == '\n').parse(rest)?;
            input = rest;
        } else {
            return Ok((rest, ()));
        }
    }
}

fn symbol_name(input: &str) -> ReadResult<'_, &str> {
    take_while1(is_symbol_char).parse(input)
}

/// Parse a symbol (identifier)
fn parse_symbol(input: &str) -> ReadResult<'_, Value> {
    let (rest, name) = symbol_name(input)?;
    Ok((rest, Value::symbol(name)))
}

/// Parse a placeholder (`$name`)
fn parse_placeholder(input: &str) -> ReadResult<'_, Value> {
    let (rest, _) = char(PLACEHOLDER_SIGIL).parse(input)?;
    match symbol_name(rest) {
        Ok((rest, name)) => Ok((rest, Value::placeholder(name))),
        Err(_) => fail(
            rest,
            format!("Expected a placeholder name after '{PLACEHOLDER_SIGIL}'"),
        ),
    }
}

/// Parse a string literal delimited by `"` or `'`. A backslash takes the next character
/// literally.
fn parse_string(input: &str) -> ReadResult<'_, Value> {
    let (mut remaining, delimiter) = one_of("\"'").parse(input)?;
    let mut text = String::new();

    loop {
        let mut chars = remaining.chars();
        match chars.next() {
            Some(c) if c == delimiter => {
                return Ok((chars.as_str(), Value::string(text)));
            }
            Some('\\') => match chars.next() {
                Some(escaped) => text.push(escaped),
                None => return fail(chars.as_str(), EOF_IN_STRING),
            },
            Some(c) => text.push(c),
            None => return fail(remaining, EOF_IN_STRING),
        }
        remaining = chars.as_str();
    }
}

/// Parse a table literal: `{key = statement, ...}` with optional commas
fn parse_table(input: &str, config: ReadConfig, depth: usize) -> ReadResult<'_, Value> {
    let (mut rest, _) = char('{').parse(input)?;
    let mut table = Table::new();

    loop {
        (rest, _) = whitespace(rest, config)?;
        match rest.chars().next() {
            None => return fail(rest, EOF_IN_TABLE),
            Some('}') => return Ok((&rest[1..], Value::Table(table))),
            Some(_) => {}
        }

        let key_start = rest;
        let (after_key, key) = match parse_atom(rest, config, depth + 1) {
            Ok(parsed) => parsed,
            Err(nom::Err::Error(_)) => {
                return fail(
                    rest,
                    format!("Expected a key in table, found {}", describe_next(rest)),
                );
            }
            Err(e) => return Err(e),
        };

        let (after_key, _) = whitespace(after_key, config)?;
        let after_equals = match after_key.strip_prefix('=') {
            Some(after_equals) => after_equals,
            None if after_key.is_empty() => return fail(after_key, EOF_IN_TABLE),
            None => {
                return fail(
                    after_key,
                    format!(
                        "Expected '=' after table key, found {}",
                        describe_next(after_key)
                    ),
                );
            }
        };

        let (value_start, _) = whitespace(after_equals, config)?;
        if value_start.is_empty() {
            return fail(value_start, EOF_IN_TABLE);
        }
        let (after_value, value) = match parse_statement(value_start, config, depth + 1) {
            Ok(parsed) => parsed,
            Err(nom::Err::Error(_)) => return fail(value_start, "Expected a value for table key"),
            Err(e) => return Err(e),
        };

        table = match table.with(key, value) {
            Ok(table) => table,
            Err(_) => return fail(key_start, "A table may contain only one placeholder key"),
        };

        (rest, _) = whitespace(after_value, config)?;
        (rest, _) = opt(char(',')).parse(rest)?;
    }
}

/// Parse a parenthesised statement: `(e0 e1 ...)`
fn parse_group(input: &str, config: ReadConfig, depth: usize) -> ReadResult<'_, Value> {
    let (rest, _) = char('(').parse(input)?;
    let (rest, _) = whitespace(rest, config)?;
    let (rest, statement) = match parse_statement(rest, config, depth + 1) {
        Ok(parsed) => parsed,
        Err(nom::Err::Error(_)) if rest.is_empty() => return fail(rest, EOF_IN_STATEMENT),
        Err(nom::Err::Error(_)) => return fail(rest, EXPECTED_STATEMENT),
        Err(e) => return Err(e),
    };

    let (rest, _) = whitespace(rest, config)?;
    match rest.strip_prefix(')') {
        Some(rest) => Ok((rest, statement)),
        None if rest.is_empty() => fail(rest, EOF_IN_STATEMENT),
        None => fail(
            rest,
            format!(
                "Unexpected character {} while reading statement",
                describe_next(rest)
            ),
        ),
    }
}

/// Parse a single atom: symbol, placeholder, string, table or group
fn parse_atom(input: &str, config: ReadConfig, depth: usize) -> ReadResult<'_, Value> {
    if depth >= MAX_READ_DEPTH {
        return fail(
            input,
            format!("Expression too deeply nested (max depth: {MAX_READ_DEPTH})"),
        );
    }
    alt((
        parse_placeholder,
        parse_string,
        parse_symbol,
        |input| parse_table(input, config, depth),
        |input| parse_group(input, config, depth),
    ))
    .parse(input)
}

/// Parse the longest run of atoms starting here. One atom is returned as-is; two or more
/// become a statement. Zero atoms is a recoverable error so callers can word the message.
fn parse_statement(input: &str, config: ReadConfig, depth: usize) -> ReadResult<'_, Value> {
    let mut elements = Vec::new();
    let mut rest = input;

    loop {
        let (candidate, _) = whitespace(rest, config)?;
        match parse_atom(candidate, config, depth) {
            Ok((after, atom)) => {
                elements.push(atom);
                rest = after;
            }
            Err(nom::Err::Error(_)) => break,
            Err(e) => return Err(e),
        }
    }

    if elements.is_empty() {
        return Err(nom::Err::Error(ReadFailure::new(input, EXPECTED_STATEMENT)));
    }
    Ok((rest, Value::statement(elements)))
}

/// Read one statement from source text.
pub fn read_str(input: &str) -> Result<Value, Error> {
    read_str_with_config(input, ReadConfig::default())
}

/// Read one statement from source text with the given options.
pub fn read_str_with_config(input: &str, config: ReadConfig) -> Result<Value, Error> {
    let parsed = whitespace(input, config)
        .and_then(|(rest, _)| parse_statement(rest, config, 0))
        .and_then(|(rest, value)| {
            let (rest, _) = whitespace(rest, config)?;
            Ok((rest, value))
        });

    match parsed {
        Ok(("", value)) => Ok(value),
        Ok((rest, _)) => Err(ReadFailure::new(
            rest,
            format!("Unexpected character {}", describe_next(rest)),
        )
        .into_error(input)),
        Err(nom::Err::Error(failure) | nom::Err::Failure(failure)) => {
            Err(failure.into_error(input))
        }
        Err(nom::Err::Incomplete(_)) => Err(Error::read_error("Unexpected eof", input, input.len())),
    }
}

/// Value-level entry point. A string is read as source text and a read failure comes back
/// as an error table; any other value is already read and is returned unchanged.
pub fn read(input: &Value) -> Value {
    match input {
        Value::String(text) => read_str(text).unwrap_or_else(Value::from),
        other => other.clone(),
    }
}
