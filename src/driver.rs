//! Drives [`eval`] to a normal form.
//!
//! Every value produced along the way is remembered; producing one that was already seen
//! means the reduction is stuck in an exact cycle and the driver bails out. Reductions that
//! grow without repeating are not caught unless a step cap is configured.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::ast::Value;
use crate::evaluator::eval;
use crate::printer::Pretty;

/// How a reduction ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The value is not a statement and is not an error
    NormalForm,
    /// The value is an error table
    Error,
    /// A step produced a value that had already been visited
    CycleDetected,
    /// The configured step cap was reached before a normal form
    StepLimit,
}

/// Outcome of [`reduce`]: the last value reached, why reduction stopped, and how many
/// `eval` steps were taken.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub value: Value,
    pub termination: Termination,
    pub steps: usize,
}

/// Driver options
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReduceConfig {
    /// Stop after this many steps. `None` runs until a normal form, an error or a cycle.
    pub max_steps: Option<usize>,
}

/// Reduce `value` to normal form
pub fn reduce(value: &Value) -> Reduction {
    reduce_with_config(value, ReduceConfig::default())
}

/// Reduce `value` to normal form with the given options
pub fn reduce_with_config(value: &Value, config: ReduceConfig) -> Reduction {
    let mut visited = BTreeSet::from([value.clone()]);
    let mut current = value.clone();
    let mut steps = 0;

    let termination = loop {
        if !current.is_statement() {
            break if current.is_error() {
                Termination::Error
            } else {
                Termination::NormalForm
            };
        }
        if config.max_steps.is_some_and(|max| steps >= max) {
            break Termination::StepLimit;
        }

        trace!(step = steps, expr = %Pretty(&current), "reducing");
        current = eval(&current);
        steps += 1;

        if !visited.insert(current.clone()) {
            break Termination::CycleDetected;
        }
    };

    debug!(steps, ?termination, "reduction finished");
    Reduction {
        value: current,
        termination,
        steps,
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::Error;
    use crate::ErrorKind;
    use crate::ast::sym;
    use crate::reader::read_str;

    /// Expected outcome of a full reduction
    #[derive(Debug)]
    enum ReduceResult {
        Normal(&'static str),           // Reduces to the value read from this text
        Fails(ErrorKind, &'static str), // Ends in an error table with this message
        Cycles,                         // Hits an exact repeat
    }
    use ReduceResult::*;

    fn run_reduce_tests(test_cases: Vec<(&str, ReduceResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let test_id = format!("Reduce test #{} ({input})", i + 1);
            let result = reduce(&read_str(input).unwrap());

            match expected {
                Normal(text) => {
                    assert_eq!(result.termination, Termination::NormalForm, "{test_id}");
                    assert_eq!(result.value, read_str(text).unwrap(), "{test_id}");
                }
                Fails(kind, message) => {
                    assert_eq!(result.termination, Termination::Error, "{test_id}");
                    let err = Error::from_value(&result.value).unwrap();
                    assert_eq!(err.kind, *kind, "{test_id}");
                    assert_eq!(err.message, *message, "{test_id}");
                }
                Cycles => {
                    assert_eq!(result.termination, Termination::CycleDetected, "{test_id}");
                }
            }
        }
    }

    #[test]
    fn test_reductions_data_driven() {
        run_reduce_tests(vec![
            // === ALREADY NORMAL ===
            ("x", Normal("x")),
            ("{a = (f x)}", Normal("{a = (f x)}")),
            // === LOOKUP CHAINS ===
            ("{a = 1} a", Normal("1")),
            ("{a = {b = {c = 3}}} a b c", Normal("3")),
            ("{a = ({b = c} b)} a", Normal("c")),
            // === FUNCTIONS VIA UNIVERSAL LOOKUP ===
            ("({$x = $x} hello)", Normal("hello")),
            ("{$x = $x} {$x = $x} hello", Normal("hello")),
            // Constant function
            ("{$x = {$y = $y}} ignored kept", Normal("kept")),
            // A body that looks its argument up in a record
            ("{$x = ({a = 1, b = 2} $x)} b", Normal("2")),
            // A body statement is reduced after substitution
            ("{$x = ({$y = $y} $x)} z", Normal("z")),
            // A nested head is stepped before the outer lookup
            ("({a = {b = {c = 3}}} a) b c", Normal("3")),
            // A function result used as a key
            ("{(g a) = found} ({$x = (g $x)} a)", Normal("found")),
            // A statement-valued head is indexed by position
            ("({$x = (f $x)} a) 0", Normal("f")),
            // === ERRORS ===
            ("{a = 1} b", Fails(ErrorKind::LookupError, "Could not find key in table")),
            ("{a = x} a b", Fails(ErrorKind::LookupError, "Expected a table for lookup")),
            // Self-application whose result is applied to a further argument
            ("{$x = ($x $x z)} {$x = ($x $x z)}", Fails(ErrorKind::LookupError, "Could not find key in table")),
            (
                "{$x = $y} a",
                Fails(
                    ErrorKind::LookupError,
                    "Mismatch between substitution key and expression",
                ),
            ),
            // === NON-TERMINATION ===
            ("{$x = ($x $x)} {$x = ($x $x)}", Cycles),
            // Statements produced by lookup are reduced in later steps
            ("{loop = ({loop = x} loop)} loop", Normal("x")),
        ]);
    }

    #[test]
    fn test_self_application_cycle() {
        let omega = read_str("{$x = ($x $x)}").unwrap();
        let expr = Value::statement(vec![omega.clone(), omega.clone()]);
        let result = reduce(&expr);

        assert_eq!(result.termination, Termination::CycleDetected);
        assert_eq!(result.value, expr);
        assert_eq!(result.steps, 1);
    }

    #[test]
    fn test_two_step_cycle() {
        // (F F) -> (G F) -> (F F), where G is self-application
        let f = read_str("{$x = ({$y = ($y $y)} $x)}").unwrap();
        let expr = Value::statement(vec![f.clone(), f]);
        let result = reduce(&expr);

        assert_eq!(result.termination, Termination::CycleDetected);
        assert_eq!(result.value, expr);
        assert_eq!(result.steps, 2);
    }

    /// `{a = {a = ... {a = end}}} a a ... a`, one lookup per step
    fn lookup_chain(depth: usize) -> Value {
        let source = format!("{}end{}{}", "{a = ".repeat(depth), "}".repeat(depth), " a".repeat(depth));
        read_str(&source).unwrap()
    }

    #[test]
    fn test_step_cap_stops_long_reductions() {
        let expr = lookup_chain(40);

        let uncapped = reduce(&expr);
        assert_eq!(uncapped.termination, Termination::NormalForm);
        assert_eq!(uncapped.value, sym("end"));
        assert_eq!(uncapped.steps, 40);

        let result = reduce_with_config(
            &expr,
            ReduceConfig {
                max_steps: Some(25),
            },
        );
        assert_eq!(result.termination, Termination::StepLimit);
        assert_eq!(result.steps, 25);
        // 15 lookups remain
        assert_eq!(result.value.as_statement().unwrap().len(), 16);
    }

    #[test]
    fn test_reduction_beyond_eval_depth_is_an_error() {
        let mut expr = sym("x");
        for _ in 0..crate::MAX_EVAL_DEPTH {
            expr = Value::statement_exact(vec![expr, sym("k")]);
        }
        let result = reduce(&expr);
        assert_eq!(result.termination, Termination::Error);
        assert_eq!(result.steps, 1);
        let err = Error::from_value(&result.value).unwrap();
        assert_eq!(err.kind, ErrorKind::EvalError);
    }

    #[test]
    fn test_step_cap_does_not_affect_short_reductions() {
        let expr = read_str("{a = {b = 2}} a b").unwrap();
        let capped = reduce_with_config(&expr, ReduceConfig { max_steps: Some(5) });
        assert_eq!(capped, reduce(&expr));
        assert_eq!(capped.termination, Termination::NormalForm);
        assert_eq!(capped.value, sym("2"));
        assert_eq!(capped.steps, 2);

        let zero = reduce_with_config(&expr, ReduceConfig { max_steps: Some(0) });
        assert_eq!(zero.termination, Termination::StepLimit);
        assert_eq!(zero.value, expr);
    }

    #[test]
    fn test_reduce_of_read_error_value() {
        let value = crate::reader::read(&crate::ast::val("{a=1"));
        let result = reduce(&value);
        assert_eq!(result.termination, Termination::Error);
        assert_eq!(result.steps, 0);
    }
}
