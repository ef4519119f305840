use reduct::Error;
use reduct::ast::Value;
use reduct::driver::{Termination, reduce};
use reduct::printer::{to_canonical, to_pretty};
use reduct::reader::{ReadConfig, read_str_with_config};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

fn main() {
    // RUST_LOG=reduct=trace shows every reduction step
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    run_repl();
}

fn run_repl() {
    println!("Reduct - everything is a table");
    println!("Enter statements like: {{a = 1, b = 2}} b");
    println!("Type :help for more commands, or Ctrl+D to exit.");
    println!();

    let mut rl = DefaultEditor::new().expect("Could not initialize REPL");
    let config = ReadConfig {
        handle_comments: true,
    };
    let mut canonical_mode = false;

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":canonical" => {
                        canonical_mode = !canonical_mode;
                        if canonical_mode {
                            println!("Canonical mode enabled: statements print as tables");
                        } else {
                            println!("Pretty mode enabled: statements print as (e0 e1 ...)");
                        }
                        println!();
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                let value = match read_str_with_config(line, config) {
                    Ok(value) => value,
                    Err(e) => {
                        println!("Read error: {}", e.message);
                        println!();
                        continue;
                    }
                };

                let result = reduce(&value);
                match result.termination {
                    Termination::NormalForm => println!("{}", render(&result.value, canonical_mode)),
                    Termination::Error => println!("Eval error: {}", error_message(&result.value)),
                    Termination::CycleDetected => println!("Infinite loop detected, bailing"),
                    Termination::StepLimit => println!("Step limit reached, bailing"),
                }
                println!();
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

fn render(value: &Value, canonical_mode: bool) -> String {
    if canonical_mode {
        to_canonical(value)
    } else {
        to_pretty(value)
    }
}

fn error_message(value: &Value) -> String {
    match Error::from_value(value) {
        Some(error) => error.message,
        None => to_pretty(value),
    }
}

fn print_help() {
    println!("Reduct REPL:");
    println!("  :help      - Show this help message");
    println!("  :canonical - Toggle between pretty and canonical output");
    println!("  :quit      - Exit the REPL");
    println!("  :exit      - Exit the REPL");
    println!("  Ctrl+D     - Exit the REPL");
    println!();
    println!("Syntax:");
    println!("  Symbols:      hello, a-b, 42");
    println!("  Strings:      \"text\" or 'text'");
    println!("  Placeholders: $x");
    println!("  Tables:       {{key = value, other = value}}");
    println!("  Statements:   head key more args, or (head key) for grouping");
    println!("  Comments:     ; to end of line");
    println!();
    println!("Examples:");
    println!("  {{a = 1, b = 2}} b                  ; lookup -> 2");
    println!("  {{$x = $x}} hello                   ; identity -> hello");
    println!("  {{a = {{b = c}}}} a b                 ; chained lookup -> c");
    println!("  {{$x = ($x $x)}} {{$x = ($x $x)}}     ; detected as a loop");
    println!();
}
