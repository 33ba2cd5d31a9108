use std::io::{self, BufRead, Write};

use calc_rs::lexer;
use calc_rs::normalize::strip_whitespace;
use calc_rs::Session;
use clap::Parser;

/// calc is an interactive evaluator for algebraic expressions. Lines
/// containing `=` declare variables or functions; anything else is
/// evaluated and printed.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Evaluate a single expression and exit.
    expression: Option<String>,

    /// Decimal places kept when rounding results.
    #[arg(long, default_value_t = 6)]
    scale: u32,

    /// Print full-precision results without rounding.
    #[arg(long)]
    no_round: bool,
}

/// A line is a declaration when a top-level `=` (outside any parentheses,
/// not part of a comparison operator) has an identifier or a function head
/// on its left. An `=` inside a call stays with the call, so
/// `if(a = b, 1, 2)` and `2 + if(x >= 1, 1, 0)` evaluate as queries while
/// `y = if(...)` and `notify = 2` declare.
fn is_declaration(line: &str) -> bool {
    let compact = strip_whitespace(line);
    let mut depth = 0u32;
    let mut prev = '\0';
    let mut iter = compact.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '=' if depth == 0 => {
                let next = iter.peek().map(|(_, c)| *c);
                let comparison = matches!(prev, '<' | '>' | '!' | '=') || next == Some('=');
                if !comparison {
                    let left = &compact[..i];
                    return lexer::is_identifier(left) || left.contains('(');
                }
            }
            _ => {}
        }
        prev = c;
    }
    false
}

fn main() {
    let args = Args::parse();

    let mut session = Session::new();
    session.set_round_scale(args.scale);
    session.set_round_enabled(!args.no_round);

    if let Some(expression) = args.expression {
        match session.parse(&expression) {
            Ok(value) => println!("{}", value),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        if is_declaration(&line) {
            if let Err(e) = session.add_expression(&line) {
                eprintln!("{}", e);
            }
        } else {
            match session.parse(&line) {
                Ok(value) => println!("{}", value),
                Err(e) => eprintln!("{}", e),
            }
        }
        let _ = io::stdout().flush();
    }

    if !session.variables().is_empty() {
        println!("Variables:");
        for variable in session.variables() {
            match variable.answer() {
                Some(value) => {
                    println!("{} = {} = {}", variable.name, variable.expression, value)
                }
                None => println!("{} = {}", variable.name, variable.expression),
            }
        }
    }
}
