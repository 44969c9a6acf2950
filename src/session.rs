//! Source text in, side effects out.
//!
//! A [`Session`] drives scan → parse → resolve → interpret and owns one
//! [`Interpreter`], so globals defined by one call are visible to the next.

use std::io::{self, Write};

use log::{debug, info};

use crate::ast::{Expr, Stmt};
use crate::config::Config;
use crate::diagnostic::{Reporter, StderrReporter};
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;
use crate::token::Token;
use crate::value::Value;

/// How a run ended.  Maps onto the usual `65` / `70` process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    StaticError,
    RuntimeError,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Ok => 0,
            RunStatus::StaticError => 65,
            RunStatus::RuntimeError => 70,
        }
    }
}

pub struct Session {
    interpreter: Interpreter,
    config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self::with_io(config, Box::new(io::stdout()), Box::new(StderrReporter))
    }

    pub fn with_io(config: Config, out: Box<dyn Write>, reporter: Box<dyn Reporter>) -> Self {
        info!("Starting session with {:?}", config);

        Self {
            interpreter: Interpreter::with_io(out, reporter).max_call_depth(config.max_call_depth),
            config,
        }
    }

    /// Runs `source` as a program.  Nothing executes if any static error is
    /// found; every one of them is reported.
    pub fn run(&mut self, source: &str) -> RunStatus {
        let Some(tokens) = self.scan(source) else {
            return RunStatus::StaticError;
        };

        let statements = match Parser::new(&tokens).parse() {
            Ok(statements) => statements,
            Err(errors) => {
                self.report_all(&errors);
                return RunStatus::StaticError;
            }
        };

        self.execute(&statements)
    }

    /// Evaluates `source` as a single expression and returns its value.
    pub fn evaluate(&mut self, source: &str) -> Result<Value, RunStatus> {
        let tokens = self.scan(source).ok_or(RunStatus::StaticError)?;

        let Some(expr) = Parser::new(&tokens).parse_expression() else {
            self.report_expression_errors(&tokens);
            return Err(RunStatus::StaticError);
        };

        self.evaluate_expr(&expr)
    }

    /// One line of interactive input.  A bare expression has its value
    /// echoed; anything else runs as a program.
    pub fn run_line(&mut self, source: &str) -> RunStatus {
        let Some(tokens) = self.scan(source) else {
            return RunStatus::StaticError;
        };

        if let Some(expr) = Parser::new(&tokens).parse_expression() {
            debug!("Echoing expression line");

            return match self.evaluate_expr(&expr) {
                Ok(value) => match self.interpreter.print(&value) {
                    Ok(()) => RunStatus::Ok,
                    Err(e) => {
                        self.report(&LoxError::Io(e));
                        RunStatus::RuntimeError
                    }
                },
                Err(status) => status,
            };
        }

        self.run(source)
    }

    // ─────────────────────────────────────────────────────────────────────────

    fn scan(&mut self, source: &str) -> Option<Vec<Token>> {
        let (tokens, errors) = scan_tokens(source.as_bytes());

        if errors.is_empty() {
            Some(tokens)
        } else {
            self.report_all(&errors);
            None
        }
    }

    fn execute(&mut self, statements: &[Stmt]) -> RunStatus {
        let resolver = Resolver::new().report_unused(self.config.report_unused);

        match resolver.resolve(statements) {
            Ok(locals) => self.interpreter.resolve(locals),
            Err(errors) => {
                self.report_all(&errors);
                return RunStatus::StaticError;
            }
        }

        match self.interpreter.interpret(statements) {
            Ok(()) => RunStatus::Ok,
            Err(e) => {
                self.report(&LoxError::Runtime(e));
                RunStatus::RuntimeError
            }
        }
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value, RunStatus> {
        match Resolver::new().resolve_expression(expr) {
            Ok(locals) => self.interpreter.resolve(locals),
            Err(errors) => {
                self.report_all(&errors);
                return Err(RunStatus::StaticError);
            }
        }

        self.interpreter.evaluate(expr).map_err(|e| {
            self.report(&LoxError::Runtime(e));
            RunStatus::RuntimeError
        })
    }

    /// `parse_expression` only says *that* it failed; reparse as a program
    /// to find out where.
    fn report_expression_errors(&mut self, tokens: &[Token]) {
        match Parser::new(tokens).parse() {
            Err(errors) => self.report_all(&errors),
            Ok(_) => {
                let first = &tokens[0];
                self.report(&LoxError::parse(first, "Expect expression."));
            }
        }
    }

    fn report(&mut self, error: &LoxError) {
        debug!("Reporting: {}", error);
        self.interpreter.reporter_mut().report_error(error);
    }

    fn report_all(&mut self, errors: &[LoxError]) {
        for error in errors {
            self.report(error);
        }
    }
}
