//! Where diagnostics go.
//!
//! The pipeline never prints errors itself.  Static errors, runtime faults
//! and non-fatal warnings (division by zero) are all handed to a
//! [`Reporter`]; the host decides how to display them.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::LoxError;

pub trait Reporter {
    /// `location` is either empty, `" at end"`, or `" at 'lexeme'"`.
    fn report(&mut self, line: usize, location: &str, message: &str);

    fn report_error(&mut self, error: &LoxError) {
        match error {
            LoxError::Lex { message, line } => self.report(*line, "", message),
            LoxError::Parse {
                message,
                location,
                line,
            }
            | LoxError::Resolve {
                message,
                location,
                line,
            } => self.report(*line, location, message),
            LoxError::Runtime(e) => self.report(e.token.line, &e.location(), &e.message),
            other => self.report(0, "", &other.to_string()),
        }
    }
}

/// Prints `[line N] Error<location>: <message>` to standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn report(&mut self, line: usize, location: &str, message: &str) {
        eprintln!("[line {}] Error{}: {}", line, location, message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub location: String,
    pub message: String,
}

/// Keeps every diagnostic in memory.  Clones share the same buffer, so one
/// handle can be given to the interpreter and another kept for inspection.
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    diagnostics: Rc<RefCell<Vec<Diagnostic>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.diagnostics
            .borrow()
            .iter()
            .map(|d| d.message.clone())
            .collect()
    }
}

impl Reporter for CollectingReporter {
    fn report(&mut self, line: usize, location: &str, message: &str) {
        self.diagnostics.borrow_mut().push(Diagnostic {
            line,
            location: location.to_string(),
            message: message.to_string(),
        });
    }
}
