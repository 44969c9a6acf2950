use std::fmt;
use std::rc::Rc;

use chrono::Utc;
use log::debug;

use crate::ast::FunctionDecl;
use crate::control_flow::Flow;
use crate::environment::{get_at, EnvRef, Environment};
use crate::interpreter::{IResult, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Anything that can appear to the left of `(...)`.
pub trait Callable {
    fn arity(&self) -> usize;

    /// Invoke with already-evaluated arguments.  The caller has checked that
    /// `arguments.len() == self.arity()`.
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> IResult<Value>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Native functions
// ─────────────────────────────────────────────────────────────────────────────

/// A function implemented by the host.
pub struct NativeFunction {
    name: &'static str,
    arity: usize,
    func: fn(&[Value]) -> Value,
}

impl NativeFunction {
    pub const fn new(name: &'static str, arity: usize, func: fn(&[Value]) -> Value) -> Self {
        Self { name, arity, func }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> IResult<Value> {
        debug!("Calling native function '{}'", self.name);
        Ok((self.func)(&arguments))
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({}/{})", self.name, self.arity)
    }
}

/// The natives installed into every interpreter's globals.
pub fn natives() -> Vec<NativeFunction> {
    vec![
        NativeFunction::new("clock", 0, clock),
        NativeFunction::new("str", 1, stringify),
    ]
}

/// Seconds since the Unix epoch, with microsecond resolution.
fn clock(_args: &[Value]) -> Value {
    let micros = Utc::now().timestamp_micros();
    Value::Number(micros as f64 / 1_000_000.0)
}

fn stringify(args: &[Value]) -> Value {
    Value::String(args.first().map(Value::to_string).unwrap_or_default())
}

// ─────────────────────────────────────────────────────────────────────────────
// User functions, methods and lambdas
// ─────────────────────────────────────────────────────────────────────────────

/// A declaration paired with the environment it closed over.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        self.declaration.display_name()
    }

    /// Returns a copy whose closure has `this` bound to `receiver`.
    pub fn bind(&self, receiver: Value) -> Function {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", receiver);

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: environment.into_ref(),
            is_initializer: self.is_initializer,
        }
    }

    fn receiver(&self) -> IResult<Value> {
        get_at(&self.closure, 0, &Token::this(self.declaration.keyword.line))
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.arity()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> IResult<Value> {
        debug!("Calling function '{}'", self.name());

        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let flow = interpreter.execute_block(&self.declaration.body, environment.into_ref())?;

        if self.is_initializer {
            return self.receiver();
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
            Flow::Break => {
                debug_assert!(false, "break escaped function '{}'", self.name());
                Ok(Value::Nil)
            }
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.declaration.arity())
            .field("is_initializer", &self.is_initializer)
            .finish_non_exhaustive()
    }
}
