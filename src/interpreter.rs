//! Tree-walking evaluator.
//!
//! Statements return [`Flow`] so `return` and `break` travel up the Rust call
//! stack as ordinary values; only genuine faults use the `Err` channel.

use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::ast::{ClassDecl, Expr, ExprId, LiteralValue, Stmt};
use crate::callable::{natives, Function};
use crate::class::{Class, Instance, INITIALIZER};
use crate::config::Config;
use crate::control_flow::Flow;
use crate::diagnostic::{Reporter, StderrReporter};
use crate::environment::{assign_at, get_at, EnvRef, Environment};
use crate::error::{location_of, RuntimeError};
use crate::resolver::Locals;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
    reporter: Box<dyn Reporter>,
    call_depth: usize,
    max_call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Prints to standard output and reports to standard error.
    pub fn new() -> Self {
        Self::with_io(Box::new(io::stdout()), Box::new(StderrReporter))
    }

    /// Creates an interpreter writing `print` output to `out` and
    /// diagnostics to `reporter`, with natives such as `clock` defined.
    pub fn with_io(out: Box<dyn Write>, reporter: Box<dyn Reporter>) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::new().into_ref();

        for native in natives() {
            debug!("Defining native function '{}'", native.name());
            globals
                .borrow_mut()
                .define(native.name(), Value::NativeFunction(Rc::new(native)));
        }

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
            reporter,
            call_depth: 0,
            max_call_depth: Config::DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn reporter_mut(&mut self) -> &mut dyn Reporter {
        self.reporter.as_mut()
    }

    /// Merge a resolver pass's distances into the table.  Ids are unique per
    /// process, so tables from separate REPL lines never collide.
    pub fn resolve(&mut self, locals: Locals) {
        debug!("Recording {} resolved local(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Writes the rendering of `value` and a newline to the output sink.
    pub fn print(&mut self, value: &Value) -> io::Result<()> {
        writeln!(self.out, "{}", value)?;
        self.out.flush()
    }

    /// Runs a program.  The first fault aborts the rest of it.
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => debug_assert!(false, "{:?} escaped to top level", flow),
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> IResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print { keyword, value } => {
                let value = self.evaluate(value)?;
                debug!("Printing {} value", value.type_name());

                self.print(&value).map_err(|e| {
                    RuntimeError::new(keyword, format!("Failed to write output: {}", e))
                })?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, environment.into_ref())
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        Flow::Break => {
                            debug!("Loop exited by break");
                            break;
                        }
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Break(_) => Ok(Flow::Break),

            Stmt::Function(declaration) => {
                let function = Function::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                debug!("Defining function '{}'", declaration.display_name());
                self.environment.borrow_mut().define(
                    declaration.display_name(),
                    Value::Function(Rc::new(function)),
                );
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }

            Stmt::Class(declaration) => {
                self.class_declaration(declaration)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Runs `statements` with `environment` as the current scope.  The
    /// previous scope is restored however the block ends.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> IResult<Flow> {
        let previous = mem::replace(&mut self.environment, environment);

        let result = self.run_statements(statements);

        self.environment = previous;
        result
    }

    fn run_statements(&mut self, statements: &[Stmt]) -> IResult<Flow> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn class_declaration(&mut self, declaration: &ClassDecl) -> IResult<()> {
        let superclass = match &declaration.superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => &declaration.name,
                    };
                    return Err(RuntimeError::new(token, "Superclass must be a class."));
                }
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&declaration.name.lexeme, Value::Nil);

        let closure = match &superclass {
            Some(superclass) => {
                let mut environment = Environment::with_enclosing(Rc::clone(&self.environment));
                environment.define("super", Value::Class(Rc::clone(superclass)));
                environment.into_ref()
            }
            None => Rc::clone(&self.environment),
        };

        let class_methods = declaration
            .class_methods
            .iter()
            .map(|method| {
                let function = Function::new(Rc::clone(method), Rc::clone(&closure), false);
                (method.display_name().to_string(), Rc::new(function))
            })
            .collect();

        let methods = declaration
            .methods
            .iter()
            .map(|method| {
                let is_initializer = method.display_name() == INITIALIZER;
                let function =
                    Function::new(Rc::clone(method), Rc::clone(&closure), is_initializer);
                (method.display_name().to_string(), Rc::new(function))
            })
            .collect();

        let class = Class::new(
            declaration.name.lexeme.clone(),
            superclass,
            methods,
            class_methods,
        );

        info!("Defined class '{}'", class.name());
        self.environment
            .borrow_mut()
            .assign(&declaration.name, Value::Class(Rc::new(class)))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::new(operator, "Operand must be a number.")),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(RuntimeError::new(operator, "Unknown unary operator.")),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                self.binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuits = match operator.token_type {
                    TokenType::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(&callee, paren, args)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
                Value::Class(class) => Class::get(&class, name),
                _ => Err(RuntimeError::new(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::new(name, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());
                Ok(value)
            }

            Expr::Super {
                id,
                keyword,
                method,
            } => self.super_method(*id, keyword, method),

            Expr::Lambda(declaration) => Ok(Value::Function(Rc::new(Function::new(
                Rc::clone(declaration),
                Rc::clone(&self.environment),
                false,
            )))),
        }
    }

    fn binary(&mut self, operator: &Token, left: Value, right: Value) -> IResult<Value> {
        use Value::{Bool, Number};

        match (&operator.token_type, left, right) {
            (TokenType::PLUS, Number(a), Number(b)) => Ok(Number(a + b)),
            (TokenType::PLUS, Value::String(a), Value::String(b)) => {
                Ok(Value::String(a + b.as_str()))
            }
            (TokenType::PLUS, _, _) => Err(RuntimeError::new(
                operator,
                "Operands must be two numbers or two strings.",
            )),

            (TokenType::MINUS, Number(a), Number(b)) => Ok(Number(a - b)),
            (TokenType::STAR, Number(a), Number(b)) => Ok(Number(a * b)),
            (TokenType::SLASH, Number(_), Number(b)) if b == 0.0 => {
                self.division_by_zero(operator);
                Ok(Number(0.0))
            }
            (TokenType::SLASH, Number(a), Number(b)) => Ok(Number(a / b)),

            (TokenType::GREATER, Number(a), Number(b)) => Ok(Bool(a > b)),
            (TokenType::GREATER_EQUAL, Number(a), Number(b)) => Ok(Bool(a >= b)),
            (TokenType::LESS, Number(a), Number(b)) => Ok(Bool(a < b)),
            (TokenType::LESS_EQUAL, Number(a), Number(b)) => Ok(Bool(a <= b)),

            (TokenType::EQUAL_EQUAL, a, b) => Ok(Bool(a == b)),
            (TokenType::BANG_EQUAL, a, b) => Ok(Bool(a != b)),

            (
                TokenType::MINUS
                | TokenType::STAR
                | TokenType::SLASH
                | TokenType::GREATER
                | TokenType::GREATER_EQUAL
                | TokenType::LESS
                | TokenType::LESS_EQUAL,
                _,
                _,
            ) => Err(RuntimeError::new(operator, "Operands must be numbers.")),

            _ => Err(RuntimeError::new(operator, "Unknown binary operator.")),
        }
    }

    /// Non-fatal: reported, then the expression evaluates to zero.
    fn division_by_zero(&mut self, operator: &Token) {
        warn!("Division by zero at line {}", operator.line);

        self.reporter.report(
            operator.line,
            &location_of(operator),
            "Division by zero; result is 0.",
        );
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> IResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn super_method(&mut self, id: ExprId, keyword: &Token, method: &Token) -> IResult<Value> {
        let distance = self
            .locals
            .get(&id)
            .copied()
            .ok_or_else(|| RuntimeError::new(keyword, "Unresolved 'super'."))?;

        let Value::Class(superclass) = get_at(&self.environment, distance, keyword)? else {
            return Err(RuntimeError::new(keyword, "Superclass must be a class."));
        };

        // `this` always lives one scope inside `super`.
        let receiver = get_at(
            &self.environment,
            distance.saturating_sub(1),
            &Token::this(keyword.line),
        )?;

        // Inside a static method the receiver is the class itself.
        let found = match receiver {
            Value::Class(_) => superclass.find_static(&method.lexeme),
            _ => superclass.find_method(&method.lexeme),
        };

        match found {
            Some(function) => Ok(Value::Function(Rc::new(function.bind(receiver)))),
            None => Err(RuntimeError::new(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn call_value(&mut self, callee: &Value, paren: &Token, arguments: Vec<Value>) -> IResult<Value> {
        let Some(callable) = callee.as_callable() else {
            return Err(RuntimeError::new(
                paren,
                "Can only call functions and classes.",
            ));
        };

        if arguments.len() != callable.arity() {
            return Err(RuntimeError::new(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::new(paren, "Stack overflow."));
        }

        self.call_depth += 1;
        let result = ensure_sufficient_stack(|| callable.call(self, arguments));
        self.call_depth -= 1;

        result
    }
}
