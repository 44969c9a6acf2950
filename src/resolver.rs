//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<String, Binding>` tracking declared/defined).
//! 2. Report static errors (redeclaration, forward‑read in initializer, invalid
//!    `return`/`break`/`this`/`super`, self‑inheritance, unused variables).
//! 3. Record, for *each* variable occurrence found in a scope, how many scopes
//!    out its binding lives.  Names found in no scope are globals and get no
//!    entry.
//!
//! The whole program is wrapped in one outer scope, so top‑level declarations
//! are checked like any block's.  Errors are accumulated; any error at all
//! means the program must not run.

use crate::ast::{ClassDecl, Expr, ExprId, FunctionDecl, Stmt};
use crate::error::LoxError;
use crate::token::Token;
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// Resolution table: expression identity → number of enclosing scopes to
/// walk.
pub type Locals = HashMap<ExprId, usize>;

/// A name absent from a scope is undeclared.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Binding {
    Declared,
    Defined,
}

/// What kind of function body are we in?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
    StaticMethod,
}

/// Are we inside a class body?  Used to validate `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver {
    scopes: Vec<HashMap<String, Binding>>,
    locals: Locals,
    current_function: FunctionType,
    current_class: ClassType,
    loop_depth: usize,
    report_unused: bool,
    /// `var` declarations in first-seen order, deduplicated by name.
    declared: Vec<Token>,
    seen_declared: HashSet<Token>,
    /// Every name read anywhere in the program.
    read: HashSet<Token>,
    errors: Vec<LoxError>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            locals: Locals::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            loop_depth: 0,
            report_unused: true,
            declared: Vec::new(),
            seen_declared: HashSet::new(),
            read: HashSet::new(),
            errors: Vec::new(),
        }
    }

    /// Turn the "declared but never used" check on or off.
    pub fn report_unused(mut self, enabled: bool) -> Self {
        self.report_unused = enabled;
        self
    }

    /// Resolve a whole program.
    pub fn resolve(mut self, statements: &[Stmt]) -> Result<Locals, Vec<LoxError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.begin_scope();
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
        if self.report_unused {
            self.check_unused();
        }
        self.end_scope();

        self.finish()
    }

    /// Resolve a single top‑level expression (REPL echo mode).
    pub fn resolve_expression(mut self, expr: &Expr) -> Result<Locals, Vec<LoxError>> {
        self.begin_scope();
        self.resolve_expr(expr);
        self.end_scope();

        self.finish()
    }

    fn finish(self) -> Result<Locals, Vec<LoxError>> {
        if self.errors.is_empty() {
            info!("Resolved {} local reference(s)", self.locals.len());
            Ok(self.locals)
        } else {
            info!("Resolve pass found {} error(s)", self.errors.len());
            Err(self.errors)
        }
    }

    fn error(&mut self, token: &Token, message: impl Into<String>) {
        self.errors.push(LoxError::resolve(token, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Class(class) => self.resolve_class(class),

            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
                self.track_declaration(name);
            }

            Stmt::Function(function) => {
                // name is visible *inside* its own body, for recursion
                if let Some(name) = &function.name {
                    self.declare(name);
                    self.define(name);
                }
                self.resolve_function(function, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print { value: expr, .. } => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.loop_depth += 1;
                self.resolve_expr(condition);
                self.resolve_stmt(body);
                self.loop_depth -= 1;
            }

            Stmt::Break(keyword) => {
                if self.loop_depth == 0 {
                    self.error(keyword, "Can't use 'break' outside of a loop.");
                }
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }
                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_class(&mut self, class: &ClassDecl) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(&class.name);

        if let Some(superclass) = &class.superclass {
            let inherits_itself = matches!(
                superclass,
                Expr::Variable { name, .. } if name.lexeme == class.name.lexeme
            );

            if inherits_itself {
                if let Expr::Variable { name, .. } = superclass {
                    self.error(name, "A class can't inherit from itself.");
                }
            } else {
                self.resolve_expr(superclass);
            }

            self.current_class = ClassType::Subclass;
            self.begin_scope();
            self.define_synthetic("super");
        }

        // Static methods: `this` is the class value.
        self.begin_scope();
        self.define_synthetic("this");
        for method in &class.class_methods {
            self.resolve_function(method, FunctionType::StaticMethod);
        }
        self.end_scope();

        // Instance methods: `this` is the receiving instance.
        self.begin_scope();
        self.define_synthetic("this");
        for method in &class.methods {
            let kind = if method.display_name() == crate::class::INITIALIZER {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }
        self.end_scope();

        if class.superclass.is_some() {
            self.end_scope();
        }

        self.define(&class.name);
        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&Binding::Declared) {
                        self.error(name, "Can't read local variable in its own initializer.");
                    }
                }
                self.read.insert(name.clone());
                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }
                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword, "Can't use 'super' outside of a class.");
                        return;
                    }
                    ClassType::Class => {
                        self.error(keyword, "Can't use 'super' in a class with no superclass.");
                        return;
                    }
                    ClassType::Subclass => {}
                }
                self.resolve_local(*id, keyword);
            }

            Expr::Lambda(function) => self.resolve_function(function, FunctionType::Function),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.  Loops do not
    /// reach through a function boundary, so `break` inside a nested
    /// function body is rejected.
    fn resolve_function(&mut self, function: &FunctionDecl, kind: FunctionType) {
        let enclosing_function = self.current_function;
        let enclosing_loop_depth = self.loop_depth;
        self.current_function = kind;
        self.loop_depth = 0;

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        for stmt in &function.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing_function;
        self.loop_depth = enclosing_loop_depth;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }

        scope.insert(name.lexeme.clone(), Binding::Declared);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), Binding::Defined);
        }
    }

    /// Bind `this` / `super` in the innermost scope.
    fn define_synthetic(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), Binding::Defined);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at distance `d`, or leave it
    /// unrecorded (global) if no scope declares it.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (distance, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at distance {}", name.lexeme, distance);
                self.locals.insert(id, distance);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Unused‑variable diagnostics
    // ─────────────────────────────────────────────────────────────────────────

    fn track_declaration(&mut self, name: &Token) {
        if self.seen_declared.insert(name.clone()) {
            self.declared.push(name.clone());
        }
    }

    /// A name counts as used if it is read anywhere, in any scope.
    fn check_unused(&mut self) {
        let unused: Vec<Token> = self
            .declared
            .iter()
            .filter(|name| !self.read.contains(*name))
            .cloned()
            .collect();

        for name in unused {
            self.error(
                &name,
                format!("Variable '{}' declared but never used.", name.lexeme),
            );
        }
    }
}
