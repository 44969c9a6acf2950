use crate::error::RuntimeError;
use crate::interpreter::IResult;
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Environments are shared by the interpreter and by every closure that
/// captured them, and outlive the block that created them.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One scope of name → value bindings plus a link to the enclosing scope.
///
/// A binding holding `None` has been declared but not yet given a value;
/// reading it is a fault, assigning it initializes it.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Option<Value>>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Inserts or overwrites a binding in this table only.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), Some(value));
    }

    /// Reserves `name` in this table without giving it a value.
    ///
    /// No language construct creates such a slot today: `var x;` defines
    /// `nil`.  Embedders can use it to reserve a name before the value that
    /// belongs there exists.
    pub fn declare(&mut self, name: &str) {
        self.values.insert(name.to_string(), None);
    }

    pub fn get(&self, name: &Token) -> IResult<Value> {
        match self.values.get(&name.lexeme) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(uninitialized(name)),
            None => match &self.enclosing {
                Some(enclosing) => enclosing.borrow().get(name),
                None => Err(undefined(name)),
            },
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> IResult<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = Some(value);
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => Err(undefined(name)),
        }
    }

    /// Reads `name` from exactly this table, without consulting the chain.
    fn get_here(&self, name: &Token) -> IResult<Value> {
        match self.values.get(&name.lexeme) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(uninitialized(name)),
            None => Err(undefined(name)),
        }
    }
}

/// Walks exactly `distance` enclosing links.
///
/// # Panics
/// If the chain is shorter than `distance`.  Distances come from the
/// resolver, so a short chain is a resolver bug rather than a user error.
pub fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
    let mut current: EnvRef = Rc::clone(env);

    for _ in 0..distance {
        let next = current
            .borrow()
            .enclosing
            .clone()
            .expect("resolved distance exceeds environment depth");
        current = next;
    }

    current
}

pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> IResult<Value> {
    debug!("get_at '{}' distance {}", name.lexeme, distance);

    let target = ancestor(env, distance);
    let value = target.borrow().get_here(name);
    value
}

pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> IResult<()> {
    debug!("assign_at '{}' distance {}", name.lexeme, distance);

    ancestor(env, distance)
        .borrow_mut()
        .values
        .insert(name.lexeme.clone(), Some(value));

    Ok(())
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
}

fn uninitialized(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Uninitialized variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod environment_tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn get_falls_back_to_enclosing() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("a", Value::Number(1.0));
        let inner = Environment::with_enclosing(Rc::clone(&outer));

        assert_eq!(inner.get(&ident("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn undefined_variable_is_a_fault() {
        let env = Environment::new();
        let err = env.get(&ident("missing")).unwrap_err();

        assert_eq!(err.message, "Undefined variable 'missing'.");
    }

    #[test]
    fn declared_but_unset_binding_is_uninitialized() {
        let mut env = Environment::new();
        env.declare("later");

        let err = env.get(&ident("later")).unwrap_err();
        assert_eq!(err.message, "Uninitialized variable 'later'.");

        env.assign(&ident("later"), Value::Bool(true)).unwrap();
        assert_eq!(env.get(&ident("later")).unwrap(), Value::Bool(true));
    }

    #[test]
    fn assign_mutates_the_table_where_found() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("a", Value::Number(1.0));
        let mut inner = Environment::with_enclosing(Rc::clone(&outer));

        inner.assign(&ident("a"), Value::Number(2.0)).unwrap();

        assert_eq!(outer.borrow().get(&ident("a")).unwrap(), Value::Number(2.0));
        assert!(inner.values.is_empty());
    }

    #[test]
    fn assign_to_unknown_name_fails() {
        let mut env = Environment::new();
        let err = env.assign(&ident("ghost"), Value::Nil).unwrap_err();

        assert_eq!(err.message, "Undefined variable 'ghost'.");
    }

    #[test]
    fn get_at_skips_shadowing_bindings() {
        let global = Environment::new().into_ref();
        global.borrow_mut().define("x", Value::Number(1.0));
        let block = Environment::with_enclosing(Rc::clone(&global)).into_ref();
        block.borrow_mut().define("x", Value::Number(2.0));

        assert_eq!(get_at(&block, 0, &ident("x")).unwrap(), Value::Number(2.0));
        assert_eq!(get_at(&block, 1, &ident("x")).unwrap(), Value::Number(1.0));

        assign_at(&block, 1, &ident("x"), Value::Number(3.0)).unwrap();
        assert_eq!(global.borrow().get(&ident("x")).unwrap(), Value::Number(3.0));
        assert_eq!(get_at(&block, 0, &ident("x")).unwrap(), Value::Number(2.0));
    }

    #[test]
    #[should_panic(expected = "resolved distance exceeds environment depth")]
    fn ancestor_past_the_chain_panics() {
        let env = Environment::new().into_ref();
        ancestor(&env, 1);
    }
}
