use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::{Callable, Function};
use crate::error::RuntimeError;
use crate::interpreter::{IResult, Interpreter};
use crate::token::Token;
use crate::value::Value;

pub const INITIALIZER: &str = "init";

/// A class value.
///
/// Instance methods live in `methods`.  Static methods live in the
/// `metaclass`, a second class whose own superclass is the superclass's
/// metaclass, so static lookups inherit the same way instance lookups do.
pub struct Class {
    name: String,
    superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<Function>>,
    metaclass: Option<Rc<Class>>,
}

impl Class {
    pub fn new(
        name: impl Into<String>,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<Function>>,
        class_methods: HashMap<String, Rc<Function>>,
    ) -> Self {
        let name = name.into();

        let metaclass = Class {
            name: format!("{} metaclass", name),
            superclass: superclass.as_ref().and_then(|s| s.metaclass.clone()),
            methods: class_methods,
            metaclass: None,
        };

        Class {
            name,
            superclass,
            methods,
            metaclass: Some(Rc::new(metaclass)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance method lookup, walking the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass.as_ref()?.find_method(name)
    }

    /// Static method lookup through the metaclass.
    pub fn find_static(&self, name: &str) -> Option<Rc<Function>> {
        self.metaclass.as_ref()?.find_method(name)
    }

    /// `Class.name` — static methods come back bound to the class itself.
    pub fn get(class: &Rc<Class>, name: &Token) -> IResult<Value> {
        match class.find_static(&name.lexeme) {
            Some(method) => Ok(Value::Function(Rc::new(
                method.bind(Value::Class(Rc::clone(class))),
            ))),
            None => Err(undefined_property(name)),
        }
    }
}

impl Callable for Rc<Class> {
    /// Same as the initializer's, or zero without one.
    fn arity(&self) -> usize {
        self.find_method(INITIALIZER).map_or(0, |init| init.arity())
    }

    /// Constructs a fresh instance and runs `init` on it for its side
    /// effects.  The result is always the new instance.
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> IResult<Value> {
        debug!("Constructing instance of '{}'", self.name);

        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(self))));

        if let Some(initializer) = self.find_method(INITIALIZER) {
            initializer
                .bind(Value::Instance(Rc::clone(&instance)))
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();

        f.debug_struct("Class")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|s| s.name()))
            .field("methods", &methods)
            .finish_non_exhaustive()
    }
}

/// An object created by calling a class.  Fields spring into existence on
/// first assignment.
pub struct Instance {
    class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    /// Own fields shadow methods; methods come back bound to `instance`.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &Token) -> IResult<Value> {
        if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        let class = Rc::clone(&instance.borrow().class);

        match class.find_method(&name.lexeme) {
            Some(method) => Ok(Value::Function(Rc::new(
                method.bind(Value::Instance(Rc::clone(instance))),
            ))),
            None => Err(undefined_property(name)),
        }
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&String> = self.fields.keys().collect();
        fields.sort();

        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &fields)
            .finish()
    }
}

fn undefined_property(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined property '{}'.", name.lexeme))
}
