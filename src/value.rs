//! Runtime values and their textual rendering.
//!
//! The rendering here is shared by `print`, the `str` native and the REPL
//! echo:
//!
//! * `nil` renders as `null`;
//! * integral numbers drop the decimal point (`5`, not `5.0`);
//! * callables render as `<fn name>`, `<native fn name>` or `<class Name>`;
//! * instances render as `<Name instance {field=value, ...}>`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::callable::{Callable, Function, NativeFunction};
use crate::class::{Class, Instance};

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    NativeFunction(Rc<NativeFunction>),
    Function(Rc<Function>),
    Class(Rc<Class>),
    Instance(Rc<RefCell<Instance>>),
}

impl Value {
    /// `nil` and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match self {
            Value::NativeFunction(native) => Some(native.as_ref()),
            Value::Function(function) => Some(function.as_ref()),
            Value::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Name of the value's kind, for log lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::NativeFunction(_) | Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }

    /// Like `Display`, but instances and classes do not expand their
    /// contents.  Used for field values so cyclic objects print finitely.
    fn fmt_shallow(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Instance(instance) => {
                write!(f, "<{} instance>", instance.borrow().class().name())
            }
            other => write!(f, "{}", other),
        }
    }
}

/// Cross-type comparisons are unequal; callables and instances compare by
/// identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::NativeFunction(a), Value::NativeFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "null"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => write_number(f, *n),

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction(native) => write!(f, "<native fn {}>", native.name()),

            Value::Function(function) => write!(f, "<fn {}>", function.name()),

            Value::Class(class) => write!(f, "<class {}>", class.name()),

            Value::Instance(instance) => {
                let instance = instance.borrow();
                let mut fields: Vec<(&String, &Value)> = instance.fields().iter().collect();
                fields.sort_by(|a, b| a.0.cmp(b.0));

                write!(f, "<{} instance {{", instance.class().name())?;
                for (i, (name, value)) in fields.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}=", name)?;
                    value.fmt_shallow(f)?;
                }
                write!(f, "}}>")
            }
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.fract() == 0.0 {
        if n.abs() < 1e15 {
            let mut buf = itoa::Buffer::new();
            return write!(f, "{}", buf.format(n as i64));
        }
        return write!(f, "{:.0}", n);
    }

    write!(f, "{}", n)
}

#[cfg(test)]
mod value_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn integral_numbers_drop_the_decimal_point() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(-12.0).to_string(), "-12");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(1.0 / 3.0).to_string(), "0.3333333333333333");
    }

    #[test]
    fn nil_renders_as_null() {
        assert_eq!(Value::Nil.to_string(), "null");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
    }

    #[test]
    fn equality_never_crosses_types() {
        assert_eq!(Value::Nil, Value::Nil);
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_ne!(Value::Number(1.0), Value::String("1".into()));
        assert_eq!(Value::String("a".into()), Value::String("a".into()));
    }
}
