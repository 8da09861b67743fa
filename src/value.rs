use core::fmt;
use std::rc::Rc;

use crate::{error::SchemeError, frame::Frame};

pub type EvaluationResult = Result<Value, SchemeError>;

/// Signature shared by every primitive. The frame is the one active at the call site.
pub type PrimitiveFn = fn(Vec<Value>, &Frame) -> EvaluationResult;

/// Every runtime entity of the language.
///
/// Pairs, closures and strings are reference counted, so cloning a value never copies
/// list structure or environments.
#[derive(Clone)]
pub enum Value {
    Null,
    Void,
    Int(i64),
    Double(f64),
    Str(Rc<str>),
    Bool(bool),
    Symbol(Rc<str>),
    Pair(Rc<(Value, Value)>),
    Closure(Rc<Closure>),
    Primitive(Primitive),
}

/// Validated parameter list of a closure.
#[derive(Debug, Clone, PartialEq)]
pub enum Formals {
    /// `(lambda (a b c) ...)`
    Fixed(Vec<Rc<str>>),
    /// `(lambda args ...)`, binds the whole argument list
    Variadic(Rc<str>),
}

pub struct Closure {
    pub(crate) formals: Formals,
    pub(crate) body: Value,
    pub(crate) environment: Frame,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Closure({:?}, {})", self.formals, self.body)
    }
}

#[derive(Clone, Copy)]
pub struct Primitive {
    pub name: &'static str,
    pub function: PrimitiveFn,
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Primitive({})", self.name)
    }
}

impl Value {
    pub fn symbol(name: &str) -> Self {
        Self::Symbol(Rc::from(name))
    }

    pub fn string(text: &str) -> Self {
        Self::Str(Rc::from(text))
    }

    pub fn cons(car: Value, cdr: Value) -> Self {
        Self::Pair(Rc::new((car, cdr)))
    }

    /// Builds a fresh proper list from the values.
    pub fn list<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        Self::list_with_tail(values, Value::Null)
    }

    pub fn list_with_tail<I>(values: I, tail: Value) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        values.into_iter()
            .rev()
            .fold(tail, |cdr, car| Value::cons(car, cdr))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Self::Closure(_) | Self::Primitive(_))
    }

    /// Only `#f` is false, everything else counts as true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Bool(false))
    }

    /// A proper list is a chain of pairs ending in `Null`.
    pub fn is_list(&self) -> bool {
        let mut cell = self;
        loop {
            match cell {
                Self::Null => return true,
                Self::Pair(pair) => cell = &pair.1,
                _ => return false,
            }
        }
    }

    pub fn as_symbol(&self) -> Option<&Rc<str>> {
        match self {
            Self::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn car(&self, procedure: &str) -> EvaluationResult {
        match self {
            Self::Pair(pair) => Ok(pair.0.clone()),
            other => Err(SchemeError::not_a_pair(procedure, other)),
        }
    }

    pub fn cdr(&self, procedure: &str) -> EvaluationResult {
        match self {
            Self::Pair(pair) => Ok(pair.1.clone()),
            other => Err(SchemeError::not_a_pair(procedure, other)),
        }
    }

    /// Collects the elements of a proper list, failing on any other terminator.
    pub fn to_vec(&self, operation: &str) -> Result<Vec<Value>, SchemeError> {
        let mut values = Vec::new();
        let mut cell = self;
        loop {
            match cell {
                Self::Null => return Ok(values),
                Self::Pair(pair) => {
                    values.push(pair.0.clone());
                    cell = &pair.1;
                }
                _ => return Err(SchemeError::not_a_list(operation, self)),
            }
        }
    }

    pub fn length(&self, operation: &str) -> Result<usize, SchemeError> {
        let mut length = 0;
        let mut cell = self;
        loop {
            match cell {
                Self::Null => return Ok(length),
                Self::Pair(pair) => {
                    length += 1;
                    cell = &pair.1;
                }
                _ => return Err(SchemeError::not_a_list(operation, self)),
            }
        }
    }

    /// Returns a new list with the elements in reverse order. The receiver is untouched.
    pub fn reversed(&self, operation: &str) -> EvaluationResult {
        let mut reversed = Value::Null;
        let mut cell = self;
        loop {
            match cell {
                Self::Null => return Ok(reversed),
                Self::Pair(pair) => {
                    reversed = Value::cons(pair.0.clone(), reversed);
                    cell = &pair.1;
                }
                _ => return Err(SchemeError::not_a_list(operation, self)),
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Void => "Void",
            Self::Int(_) => "Integer",
            Self::Double(_) => "Double",
            Self::Str(_) => "String",
            Self::Bool(_) => "Boolean",
            Self::Symbol(_) => "Symbol",
            Self::Pair(_) => "Pair",
            Self::Closure(_) => "Procedure",
            Self::Primitive(_) => "Primitive",
        }
    }
}

impl PartialEq for Value {
    /// Structural equality for data, identity for procedures.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) | (Self::Void, Self::Void) => true,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::Str(a), Self::Str(b)) | (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Pair(a), Self::Pair(b)) => Rc::ptr_eq(a, b) || (a.0 == b.0 && a.1 == b.1),
            (Self::Closure(a), Self::Closure(b)) => Rc::ptr_eq(a, b),
            (Self::Primitive(a), Self::Primitive(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "()"),
            Self::Void => Ok(()),
            Self::Int(value) => write!(f, "{}", value),
            // Debug keeps the fractional part, `3.0` rather than `3`
            Self::Double(value) => write!(f, "{:?}", value),
            Self::Str(value) => write!(f, "\"{}\"", value),
            Self::Bool(value) => write!(f, "{}", if *value { "#t" } else { "#f" }),
            Self::Symbol(name) => write!(f, "{}", name),
            Self::Closure(_) => write!(f, "#<procedure>"),
            Self::Primitive(_) => write!(f, "#<primitive>"),
            Self::Pair(pair) => {
                write!(f, "({}", pair.0)?;
                let mut cell = &pair.1;
                loop {
                    match cell {
                        Self::Null => break,
                        Self::Pair(pair) => {
                            write!(f, " {}", pair.0)?;
                            cell = &pair.1;
                        }
                        tail => {
                            write!(f, " . {}", tail)?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(f, "#<void>"),
            other => fmt::Display::fmt(other, f),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
